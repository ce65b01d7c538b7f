//! # focuscycle Core Library
//!
//! Business logic for the focuscycle work/break timer. The `focuscycle` CLI
//! is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a second-granularity state machine cycling
//!   Work → Short/Long Break → Work, driven by `tick()`
//! - **Events**: per-kind subscriber lists the engine fans out to
//! - **Recovery**: flat persisted record and the rules for restoring from it
//! - **Timer Service**: a tokio task that owns the engine and serializes
//!   commands with the one-second ticker
//! - **Storage**: SQLite session log and runtime record, TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerService`] / [`TimerHandle`]: Single-owner driver
//! - [`PersistedRuntimeState`]: Crash-recovery record
//! - [`Database`]: Session log and state persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod recovery;
pub mod service;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError};
pub use events::{Event, EventBus, SubscriptionId};
pub use recovery::{PersistedRuntimeState, RecoveryOptions};
pub use service::{TimerHandle, TimerService};
pub use storage::{Config, Database, MemoryStateStore, StateStore, TaskTag};
pub use timer::{Mode, SessionLogEntry, SessionState, Snapshot, TimerConfig, TimerEngine};
