mod clock;
mod config;
mod engine;
mod mode;
mod session;
mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TimerConfig;
pub use engine::TimerEngine;
pub use mode::Mode;
pub use session::SessionLogEntry;
pub use state::{SessionState, Snapshot};
