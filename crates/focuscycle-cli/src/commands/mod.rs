pub mod config;
pub mod run;
pub mod sessions;
pub mod tag;
pub mod timer;
