//! Controller side: worker lifecycle, foreground polling, configuration.
//!
//! Everything here runs on (or is owned by) the foreground thread and never
//! blocks on the worker, except for the bounded wait inside `stop`.

pub mod config;
pub mod poller;
pub mod supervisor;

pub use config::AppConfig;
pub use poller::TelemetryPoller;
pub use supervisor::Supervisor;
