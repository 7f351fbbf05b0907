//! Control/telemetry protocol between the controller and the worker.
//!
//! This module defines everything that crosses the thread boundary:
//! - `types`: typed commands, wire-level command frames, telemetry messages
//! - `channel`: the two one-directional FIFO queues carrying them
//!
//! Ordering is FIFO within each queue; there is no ordering guarantee across
//! the two queues (a telemetry message is not correlated to a command).

pub mod channel;
pub mod types;

pub use channel::{ChannelClosed, ChannelPair};
pub use types::{Command, CommandFrame, TelemetryMessage};
