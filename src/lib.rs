//! Drive a background waveform worker from a foreground controller, using
//! two one-directional queues as the only communication channel.
//!
//! ## Module Organization
//!
//! - `protocol`: typed commands, wire frames, telemetry, and the channel
//!   pair carrying them between the two threads
//! - `worker`: the background poll loop and the passive renderer it drives
//! - `control`: the controller side: supervisor (lifecycle), foreground
//!   telemetry poller, and configuration
//!
//! ## Public API
//!
//! The presentation layer talks to [`control::Supervisor`] and nothing
//! else: `start`, `stop`, `send`, `receive`, `close`. The worker side of
//! the contract is [`worker::worker_task`], an entry point taking the
//! command queue's consumer end and the telemetry queue's producer end.

pub mod control;
pub mod protocol;
pub mod worker;
