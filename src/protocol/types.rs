//! Message type definitions for the control/telemetry protocol.

use serde::{Deserialize, Serialize};

/// Commands sent from the controller to the worker.
///
/// Each command is consumed exactly once by the worker's drain loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Change the rendered frequency. The payload must be positive; the
    /// worker ignores anything else.
    SetFrequency(f64),
    /// Enable or disable per-tick telemetry.
    SetVerbosity(bool),
    /// Sentinel instructing the worker to exit its loop.
    Terminate,
}

/// Wire-level command frame: a dictionary with optional fields, any
/// combination of which may appear in one message.
///
/// This is the interop format; inside the process the typed [`Command`]
/// variants are used. `exit: true` takes precedence over the other fields
/// of the same frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub exit: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl CommandFrame {
    /// Frame carrying only a frequency update.
    pub fn freq(freq: f64) -> Self {
        Self {
            freq: Some(freq),
            ..Self::default()
        }
    }

    /// Frame carrying only a verbosity update.
    pub fn verbose(verbose: bool) -> Self {
        Self {
            verbose: Some(verbose),
            ..Self::default()
        }
    }

    /// The termination sentinel frame.
    pub fn exit() -> Self {
        Self {
            exit: true,
            ..Self::default()
        }
    }

    /// Expand the frame into typed commands, in application order.
    ///
    /// An exit frame yields only [`Command::Terminate`], regardless of what
    /// else the frame carries.
    pub fn commands(&self) -> Vec<Command> {
        if self.exit {
            return vec![Command::Terminate];
        }
        let mut commands = Vec::new();
        if let Some(freq) = self.freq {
            commands.push(Command::SetFrequency(freq));
        }
        if let Some(verbose) = self.verbose {
            commands.push(Command::SetVerbosity(verbose));
        }
        commands
    }

    /// Parse a frame from its JSON dictionary form.
    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }

    /// Serialize the frame to its JSON dictionary form. Absent fields are
    /// omitted so `{"exit": true}` round-trips as-is.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Status report emitted by the worker after rendering, once per tick while
/// verbosity is on. Delivery is at-most-once; unread messages are discarded
/// with the channel pair on teardown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryMessage {
    /// Seconds elapsed since the worker started.
    pub elapsed_seconds: f64,
}

impl TelemetryMessage {
    pub fn new(elapsed_seconds: f64) -> Self {
        Self { elapsed_seconds }
    }
}

impl std::fmt::Display for TelemetryMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "multiprocess time: {:.3}", self.elapsed_seconds)
    }
}
