//! The two-queue channel pair connecting controller and worker.
//!
//! One unbounded FIFO queue per direction: `commands` (controller to worker)
//! and `telemetry` (worker to controller). Sends never block. Reads never
//! block either; an empty queue is the steady-state case, not an error.
//! Closing the pair is idempotent and makes later sends fail loudly.

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

use super::types::{Command, TelemetryMessage};

/// Error returned when an operation hits an already-closed channel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelClosed;

impl std::fmt::Display for ChannelClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel pair is closed")
    }
}

impl std::error::Error for ChannelClosed {}

struct Endpoints {
    command_tx: Sender<Command>,
    command_rx: Receiver<Command>,
    telemetry_tx: Sender<TelemetryMessage>,
    telemetry_rx: Receiver<TelemetryMessage>,
}

/// Both queues of the protocol, owned by the controller side.
///
/// The pair keeps every endpoint alive for its own lifetime, so a queue can
/// never disconnect underneath a live pair; workers get clones of the two
/// endpoints they need and drop them when they exit. After [`close`] the
/// endpoints are released and any telemetry still queued is discarded.
///
/// [`close`]: ChannelPair::close
pub struct ChannelPair {
    inner: Option<Endpoints>,
}

impl ChannelPair {
    pub fn new() -> Self {
        let (command_tx, command_rx) = unbounded();
        let (telemetry_tx, telemetry_rx) = unbounded();
        Self {
            inner: Some(Endpoints {
                command_tx,
                command_rx,
                telemetry_tx,
                telemetry_rx,
            }),
        }
    }

    /// Enqueue a command for the worker. Never blocks; unbounded capacity.
    pub fn send_command(&self, command: Command) -> Result<(), ChannelClosed> {
        let endpoints = self.inner.as_ref().ok_or(ChannelClosed)?;
        // The pair holds its own receiver, so a live pair cannot disconnect.
        endpoints.command_tx.send(command).map_err(|_| ChannelClosed)
    }

    /// Non-blocking drain of one telemetry message. Returns `None` when the
    /// queue is empty or on any queue error; the caller treats both as "no
    /// message right now".
    pub fn try_receive_telemetry(&self) -> Option<TelemetryMessage> {
        self.inner.as_ref()?.telemetry_rx.try_recv().ok()
    }

    /// The two endpoints a worker needs: the command queue's consumer side
    /// and the telemetry queue's producer side. Clones share the underlying
    /// queues with the pair.
    pub fn worker_endpoints(&self) -> Option<(Receiver<Command>, Sender<TelemetryMessage>)> {
        let endpoints = self.inner.as_ref()?;
        Some((endpoints.command_rx.clone(), endpoints.telemetry_tx.clone()))
    }

    /// A standalone consumer of the telemetry queue, used by the foreground
    /// poller. Keeps working after the pair closes, yielding `None` once the
    /// remaining producers are gone.
    pub fn telemetry_receiver(&self) -> Option<Receiver<TelemetryMessage>> {
        Some(self.inner.as_ref()?.telemetry_rx.clone())
    }

    /// Release both queues. Idempotent; repeated calls are no-ops.
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            debug!("channel pair closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Default for ChannelPair {
    fn default() -> Self {
        Self::new()
    }
}
