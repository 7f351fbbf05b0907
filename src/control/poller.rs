//! Foreground telemetry poller.
//!
//! A fixed-interval periodic timer that drains at most one telemetry
//! message per tick and hands it to a presentation callback. The poller is
//! cancellable as a single handle: `stop()` (or dropping the handle) ends
//! it. Rescheduling is unconditional, so an empty poll never stops the
//! timer. When the timer source itself is gone the poller dies silently,
//! which is the intended shutdown behavior.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};
use log::debug;

use crate::protocol::TelemetryMessage;

/// Handle to a running poller. Cancel with [`stop`](TelemetryPoller::stop)
/// or by dropping the handle.
pub struct TelemetryPoller {
    cancel_tx: Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TelemetryPoller {
    /// Start polling on a fixed cadence. `poll` drains at most one message
    /// and must never block; `on_message` receives each drained message.
    pub fn spawn<P, F>(interval: Duration, mut poll: P, mut on_message: F) -> Self
    where
        P: FnMut() -> Option<TelemetryMessage> + Send + 'static,
        F: FnMut(TelemetryMessage) + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let ticker = tick(interval);

        let thread = thread::Builder::new()
            .name("telemetry-poller".to_string())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> beat => {
                            if beat.is_err() {
                                // Timer source gone; die silently.
                                break;
                            }
                            if let Some(message) = poll() {
                                on_message(message);
                            }
                        }
                        recv(cancel_rx) -> _ => break,
                    }
                }
                debug!("telemetry poller exited");
            })
            .ok();

        Self { cancel_tx, thread }
    }

    /// Cancel the poller and wait for its timer thread to exit.
    pub fn stop(mut self) {
        let _ = self.cancel_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
