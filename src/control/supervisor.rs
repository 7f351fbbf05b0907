//! Controller-side owner of the worker lifecycle and the channel pair.
//!
//! The five operations here (`start`, `stop`, `send`, `receive`, `close`)
//! are the entire surface the presentation layer is allowed to call. All of
//! them recover locally: a double start is logged and ignored, a double stop
//! is a no-op, and none of them ever blocks on the worker beyond the bounded
//! wait inside `stop`.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::control::config::AppConfig;
use crate::protocol::{ChannelPair, Command, CommandFrame, TelemetryMessage};
use crate::worker::{self, WorkerSettings};

/// Owns the channel pair and at most one live worker thread.
///
/// Invariant: `worker == None` exactly when no worker is running (a handle
/// left behind by a worker that exited on its own is reaped on the next
/// lifecycle call).
pub struct Supervisor {
    channels: ChannelPair,
    worker: Option<thread::JoinHandle<()>>,
    settings: WorkerSettings,
    stop_timeout: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_config(&AppConfig::default())
    }

    pub fn with_config(config: &AppConfig) -> Self {
        Self {
            channels: ChannelPair::new(),
            worker: None,
            settings: config.worker_settings(),
            stop_timeout: config.stop_timeout(),
        }
    }

    /// Spawn the worker if none is running. Idempotent: repeated triggers
    /// (a double-clicked start button, say) leave exactly one live worker.
    pub fn start(&mut self) {
        if let Some(handle) = &self.worker {
            if !handle.is_finished() {
                info!("worker already running; start ignored");
                return;
            }
            // The previous worker exited on its own; reap it before respawning.
            self.reap();
        }

        let Some((commands, telemetry)) = self.channels.worker_endpoints() else {
            error!("channel pair is closed; cannot start worker");
            return;
        };

        // Anything a caller enqueued while no worker was alive stays unread.
        let stale = commands.try_iter().count();
        if stale > 0 {
            debug!("discarded {stale} commands queued while stopped");
        }

        let settings = self.settings;
        let spawned = thread::Builder::new()
            .name("waveform-worker".to_string())
            .spawn(move || worker::run(commands, telemetry, settings));
        match spawned {
            Ok(handle) => {
                info!("worker started");
                self.worker = Some(handle);
            }
            Err(err) => error!("failed to spawn worker thread: {err}"),
        }
    }

    /// Send the terminate sentinel and wait for the worker to exit.
    /// Idempotent: with no worker recorded this is a no-op, and it is safe
    /// to call after the worker already exited on its own.
    ///
    /// The wait is bounded. A worker that ignores the sentinel past the
    /// timeout is abandoned: its handle is cleared so the lifecycle can
    /// continue, and the stuck thread is left to the OS.
    pub fn stop(&mut self) {
        if self.worker.is_none() {
            debug!("stop with no worker recorded; nothing to do");
            return;
        }

        if self.channels.send_command(Command::Terminate).is_err() {
            warn!("channel pair closed before stop; joining worker anyway");
        }

        let deadline = Instant::now() + self.stop_timeout;
        loop {
            let finished = match &self.worker {
                Some(handle) => handle.is_finished(),
                None => return,
            };
            if finished {
                self.reap();
                info!("worker stopped");
                return;
            }
            if Instant::now() >= deadline {
                error!(
                    "worker did not exit within {:?}; abandoning its thread",
                    self.stop_timeout
                );
                self.worker = None;
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Forward a command to the worker's queue. Valid while a worker is
    /// alive; with no worker the command is enqueued and simply never read.
    pub fn send(&self, command: Command) {
        if self.worker.is_none() {
            debug!("send with no worker recorded; command will go unread");
        }
        if let Err(err) = self.channels.send_command(command) {
            error!("dropping command: {err}");
        }
    }

    /// Send every command carried by a wire frame, in application order.
    pub fn send_frame(&self, frame: &CommandFrame) {
        for command in frame.commands() {
            self.send(command);
        }
    }

    /// Non-blocking drain of one telemetry message. `None` means "nothing
    /// right now" (the steady-state case) or a discarded queue.
    pub fn receive(&self) -> Option<TelemetryMessage> {
        self.channels.try_receive_telemetry()
    }

    /// A detached poll handle for the foreground poller: each call drains at
    /// most one telemetry message and never blocks. Stays safe to call after
    /// `close`, yielding `None` forever once the queue is gone.
    pub fn telemetry_source(&self) -> impl FnMut() -> Option<TelemetryMessage> + Send + 'static + use<> {
        let receiver = self.channels.telemetry_receiver();
        move || receiver.as_ref().and_then(|rx| rx.try_recv().ok())
    }

    /// Stop the worker and release both queues. Idempotent; safe to call
    /// from a window-close handler.
    pub fn close(&mut self) {
        self.stop();
        self.channels.close();
    }

    /// Whether a worker is currently alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Join a finished worker and clear the handle.
    fn reap(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Supervisor with a fast worker tick so tests stay well under a second.
    fn fast_supervisor() -> Supervisor {
        let config = AppConfig {
            worker_poll_interval_ms: 10,
            stop_timeout_ms: 2000,
            ..AppConfig::default()
        };
        Supervisor::with_config(&config)
    }

    /// Poll until `receive()` yields a message or the deadline passes.
    fn wait_for_telemetry(supervisor: &Supervisor, timeout: Duration) -> Option<TelemetryMessage> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Some(message) = supervisor.receive() {
                return Some(message);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn start_twice_leaves_one_live_worker() {
        let mut supervisor = fast_supervisor();
        supervisor.start();
        supervisor.start();
        assert!(supervisor.is_running());

        // One terminate sentinel suffices: if a second worker had been
        // spawned it would survive the stop and keep emitting telemetry.
        supervisor.send(Command::SetVerbosity(true));
        assert!(wait_for_telemetry(&supervisor, Duration::from_millis(500)).is_some());
        supervisor.stop();
        assert!(!supervisor.is_running());

        while supervisor.receive().is_some() {}
        thread::sleep(Duration::from_millis(50));
        assert_eq!(supervisor.receive(), None);
    }

    #[test]
    fn stop_twice_is_a_noop() {
        let mut supervisor = fast_supervisor();
        supervisor.start();
        supervisor.stop();
        supervisor.stop();
        assert!(!supervisor.is_running());
    }

    #[test]
    fn stop_without_start_is_a_noop() {
        let mut supervisor = fast_supervisor();
        supervisor.stop();
        assert!(!supervisor.is_running());
    }

    #[test]
    fn stop_after_worker_exited_on_its_own() {
        let mut supervisor = fast_supervisor();
        supervisor.start();
        // The worker terminates itself; stop() must still settle cleanly.
        supervisor.send(Command::Terminate);
        thread::sleep(Duration::from_millis(100));
        supervisor.stop();
        assert!(!supervisor.is_running());
    }

    #[test]
    fn close_discards_telemetry_and_worker() {
        let mut supervisor = fast_supervisor();
        supervisor.start();
        supervisor.send(Command::SetVerbosity(true));
        assert!(wait_for_telemetry(&supervisor, Duration::from_millis(500)).is_some());

        supervisor.close();
        assert!(!supervisor.is_running());
        assert_eq!(supervisor.receive(), None);

        // Idempotent, and a start afterwards is a logged no-op.
        supervisor.close();
        supervisor.start();
        assert!(!supervisor.is_running());
    }

    #[test]
    fn send_after_stop_is_harmless_and_unread_after_restart() {
        let mut supervisor = fast_supervisor();
        supervisor.start();
        supervisor.stop();

        supervisor.send(Command::SetVerbosity(true));
        supervisor.start();
        assert!(supervisor.is_running());

        // The fresh worker must not have consumed the stale verbosity flip.
        assert_eq!(wait_for_telemetry(&supervisor, Duration::from_millis(100)), None);
        supervisor.stop();
    }

    #[test]
    fn frequency_round_trip_never_faults() {
        for freq in [0.5, 1.0, 3.0, 10.0] {
            let mut supervisor = fast_supervisor();
            supervisor.start();
            supervisor.send(Command::SetFrequency(freq));
            supervisor.stop();
            assert!(!supervisor.is_running());
        }
    }

    #[test]
    fn reference_scenario_with_restart() {
        let mut supervisor = fast_supervisor();
        supervisor.start();
        supervisor.send_frame(&CommandFrame {
            freq: Some(3.0),
            verbose: Some(true),
            exit: false,
        });

        let message = wait_for_telemetry(&supervisor, Duration::from_millis(500))
            .expect("verbose worker should report within a few ticks");
        let text = message.to_string();
        let seconds = text
            .strip_prefix("multiprocess time: ")
            .expect("telemetry prefix");
        let (whole, frac) = seconds.split_once('.').expect("decimal point");
        assert!(!whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(frac.len(), 3);
        assert!(frac.chars().all(|c| c.is_ascii_digit()));

        supervisor.send_frame(&CommandFrame::exit());
        let stop_started = Instant::now();
        supervisor.stop();
        assert!(stop_started.elapsed() < Duration::from_secs(2));

        supervisor.start();
        assert!(supervisor.is_running());
        supervisor.close();
    }
}
