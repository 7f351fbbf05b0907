//! Worker poll loop applying commands and driving the renderer.
//!
//! High-level flow each tick:
//! 1) Sleep for the poll interval.
//! 2) Drain ALL currently-available commands in FIFO order. Intervening
//!    ticks may coalesce several rapid controller updates into one batch;
//!    only the latest frequency of a batch is rendered (last-writer-wins).
//! 3) A terminate command stops the batch immediately and ends the loop.
//! 4) Render once if any frequency was seen, then emit one telemetry
//!    message if verbosity is on.
//!
//! An empty command queue is the normal "no new command" case. A
//! disconnected command queue means the controller side is gone for good;
//! the worker treats that as a termination, never as a fault.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info, warn};

use crate::protocol::{Command, TelemetryMessage};

use super::renderer::WaveRenderer;

/// Tunables for the worker loop. The defaults match the reference cadence;
/// tests shorten the poll interval to keep wall-clock time down.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    pub initial_frequency: f64,
    pub initial_verbose: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            initial_frequency: 1.0,
            initial_verbose: false,
        }
    }
}

/// Lifecycle of the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Created, before the first tick.
    Idle,
    /// Ticking and applying commands.
    Running,
    /// Terminate observed (or channel gone); releasing resources.
    Draining,
    /// Loop exited.
    Terminated,
}

/// State owned exclusively by the worker thread. Created fresh at spawn,
/// dropped at exit; nothing here survives a stop/start cycle or is ever
/// reachable from the controller.
#[derive(Debug)]
pub(crate) struct WorkerState {
    pub(crate) frequency: f64,
    pub(crate) verbose: bool,
    pub(crate) phase: Phase,
    started_at: Instant,
}

impl WorkerState {
    fn new(settings: &WorkerSettings) -> Self {
        Self {
            frequency: settings.initial_frequency,
            verbose: settings.initial_verbose,
            phase: Phase::Idle,
            started_at: Instant::now(),
        }
    }

    fn elapsed(&self) -> TelemetryMessage {
        TelemetryMessage::new(self.started_at.elapsed().as_secs_f64())
    }
}

/// Entry point for a worker bound to a channel pair, with the reference
/// cadence. Owns its lifetime; returns once a terminate command is dequeued.
pub fn worker_task(commands: Receiver<Command>, telemetry: Sender<TelemetryMessage>) {
    run(commands, telemetry, WorkerSettings::default());
}

/// Same as [`worker_task`] with explicit settings.
pub fn run(commands: Receiver<Command>, telemetry: Sender<TelemetryMessage>, settings: WorkerSettings) {
    let _ = run_loop(commands, telemetry, settings);
}

pub(crate) fn run_loop(
    commands: Receiver<Command>,
    telemetry: Sender<TelemetryMessage>,
    settings: WorkerSettings,
) -> WorkerState {
    info!("worker starting");
    let mut renderer = WaveRenderer::new();
    let mut state = WorkerState::new(&settings);

    state.phase = Phase::Running;
    while state.phase == Phase::Running {
        thread::sleep(settings.poll_interval);

        let latest_frequency = drain_commands(&commands, &mut state);
        if state.phase != Phase::Running {
            // Draining: remaining batch commands stay unread.
            break;
        }

        if let Some(frequency) = latest_frequency {
            renderer.refresh(frequency);
        }
        if state.verbose && telemetry.send(state.elapsed()).is_err() {
            debug!("telemetry consumer gone; message dropped");
        }
    }

    renderer.release();
    state.phase = Phase::Terminated;
    info!("worker terminated");
    state
}

/// Drain every command currently queued, applying each in FIFO order.
///
/// Returns the latest valid frequency seen in the batch, if any; earlier
/// values are superseded. A terminate command (or a disconnected queue)
/// moves the state to [`Phase::Draining`] and stops the batch on the spot.
fn drain_commands(commands: &Receiver<Command>, state: &mut WorkerState) -> Option<f64> {
    let mut latest_frequency = None;
    loop {
        match commands.try_recv() {
            Ok(Command::SetFrequency(frequency)) => {
                if frequency.is_finite() && frequency > 0.0 {
                    latest_frequency = Some(frequency);
                    state.frequency = frequency;
                } else {
                    warn!("ignoring non-positive frequency {frequency}");
                }
            }
            Ok(Command::SetVerbosity(verbose)) => {
                state.verbose = verbose;
            }
            Ok(Command::Terminate) => {
                state.phase = Phase::Draining;
                return latest_frequency;
            }
            Err(TryRecvError::Empty) => return latest_frequency,
            Err(TryRecvError::Disconnected) => {
                warn!("command queue closed; worker terminating");
                state.phase = Phase::Draining;
                return latest_frequency;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn fresh_state() -> WorkerState {
        WorkerState::new(&WorkerSettings::default())
    }

    fn fast_settings() -> WorkerSettings {
        WorkerSettings {
            poll_interval: Duration::from_millis(10),
            ..WorkerSettings::default()
        }
    }

    #[test]
    fn state_starts_idle_with_defaults() {
        let state = fresh_state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.frequency, 1.0);
        assert!(!state.verbose);
    }

    #[test]
    fn drain_applies_batch_in_fifo_order() {
        let (tx, rx) = unbounded();
        tx.send(Command::SetFrequency(2.0)).unwrap();
        tx.send(Command::SetVerbosity(true)).unwrap();
        tx.send(Command::SetFrequency(4.0)).unwrap();

        let mut state = fresh_state();
        let latest = drain_commands(&rx, &mut state);

        assert_eq!(latest, Some(4.0));
        assert_eq!(state.frequency, 4.0);
        assert!(state.verbose);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn last_writer_wins_within_one_batch() {
        let (tx, rx) = unbounded();
        tx.send(Command::SetFrequency(2.0)).unwrap();
        tx.send(Command::SetFrequency(5.0)).unwrap();

        let mut state = fresh_state();
        assert_eq!(drain_commands(&rx, &mut state), Some(5.0));
    }

    #[test]
    fn terminate_stops_the_batch_immediately() {
        let (tx, rx) = unbounded();
        tx.send(Command::SetFrequency(2.0)).unwrap();
        tx.send(Command::Terminate).unwrap();
        tx.send(Command::SetFrequency(9.0)).unwrap();

        let mut state = fresh_state();
        drain_commands(&rx, &mut state);

        assert_eq!(state.phase, Phase::Draining);
        assert_eq!(state.frequency, 2.0);
        // The command after the sentinel is left unread.
        assert_eq!(rx.try_recv(), Ok(Command::SetFrequency(9.0)));
    }

    #[test]
    fn non_positive_frequencies_are_ignored() {
        let (tx, rx) = unbounded();
        tx.send(Command::SetFrequency(-1.0)).unwrap();
        tx.send(Command::SetFrequency(0.0)).unwrap();
        tx.send(Command::SetFrequency(f64::NAN)).unwrap();

        let mut state = fresh_state();
        assert_eq!(drain_commands(&rx, &mut state), None);
        assert_eq!(state.frequency, 1.0);
    }

    #[test]
    fn disconnected_queue_moves_to_draining() {
        let (tx, rx) = unbounded::<Command>();
        drop(tx);

        let mut state = fresh_state();
        drain_commands(&rx, &mut state);
        assert_eq!(state.phase, Phase::Draining);
    }

    #[test]
    fn quiet_worker_emits_no_telemetry() {
        let (command_tx, command_rx) = unbounded();
        let (telemetry_tx, telemetry_rx) = unbounded();

        let worker = thread::spawn(move || run_loop(command_rx, telemetry_tx, fast_settings()));
        thread::sleep(Duration::from_millis(100));
        command_tx.send(Command::Terminate).unwrap();
        let state = worker.join().unwrap();

        assert_eq!(state.phase, Phase::Terminated);
        assert_eq!(telemetry_rx.try_iter().count(), 0);
    }

    #[test]
    fn verbose_worker_emits_one_message_per_tick() {
        let (command_tx, command_rx) = unbounded();
        let (telemetry_tx, telemetry_rx) = unbounded();

        let worker = thread::spawn(move || run_loop(command_rx, telemetry_tx, fast_settings()));
        command_tx.send(Command::SetVerbosity(true)).unwrap();
        thread::sleep(Duration::from_millis(150));
        command_tx.send(Command::Terminate).unwrap();
        worker.join().unwrap();

        // ~15 ticks elapsed at 10ms; allow generous scheduling slack but
        // require both a lower bound and the one-per-tick upper bound.
        let emitted = telemetry_rx.try_iter().count();
        assert!(emitted >= 3, "expected several telemetry messages, got {emitted}");
        assert!(emitted <= 20, "more than one message per tick: {emitted}");
    }

    #[test]
    fn telemetry_reports_monotonic_elapsed_time() {
        let (command_tx, command_rx) = unbounded();
        let (telemetry_tx, telemetry_rx) = unbounded();

        let worker = thread::spawn(move || run_loop(command_rx, telemetry_tx, fast_settings()));
        command_tx.send(Command::SetVerbosity(true)).unwrap();
        thread::sleep(Duration::from_millis(100));
        command_tx.send(Command::Terminate).unwrap();
        worker.join().unwrap();

        let reports: Vec<f64> = telemetry_rx.try_iter().map(|m| m.elapsed_seconds).collect();
        assert!(reports.len() >= 2);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert!(reports.iter().all(|&t| t >= 0.0));
    }

    #[test]
    fn worker_exits_cleanly_when_controller_disappears() {
        let (command_tx, command_rx) = unbounded::<Command>();
        let (telemetry_tx, _telemetry_rx) = unbounded();

        let worker = thread::spawn(move || run_loop(command_rx, telemetry_tx, fast_settings()));
        drop(command_tx);
        let state = worker.join().unwrap();
        assert_eq!(state.phase, Phase::Terminated);
    }
}
