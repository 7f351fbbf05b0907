//! Headless demo driving a background waveform worker over the protocol.
//!
//! Mirrors the flow a GUI would produce: start the worker, push the initial
//! frequency and verbosity, drain telemetry through the foreground poller,
//! sweep the frequency as a slider drag would, cycle the worker once, then
//! shut everything down from a single close handler.

use std::env;
use std::path::Path;
use std::thread;
use std::time::Duration;

use env_logger::Builder;
use log::{LevelFilter, info};

use waveform_worker::control::{AppConfig, Supervisor, TelemetryPoller};
use waveform_worker::protocol::{Command, CommandFrame};

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("waveform_worker"), LevelFilter::Debug)
        .init();

    info!("Starting up");

    let config = match env::args().nth(1) {
        Some(path) => AppConfig::load(Path::new(&path))?,
        None => AppConfig::default(),
    };

    let mut supervisor = Supervisor::with_config(&config);
    supervisor.start();

    // The controller pushes its current knob state right after spawning.
    supervisor.send_frame(&CommandFrame {
        freq: Some(config.initial_frequency),
        verbose: Some(config.initial_verbose),
        exit: false,
    });

    let poller = TelemetryPoller::spawn(
        config.poller_interval(),
        supervisor.telemetry_source(),
        |message| info!("{message}"),
    );

    supervisor.send(Command::SetVerbosity(true));
    for freq in [2.0, 3.0, 5.0, 8.0] {
        supervisor.send(Command::SetFrequency(freq));
        thread::sleep(Duration::from_millis(600));
    }
    supervisor.send(Command::SetVerbosity(false));
    thread::sleep(Duration::from_millis(400));

    // Stop/start cycle: the second worker begins with fresh state.
    supervisor.stop();
    supervisor.start();
    supervisor.send(Command::SetFrequency(4.0));
    thread::sleep(Duration::from_millis(400));

    poller.stop();
    supervisor.close();

    info!("Shutting down");
    Ok(())
}
