//! Passive waveform renderer driven by the worker loop.
//!
//! Stands in for a plotting backend: a refresh recomputes one cycle worth of
//! sine samples for the requested frequency and logs it. The renderer owns
//! no window and runs synchronously on the worker thread.

use log::{debug, info};

/// Number of sample points per refresh, spanning x in [0, 1].
pub const SAMPLE_POINTS: usize = 1000;

pub struct WaveRenderer {
    samples: Vec<f64>,
    last_frequency: Option<f64>,
}

impl WaveRenderer {
    pub fn new() -> Self {
        Self {
            samples: Vec::with_capacity(SAMPLE_POINTS),
            last_frequency: None,
        }
    }

    /// Recompute the sample buffer as `sin(2*pi*x*frequency)` over [0, 1].
    pub fn refresh(&mut self, frequency: f64) {
        self.samples.clear();
        self.samples.extend((0..SAMPLE_POINTS).map(|i| {
            let x = i as f64 / (SAMPLE_POINTS - 1) as f64;
            (2.0 * std::f64::consts::PI * x * frequency).sin()
        }));
        self.last_frequency = Some(frequency);
        debug!("rendered waveform at frequency {frequency}");
    }

    /// The frequency shown by the most recent refresh, if any.
    pub fn last_frequency(&self) -> Option<f64> {
        self.last_frequency
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Release rendering resources on worker shutdown.
    pub fn release(&mut self) {
        self.samples = Vec::new();
        self.last_frequency = None;
        info!("renderer released");
    }
}

impl Default for WaveRenderer {
    fn default() -> Self {
        Self::new()
    }
}
