// Trial timing
//
// Each 2IAFC trial is paced as:
//   pre-trial pause 0.5 s
//   interval 1      duration + 0.15 s
//   inter-stimulus  0.5 s
//   interval 2      duration + 0.15 s

use std::time::Duration;

/// Pause before the first interval of every trial (seconds)
pub const PRE_TRIAL_PAUSE_SECS: f64 = 0.5;

/// Silence between the two intervals (seconds)
pub const INTER_STIMULUS_SECS: f64 = 0.5;

/// Added to the stimulus duration to form one interval (seconds)
pub const INTERVAL_PADDING_SECS: f64 = 0.15;

/// Trait representing a blocking clock used between trial phases.
pub trait Pacer {
    fn pause(&mut self, secs: f64);
}

/// Sleeps the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, secs: f64) {
        if secs > 0.0 && secs.is_finite() {
            std::thread::sleep(Duration::from_secs_f64(secs));
        }
    }
}

/// Returns immediately, accumulating the time that would have elapsed
#[derive(Debug, Default, Clone)]
pub struct NoopPacer {
    pauses: Vec<f64>,
}

impl NoopPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested pause, in order
    pub fn pauses(&self) -> &[f64] {
        &self.pauses
    }

    /// Total time a real session would have waited
    pub fn elapsed_secs(&self) -> f64 {
        self.pauses.iter().sum()
    }
}

impl Pacer for NoopPacer {
    fn pause(&mut self, secs: f64) {
        self.pauses.push(secs);
    }
}
