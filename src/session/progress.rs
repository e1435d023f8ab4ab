// Session progress events and per-frequency results

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Progress update published while a session runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionProgress {
    /// A new frequency is about to be tested
    FrequencyStarted {
        freq: f64,
        /// 1-based position in the frequency list
        index: usize,
        total: usize,
        /// Share of frequencies started so far (0-100)
        percent: f64,
    },
    /// One trial was answered and logged
    TrialCompleted {
        freq: f64,
        trial: usize,
        stair_level: f64,
        desired_level_db: f64,
        correct: bool,
        reversal: bool,
    },
    /// The staircase for a frequency stopped
    FrequencyFinished(FrequencySummary),
    /// Every frequency has been tested
    SessionFinished { frequencies: usize },
}

/// Outcome of one staircase run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencySummary {
    pub freq: f64,
    pub trials: usize,
    /// Staircase levels at each reversal
    pub reversal_levels: Vec<f64>,
    /// Mean of the reversal levels (staircase units)
    pub threshold: Option<f64>,
}

/// Outcome of a whole session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub subject: String,
    pub condition: String,
    pub log_path: PathBuf,
    pub frequencies: Vec<FrequencySummary>,
}

impl SessionSummary {
    pub fn total_trials(&self) -> usize {
        self.frequencies.iter().map(|f| f.trials).sum()
    }
}
