// TrialRecord - one row of the trial log

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::staircase::{DataPoint, Response};

/// Column names, in file order
pub const TRIAL_LOG_HEADER: [&str; 18] = [
    "trial",
    "subject",
    "condition",
    "min_level",
    "max_level",
    "duration",
    "step_sizes",
    "num_reversals",
    "rapid_descend",
    "slm_reading",
    "cal_level_dB",
    "slm_offset",
    "adjusted_level_dB",
    "desired_level_dB",
    "test_freq",
    "staircase_level",
    "response",
    "reversal",
];

/// Snapshot of the session state after one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial: usize,
    pub subject: String,
    pub condition: String,
    pub min_level: f64,
    pub max_level: f64,
    pub duration: f64,
    pub step_sizes: String,
    pub num_reversals: usize,
    pub rapid_descend: bool,
    pub slm_reading: f64,
    pub cal_level_db: f64,
    pub slm_offset: f64,
    pub adjusted_level_db: f64,
    pub desired_level_db: f64,
    pub test_freq: f64,
    pub staircase_level: f64,
    pub response: Response,
    pub reversal: bool,
}

impl TrialRecord {
    /// Combine session parameters with the staircase's latest data point
    ///
    /// `session_trial` counts trials across every frequency of the session;
    /// the data point's own trial number restarts with each staircase.
    pub fn from_session(
        config: &SessionConfig,
        session_trial: usize,
        test_freq: f64,
        point: &DataPoint,
    ) -> Self {
        Self {
            trial: session_trial,
            subject: config.subject.clone(),
            condition: config.condition.clone(),
            min_level: config.staircase.min_level,
            max_level: config.staircase.max_level,
            duration: config.stimulus.duration,
            step_sizes: config.step_sizes_label(),
            num_reversals: config.staircase.num_reversals,
            rapid_descend: config.staircase.rapid_descend,
            slm_reading: config.calibration.slm_reading,
            cal_level_db: config.calibration.cal_level_db,
            slm_offset: config.calibration.slm_offset,
            adjusted_level_db: config.calibration.adjusted_level_db,
            desired_level_db: config.calibration.desired_level_db,
            test_freq,
            staircase_level: point.level,
            response: point.response,
            reversal: point.reversal,
        }
    }

    /// Field values in [TRIAL_LOG_HEADER] order
    pub fn to_fields(&self) -> Vec<String> {
        vec![
            self.trial.to_string(),
            self.subject.clone(),
            self.condition.clone(),
            self.min_level.to_string(),
            self.max_level.to_string(),
            self.duration.to_string(),
            self.step_sizes.clone(),
            self.num_reversals.to_string(),
            self.rapid_descend.to_string(),
            self.slm_reading.to_string(),
            self.cal_level_db.to_string(),
            self.slm_offset.to_string(),
            self.adjusted_level_db.to_string(),
            self.desired_level_db.to_string(),
            self.test_freq.to_string(),
            self.staircase_level.to_string(),
            self.response.as_score().to_string(),
            self.reversal.to_string(),
        ]
    }
}
