//! Session parameter management
//!
//! Session parameters persist between runs as a JSON file. A missing or
//! malformed file falls back to defaults so a fresh install can start a
//! session immediately.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DataError, SessionError, StimulusError};
use crate::staircase::StaircaseParams;
use crate::stimulus::model::STARTING_PHASES_DEG;
use crate::stimulus::retspl;
use crate::stimulus::warble::STIMULUS_RAMP_SECS;

/// Default session file name, relative to the working directory
pub const DEFAULT_SESSION_FILE: &str = "peat_session.json";

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub subject: String,
    pub condition: String,
    pub stimulus: StimulusConfig,
    pub staircase: StaircaseConfig,
    pub audio: AudioConfig,
    pub calibration: CalibrationConfig,
    /// Directory receiving trial logs
    pub data_dir: PathBuf,
}

/// Stimulus parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusConfig {
    /// Number of sound-field channels driven simultaneously
    pub num_stim_chans: usize,
    /// Test frequencies in presentation order (Hz)
    pub test_freqs: Vec<f64>,
    /// Duration of the stimulus per interval (seconds)
    pub duration: f64,
    pub sample_rate: u32,
    /// Warble modulation rate (Hz)
    pub mod_rate: f64,
    /// Warble modulation depth (percent)
    pub mod_depth: f64,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            num_stim_chans: 1,
            test_freqs: vec![500.0, 1000.0, 2000.0, 4000.0],
            duration: 2.0,
            sample_rate: 48000,
            mod_rate: 5.0,
            mod_depth: 5.0,
        }
    }
}

/// Staircase parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseConfig {
    pub starting_level: f64,
    pub min_level: f64,
    pub max_level: f64,
    pub step_sizes: Vec<f64>,
    pub num_reversals: usize,
    pub rapid_descend: bool,
}

impl Default for StaircaseConfig {
    fn default() -> Self {
        Self {
            starting_level: 30.0,
            min_level: -50.0,
            max_level: 90.0,
            step_sizes: vec![10.0, 5.0, 2.0],
            num_reversals: 5,
            rapid_descend: true,
        }
    }
}

/// Output routing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device identifier
    pub audio_device: String,
    /// 1-based speaker numbers, one per stimulus channel
    pub channel_routing: Vec<usize>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            audio_device: "default".to_string(),
            channel_routing: vec![1],
        }
    }
}

/// Sound level meter calibration state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// dB FS level at which the calibration tone is played
    pub cal_level_db: f64,
    /// SLM reading (dB SPL) for the calibration tone
    pub slm_reading: f64,
    /// slm_reading - cal_level_db
    pub slm_offset: f64,
    /// Last desired SPL
    pub desired_level_db: f64,
    /// Last dB FS level sent to the output
    pub adjusted_level_db: f64,
    /// Custom calibration WAV; the built-in warble is used when absent
    pub cal_file: Option<PathBuf>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            cal_level_db: -30.0,
            slm_reading: 70.0,
            slm_offset: 100.0,
            desired_level_db: 75.0,
            adjusted_level_db: -25.0,
            cal_file: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            subject: "999".to_string(),
            condition: "test".to_string(),
            stimulus: StimulusConfig::default(),
            staircase: StaircaseConfig::default(),
            audio: AudioConfig::default(),
            calibration: CalibrationConfig::default(),
            data_dir: PathBuf::from("Data"),
        }
    }
}

impl SessionConfig {
    /// Load configuration from JSON file
    ///
    /// # Returns
    /// The parsed configuration, or defaults when the file is missing or
    /// its JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded session parameters from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read session file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from the default session file in the working directory
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_SESSION_FILE)
    }

    /// Persist as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DataError> {
        let json = serde_json::to_string_pretty(self).map_err(|err| DataError::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        })?;
        fs::write(&path, json).map_err(|err| DataError::io(&path, err))?;
        log::info!("[Config] Saved session parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Staircase parameters for one threshold search (1-up/2-down)
    pub fn staircase_params(&self) -> StaircaseParams {
        StaircaseParams {
            start_level: self.staircase.starting_level,
            step_sizes: self.staircase.step_sizes.clone(),
            n_up: 1,
            n_down: 2,
            n_trials: 0,
            n_reversals: self.staircase.num_reversals,
            rapid_descend: self.staircase.rapid_descend,
            min_level: self.staircase.min_level,
            max_level: self.staircase.max_level,
        }
    }

    /// Check every cross-field invariant before a session starts
    pub fn validate(&self) -> Result<(), SessionError> {
        self.staircase_params().validate()?;

        let stim = &self.stimulus;
        if stim.num_stim_chans == 0 || stim.num_stim_chans > STARTING_PHASES_DEG.len() {
            return Err(StimulusError::TooManyChannels {
                requested: stim.num_stim_chans,
                available: STARTING_PHASES_DEG.len(),
            }
            .into());
        }
        if stim.test_freqs.is_empty() {
            return Err(SessionError::Config {
                reason: "no test frequencies".to_string(),
            });
        }
        if let Some(freq) = stim.test_freqs.iter().find(|f| !retspl::is_supported(**f)) {
            return Err(StimulusError::UnsupportedFrequency { freq: *freq }.into());
        }
        // both gate ramps must fit inside the stimulus
        if !stim.duration.is_finite() || stim.duration < 2.0 * STIMULUS_RAMP_SECS {
            return Err(StimulusError::InvalidDuration {
                duration: stim.duration,
            }
            .into());
        }
        if self.subject.trim().is_empty() || self.condition.trim().is_empty() {
            return Err(SessionError::Config {
                reason: "subject and condition are required".to_string(),
            });
        }
        // labels end up in file names and single-line CSV rows
        for (field, value) in [("subject", &self.subject), ("condition", &self.condition)] {
            if value.chars().any(char::is_control) {
                return Err(SessionError::Config {
                    reason: format!("{} {:?} contains control characters", field, value),
                });
            }
        }
        Ok(())
    }

    /// Step sizes rendered the way trial logs store them ("10, 5, 2")
    pub fn step_sizes_label(&self) -> String {
        self.staircase
            .step_sizes
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
