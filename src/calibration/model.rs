// CalibrationModel - sound level meter offset and dB FS level arithmetic
//
// The calibration tone is played at `cal_level_db` (dB FS) and measured
// with a sound level meter. The difference between the reading and the
// playback level is the offset that maps a desired SPL onto the dB FS
// gain handed to the output.

use std::path::{Path, PathBuf};

use crate::audio::{prepare, read_wav, write_wav, OutputSink, PreparedAudio, Signal};
use crate::config::CalibrationConfig;
use crate::error::{log_audio_error, AudioError, StimulusError};
use crate::stimulus::warble::{gate, set_rms, warble_tone, STIMULUS_RAMP_SECS, STIMULUS_RMS_DB};

/// Calibration tone carrier frequency (Hz)
pub const CAL_TONE_FREQ: f64 = 1000.0;

/// Default calibration tone length (seconds)
pub const CAL_TONE_SECS: f64 = 2.0;

/// Offset between a meter reading and the dB FS level it was produced by
pub fn calc_offset(slm_reading: f64, cal_level_db: f64) -> f64 {
    slm_reading - cal_level_db
}

/// dB FS level producing `desired_level_db` SPL given an offset
pub fn calc_level(desired_level_db: f64, slm_offset: f64) -> f64 {
    desired_level_db - slm_offset
}

/// Calibration state for one session
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationModel {
    cal_level_db: f64,
    slm_reading: f64,
    slm_offset: f64,
    desired_level_db: f64,
    adjusted_level_db: f64,
    cal_file: Option<PathBuf>,
}

impl CalibrationModel {
    /// Restore calibration state from saved session parameters
    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self {
            cal_level_db: config.cal_level_db,
            slm_reading: config.slm_reading,
            slm_offset: config.slm_offset,
            desired_level_db: config.desired_level_db,
            adjusted_level_db: config.adjusted_level_db,
            cal_file: config.cal_file.clone(),
        }
    }

    /// Write the current state back into session parameters
    pub fn apply_to(&self, config: &mut CalibrationConfig) {
        config.cal_level_db = self.cal_level_db;
        config.slm_reading = self.slm_reading;
        config.slm_offset = self.slm_offset;
        config.desired_level_db = self.desired_level_db;
        config.adjusted_level_db = self.adjusted_level_db;
        config.cal_file = self.cal_file.clone();
    }

    pub fn cal_level_db(&self) -> f64 {
        self.cal_level_db
    }

    pub fn slm_reading(&self) -> f64 {
        self.slm_reading
    }

    pub fn slm_offset(&self) -> f64 {
        self.slm_offset
    }

    pub fn desired_level_db(&self) -> f64 {
        self.desired_level_db
    }

    pub fn adjusted_level_db(&self) -> f64 {
        self.adjusted_level_db
    }

    /// Record a meter reading taken while the tone played at `cal_level_db`
    ///
    /// # Returns
    /// The new SLM offset
    pub fn record_reading(&mut self, slm_reading: f64, cal_level_db: f64) -> f64 {
        self.slm_reading = slm_reading;
        self.cal_level_db = cal_level_db;
        self.slm_offset = calc_offset(slm_reading, cal_level_db);
        log::info!(
            "[Calibration] SLM reading {:.2} dB at {:.2} dB FS -> offset {:.2}",
            slm_reading,
            cal_level_db,
            self.slm_offset
        );
        self.slm_offset
    }

    /// Convert a desired SPL to the dB FS level to present
    ///
    /// Both the desired and adjusted levels are remembered so each trial
    /// log row reflects the level actually sent to the output.
    pub fn level_for(&mut self, desired_level_db: f64) -> f64 {
        self.desired_level_db = desired_level_db;
        self.adjusted_level_db = calc_level(desired_level_db, self.slm_offset);
        log::debug!(
            "[Calibration] desired {:.2} dB SPL -> {:.2} dB FS",
            desired_level_db,
            self.adjusted_level_db
        );
        self.adjusted_level_db
    }

    /// Use a custom WAV file instead of the built-in warble
    pub fn set_cal_file(&mut self, path: Option<PathBuf>) {
        self.cal_file = path;
    }

    pub fn cal_file(&self) -> Option<&Path> {
        self.cal_file.as_deref()
    }

    /// Signal to present during calibration
    ///
    /// A custom file takes precedence; otherwise the built-in 1 kHz warble
    /// is synthesised.
    pub fn calibration_signal(&self, sample_rate: u32) -> Result<Signal, AudioError> {
        match &self.cal_file {
            Some(path) => read_wav(path),
            None => calibration_tone(CAL_TONE_SECS, sample_rate).map_err(|err| {
                AudioError::InvalidDevice {
                    device: "calibration tone".to_string(),
                    reason: err.to_string(),
                }
            }),
        }
    }

    /// Play the calibration signal at `cal_level_db` through `routing`
    ///
    /// The routing needs one speaker per channel of the calibration
    /// signal, so the built-in mono tone takes a single speaker.
    pub fn present<S: OutputSink + ?Sized>(
        &self,
        sink: &mut S,
        sample_rate: u32,
        routing: &[usize],
    ) -> Result<PreparedAudio, AudioError> {
        let signal = self
            .calibration_signal(sample_rate)
            .inspect_err(|err| log_audio_error(err, "CalibrationModel::present"))?;
        let prepared = prepare(&signal, self.cal_level_db, routing, sink.max_output_channels())?;

        log::info!(
            "[Calibration] Presenting {} at {:.2} dB FS on speaker(s) {:?}",
            self.cal_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in 1 kHz warble".to_string()),
            self.cal_level_db,
            prepared.routing
        );
        sink.play(&prepared)?;
        sink.stop()?;
        Ok(prepared)
    }
}

/// Mono 1 kHz warble tone gated with 40 ms ramps at -40 dB FS RMS
pub fn calibration_tone(duration: f64, sample_rate: u32) -> Result<Signal, StimulusError> {
    let tone = warble_tone(duration, sample_rate, CAL_TONE_FREQ, 0.0, 5.0, 5.0)?;
    let gated = gate(&tone, STIMULUS_RAMP_SECS, sample_rate)?;
    let scaled = set_rms(&gated, STIMULUS_RMS_DB);
    let samples: Vec<f32> = scaled.iter().map(|&s| s as f32).collect();

    Signal::from_interleaved(samples, 1, sample_rate).map_err(|_| StimulusError::InvalidDuration {
        duration,
    })
}

/// Write the built-in calibration tone to a WAV file
pub fn write_calibration_tone(
    path: &Path,
    duration: f64,
    sample_rate: u32,
) -> Result<Signal, AudioError> {
    let signal = calibration_tone(duration, sample_rate).map_err(|err| AudioError::WavIo {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    write_wav(path, &signal)?;
    log::info!(
        "[Calibration] Wrote {:.1} s calibration tone to {}",
        duration,
        path.display()
    );
    Ok(signal)
}
