// Stimulus error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Stimulus error code constants
///
/// Error code range: 2001-2005
pub struct StimulusErrorCodes;

impl StimulusErrorCodes {
    /// No RETSPL entry for the requested frequency
    pub const UNSUPPORTED_FREQUENCY: i32 = 2001;

    /// More channels requested than vetted starting phases
    pub const TOO_MANY_CHANNELS: i32 = 2002;

    /// Stimulus duration is not positive or too short for the gate
    pub const INVALID_DURATION: i32 = 2003;

    /// Comma-separated list could not be parsed
    pub const INVALID_LIST: i32 = 2004;

    /// Sampling rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 2005;
}

/// Log a stimulus error with structured context
pub fn log_stimulus_error(err: &StimulusError, context: &str) {
    error!(
        "Stimulus error in {}: code={}, component=StimulusModel, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Stimulus generation and level calculation errors
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusError {
    /// Frequency has no RETSPL reference value
    UnsupportedFrequency { freq: f64 },

    /// Requested channel count exceeds available phases
    TooManyChannels { requested: usize, available: usize },

    /// Duration cannot hold the onset and offset ramps
    InvalidDuration { duration: f64 },

    /// List text could not be parsed
    InvalidList { input: String, reason: String },

    /// Sampling rate must be positive
    InvalidSampleRate { sample_rate: u32 },
}

impl ErrorCode for StimulusError {
    fn code(&self) -> i32 {
        match self {
            StimulusError::UnsupportedFrequency { .. } => StimulusErrorCodes::UNSUPPORTED_FREQUENCY,
            StimulusError::TooManyChannels { .. } => StimulusErrorCodes::TOO_MANY_CHANNELS,
            StimulusError::InvalidDuration { .. } => StimulusErrorCodes::INVALID_DURATION,
            StimulusError::InvalidList { .. } => StimulusErrorCodes::INVALID_LIST,
            StimulusError::InvalidSampleRate { .. } => StimulusErrorCodes::INVALID_SAMPLE_RATE,
        }
    }

    fn message(&self) -> String {
        match self {
            StimulusError::UnsupportedFrequency { freq } => {
                format!("No RETSPL value for {} Hz", freq)
            }
            StimulusError::TooManyChannels {
                requested,
                available,
            } => format!(
                "{} channels requested but only {} starting phases are available",
                requested, available
            ),
            StimulusError::InvalidDuration { duration } => {
                format!("Invalid stimulus duration: {} s", duration)
            }
            StimulusError::InvalidList { input, reason } => {
                format!("Cannot parse '{}': {}", input, reason)
            }
            StimulusError::InvalidSampleRate { sample_rate } => {
                format!("Invalid sampling rate: {} Hz", sample_rate)
            }
        }
    }
}

impl fmt::Display for StimulusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StimulusError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StimulusError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stimulus_error_codes() {
        assert_eq!(
            StimulusError::UnsupportedFrequency { freq: 1100.0 }.code(),
            StimulusErrorCodes::UNSUPPORTED_FREQUENCY
        );
        assert_eq!(
            StimulusError::TooManyChannels {
                requested: 10,
                available: 9
            }
            .code(),
            StimulusErrorCodes::TOO_MANY_CHANNELS
        );
        assert_eq!(
            StimulusError::InvalidDuration { duration: 0.0 }.code(),
            StimulusErrorCodes::INVALID_DURATION
        );
        assert_eq!(
            StimulusError::InvalidSampleRate { sample_rate: 0 }.code(),
            2005
        );
    }

    #[test]
    fn test_unsupported_frequency_message() {
        let err = StimulusError::UnsupportedFrequency { freq: 1100.0 };
        assert_eq!(err.message(), "No RETSPL value for 1100 Hz");
    }
}
