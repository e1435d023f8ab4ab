// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 3001-3005
pub struct AudioErrorCodes;

impl AudioErrorCodes {
    /// Speaker routing does not match the signal's channel count
    pub const INVALID_ROUTING: i32 = 3001;

    /// Applied level pushes samples past full scale
    pub const CLIPPING: i32 = 3002;

    /// Output device rejected or unavailable
    pub const INVALID_DEVICE: i32 = 3003;

    /// WAV file could not be read or written
    pub const WAV_IO: i32 = 3004;

    /// Signal has no samples or no channels
    pub const EMPTY_SIGNAL: i32 = 3005;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=Playback, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Playback preparation and output errors
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Routing must list one speaker per signal channel
    InvalidRouting {
        num_channels: usize,
        routing: Vec<usize>,
    },

    /// Peak magnitude after scaling exceeds 1.0
    Clipping { peak: f32, level_db: f64 },

    /// Output device is not usable
    InvalidDevice { device: String, reason: String },

    /// WAV read/write failure
    WavIo { path: String, reason: String },

    /// Nothing to play
    EmptySignal,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::InvalidRouting { .. } => AudioErrorCodes::INVALID_ROUTING,
            AudioError::Clipping { .. } => AudioErrorCodes::CLIPPING,
            AudioError::InvalidDevice { .. } => AudioErrorCodes::INVALID_DEVICE,
            AudioError::WavIo { .. } => AudioErrorCodes::WAV_IO,
            AudioError::EmptySignal => AudioErrorCodes::EMPTY_SIGNAL,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::InvalidRouting {
                num_channels,
                routing,
            } => format!(
                "Speaker routing {:?} must correspond with the {} channel(s) of the signal",
                routing, num_channels
            ),
            AudioError::Clipping { peak, level_db } => format!(
                "The level ({:.2} dB) is too high and caused clipping (peak {:.3})",
                level_db, peak
            ),
            AudioError::InvalidDevice { device, reason } => {
                format!("Invalid audio device '{}': {}", device, reason)
            }
            AudioError::WavIo { path, reason } => {
                format!("WAV I/O failed for {}: {}", path, reason)
            }
            AudioError::EmptySignal => "Signal contains no samples".to_string(),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::InvalidRouting {
                num_channels: 2,
                routing: vec![1]
            }
            .code(),
            AudioErrorCodes::INVALID_ROUTING
        );
        assert_eq!(
            AudioError::Clipping {
                peak: 1.2,
                level_db: 3.0
            }
            .code(),
            AudioErrorCodes::CLIPPING
        );
        assert_eq!(AudioError::EmptySignal.code(), 3005);
    }

    #[test]
    fn test_invalid_routing_message() {
        let err = AudioError::InvalidRouting {
            num_channels: 3,
            routing: vec![1, 2],
        };
        let msg = err.message();
        assert!(msg.contains("[1, 2]"));
        assert!(msg.contains("3 channel"));
    }
}
