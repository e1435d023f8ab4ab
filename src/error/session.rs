// Session-level error aggregating the domain errors raised during a run

use crate::error::{AudioError, DataError, ErrorCode, StaircaseError, StimulusError};
use std::fmt;

/// Errors surfaced by the session runner
///
/// Domain errors keep their own codes; session-only failures use 5001-5002.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Staircase(StaircaseError),
    Stimulus(StimulusError),
    Audio(AudioError),
    Data(DataError),

    /// Response source failed or produced an unusable answer
    Response { reason: String },

    /// Session parameters rejected before the run started
    Config { reason: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::Staircase(err) => err.code(),
            SessionError::Stimulus(err) => err.code(),
            SessionError::Audio(err) => err.code(),
            SessionError::Data(err) => err.code(),
            SessionError::Response { .. } => 5001,
            SessionError::Config { .. } => 5002,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::Staircase(err) => err.message(),
            SessionError::Stimulus(err) => err.message(),
            SessionError::Audio(err) => err.message(),
            SessionError::Data(err) => err.message(),
            SessionError::Response { reason } => format!("Response failed: {}", reason),
            SessionError::Config { reason } => format!("Invalid session parameters: {}", reason),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Staircase(err) => write!(f, "{}", err),
            SessionError::Stimulus(err) => write!(f, "{}", err),
            SessionError::Audio(err) => write!(f, "{}", err),
            SessionError::Data(err) => write!(f, "{}", err),
            _ => write!(
                f,
                "SessionError::{:?} (code {}): {}",
                self,
                self.code(),
                self.message()
            ),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Staircase(err) => Some(err),
            SessionError::Stimulus(err) => Some(err),
            SessionError::Audio(err) => Some(err),
            SessionError::Data(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StaircaseError> for SessionError {
    fn from(err: StaircaseError) -> Self {
        SessionError::Staircase(err)
    }
}

impl From<StimulusError> for SessionError {
    fn from(err: StimulusError) -> Self {
        SessionError::Stimulus(err)
    }
}

impl From<AudioError> for SessionError {
    fn from(err: AudioError) -> Self {
        SessionError::Audio(err)
    }
}

impl From<DataError> for SessionError {
    fn from(err: DataError) -> Self {
        SessionError::Data(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_codes() {
        let err: SessionError = StimulusError::UnsupportedFrequency { freq: 1100.0 }.into();
        assert_eq!(err.code(), 2001);

        let err: SessionError = AudioError::EmptySignal.into();
        assert_eq!(err.code(), 3005);
    }

    #[test]
    fn test_session_only_codes() {
        let err = SessionError::Response {
            reason: "stdin closed".to_string(),
        };
        assert_eq!(err.code(), 5001);
        assert!(err.to_string().contains("stdin closed"));
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), StaircaseError> {
            Err(StaircaseError::InvalidStepSizes {
                reason: "empty".to_string(),
            })
        }

        fn caller() -> Result<(), SessionError> {
            may_fail()?;
            Ok(())
        }

        assert_eq!(caller().unwrap_err().code(), 1001);
    }
}
