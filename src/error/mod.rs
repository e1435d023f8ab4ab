// Error types for the threshold estimation engine
//
// Each domain owns an error enum with stable numeric codes so CLI output
// and logs can be matched against a fixed table.

mod audio;
mod data;
mod session;
mod staircase;
mod stimulus;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use data::{log_data_error, DataError, DataErrorCodes};
pub use session::SessionError;
pub use staircase::{log_staircase_error, StaircaseError, StaircaseErrorCodes};
pub use stimulus::{log_stimulus_error, StimulusError, StimulusErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
