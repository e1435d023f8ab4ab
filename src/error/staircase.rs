// Staircase error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Staircase error code constants
///
/// Error code range: 1001-1005
pub struct StaircaseErrorCodes;

impl StaircaseErrorCodes {
    /// Step size list is empty or contains a non-positive value
    pub const INVALID_STEP_SIZES: i32 = 1001;

    /// Maximum level does not exceed minimum level
    pub const INVALID_BOUNDS: i32 = 1002;

    /// Starting level lies outside the level bounds
    pub const START_OUT_OF_BOUNDS: i32 = 1003;

    /// Fewer reversals requested than step sizes provided
    pub const NOT_ENOUGH_REVERSALS: i32 = 1004;

    /// Response added after the stopping rule was met
    pub const ALREADY_COMPLETE: i32 = 1005;
}

/// Log a staircase error with structured context
pub fn log_staircase_error(err: &StaircaseError, context: &str) {
    error!(
        "Staircase error in {}: code={}, component=Staircase, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Staircase construction and tracking errors
#[derive(Debug, Clone, PartialEq)]
pub enum StaircaseError {
    /// Step sizes must be a non-empty list of positive values
    InvalidStepSizes { reason: String },

    /// Level bounds are inverted or equal
    InvalidBounds { min_level: f64, max_level: f64 },

    /// Starting level lies outside [min_level, max_level]
    StartOutOfBounds {
        start: f64,
        min_level: f64,
        max_level: f64,
    },

    /// Number of reversals must at least equal the number of steps
    NotEnoughReversals { reversals: usize, steps: usize },

    /// The staircase already met its stopping rule
    AlreadyComplete { trials: usize, reversals: usize },
}

impl ErrorCode for StaircaseError {
    fn code(&self) -> i32 {
        match self {
            StaircaseError::InvalidStepSizes { .. } => StaircaseErrorCodes::INVALID_STEP_SIZES,
            StaircaseError::InvalidBounds { .. } => StaircaseErrorCodes::INVALID_BOUNDS,
            StaircaseError::StartOutOfBounds { .. } => StaircaseErrorCodes::START_OUT_OF_BOUNDS,
            StaircaseError::NotEnoughReversals { .. } => StaircaseErrorCodes::NOT_ENOUGH_REVERSALS,
            StaircaseError::AlreadyComplete { .. } => StaircaseErrorCodes::ALREADY_COMPLETE,
        }
    }

    fn message(&self) -> String {
        match self {
            StaircaseError::InvalidStepSizes { reason } => {
                format!("Invalid step sizes: {}", reason)
            }
            StaircaseError::InvalidBounds {
                min_level,
                max_level,
            } => format!(
                "The maximum level must exceed the minimum level (min {}, max {})",
                min_level, max_level
            ),
            StaircaseError::StartOutOfBounds {
                start,
                min_level,
                max_level,
            } => format!(
                "Starting level {} outside [{}, {}]",
                start, min_level, max_level
            ),
            StaircaseError::NotEnoughReversals { reversals, steps } => format!(
                "The number of reversals must at least equal the number of steps ({} < {})",
                reversals, steps
            ),
            StaircaseError::AlreadyComplete { trials, reversals } => format!(
                "Staircase already complete after {} trials and {} reversals",
                trials, reversals
            ),
        }
    }
}

impl fmt::Display for StaircaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StaircaseError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StaircaseError {}
