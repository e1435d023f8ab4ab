// Data log and scoring error types

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Data error code constants
///
/// Error code range: 4001-4006
pub struct DataErrorCodes;

impl DataErrorCodes {
    /// Data file or directory is not writable
    pub const PERMISSION_DENIED: i32 = 4001;

    /// Underlying filesystem failure
    pub const IO: i32 = 4002;

    /// Trial log lacks a column needed for scoring
    pub const MISSING_COLUMN: i32 = 4003;

    /// A field could not be parsed
    pub const PARSE: i32 = 4004;

    /// Reversal count for averaging is zero
    pub const INVALID_REVERSAL_COUNT: i32 = 4005;

    /// No trial logs found
    pub const NO_DATA: i32 = 4006;
}

/// Log a data error with structured context
pub fn log_data_error(err: &DataError, context: &str) {
    error!(
        "Data error in {}: code={}, component=DataLog, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Trial log and threshold scoring errors
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Cannot write to the data file
    PermissionDenied { path: String },

    /// Filesystem error
    Io { path: String, reason: String },

    /// Required column absent from header
    MissingColumn { path: String, column: String },

    /// Malformed field value
    Parse {
        path: String,
        line: usize,
        reason: String,
    },

    /// Number of reversals for averaging must be positive
    InvalidReversalCount { requested: usize },

    /// Directory holds no trial logs
    NoData { directory: String },
}

impl ErrorCode for DataError {
    fn code(&self) -> i32 {
        match self {
            DataError::PermissionDenied { .. } => DataErrorCodes::PERMISSION_DENIED,
            DataError::Io { .. } => DataErrorCodes::IO,
            DataError::MissingColumn { .. } => DataErrorCodes::MISSING_COLUMN,
            DataError::Parse { .. } => DataErrorCodes::PARSE,
            DataError::InvalidReversalCount { .. } => DataErrorCodes::INVALID_REVERSAL_COUNT,
            DataError::NoData { .. } => DataErrorCodes::NO_DATA,
        }
    }

    fn message(&self) -> String {
        match self {
            DataError::PermissionDenied { path } => {
                format!("Data not saved! Permission denied accessing file: {}", path)
            }
            DataError::Io { path, reason } => format!("I/O error on {}: {}", path, reason),
            DataError::MissingColumn { path, column } => {
                format!("{} has no '{}' column", path, column)
            }
            DataError::Parse { path, line, reason } => {
                format!("{} line {}: {}", path, line, reason)
            }
            DataError::InvalidReversalCount { requested } => format!(
                "Number of reversals cannot be 0 or negative (got {})",
                requested
            ),
            DataError::NoData { directory } => {
                format!("No trial data (*.csv) found in {}", directory)
            }
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DataError {}

impl DataError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            DataError::PermissionDenied { path }
        } else {
            DataError::Io {
                path,
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_codes() {
        assert_eq!(
            DataError::PermissionDenied {
                path: "x.csv".to_string()
            }
            .code(),
            4001
        );
        assert_eq!(DataError::InvalidReversalCount { requested: 0 }.code(), 4005);
        assert_eq!(
            DataError::NoData {
                directory: "Data".to_string()
            }
            .code(),
            4006
        );
    }

    #[test]
    fn test_io_conversion_maps_permission_denied() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = DataError::io("Data/P1_quiet.csv", io_err);
        assert_eq!(
            err,
            DataError::PermissionDenied {
                path: "Data/P1_quiet.csv".to_string()
            }
        );

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        match DataError::io("Data", io_err) {
            DataError::Io { reason, .. } => assert!(reason.contains("missing")),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
