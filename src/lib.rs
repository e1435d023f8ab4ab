// P.E.A.T. core - adaptive threshold estimation for sound-field audiometry
// 2IAFC staircase tracking with warble-tone stimuli and SLM calibration

// Module declarations
pub mod audio;
pub mod calibration;
pub mod config;
pub mod data;
pub mod error;
pub mod observer;
pub mod scoring;
pub mod session;
pub mod staircase;
pub mod stimulus;

// Re-exports for convenience
pub use config::SessionConfig;
pub use error::{ErrorCode, SessionError};
pub use session::{SessionProgress, SessionRunner, SessionSummary};
pub use staircase::{Staircase, StaircaseParams};
