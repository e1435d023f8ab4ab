// Data module - CSV trial logs

pub mod csv;
pub mod record;
pub mod trial_log;

pub use record::{TrialRecord, TRIAL_LOG_HEADER};
pub use trial_log::TrialLog;
