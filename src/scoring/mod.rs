// Scoring module - thresholds from saved trial logs
//
// 1. Load every *.csv trial log in a directory, oldest session first
// 2. Group rows by (subject, condition, test frequency)
// 3. Average the last N reversal levels of each group
// 4. Write thresholds.csv next to the logs

pub mod loader;
pub mod thresholds;

use std::path::{Path, PathBuf};

use crate::error::DataError;

pub use loader::{load_directory, parse_trial_log, TrialRow, THRESHOLDS_FILE};
pub use thresholds::{score, write_thresholds, ScoreBasis, ThresholdResult};

/// Score a directory of trial logs and write `thresholds.csv` into `output_dir`
///
/// # Returns
/// The computed results and the path they were written to
pub fn score_directory(
    directory: &Path,
    num_reversals: usize,
    basis: ScoreBasis,
    output_dir: &Path,
) -> Result<(Vec<ThresholdResult>, PathBuf), DataError> {
    let rows = load_directory(directory)?;
    let results = score(&rows, num_reversals, basis)?;
    let output = output_dir.join(THRESHOLDS_FILE);
    write_thresholds(&output, &results)?;
    Ok((results, output))
}
