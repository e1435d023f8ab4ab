// Threshold scoring - mean of the last N reversal levels per group
//
// Groups are (subject, condition, test frequency). Subjects and
// conditions are never pooled.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::csv::csv_line;
use crate::error::{log_data_error, DataError};
use crate::scoring::loader::TrialRow;

/// Which logged level the threshold is averaged from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreBasis {
    /// Calibrated SPL sent to the output (`desired_level_dB`)
    #[default]
    DesiredLevel,
    /// Raw staircase level (`staircase_level`)
    StaircaseLevel,
}

impl ScoreBasis {
    pub fn column(&self) -> &'static str {
        match self {
            ScoreBasis::DesiredLevel => "desired_level_dB",
            ScoreBasis::StaircaseLevel => "staircase_level",
        }
    }
}

impl fmt::Display for ScoreBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ScoreBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desired" | "desired_level_db" => Ok(ScoreBasis::DesiredLevel),
            "staircase" | "staircase_level" => Ok(ScoreBasis::StaircaseLevel),
            other => Err(format!(
                "unknown score basis '{}' (expected 'desired' or 'staircase')",
                other
            )),
        }
    }
}

/// Threshold for one subject, condition and frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub subject: String,
    pub condition: String,
    pub freq: f64,
    /// `None` when the group has no reversals
    pub threshold: Option<f64>,
    pub reversals_used: usize,
}

/// Average the last `num_reversals` reversal levels of every group
///
/// Groups appear in the order they are first seen in `rows`; reversal
/// levels are taken in row order, so the last N come from the newest
/// session when `rows` come from [load_directory](super::load_directory).
pub fn score(
    rows: &[TrialRow],
    num_reversals: usize,
    basis: ScoreBasis,
) -> Result<Vec<ThresholdResult>, DataError> {
    if num_reversals == 0 {
        let err = DataError::InvalidReversalCount {
            requested: num_reversals,
        };
        log_data_error(&err, "score");
        return Err(err);
    }

    let mut order: Vec<(String, String, f64)> = Vec::new();
    let mut levels: HashMap<(String, String, u64), Vec<f64>> = HashMap::new();

    for row in rows {
        let key = (row.subject.clone(), row.condition.clone(), row.test_freq.to_bits());
        let entry = levels.entry(key).or_insert_with(|| {
            order.push((row.subject.clone(), row.condition.clone(), row.test_freq));
            Vec::new()
        });
        if !row.reversal {
            continue;
        }
        let level = match basis {
            ScoreBasis::DesiredLevel => Some(row.desired_level_db),
            ScoreBasis::StaircaseLevel => row.staircase_level,
        };
        match level {
            Some(level) => entry.push(level),
            None => {
                return Err(DataError::MissingColumn {
                    path: format!("{}/{}", row.subject, row.condition),
                    column: basis.column().to_string(),
                })
            }
        }
    }

    let results = order
        .into_iter()
        .map(|(subject, condition, freq)| {
            let key = (subject.clone(), condition.clone(), freq.to_bits());
            let group = levels.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            let used = &group[group.len().saturating_sub(num_reversals)..];
            let threshold = if used.is_empty() {
                None
            } else {
                Some(used.iter().sum::<f64>() / used.len() as f64)
            };
            log::info!(
                "[Scoring] {} / {} / {} Hz: {:?} from {} reversal(s)",
                subject,
                condition,
                freq,
                threshold,
                used.len()
            );
            ThresholdResult {
                subject,
                condition,
                freq,
                threshold,
                reversals_used: used.len(),
            }
        })
        .collect();

    Ok(results)
}

/// Write results as CSV; groups without a threshold get an empty cell
pub fn write_thresholds(path: &Path, results: &[ThresholdResult]) -> Result<(), DataError> {
    let mut contents = csv_line(&["subject", "condition", "freq", "threshold", "reversals_used"]);
    contents.push('\n');
    for result in results {
        let threshold = result
            .threshold
            .map(|t| t.to_string())
            .unwrap_or_default();
        contents.push_str(&csv_line(&[
            result.subject.clone(),
            result.condition.clone(),
            result.freq.to_string(),
            threshold,
            result.reversals_used.to_string(),
        ]));
        contents.push('\n');
    }
    fs::write(path, contents).map_err(|err| DataError::io(path, err))?;
    log::info!(
        "[Scoring] Wrote {} threshold(s) to {}",
        results.len(),
        path.display()
    );
    Ok(())
}
