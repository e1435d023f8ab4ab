// Trial log loading for threshold scoring

use std::fs;
use std::path::{Path, PathBuf};

use crate::data::csv::split_csv_line;
use crate::data::trial_log::timestamp_from_path;
use crate::error::DataError;

/// Name of the scoring output; never read back as trial data
pub const THRESHOLDS_FILE: &str = "thresholds.csv";

/// The trial log columns scoring needs
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRow {
    pub subject: String,
    pub condition: String,
    pub test_freq: f64,
    pub reversal: bool,
    pub desired_level_db: f64,
    pub staircase_level: Option<f64>,
}

/// Every `*.csv` trial log in `directory`, oldest session first
///
/// Logs are ordered by the date stamp in their file name. Files without a
/// stamp come first, and ties fall back to the file name.
pub fn trial_log_paths(directory: &Path) -> Result<Vec<PathBuf>, DataError> {
    let entries = fs::read_dir(directory).map_err(|err| DataError::io(directory, err))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| DataError::io(directory, err))?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        let is_output = path.file_name().map(|n| n == THRESHOLDS_FILE).unwrap_or(false);
        if path.is_file() && is_csv && !is_output {
            paths.push(path);
        }
    }
    paths.sort_by_cached_key(|path| (timestamp_from_path(path), path.clone()));
    Ok(paths)
}

/// Load and concatenate every trial log in `directory`
pub fn load_directory(directory: &Path) -> Result<Vec<TrialRow>, DataError> {
    let paths = trial_log_paths(directory)?;
    if paths.is_empty() {
        return Err(DataError::NoData {
            directory: directory.display().to_string(),
        });
    }

    let mut rows = Vec::new();
    for path in &paths {
        let contents = fs::read_to_string(path).map_err(|err| DataError::io(path, err))?;
        let mut parsed = parse_trial_log(path, &contents)?;
        log::info!("[Scoring] {} rows from {}", parsed.len(), path.display());
        rows.append(&mut parsed);
    }
    Ok(rows)
}

/// Parse the contents of one trial log
pub fn parse_trial_log(path: &Path, contents: &str) -> Result<Vec<TrialRow>, DataError> {
    let path_label = path.display().to_string();
    let mut lines = contents.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let header = match lines.next() {
        Some((_, line)) => split_csv_line(line),
        None => return Ok(Vec::new()),
    };
    let column = |name: &str| -> Result<usize, DataError> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn {
                path: path_label.clone(),
                column: name.to_string(),
            })
    };
    let subject_col = column("subject")?;
    let condition_col = column("condition")?;
    let freq_col = column("test_freq")?;
    let reversal_col = column("reversal")?;
    let desired_col = column("desired_level_dB")?;
    // logs written before staircase_level was recorded lack the column
    let stair_col = column("staircase_level").ok();

    let mut rows = Vec::new();
    for (index, line) in lines {
        let fields = split_csv_line(line);
        let line_no = index + 1;
        let field = |col: usize| -> Result<&str, DataError> {
            fields
                .get(col)
                .map(|f| f.trim())
                .ok_or_else(|| DataError::Parse {
                    path: path_label.clone(),
                    line: line_no,
                    reason: format!("expected {} fields, found {}", header.len(), fields.len()),
                })
        };
        let number = |col: usize| -> Result<f64, DataError> {
            let raw = field(col)?;
            raw.parse::<f64>().map_err(|_| DataError::Parse {
                path: path_label.clone(),
                line: line_no,
                reason: format!("'{}' is not a number", raw),
            })
        };

        let reversal_raw = field(reversal_col)?;
        let reversal = parse_flag(reversal_raw).ok_or_else(|| DataError::Parse {
            path: path_label.clone(),
            line: line_no,
            reason: format!("'{}' is not a reversal flag", reversal_raw),
        })?;

        rows.push(TrialRow {
            subject: field(subject_col)?.to_string(),
            condition: field(condition_col)?.to_string(),
            test_freq: number(freq_col)?,
            reversal,
            desired_level_db: number(desired_col)?,
            staircase_level: stair_col.map(number).transpose()?,
        });
    }
    Ok(rows)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
