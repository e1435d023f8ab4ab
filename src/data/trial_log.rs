// TrialLog - append-only CSV log, one file per subject/condition/session
//
// The file name is fixed when the log is created so every trial of a
// session lands in the same file even if the session crosses a minute
// boundary.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::data::csv::csv_line;
use crate::data::record::{TrialRecord, TRIAL_LOG_HEADER};
use crate::error::{log_data_error, DataError};

/// Date stamp format used in trial log file names (e.g. 2024_Mar_05_1412)
pub const DATESTAMP_FORMAT: &str = "%Y_%b_%d_%H%M";

/// Session time encoded in a trial log file name
///
/// The stamp is the last four `_`-separated parts of the file stem, so
/// subjects and conditions may contain underscores themselves.
pub fn timestamp_from_path(path: &Path) -> Option<NaiveDateTime> {
    let stem = path.file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.rsplitn(5, '_').collect();
    if parts.len() < 5 {
        return None;
    }
    let stamp = format!("{}_{}_{}_{}", parts[3], parts[2], parts[1], parts[0]);
    NaiveDateTime::parse_from_str(&stamp, DATESTAMP_FORMAT).ok()
}

/// CSV trial log writer
#[derive(Debug, Clone)]
pub struct TrialLog {
    directory: PathBuf,
    path: PathBuf,
}

impl TrialLog {
    /// Log for `subject`/`condition` stamped with the current local time
    pub fn new(data_dir: impl AsRef<Path>, subject: &str, condition: &str) -> Self {
        Self::with_timestamp(data_dir, subject, condition, Local::now().naive_local())
    }

    /// Log stamped with an explicit time
    pub fn with_timestamp(
        data_dir: impl AsRef<Path>,
        subject: &str,
        condition: &str,
        timestamp: NaiveDateTime,
    ) -> Self {
        let directory = data_dir.as_ref().to_path_buf();
        let file_name = format!(
            "{}_{}_{}.csv",
            subject,
            condition,
            timestamp.format(DATESTAMP_FORMAT)
        );
        let path = directory.join(file_name);
        Self { directory, path }
    }

    /// Full path of the CSV file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Append one record, creating the directory and header as needed
    pub fn append(&self, record: &TrialRecord) -> Result<(), DataError> {
        self.ensure_directory()?;
        self.check_write_access()?;

        let new_file = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.fail(DataError::io(&self.path, err)))?;

        let mut contents = String::new();
        if new_file {
            contents.push_str(&csv_line(&TRIAL_LOG_HEADER));
            contents.push('\n');
        }
        contents.push_str(&csv_line(&record.to_fields()));
        contents.push('\n');

        file.write_all(contents.as_bytes())
            .map_err(|err| self.fail(DataError::io(&self.path, err)))?;

        log::debug!(
            "[TrialLog] Saved trial {} at {} Hz to {}",
            record.trial,
            record.test_freq,
            self.path.display()
        );
        Ok(())
    }

    fn ensure_directory(&self) -> Result<(), DataError> {
        if !self.directory.exists() {
            log::info!(
                "[TrialLog] {} directory not found, creating it",
                self.directory.display()
            );
            fs::create_dir_all(&self.directory)
                .map_err(|err| self.fail(DataError::io(&self.directory, err)))?;
        }
        Ok(())
    }

    /// Existing files must be writable; new files need a writable parent
    fn check_write_access(&self) -> Result<(), DataError> {
        let target = if self.path.exists() {
            &self.path
        } else {
            &self.directory
        };
        let readonly = fs::metadata(target)
            .map(|meta| meta.permissions().readonly())
            .map_err(|err| self.fail(DataError::io(target, err)))?;

        if readonly {
            return Err(self.fail(DataError::PermissionDenied {
                path: self.path.display().to_string(),
            }));
        }
        Ok(())
    }

    fn fail(&self, err: DataError) -> DataError {
        log_data_error(&err, "TrialLog::append");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::staircase::{DataPoint, Response};
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 12, 0)
            .unwrap()
    }

    fn record(trial: usize) -> TrialRecord {
        let point = DataPoint {
            trial,
            level: 30.0,
            response: Response::Correct,
            reversal: false,
        };
        TrialRecord::from_session(&SessionConfig::default(), trial, 500.0, &point)
    }

    #[test]
    fn test_file_name_uses_datestamp() {
        let log = TrialLog::with_timestamp("Data", "P1", "quiet", timestamp());
        assert_eq!(log.path(), Path::new("Data/P1_quiet_2024_Mar_05_1412.csv"));
    }

    #[test]
    fn test_timestamp_from_path() {
        let log = TrialLog::with_timestamp("Data", "P_1", "quiet", timestamp());
        assert_eq!(timestamp_from_path(log.path()), Some(timestamp()));
        assert_eq!(timestamp_from_path(Path::new("Data/notes.csv")), None);
        assert_eq!(timestamp_from_path(Path::new("P1_quiet_2024_Foo_05_1412.csv")), None);
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrialLog::with_timestamp(dir.path().join("Data"), "P1", "quiet", timestamp());

        log.append(&record(1)).unwrap();
        log.append(&record(2)).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("trial,subject,condition,"));
        assert!(lines[1].starts_with("1,999,test,"));
        assert!(lines[2].starts_with("2,999,test,"));
        // step sizes contain commas and must be quoted
        assert!(lines[1].contains("\"10, 5, 2\""));
    }

    #[cfg(unix)]
    #[test]
    fn test_readonly_file_is_permission_denied() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrialLog::with_timestamp(dir.path(), "P1", "quiet", timestamp());
        log.append(&record(1)).unwrap();

        let mut perms = fs::metadata(log.path()).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(log.path(), perms).unwrap();

        let err = log.append(&record(2)).unwrap_err();
        assert!(matches!(err, DataError::PermissionDenied { .. }));
    }
}
