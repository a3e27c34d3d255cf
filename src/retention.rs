use crate::config::Settings;
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::fs;
use std::io;

/// Result of a retention pass over the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionOutcome {
    Pruned { deleted: Vec<String>, remaining: usize },
    LowCount { expected: usize, actual: usize },
}

fn prefix_pattern() -> Regex {
    Regex::new(r"^(20\d{6})-").unwrap()
}

fn staged_date(name: &str, pattern: &Regex) -> Option<NaiveDate> {
    let date_str = pattern.captures(name)?.get(1)?.as_str();
    NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()
}

/// Deletes staged backups dated before `today - retention_days`.
///
/// A directory holding fewer than `min_expected_count` entries means an
/// upstream backup has failed at some point; nothing is deleted and the
/// mismatch is reported instead. Entries with the backup suffix but no
/// parseable date prefix are left untouched.
pub fn enforce_retention(settings: &Settings, today: NaiveDate) -> io::Result<RetentionOutcome> {
    let mut names = vec![];
    for entry in fs::read_dir(&settings.staging_dir)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }

    if names.len() < settings.min_expected_count {
        println!(
            "Expected at least {} staged backups, found {}; skipping prune.",
            settings.min_expected_count,
            names.len()
        );
        return Ok(RetentionOutcome::LowCount {
            expected: settings.min_expected_count,
            actual: names.len(),
        });
    }

    let cutoff = today - Duration::days(settings.retention_days);
    let pattern = prefix_pattern();
    let dot_suffix = format!(".{}", settings.backup_suffix);

    let mut deleted = vec![];
    for name in &names {
        if !name.ends_with(&dot_suffix) {
            continue;
        }

        let date = match staged_date(name, &pattern) {
            Some(date) => date,
            None => continue,
        };

        if date < cutoff {
            fs::remove_file(settings.staging_dir.join(name))?;
            println!("Deleted stale backup: {}", name);
            deleted.push(name.clone());
        }
    }

    let remaining = names.len() - deleted.len();
    Ok(RetentionOutcome::Pruned { deleted, remaining })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn test_settings(staging_dir: PathBuf) -> Settings {
        Settings {
            remote_backup_dir: "/appliance/backups".into(),
            staging_dir,
            backup_suffix: "pbc".to_string(),
            min_expected_count: 3,
            retention_days: 3,
            ssh_host: "appliance.example.com".to_string(),
            ssh_port: 22,
            ssh_user: "backup".to_string(),
            identity_file: "/dev/null".into(),
            smtp_server: "localhost".to_string(),
            smtp_port: 25,
            smtp_from: "backup@example.com".to_string(),
            smtp_recipients: vec!["ops@example.com".to_string()],
        }
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"pbc").unwrap();
    }

    fn today() -> NaiveDate {
        // Cutoff with the default 3-day window is 2024-01-10.
        NaiveDate::from_ymd_opt(2024, 1, 13).unwrap()
    }

    #[test]
    fn deletes_everything_older_than_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "20240101-2024_pp.pbc",
            "20240102-2024_pp.pbc",
            "20240103-2024_pp.pbc",
        ] {
            touch(dir.path(), name);
        }
        let settings = test_settings(dir.path().to_path_buf());

        let outcome = enforce_retention(&settings, today()).unwrap();
        match outcome {
            RetentionOutcome::Pruned { deleted, remaining } => {
                assert_eq!(deleted.len(), 3);
                assert_eq!(remaining, 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn keeps_files_newer_than_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20240101-2024_pp.pbc");
        touch(dir.path(), "20240102-2024_pp.pbc");
        touch(dir.path(), "20240113-2024_pp.pbc");
        let settings = test_settings(dir.path().to_path_buf());

        let outcome = enforce_retention(&settings, today()).unwrap();
        match outcome {
            RetentionOutcome::Pruned { mut deleted, remaining } => {
                deleted.sort();
                assert_eq!(
                    deleted,
                    vec![
                        "20240101-2024_pp.pbc".to_string(),
                        "20240102-2024_pp.pbc".to_string(),
                    ]
                );
                assert_eq!(remaining, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(dir.path().join("20240113-2024_pp.pbc").exists());
    }

    #[test]
    fn low_count_suppresses_deletion() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20240101-2024_pp.pbc");
        touch(dir.path(), "20240102-2024_pp.pbc");
        let settings = test_settings(dir.path().to_path_buf());

        let outcome = enforce_retention(&settings, today()).unwrap();
        assert_eq!(
            outcome,
            RetentionOutcome::LowCount {
                expected: 3,
                actual: 2
            }
        );
        assert!(dir.path().join("20240101-2024_pp.pbc").exists());
        assert!(dir.path().join("20240102-2024_pp.pbc").exists());
    }

    #[test]
    fn suffix_without_date_prefix_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "notes.pbc");
        touch(dir.path(), "20240101-2024_pp.pbc");
        touch(dir.path(), "20240113-2024_pp.pbc");
        let settings = test_settings(dir.path().to_path_buf());

        let outcome = enforce_retention(&settings, today()).unwrap();
        match outcome {
            RetentionOutcome::Pruned { deleted, .. } => {
                assert_eq!(deleted, vec!["20240101-2024_pp.pbc".to_string()]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(dir.path().join("notes.pbc").exists());
    }

    #[test]
    fn unrelated_files_count_toward_threshold_but_are_never_deleted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "README.txt");
        touch(dir.path(), "20240101-2024_pp.pbc");
        touch(dir.path(), "20240102-2024_pp.pbc");
        let settings = test_settings(dir.path().to_path_buf());

        let outcome = enforce_retention(&settings, today()).unwrap();
        match outcome {
            RetentionOutcome::Pruned { deleted, remaining } => {
                assert_eq!(deleted.len(), 2);
                assert_eq!(remaining, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(dir.path().join("README.txt").exists());
    }

    #[test]
    fn file_dated_exactly_at_cutoff_survives() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "20240110-2024_pp.pbc");
        touch(dir.path(), "20240111-2024_pp.pbc");
        touch(dir.path(), "20240112-2024_pp.pbc");
        let settings = test_settings(dir.path().to_path_buf());

        let outcome = enforce_retention(&settings, today()).unwrap();
        assert_eq!(
            outcome,
            RetentionOutcome::Pruned {
                deleted: vec![],
                remaining: 3
            }
        );
    }
}
