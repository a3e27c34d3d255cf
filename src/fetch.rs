use crate::config::Settings;
use crate::ssh::RemoteStore;
use chrono::NaiveDate;
use regex::Regex;
use std::io;

/// A remote backup file whose name carries an extractable date.
///
/// `staged_name` is the date-first rewrite used on the staging share, so a
/// plain lexicographic sort on it is a chronological sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub remote_name: String,
    pub staged_name: String,
    pub date: NaiveDate,
}

fn tail_pattern(suffix: &str) -> Regex {
    Regex::new(&format!(r"-(20\d{{6}})\.{}$", regex::escape(suffix))).unwrap()
}

fn parse_candidate(name: &str, pattern: &Regex, suffix: &str) -> Option<Candidate> {
    let caps = pattern.captures(name)?;
    let tail = caps.get(0)?;
    let date_str = caps.get(1)?.as_str();

    // Eight digits that are not a real calendar date disqualify the file.
    let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").ok()?;

    let stem = &name[..tail.start()];
    Some(Candidate {
        remote_name: name.to_string(),
        staged_name: format!("{}-{}.{}", date_str, stem, suffix),
        date,
    })
}

pub fn select_latest(names: &[String], suffix: &str) -> io::Result<Candidate> {
    let pattern = tail_pattern(suffix);
    let mut candidates: Vec<Candidate> = names
        .iter()
        .filter_map(|name| parse_candidate(name, &pattern, suffix))
        .collect();

    if candidates.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!(
                "no backup files matching *-YYYYMMDD.{} in remote listing",
                suffix
            ),
        ));
    }

    candidates.sort_by(|a, b| b.staged_name.cmp(&a.staged_name));
    Ok(candidates.remove(0))
}

pub fn fetch_latest(settings: &Settings, remote: &dyn RemoteStore) -> io::Result<Candidate> {
    let names = remote.list()?;
    let latest = select_latest(&names, &settings.backup_suffix)?;

    println!(
        "Latest remote backup: {} (dated {})",
        latest.remote_name, latest.date
    );

    let destination = settings.staging_dir.join(&latest.staged_name);
    remote.fetch(&latest.remote_name, &destination)?;

    Ok(latest)
}
