// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Dated snapshot files: `pomodoro_daily_YYYYMMDD.txt` in the archive directory.
//!
//! Older versions wrote unpadded names (`pomodoro_daily_2025310.txt`); those are
//! still found by [`ArchiveDir::locate`] but never written.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use regex::Regex;

use crate::error::{Error, Result};
use crate::store::Store;

const PREFIX: &str = "pomodoro_daily_";
const SUFFIX: &str = ".txt";

fn daily_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^pomodoro_daily_(\d{4})(\d{2})(\d{2})\.txt$").expect("static regex")
    })
}

/// Date encoded in a snapshot file name, or `None` for any other file.
pub fn parse_daily_name(file_name: &str) -> Option<NaiveDate> {
    let caps = daily_name_re().captures(file_name)?;
    let y: i32 = caps[1].parse().ok()?;
    let m: u32 = caps[2].parse().ok()?;
    let d: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

#[derive(Clone, Debug)]
pub struct ArchiveDir {
    dir: PathBuf,
}

impl ArchiveDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArchiveDir { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path for `date`. Pure; the file may not exist.
    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{:04}{:02}{:02}{}",
            PREFIX,
            date.year(),
            date.month(),
            date.day(),
            SUFFIX
        ))
    }

    fn legacy_daily_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}{}{}{}",
            PREFIX,
            date.year(),
            date.month(),
            date.day(),
            SUFFIX
        ))
    }

    /// Unpadded name for `date`, but only when no other date of that year
    /// shares it (`2025111` is both Jan 11 and Nov 1) and it differs from the
    /// padded name.
    fn legacy_for(&self, date: NaiveDate) -> Option<PathBuf> {
        if !legacy_name_is_unique(date) {
            return None;
        }
        let legacy = self.legacy_daily_path(date);
        if legacy == self.daily_path(date) {
            return None;
        }
        Some(legacy)
    }

    /// Existing snapshot for `date`, preferring the padded name; falls back to
    /// [`daily_path`](Self::daily_path) when neither exists.
    pub fn locate(&self, date: NaiveDate) -> PathBuf {
        let path = self.daily_path(date);
        if path.exists() {
            return path;
        }
        match self.legacy_for(date) {
            Some(legacy) if legacy.exists() => {
                warn!("using legacy snapshot name {}", legacy.display());
                legacy
            }
            Some(_) => path,
            None => {
                let legacy = self.legacy_daily_path(date);
                if legacy != path && legacy.exists() {
                    warn!("ignoring ambiguous legacy snapshot {}", legacy.display());
                }
                path
            }
        }
    }

    /// Loads the store for `date`; a day without a snapshot is an empty store.
    pub fn load_day(&self, date: NaiveDate) -> Result<Store> {
        let path = self.locate(date);
        debug!("{}: snapshot for {}", path.display(), date);
        Store::load(&path)
    }

    /// All snapshot files with a parseable date, oldest first.
    pub fn snapshots(&self) -> Result<Vec<(NaiveDate, PathBuf)>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let mut found = Vec::new();
        for e in entries.flatten() {
            let p = e.path();
            if let Some(date) = p.file_name().and_then(|n| n.to_str()).and_then(parse_daily_name) {
                found.push((date, p));
            }
        }
        found.sort_by_key(|(date, _)| *date);
        Ok(found)
    }

    /// Moves the working store into the snapshot for `at`'s date and empties it.
    ///
    /// Running watches are paused at `at` first. If the day already has a
    /// snapshot, the working store is merged into it instead of replacing it.
    pub fn write_snapshot(&self, store: &mut Store, at: NaiveDateTime) -> Result<PathBuf> {
        let date = at.date();
        let path = self.daily_path(date);
        let mut day = self.load_day(date)?;
        let existing = day.len();
        let mut moving = store.clone();
        let paused = moving.pause_all_at(at);
        day.absorb(moving);
        day.save(&path)?;
        store.clear();
        if let Some(legacy) = self.legacy_for(date) {
            if legacy.exists() {
                fs::remove_file(&legacy).map_err(|e| Error::io(&legacy, e))?;
            }
        }
        debug!(
            "{}: snapshot written ({} existing, {} total, {} paused)",
            path.display(),
            existing,
            day.len(),
            paused
        );
        Ok(path)
    }
}

/// True when `{year}{month}{day}` without padding splits into exactly one valid date.
fn legacy_name_is_unique(date: NaiveDate) -> bool {
    let digits = format!("{}{}", date.month(), date.day());
    let splits = (1..digits.len())
        .filter(|&i| {
            let (m, d) = digits.split_at(i);
            if m.starts_with('0') || d.starts_with('0') {
                return false;
            }
            match (m.parse::<u32>(), d.parse::<u32>()) {
                (Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(date.year(), m, d).is_some(),
                _ => false,
            }
        })
        .count();
    splits == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TimeRecord;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_path_is_padded() {
        let a = ArchiveDir::new("/arch");
        assert_eq!(
            a.daily_path(date(2025, 3, 1)),
            PathBuf::from("/arch/pomodoro_daily_20250301.txt")
        );
        assert_ne!(a.daily_path(date(2025, 1, 11)), a.daily_path(date(2025, 11, 1)));
    }

    #[test]
    fn test_parse_daily_name_inverts_daily_path() {
        let a = ArchiveDir::new("/arch");
        let d = date(2024, 12, 31);
        let p = a.daily_path(d);
        let name = p.file_name().unwrap().to_str().unwrap();
        assert_eq!(parse_daily_name(name), Some(d));
        assert_eq!(parse_daily_name("pomodoro_daily_20241340.txt"), None);
        assert_eq!(parse_daily_name("pomodoro_daily_2024115.txt"), None);
        assert_eq!(parse_daily_name("pomodoro.txt"), None);
    }

    #[test]
    fn test_locate_falls_back_to_legacy_name() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        let d = date(2025, 3, 4);
        assert_eq!(a.locate(d), a.daily_path(d));
        let legacy = dir.path().join("pomodoro_daily_202534.txt");
        fs::write(&legacy, "x, 2025-03-04T09:00:00, 0:01:00, False, \n").unwrap();
        assert_eq!(a.locate(d), legacy);
        assert_eq!(a.load_day(d).unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_name_is_unique() {
        assert!(legacy_name_is_unique(date(2025, 3, 4)));
        assert!(legacy_name_is_unique(date(2025, 12, 31)));
        assert!(!legacy_name_is_unique(date(2025, 1, 11)));
        assert!(!legacy_name_is_unique(date(2025, 11, 1)));
        assert!(!legacy_name_is_unique(date(2025, 1, 23)));
        assert!(legacy_name_is_unique(date(2025, 10, 1)));
    }

    #[test]
    fn test_ambiguous_legacy_name_is_never_used() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        let legacy = dir.path().join("pomodoro_daily_2025111.txt");
        fs::write(&legacy, "jan_work, 2025-01-11T09:00:00, 1:00:00, False, \n").unwrap();
        let nov1 = date(2025, 11, 1);
        assert_eq!(a.locate(nov1), a.daily_path(nov1));
        assert!(a.load_day(nov1).unwrap().is_empty());
        assert!(a.load_day(date(2025, 1, 11)).unwrap().is_empty());

        let mut store = Store::new();
        store.add(TimeRecord::new("nov_work")).unwrap();
        let path = a
            .write_snapshot(&mut store, nov1.and_hms_opt(18, 0, 0).unwrap())
            .unwrap();
        assert!(legacy.exists());
        let snap = Store::load(&path).unwrap();
        assert!(snap.find("jan_work").is_none());
        assert!(snap.find("nov_work").is_some());
    }

    #[test]
    fn test_write_snapshot_failure_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path().join("missing"));
        let start = date(2025, 3, 4).and_hms_opt(9, 0, 0).unwrap();
        let mut store = Store::new();
        store.add(TimeRecord::new_at("precious", start)).unwrap().resume_at(start);
        let err = a.write_snapshot(&mut store, start + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(store.len(), 1);
        let w = store.find("precious").unwrap();
        assert!(w.is_running());
        assert_eq!(w.start_time(), start);
    }

    #[test]
    fn test_load_day_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        assert!(a.load_day(date(2025, 3, 4)).unwrap().is_empty());
    }

    #[test]
    fn test_snapshots_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        for name in ["pomodoro_daily_20250305.txt", "pomodoro_daily_20250301.txt", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let dates: Vec<NaiveDate> = a.snapshots().unwrap().into_iter().map(|(d, _)| d).collect();
        assert_eq!(dates, [date(2025, 3, 1), date(2025, 3, 5)]);
        assert!(ArchiveDir::new(dir.path().join("missing")).snapshots().unwrap().is_empty());
    }

    #[test]
    fn test_write_snapshot_pauses_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        let start = date(2025, 3, 4).and_hms_opt(9, 0, 0).unwrap();
        let mut store = Store::new();
        store.add(TimeRecord::new_at("a", start)).unwrap().resume_at(start);
        let path = a.write_snapshot(&mut store, start + Duration::hours(2)).unwrap();
        assert!(store.is_empty());
        assert_eq!(path, a.daily_path(date(2025, 3, 4)));
        let snap = Store::load(&path).unwrap();
        let w = snap.find("a").unwrap();
        assert!(!w.is_running());
        assert_eq!(w.banked(), Duration::hours(2));
    }

    #[test]
    fn test_write_snapshot_twice_same_day_merges() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        let start = date(2025, 3, 4).and_hms_opt(9, 0, 0).unwrap();
        let mut store = Store::new();
        store.add(TimeRecord::new_at("a", start)).unwrap().resume_at(start);
        a.write_snapshot(&mut store, start + Duration::hours(1)).unwrap();
        let later = start + Duration::hours(3);
        store.add(TimeRecord::new_at("a", later)).unwrap().resume_at(later);
        store.add(TimeRecord::new_at("b", later)).unwrap();
        let path = a.write_snapshot(&mut store, later + Duration::minutes(30)).unwrap();
        let snap = Store::load(&path).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.find("a").unwrap().banked(), Duration::minutes(90));
    }

    #[test]
    fn test_write_snapshot_replaces_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = ArchiveDir::new(dir.path());
        let legacy = dir.path().join("pomodoro_daily_202534.txt");
        fs::write(&legacy, "old, 2025-03-04T08:00:00, 0:20:00, False, \n").unwrap();
        let mut store = Store::new();
        store.add(TimeRecord::new("new")).unwrap();
        let at = date(2025, 3, 4).and_hms_opt(18, 0, 0).unwrap();
        let path = a.write_snapshot(&mut store, at).unwrap();
        assert!(!legacy.exists());
        let names: Vec<String> = Store::load(&path)
            .unwrap()
            .iter()
            .map(|w| w.name().to_string())
            .collect();
        assert_eq!(names, ["old", "new"]);
    }
}
