// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Ordered name → watch mapping, loaded from and saved to one file.
//!
//! Insertion order is the listing order and the index space for `find`.
//! Archived (hidden) watches keep their position.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use indexmap::map::Entry;
use indexmap::IndexMap;
use log::debug;

use crate::codec;
use crate::error::{Error, Result};
use crate::record::{self, TimeRecord};

/// Order-preserving key → summed duration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rollup(IndexMap<String, Duration>);

impl Rollup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `d` to `key`, appending the key if it is new.
    pub fn add(&mut self, key: &str, d: Duration) {
        match self.0.get_mut(key) {
            Some(sum) => *sum = *sum + d,
            None => {
                self.0.insert(key.to_string(), d);
            }
        }
    }

    /// Folds `other` in; keys new to `self` are appended in `other`'s order.
    pub fn merge(&mut self, other: &Rollup) {
        for (key, d) in other.iter() {
            self.add(key, d);
        }
    }

    pub fn get(&self, key: &str) -> Option<Duration> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.0.iter().map(|(k, d)| (k.as_str(), *d))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn total(&self) -> Duration {
        self.0.values().fold(Duration::zero(), |acc, d| acc + *d)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rejects names and categories that would break the line format or a command token.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(',') || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct Store {
    watches: IndexMap<String, TimeRecord>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a store file; a missing file is an empty store.
    /// The first malformed line aborts the load.
    pub fn load(path: &Path) -> Result<Store> {
        let mut store = Store::new();
        if !path.exists() {
            debug!("{}: no such file, starting empty", path.display());
            return Ok(store);
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = codec::decode(line).map_err(|e| Error::InFile {
                path: path.to_path_buf(),
                line: i + 1,
                source: Box::new(e),
            })?;
            store.watches.insert(record.name().to_string(), record);
        }
        debug!("{}: loaded {} watches", path.display(), store.len());
        Ok(store)
    }

    /// Rewrites the whole file, archived watches included.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for w in self.watches.values() {
            out.push_str(&codec::encode(w));
            out.push('\n');
        }
        fs::write(path, out).map_err(|e| Error::io(path, e))?;
        debug!("{}: saved {} watches", path.display(), self.len());
        Ok(())
    }

    /// Inserts a new watch; an existing name leaves the store untouched.
    pub fn add(&mut self, record: TimeRecord) -> Result<&mut TimeRecord> {
        validate_name(record.name())?;
        match self.watches.entry(record.name().to_string()) {
            Entry::Occupied(e) => Err(Error::DuplicateName(e.key().clone())),
            Entry::Vacant(e) => Ok(e.insert(record)),
        }
    }

    /// Position of `key`: a valid index first, then an exact name.
    pub fn get_index_of(&self, key: &str) -> Option<usize> {
        if let Ok(idx) = key.parse::<usize>() {
            if idx < self.watches.len() {
                return Some(idx);
            }
        }
        self.watches.get_index_of(key)
    }

    pub fn find(&self, key: &str) -> Option<&TimeRecord> {
        let idx = self.get_index_of(key)?;
        self.watches.get_index(idx).map(|(_, w)| w)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut TimeRecord> {
        let idx = self.get_index_of(key)?;
        self.watches.get_index_mut(idx).map(|(_, w)| w)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeRecord> {
        self.watches.values()
    }

    /// Non-archived watches with their positional index.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &TimeRecord)> {
        self.watches.values().enumerate().filter(|(_, w)| !w.archived)
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    pub fn clear(&mut self) {
        self.watches.clear();
    }

    /// Banks every running watch at `at`. Returns how many were stopped.
    pub fn pause_all_at(&mut self, at: NaiveDateTime) -> usize {
        self.watches
            .values_mut()
            .map(|w| w.pause_at(at))
            .filter(|&paused| paused)
            .count()
    }

    /// Takes every watch of `other`. A name already present gets the other
    /// watch's banked time added and its note appended.
    pub fn absorb(&mut self, other: Store) {
        for (name, w) in other.watches {
            match self.watches.entry(name) {
                Entry::Occupied(mut e) => {
                    let existing = e.get_mut();
                    existing.bank(w.banked());
                    if !w.note.is_empty() {
                        if existing.note.is_empty() {
                            existing.note = w.note;
                        } else {
                            existing.note = format!("{}; {}", existing.note, w.note);
                        }
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(w);
                }
            }
        }
    }

    pub fn sum_by_category(&self) -> Rollup {
        self.sum_by_category_at(record::now())
    }

    pub fn sum_by_category_at(&self, at: NaiveDateTime) -> Rollup {
        let mut cats = Rollup::new();
        for w in self.watches.values() {
            cats.add(&w.category, w.elapsed_at(at));
        }
        cats
    }

    pub fn sum_by_name(&self) -> Rollup {
        self.sum_by_name_at(record::now())
    }

    pub fn sum_by_name_at(&self, at: NaiveDateTime) -> Rollup {
        let mut names = Rollup::new();
        for w in self.watches.values() {
            names.add(w.name(), w.elapsed_at(at));
        }
        names
    }
}
