// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Weekly statistics rebuilt from the dated snapshots, Monday through today.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use log::debug;

use crate::archive::ArchiveDir;
use crate::error::Result;
use crate::store::{Rollup, Store};

/// What a rollup sums over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    Name,
    Category,
}

impl Grouping {
    /// Plural noun for report headers (`Mon [3 watches]`).
    pub fn noun(self) -> &'static str {
        match self {
            Grouping::Name => "watches",
            Grouping::Category => "categories",
        }
    }

    pub fn rollup_at(self, store: &Store, at: NaiveDateTime) -> Rollup {
        match self {
            Grouping::Name => store.sum_by_name_at(at),
            Grouping::Category => store.sum_by_category_at(at),
        }
    }
}

/// One day's sums.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayRollup {
    pub date: NaiveDate,
    /// Watches in that day's store, archived ones included.
    pub records: usize,
    pub rollup: Rollup,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeeklyReport {
    pub grouping: Grouping,
    /// Monday first, one entry per day through today.
    pub days: Vec<DayRollup>,
    pub totals: Rollup,
    /// The not-yet-archived working store; never part of `totals`.
    pub unsaved: Option<DayRollup>,
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Sums every snapshot from Monday through `today` by `grouping`.
///
/// Keys keep the order in which they were first seen, scanning days forward.
/// A day without a snapshot contributes an empty rollup.
pub fn weekly_rollup(
    archive: &ArchiveDir,
    today: NaiveDate,
    grouping: Grouping,
    current: &Store,
    at: NaiveDateTime,
) -> Result<WeeklyReport> {
    let monday = week_start(today);
    let mut days = Vec::new();
    let mut totals = Rollup::new();
    for date in monday.iter_days().take_while(|d| *d <= today) {
        let store = archive.load_day(date)?;
        let rollup = grouping.rollup_at(&store, at);
        debug!("{}: {} {}", date, rollup.len(), grouping.noun());
        totals.merge(&rollup);
        days.push(DayRollup {
            date,
            records: store.len(),
            rollup,
        });
    }
    let unsaved = if current.is_empty() {
        None
    } else {
        Some(DayRollup {
            date: today,
            records: current.len(),
            rollup: grouping.rollup_at(current, at),
        })
    };
    Ok(WeeklyReport {
        grouping,
        days,
        totals,
        unsaved,
    })
}
