// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Plain-text tables for rollups and weekly reports.

use crate::record::format_hms;
use crate::stats::{DayRollup, Grouping, WeeklyReport};
use crate::store::Rollup;

const KEY_WIDTH: usize = 24;

fn border() -> String {
    format!("+-{}-+-{}+", "-".repeat(KEY_WIDTH), "-".repeat(9))
}

/// Bordered two-column table: key, `HH:MM:SS`.
pub fn rollup_table(rollup: &Rollup) -> String {
    let mut out = String::new();
    out.push_str(&border());
    out.push('\n');
    for (key, d) in rollup.iter() {
        out.push_str(&format!("| {:width$} | {} |\n", key, format_hms(d), width = KEY_WIDTH));
    }
    out.push_str(&border());
    out.push('\n');
    out
}

fn day_section(day: &DayRollup, grouping: Grouping) -> String {
    let count = match grouping {
        Grouping::Name => day.records,
        Grouping::Category => day.rollup.len(),
    };
    format!(
        "{} [{} {}]\n{}\n",
        day.date.format("%a"),
        count,
        grouping.noun(),
        rollup_table(&day.rollup)
    )
}

pub fn weekly(report: &WeeklyReport) -> String {
    let mut out = String::new();
    for day in &report.days {
        out.push_str(&day_section(day, report.grouping));
    }
    out.push_str("\nWEEKLY STATS:\n");
    out.push_str(&format!("{} {}\n", report.totals.len(), report.grouping.noun()));
    out.push_str(&rollup_table(&report.totals));
    if let Some(unsaved) = &report.unsaved {
        out.push_str("\nFound unsaved watches (not included in statistics):\n");
        out.push_str(&day_section(unsaved, report.grouping));
    }
    out
}
