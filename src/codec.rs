// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! One watch per line:
//!
//! `name, start_time, elapsed, running, note, archived, category`
//!
//! - `start_time` is ISO-8601 local time (`2025-03-10T09:00:00[.ffffff]`).
//! - `elapsed` is `H:MM:SS[.ffffff]`; hours are not wrapped at 24.
//! - `running` and `archived` are `True` / `False`.
//! - Commas in the note are written as `%komma%`; line breaks as spaces.
//!
//! Notes are lossy in three ways: a literal `%komma%` reads back as a comma,
//! line breaks read back as spaces, and leading or trailing whitespace is
//! trimmed like every other field.
//!
//! Lines written before `archived` and `category` existed have only five fields;
//! they decode as not archived, category `none`.

use chrono::{Duration, NaiveDateTime, SubsecRound, Timelike};

use crate::error::{Error, Result};
use crate::record::{TimeRecord, DEFAULT_CATEGORY};

/// Stands in for a literal comma inside the note field.
pub const COMMA_TOKEN: &str = "%komma%";

const DELIMITER: &str = ", ";
const MIN_FIELDS: usize = 5;

/// Largest hour count accepted in `elapsed`; anything bigger is a corrupt line.
const MAX_HOURS: i64 = 1_000_000;

/// Datetime layouts accepted on decode, tried in order.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Line breaks become spaces so a note never splits its record.
pub fn escape_note(note: &str) -> String {
    note.replace(['\r', '\n'], " ").replace(',', COMMA_TOKEN)
}

pub fn unescape_note(note: &str) -> String {
    note.replace(COMMA_TOKEN, ",")
}

fn format_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// ISO-8601 without offset; the fraction is only written when non-zero.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    let micros = dt.nanosecond() / 1000;
    if micros == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        format!("{}.{:06}", dt.format("%Y-%m-%dT%H:%M:%S"), micros)
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.trunc_subsecs(6))
}

/// `H:MM:SS` with `.ffffff` appended when there are leftover microseconds.
pub fn format_elapsed(d: Duration) -> String {
    let total = d.num_microseconds().unwrap_or(i64::MAX).max(0);
    let (secs, micros) = (total / 1_000_000, total % 1_000_000);
    let (hours, rem) = (secs / 3600, secs % 3600);
    let hms = format!("{}:{:02}:{:02}", hours, rem / 60, rem % 60);
    if micros == 0 {
        hms
    } else {
        format!("{}.{:06}", hms, micros)
    }
}

/// Parses `H:MM:SS[.f...]`. Fractions beyond microseconds are truncated.
pub fn parse_elapsed(s: &str) -> Option<Duration> {
    let mut parts = s.split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    let seconds = parts.next()?.trim();
    if parts.next().is_some() || hours < 0 || !(0..60).contains(&minutes) {
        return None;
    }
    let (whole, frac) = match seconds.split_once('.') {
        Some((w, f)) => (w, f),
        None => (seconds, ""),
    };
    let whole: i64 = whole.parse().ok()?;
    if !(0..60).contains(&whole) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let micros: i64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<6}", &frac[..frac.len().min(6)]).parse().ok()?
    };
    if hours > MAX_HOURS {
        return None;
    }
    let secs = hours * 3600 + minutes * 60 + whole;
    Duration::try_seconds(secs)?.checked_add(&Duration::microseconds(micros))
}

pub fn encode(record: &TimeRecord) -> String {
    let start = format_datetime(record.start_time());
    let elapsed = format_elapsed(record.banked());
    let note = escape_note(&record.note);
    let fields: [&str; 7] = [
        record.name(),
        &start,
        &elapsed,
        format_bool(record.is_running()),
        &note,
        format_bool(record.archived),
        &record.category,
    ];
    fields.join(DELIMITER)
}

pub fn decode(line: &str) -> Result<TimeRecord> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(Error::MalformedRecord(format!(
            "expected at least {} fields, found {}",
            MIN_FIELDS,
            fields.len()
        )));
    }
    let start_time = parse_datetime(fields[1])
        .ok_or_else(|| Error::MalformedRecord(format!("bad start time '{}'", fields[1])))?;
    let elapsed = parse_elapsed(fields[2])
        .ok_or_else(|| Error::MalformedRecord(format!("bad elapsed time '{}'", fields[2])))?;
    let mut record = TimeRecord::from_parts(
        fields[0].to_string(),
        start_time,
        elapsed,
        fields[3] == "True",
    );
    record.note = unescape_note(fields[4]);
    record.archived = fields.get(5).map(|f| *f == "True").unwrap_or(false);
    record.category = fields
        .get(6)
        .map(|f| f.to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    Ok(record)
}
