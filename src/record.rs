// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! A single named stopwatch and its time accounting.
//!
//! Elapsed time is `elapsed` (banked from finished run segments) plus the live
//! segment `now - start_time` while running. Pause and resume are idempotent:
//! pausing a paused watch or resuming a running one changes nothing.

use chrono::{Duration, Local, NaiveDateTime, SubsecRound};

/// Category assigned to a watch until the user sets one.
pub const DEFAULT_CATEGORY: &str = "none";

/// Local wall-clock time, truncated to the microsecond precision of the save format.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Formats a duration as `HH:MM:SS` (hours not wrapped at 24), dropping fractions.
pub fn format_hms(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (hours, rem) = (secs / 3600, secs % 3600);
    format!("{:02}:{:02}:{:02}", hours, rem / 60, rem % 60)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRecord {
    name: String,
    start_time: NaiveDateTime,
    elapsed: Duration,
    running: bool,
    pub note: String,
    pub archived: bool,
    pub category: String,
}

impl TimeRecord {
    /// A paused watch with nothing banked.
    pub fn new(name: impl Into<String>) -> Self {
        Self::new_at(name, now())
    }

    pub fn new_at(name: impl Into<String>, at: NaiveDateTime) -> Self {
        TimeRecord {
            name: name.into(),
            start_time: at,
            elapsed: Duration::zero(),
            running: false,
            note: String::new(),
            archived: false,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Rebuilds a record from decoded fields.
    pub(crate) fn from_parts(
        name: String,
        start_time: NaiveDateTime,
        elapsed: Duration,
        running: bool,
    ) -> Self {
        TimeRecord {
            name,
            start_time,
            elapsed,
            running,
            note: String::new(),
            archived: false,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    /// Time banked from finished run segments, excluding any live segment.
    pub fn banked(&self) -> Duration {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Banks the live segment and stops. Returns false if already paused.
    pub fn pause(&mut self) -> bool {
        self.pause_at(now())
    }

    pub fn pause_at(&mut self, at: NaiveDateTime) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed = self.elapsed + self.live_segment(at);
        self.running = false;
        true
    }

    /// Starts a new segment at the current time. Returns false if already running.
    pub fn resume(&mut self) -> bool {
        self.resume_at(now())
    }

    pub fn resume_at(&mut self, at: NaiveDateTime) -> bool {
        if self.running {
            return false;
        }
        self.start_time = at;
        self.running = true;
        true
    }

    /// Total elapsed time including the live segment.
    pub fn get_elapsed(&self) -> Duration {
        self.elapsed_at(now())
    }

    pub fn elapsed_at(&self, at: NaiveDateTime) -> Duration {
        if self.running {
            self.elapsed + self.live_segment(at)
        } else {
            self.elapsed
        }
    }

    /// Adds time banked elsewhere (same watch archived twice in a day).
    pub(crate) fn bank(&mut self, extra: Duration) {
        self.elapsed = self.elapsed + extra;
    }

    // A start time in the future (clock skew) contributes nothing.
    fn live_segment(&self, at: NaiveDateTime) -> Duration {
        (at - self.start_time).max(Duration::zero())
    }

    /// One listing line: name, elapsed `HH:MM:SS`, running flag.
    pub fn display_line(&self) -> String {
        format!(
            "{:16} | {} | {}",
            self.name,
            format_hms(self.get_elapsed()),
            if self.running { "True" } else { "False" }
        )
    }
}
