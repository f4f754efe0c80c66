// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! File locations. Defaults live under `$HOME/Documents`; `POMO_FILE` and
//! `POMO_ARCHIVE_DIR` override them.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Default path segment under `$HOME` for the working store.
const DEFAULT_SAVEFILE: &str = "Documents/pomodoro.txt";

/// Default path segment under `$HOME` for the dated snapshots.
const DEFAULT_ARCHIVE_DIR: &str = "Documents/pomodoro_archive";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub savefile: PathBuf,
    pub archive_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var_os("HOME"),
            env::var_os("POMO_FILE"),
            env::var_os("POMO_ARCHIVE_DIR"),
        )
    }

    fn from_vars(
        home: Option<OsString>,
        savefile: Option<OsString>,
        archive_dir: Option<OsString>,
    ) -> Self {
        let home = home.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        Config {
            savefile: savefile
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(DEFAULT_SAVEFILE)),
            archive_dir: archive_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(DEFAULT_ARCHIVE_DIR)),
        }
    }
}
