// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! The state every command works on: the working store, where it is saved,
//! and where snapshots go.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::ArchiveDir;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::Store;

#[derive(Debug)]
pub struct Session {
    pub store: Store,
    pub savefile: PathBuf,
    pub archive: ArchiveDir,
    /// Name or index the user last started or continued.
    pub last_active: String,
    /// Cleared by `quit` to end the prompt loop.
    pub running: bool,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

impl Session {
    /// Creates missing directories and loads the working store.
    pub fn open(config: &Config) -> Result<Session> {
        ensure_dir(&config.archive_dir)?;
        if let Some(parent) = config.savefile.parent() {
            ensure_dir(parent)?;
        }
        Ok(Session {
            store: Store::load(&config.savefile)?,
            savefile: config.savefile.clone(),
            archive: ArchiveDir::new(&config.archive_dir),
            last_active: String::new(),
            running: true,
        })
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(&self.savefile)
    }
}
