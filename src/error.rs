// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Error taxonomy for the watch store, codec and snapshot files.
//!
//! A missed lookup is not an error: `Store::find` returns `None`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A watch with this name is already in the store.
    #[error("a watch named '{0}' already exists")]
    DuplicateName(String),

    /// A persisted line could not be decoded.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A decode failure with the file and 1-based line it came from.
    #[error("{}:{line}: {source}", path.display())]
    InFile {
        path: PathBuf,
        line: usize,
        #[source]
        source: Box<Error>,
    },

    /// Names and categories are single tokens without the field delimiter.
    #[error("invalid name '{0}': must be non-empty without commas or whitespace")]
    InvalidName(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for a decode failure, whether or not it carries a file location.
    pub fn is_malformed(&self) -> bool {
        match self {
            Error::MalformedRecord(_) => true,
            Error::InFile { source, .. } => source.is_malformed(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
