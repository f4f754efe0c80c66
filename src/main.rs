// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # pomo — stopwatch time tracker
//!
//! Keeps a set of named stopwatches ("watches") that can be started, paused,
//! continued, annotated, categorized and archived, and reports daily and weekly
//! totals. The working set lives at `$HOME/Documents/pomodoro.txt` by default;
//! `daily` moves it into `$HOME/Documents/pomodoro_archive/pomodoro_daily_YYYYMMDD.txt`.
//!
//! ## Save format
//!
//! One watch per line, see [`codec`]:
//!
//! `name, start_time, elapsed, running, note, archived, category`
//!
//! ## Usage
//!
//! | Invocation          | Description |
//! |---------------------|-------------|
//! | `pomo`              | Interactive `> ` prompt; `help` lists the commands. |
//! | `pomo <cmd> [args]` | Run one command and exit; status 1 on error. |
//!
//! ## Environment
//!
//! | Variable           | Effect |
//! |--------------------|--------|
//! | `POMO_FILE`        | Working store path. |
//! | `POMO_ARCHIVE_DIR` | Snapshot directory. |
//! | `POMO_DEBUG`       | Debug logging on stderr. |
//! | `POMO_LOG`         | `env_logger` filter directives, applied after `POMO_DEBUG`. |

mod archive;
mod codec;
mod commands;
mod config;
mod error;
mod record;
mod report;
mod session;
mod stats;
mod store;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

#[cfg(unix)]
use libc::{signal, SIGPIPE, SIG_DFL};
use log::{debug, LevelFilter};

use crate::commands::Registry;
use crate::config::Config;
use crate::session::Session;

fn init_logging() {
    let level = if env::var_os("POMO_DEBUG").is_some() {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    if let Ok(filters) = env::var("POMO_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

/// Reads commands until `quit` or end of input. Errors are reported and the loop goes on.
fn run_prompt(registry: &Registry, session: &mut Session) -> Result<(), String> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    while session.running {
        print!("> ");
        stdout.flush().map_err(|e| e.to_string())?;
        let mut line = String::new();
        let n = stdin.lock().read_line(&mut line).map_err(|e| e.to_string())?;
        if n == 0 {
            println!();
            return session.save().map_err(|e| e.to_string());
        }
        if let Err(e) = registry.exec(&line, session) {
            eprintln!("ERROR: {}", e);
        }
    }
    Ok(())
}

fn main() {
    init_logging();
    #[cfg(unix)]
    unsafe {
        signal(SIGPIPE, SIG_DFL);
    }
    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env();
    debug!("store {}, archive {}", config.savefile.display(), config.archive_dir.display());

    let mut session = match Session::open(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            if e.is_malformed() {
                eprintln!("Fix or remove that line, then run pomo again.");
            }
            process::exit(1);
        }
    };
    let registry = Registry::standard();

    let result = if args.is_empty() {
        run_prompt(&registry, &mut session)
    } else {
        registry.exec_words(&args, &mut session)
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
