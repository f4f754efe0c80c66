// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Command registry and handlers.
//!
//! Every handler gets the tokenized input (`words[0]` is the keyword as typed)
//! and the session. Handlers that change a watch save the working store.
//!
//! | Command     | Alias   | Description |
//! |-------------|---------|-------------|
//! | `print`     | `p`     | List visible watches with index, elapsed time and state. |
//! | `new`       | `n`     | Create a paused watch. |
//! | `start`     | `s`     | Continue a watch, creating it first if needed. |
//! | `stop`      | `pause` | Pause a watch. |
//! | `cont`      | `c`     | Continue a paused watch. |
//! | `note`      |         | Set a watch's note. |
//! | `cat`       |         | Set a watch's category. |
//! | `archive`   | `a`     | Hide a watch from `print`. |
//! | `unarchive` |         | Show a hidden watch again. |
//! | `pcats`     |         | Totals per category. |
//! | `daily`     |         | Move all watches into today's snapshot. |
//! | `wstats`    |         | This week's totals per watch name. |
//! | `wcats`     |         | This week's totals per category. |
//! | `days`      |         | List snapshot days with their totals. |
//! | `save`      |         | Save the working store. |
//! | `help`      | `h`     | Show this list. |
//! | `quit`      | `q`     | Save and leave the prompt. |

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use crate::record::{self, format_hms, TimeRecord};
use crate::report;
use crate::session::Session;
use crate::stats::{self, Grouping};
use crate::store::{self, Store};

type Handler = fn(&[String], &mut Session) -> Result<(), String>;

enum Action {
    Run(Handler),
    /// Prints the help of the registry doing the dispatch.
    Help,
}

pub struct CommandSpec {
    pub keyword: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    action: Action,
}

#[derive(Default)]
pub struct Registry {
    commands: IndexMap<&'static str, CommandSpec>,
    aliases: HashMap<&'static str, &'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, keyword: &'static str, usage: &'static str, help: &'static str, run: Handler) {
        self.insert(keyword, usage, help, Action::Run(run));
    }

    /// Registers a command that lists this registry's own commands.
    pub fn add_help(&mut self, keyword: &'static str, usage: &'static str, help: &'static str) {
        self.insert(keyword, usage, help, Action::Help);
    }

    fn insert(&mut self, keyword: &'static str, usage: &'static str, help: &'static str, action: Action) {
        self.commands.insert(
            keyword,
            CommandSpec {
                keyword,
                usage,
                help,
                action,
            },
        );
    }

    pub fn alias(&mut self, short: &'static str, keyword: &'static str) {
        self.aliases.insert(short, keyword);
    }

    /// Every built-in command and alias.
    pub fn standard() -> Self {
        let mut r = Registry::new();
        r.add("print", "print", "List all visible watches with index, elapsed time and state.", cmd_print);
        r.add("new", "new <watch_name>", "Create a new, paused watch.", cmd_new);
        r.add(
            "start",
            "start <watch_name/watch_index>",
            "Continue a watch. If it doesn't exist, a new one is created.",
            cmd_start,
        );
        r.add("stop", "stop <watch_name/watch_index>", "Pause the given watch.", cmd_stop);
        r.add("cont", "cont <watch_name/watch_index>", "Continue a paused watch.", cmd_cont);
        r.add(
            "note",
            "note <watch_name/watch_index> [text...]",
            "Set the watch's note; no text clears it.",
            cmd_note,
        );
        r.add("cat", "cat <watch_name/watch_index> <category>", "Set the watch's category.", cmd_cat);
        r.add("archive", "archive <watch_name/watch_index>", "Archive (hide) a watch.", cmd_archive);
        r.add("unarchive", "unarchive <watch_name/watch_index>", "Show an archived watch again.", cmd_unarchive);
        r.add("pcats", "pcats", "Print total times for all categories.", cmd_pcats);
        r.add(
            "daily",
            "daily",
            "Print all watches and move them to today's snapshot file.",
            cmd_daily,
        );
        r.add("wstats", "wstats", "Weekly totals per watch name, Monday until today.", cmd_wstats);
        r.add("wcats", "wcats", "Weekly totals per category, Monday until today.", cmd_wcats);
        r.add("days", "days", "List snapshot days with their total time.", cmd_days);
        r.add("save", "save", "Save the status.", cmd_save);
        r.add_help("help", "help", "Print this help message.");
        r.add("quit", "quit", "Save the status of all watches and quit.", cmd_quit);

        r.alias("q", "quit");
        r.alias("p", "print");
        r.alias("n", "new");
        r.alias("s", "start");
        r.alias("h", "help");
        r.alias("a", "archive");
        r.alias("c", "cont");
        r.alias("pause", "stop");
        r
    }

    /// Looks up a keyword, aliases first, ignoring case.
    pub fn resolve(&self, word: &str) -> Option<&CommandSpec> {
        let word = word.to_lowercase();
        let keyword = self.aliases.get(word.as_str()).copied().unwrap_or(word.as_str());
        self.commands.get(keyword)
    }

    /// Splits a prompt line on whitespace and runs it. Blank input does nothing.
    pub fn exec(&self, input: &str, session: &mut Session) -> Result<(), String> {
        let words: Vec<String> = input.split_whitespace().map(String::from).collect();
        if words.is_empty() {
            return Ok(());
        }
        self.exec_words(&words, session)
    }

    pub fn exec_words(&self, words: &[String], session: &mut Session) -> Result<(), String> {
        let first = match words.first() {
            Some(w) => w,
            None => return Ok(()),
        };
        let cmd = self
            .resolve(first)
            .ok_or_else(|| format!("Unknown command '{}'", words.join(" ")))?;
        debug!("dispatching {:?} to {}", first, cmd.keyword);
        match cmd.action {
            Action::Run(run) => run(words, session),
            Action::Help => {
                println!();
                print!("{}", self.help_text());
                Ok(())
            }
        }
    }

    /// One block per command: keyword with aliases, usage, help.
    pub fn help_text(&self) -> String {
        let mut out = String::new();
        for cmd in self.commands.values() {
            let mut aliases: Vec<&str> = self
                .aliases
                .iter()
                .filter(|(_, k)| **k == cmd.keyword)
                .map(|(s, _)| *s)
                .collect();
            aliases.sort_unstable();
            out.push_str(&format!(" {}", cmd.keyword));
            for a in aliases {
                out.push_str(&format!(", {}", a));
            }
            out.push_str(&format!(":\n    {}\n\n    Usage: {}\n\n", cmd.help, cmd.usage));
        }
        out
    }
}

/// The watch key argument, or the usage line as the error.
fn key_arg<'a>(words: &'a [String], usage: &str) -> Result<&'a str, String> {
    words
        .get(1)
        .map(String::as_str)
        .ok_or_else(|| format!("no watch name or index given\nUsage: {}", usage))
}

fn find_watch<'a>(store: &'a mut Store, key: &str) -> Result<&'a mut TimeRecord, String> {
    store
        .find_mut(key)
        .ok_or_else(|| format!("can't find watch '{}'", key))
}

fn save(session: &Session) -> Result<(), String> {
    session.save().map_err(|e| e.to_string())
}

fn print_watches(session: &Session) {
    println!("{} watches", session.store.len());
    for (i, w) in session.store.visible() {
        println!("[{:3}] {}", i, w.display_line());
    }
    println!("last active: '{}'", session.last_active);
}

fn print_categories(store: &Store) {
    for (cat, d) in store.sum_by_category().iter() {
        println!("{:24} {}", cat, format_hms(d));
    }
}

fn cmd_print(_words: &[String], session: &mut Session) -> Result<(), String> {
    print_watches(session);
    Ok(())
}

fn cmd_new(words: &[String], session: &mut Session) -> Result<(), String> {
    let name = key_arg(words, "new <watch_name>")?;
    session
        .store
        .add(TimeRecord::new(name))
        .map_err(|e| e.to_string())?;
    println!("creating new watch '{}'", name);
    session.last_active = name.to_string();
    save(session)
}

fn cmd_start(words: &[String], session: &mut Session) -> Result<(), String> {
    let key = key_arg(words, "start <watch_name/watch_index>")?;
    if session.store.find(key).is_none() {
        session
            .store
            .add(TimeRecord::new(key))
            .map_err(|e| e.to_string())?;
        println!("creating new watch '{}'", key);
    }
    let w = find_watch(&mut session.store, key)?;
    w.resume();
    println!("continuing '{}', {}", w.name(), format_hms(w.get_elapsed()));
    session.last_active = key.to_string();
    save(session)
}

fn cmd_stop(words: &[String], session: &mut Session) -> Result<(), String> {
    let key = key_arg(words, "stop <watch_name/watch_index>")?;
    let w = find_watch(&mut session.store, key)?;
    if w.pause() {
        println!("pausing '{}', elapsed: {}", w.name(), format_hms(w.get_elapsed()));
    } else {
        println!("'{}' is not running, elapsed: {}", w.name(), format_hms(w.get_elapsed()));
    }
    save(session)
}

fn cmd_cont(words: &[String], session: &mut Session) -> Result<(), String> {
    let key = key_arg(words, "cont <watch_name/watch_index>")?;
    let w = find_watch(&mut session.store, key)?;
    if w.resume() {
        println!("continuing '{}'", w.name());
    } else {
        println!("'{}' is already running", w.name());
    }
    session.last_active = key.to_string();
    save(session)
}

fn cmd_note(words: &[String], session: &mut Session) -> Result<(), String> {
    let key = key_arg(words, "note <watch_name/watch_index> [text...]")?;
    let w = find_watch(&mut session.store, key)?;
    w.note = words[2..].join(" ");
    println!("note for '{}': '{}'", w.name(), w.note);
    save(session)
}

fn cmd_cat(words: &[String], session: &mut Session) -> Result<(), String> {
    let usage = "cat <watch_name/watch_index> <category>";
    let key = key_arg(words, usage)?;
    let category = words
        .get(2)
        .ok_or_else(|| format!("no category given\nUsage: {}", usage))?;
    store::validate_name(category).map_err(|e| e.to_string())?;
    let w = find_watch(&mut session.store, key)?;
    w.category = category.clone();
    println!("'{}' is now in category '{}'", w.name(), w.category);
    save(session)
}

fn set_archived(words: &[String], session: &mut Session, archived: bool, usage: &str) -> Result<(), String> {
    let key = key_arg(words, usage)?;
    let w = find_watch(&mut session.store, key)?;
    w.archived = archived;
    println!("{} '{}'", if archived { "archived" } else { "unarchived" }, w.name());
    save(session)
}

fn cmd_archive(words: &[String], session: &mut Session) -> Result<(), String> {
    set_archived(words, session, true, "archive <watch_name/watch_index>")
}

fn cmd_unarchive(words: &[String], session: &mut Session) -> Result<(), String> {
    set_archived(words, session, false, "unarchive <watch_name/watch_index>")
}

fn cmd_pcats(_words: &[String], session: &mut Session) -> Result<(), String> {
    print_categories(&session.store);
    Ok(())
}

fn cmd_daily(_words: &[String], session: &mut Session) -> Result<(), String> {
    print_watches(session);
    print_categories(&session.store);
    let count = session.store.len();
    let path = session
        .archive
        .write_snapshot(&mut session.store, record::now())
        .map_err(|e| e.to_string())?;
    println!("archived {} watches to {}", count, path.display());
    save(session)
}

fn weekly(session: &Session, grouping: Grouping) -> Result<(), String> {
    let now = record::now();
    let week = stats::weekly_rollup(&session.archive, now.date(), grouping, &session.store, now)
        .map_err(|e| e.to_string())?;
    print!("{}", report::weekly(&week));
    Ok(())
}

fn cmd_wstats(_words: &[String], session: &mut Session) -> Result<(), String> {
    weekly(session, Grouping::Name)
}

fn cmd_wcats(_words: &[String], session: &mut Session) -> Result<(), String> {
    weekly(session, Grouping::Category)
}

fn cmd_days(_words: &[String], session: &mut Session) -> Result<(), String> {
    let snapshots = session.archive.snapshots().map_err(|e| e.to_string())?;
    if snapshots.is_empty() {
        println!("No snapshots in {}.", session.archive.dir().display());
        return Ok(());
    }
    for (date, path) in snapshots {
        let day = Store::load(&path).map_err(|e| e.to_string())?;
        println!(
            "{}  {}  ({} watches)",
            date.format("%a %Y-%m-%d"),
            format_hms(day.sum_by_name().total()),
            day.len()
        );
    }
    Ok(())
}

fn cmd_save(_words: &[String], session: &mut Session) -> Result<(), String> {
    save(session)
}

fn cmd_quit(_words: &[String], session: &mut Session) -> Result<(), String> {
    session.running = false;
    save(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Duration;
    use std::fs;
    use tempfile::TempDir;

    fn session() -> (TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            savefile: dir.path().join("pomodoro.txt"),
            archive_dir: dir.path().join("pomodoro_archive"),
        };
        let s = Session::open(&config).unwrap();
        (dir, s)
    }

    fn run(r: &Registry, s: &mut Session, input: &str) -> Result<(), String> {
        r.exec(input, s)
    }

    #[test]
    fn test_resolve_aliases_and_case() {
        let r = Registry::standard();
        assert_eq!(r.resolve("q").unwrap().keyword, "quit");
        assert_eq!(r.resolve("PAUSE").unwrap().keyword, "stop");
        assert_eq!(r.resolve("Print").unwrap().keyword, "print");
        assert!(r.resolve("frobnicate").is_none());
    }

    #[test]
    fn test_unknown_command() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        let err = run(&r, &mut s, "frobnicate now").unwrap_err();
        assert_eq!(err, "Unknown command 'frobnicate now'");
    }

    #[test]
    fn test_blank_input_is_noop() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        assert!(run(&r, &mut s, "   ").is_ok());
        assert!(!s.savefile.exists());
    }

    #[test]
    fn test_new_saves_and_rejects_duplicate() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "new coding").unwrap();
        assert_eq!(s.last_active, "coding");
        assert!(!s.store.find("coding").unwrap().is_running());
        assert_eq!(Store::load(&s.savefile).unwrap().len(), 1);
        let err = run(&r, &mut s, "n coding").unwrap_err();
        assert!(err.contains("already exists"), "{}", err);
        assert_eq!(s.store.len(), 1);
    }

    #[test]
    fn test_new_without_name_is_usage_error() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        let err = run(&r, &mut s, "new").unwrap_err();
        assert!(err.contains("Usage: new <watch_name>"));
    }

    #[test]
    fn test_start_creates_and_runs() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "s coding").unwrap();
        assert!(s.store.find("coding").unwrap().is_running());
        let saved = Store::load(&s.savefile).unwrap();
        assert!(saved.find("coding").unwrap().is_running());
    }

    #[test]
    fn test_stop_and_cont_by_index() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "start a").unwrap();
        run(&r, &mut s, "start b").unwrap();
        run(&r, &mut s, "stop 1").unwrap();
        assert!(!s.store.find("b").unwrap().is_running());
        assert!(s.store.find("a").unwrap().is_running());
        run(&r, &mut s, "c 1").unwrap();
        assert!(s.store.find("b").unwrap().is_running());
        assert_eq!(s.last_active, "1");
    }

    #[test]
    fn test_stop_twice_keeps_elapsed() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "start a").unwrap();
        run(&r, &mut s, "stop a").unwrap();
        let banked = s.store.find("a").unwrap().banked();
        run(&r, &mut s, "pause a").unwrap();
        assert_eq!(s.store.find("a").unwrap().banked(), banked);
    }

    #[test]
    fn test_missing_watch_is_error() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        let err = run(&r, &mut s, "stop ghost").unwrap_err();
        assert_eq!(err, "can't find watch 'ghost'");
        assert!(run(&r, &mut s, "cont 0").is_err());
    }

    #[test]
    fn test_note_with_comma_persists() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "new a").unwrap();
        run(&r, &mut s, "note a hello, world").unwrap();
        let saved = Store::load(&s.savefile).unwrap();
        assert_eq!(saved.find("a").unwrap().note, "hello, world");
        run(&r, &mut s, "note a").unwrap();
        assert!(s.store.find("a").unwrap().note.is_empty());
    }

    #[test]
    fn test_cat_sets_and_validates_category() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "new a").unwrap();
        run(&r, &mut s, "cat a work").unwrap();
        assert_eq!(s.store.find("a").unwrap().category, "work");
        assert!(run(&r, &mut s, "cat a x,y").is_err());
        assert!(run(&r, &mut s, "cat a").is_err());
        assert_eq!(s.store.find("a").unwrap().category, "work");
    }

    #[test]
    fn test_archive_hides_but_keeps_index() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "new a").unwrap();
        run(&r, &mut s, "new b").unwrap();
        run(&r, &mut s, "a 0").unwrap();
        assert!(s.store.find("a").unwrap().archived);
        assert_eq!(s.store.visible().count(), 1);
        assert!(Store::load(&s.savefile).unwrap().find("a").unwrap().archived);
        run(&r, &mut s, "unarchive 0").unwrap();
        assert_eq!(s.store.visible().count(), 2);
    }

    #[test]
    fn test_daily_moves_watches_to_snapshot() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "start a").unwrap();
        run(&r, &mut s, "new b").unwrap();
        run(&r, &mut s, "daily").unwrap();
        assert!(s.store.is_empty());
        assert!(Store::load(&s.savefile).unwrap().is_empty());
        let snapshots = s.archive.snapshots().unwrap();
        assert_eq!(snapshots.len(), 1);
        let snap = Store::load(&snapshots[0].1).unwrap();
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|w| !w.is_running()));
        // The name is free again after archiving.
        run(&r, &mut s, "new a").unwrap();
    }

    #[test]
    fn test_daily_failure_keeps_watches() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "start a").unwrap();
        run(&r, &mut s, "new b").unwrap();
        fs::remove_dir_all(s.archive.dir()).unwrap();
        assert!(run(&r, &mut s, "daily").is_err());
        assert_eq!(s.store.len(), 2);
        assert!(s.store.find("a").unwrap().is_running());
        assert_eq!(Store::load(&s.savefile).unwrap().len(), 2);
    }

    #[test]
    fn test_weekly_reports_and_days_run() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        run(&r, &mut s, "new a").unwrap();
        run(&r, &mut s, "daily").unwrap();
        run(&r, &mut s, "new b").unwrap();
        assert!(run(&r, &mut s, "wstats").is_ok());
        assert!(run(&r, &mut s, "wcats").is_ok());
        assert!(run(&r, &mut s, "days").is_ok());
        assert!(run(&r, &mut s, "pcats").is_ok());
        assert!(run(&r, &mut s, "p").is_ok());
    }

    #[test]
    fn test_weekly_surfaces_malformed_snapshot() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        let today = record::now().date();
        fs::write(s.archive.daily_path(today), "broken\n").unwrap();
        let err = run(&r, &mut s, "wcats").unwrap_err();
        assert!(err.contains("malformed record"), "{}", err);
    }

    #[test]
    fn test_quit_stops_loop_and_saves() {
        let r = Registry::standard();
        let (_dir, mut s) = session();
        s.store.add(TimeRecord::new("a")).unwrap();
        run(&r, &mut s, "q").unwrap();
        assert!(!s.running);
        assert_eq!(Store::load(&s.savefile).unwrap().len(), 1);
    }

    #[test]
    fn test_help_lists_aliases() {
        let text = Registry::standard().help_text();
        assert!(text.contains(" quit, q:\n"));
        assert!(text.contains(" stop, pause:\n"));
        assert!(text.contains("Usage: new <watch_name>"));
    }

    #[test]
    fn test_help_describes_dispatching_registry() {
        let mut r = Registry::new();
        r.add("save", "save", "Save the status.", cmd_save);
        r.add_help("help", "help", "Print this help message.");
        r.alias("?", "help");
        let text = r.help_text();
        assert!(text.contains(" help, ?:\n"));
        assert!(text.contains(" save:\n"));
        assert!(!text.contains("quit"));
        assert!(matches!(r.resolve("?").unwrap().action, Action::Help));
        let (_dir, mut s) = session();
        assert!(run(&r, &mut s, "?").is_ok());
        assert!(!s.savefile.exists());
    }

    #[test]
    fn test_elapsed_survives_save_reload() {
        let (_dir, mut s) = session();
        let w = s.store.add(TimeRecord::new("a")).unwrap();
        let t0 = w.start_time();
        w.resume_at(t0);
        w.pause_at(t0 + Duration::seconds(90));
        s.save().unwrap();
        let saved = Store::load(&s.savefile).unwrap();
        assert_eq!(saved.find("a").unwrap().banked(), Duration::seconds(90));
    }
}
