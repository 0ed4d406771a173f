//! # Script interpreter module
//!
//! This module provides an interpreter for timed scripts, allowing events
//! (for example operator input) to be replayed from a file. Each entry in a
//! script has the form
//!
//! ```text
//! <time_s>: <json payload>;
//! ```
//!
//! where `time_s` is the time after the start of the script at which the
//! payload becomes pending.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An entry which is scripted to occur at a specific time.
struct Entry<T> {
    /// The time the entry is supposed to execute at
    exec_time_s: f64,

    /// The payload of the entry
    payload: T
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending`
/// to acquire a list of payloads that need executing.
pub struct ScriptInterpreter<T> {
    _script_path: Option<PathBuf>,
    entries: VecDeque<Entry<T>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid entry at {0} s: {1}")]
    InvalidEntry(f64, serde_json::Error)
}

/// Payloads pending execution.
#[derive(Debug, PartialEq)]
pub enum Pending<T> {
    None,
    Some(Vec<T>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> ScriptInterpreter<T>
where
    T: DeserializeOwned
{

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        let mut si = Self::from_str(&script)?;
        si._script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {

        // Empty queue of entries
        let mut queue: Vec<Entry<T>> = Vec::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is invalid");

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let exec_time_s: f64 = match cap[1].parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            // Parse the payload, the scripts contain JSON only.
            let payload = match serde_json::from_str(&cap[3]) {
                Ok(p) => p,
                Err(e) => return Err(ScriptError::InvalidEntry(
                    exec_time_s, e
                ))
            };

            queue.push(Entry {
                exec_time_s,
                payload
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        // Entries may be written out of order, a stable sort keeps entries
        // with equal times in the order they were written.
        queue.sort_by(|a, b| a.exec_time_s
            .partial_cmp(&b.exec_time_s)
            .unwrap_or(std::cmp::Ordering::Equal));

        Ok(ScriptInterpreter {
            _script_path: None,
            entries: queue.into()
        })
    }

    /// Return a vector of pending payloads, or `None` if nothing needs
    /// executing at `current_time_s`.
    pub fn get_pending(&mut self, current_time_s: f64) -> Pending<T> {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.entries.is_empty() {
            return Pending::EndOfScript
        }

        let mut pending: Vec<T> = vec![];

        // Pop items from the queue while the head's exec time is not after
        // the current time.
        while let Some(entry) = self.entries.front() {
            if entry.exec_time_s > current_time_s {
                break
            }

            if let Some(entry) = self.entries.pop_front() {
                pending.push(entry.payload);
            }
        }

        if pending.len() > 0 {
            Pending::Some(pending)
        }
        else {
            Pending::None
        }
    }

    /// Get the number of entries remaining in the script
    pub fn get_num_entries(&self) -> usize {
        self.entries.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.entries.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }
}
