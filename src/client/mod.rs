//! Capabilities the console needs from a beanstalkd server.
//!
//! `QueueClient` is one live connection; `Connector` produces them. The
//! session only ever talks to these traits, so the TCP client and the
//! in-memory mock are interchangeable.

pub mod beanstalk;
pub mod mock;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::{Error, Result};

pub use beanstalk::{BeanstalkClient, TcpConnector};

/// Name of the tube every fresh beanstalkd connection uses.
pub const DEFAULT_TUBE: &str = "default";

/// Longest tube name beanstalkd accepts, in bytes.
pub const MAX_TUBE_NAME_LEN: usize = 200;

/// Check `name` against beanstalkd's tube name rules: 1 to 200 bytes of
/// `A-Z a-z 0-9 - + / ; . $ _ ( )`, not starting with `-`. Names go onto
/// the wire verbatim, so anything else is refused before any I/O.
pub fn validate_tube_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(Error::Validation(format!(
            "invalid tube name '{}': {}",
            name.escape_default(),
            reason
        )))
    };
    if name.is_empty() {
        return invalid("empty");
    }
    if name.len() > MAX_TUBE_NAME_LEN {
        return invalid("longer than 200 bytes");
    }
    if name.starts_with('-') {
        return invalid("starts with '-'");
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || "-+/;.$_()".contains(c);
    if let Some(c) = name.chars().find(|&c| !allowed(c)) {
        return invalid(&format!("'{}' is not allowed", c.escape_default()));
    }
    Ok(())
}

/// Flat `key: value` stats document as returned by `stats*` commands.
pub type Stats = BTreeMap<String, String>;

/// The three job states a tube can be peeked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Ready,
    Delayed,
    Buried,
}

impl JobState {
    /// Registration order for the generated command families.
    pub const ALL: [JobState; 3] = [JobState::Buried, JobState::Delayed, JobState::Ready];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Ready => "ready",
            JobState::Delayed => "delayed",
            JobState::Buried => "buried",
        }
    }

    /// First letter, used for the `p?`/`d?` aliases.
    pub fn initial(&self) -> char {
        match self {
            JobState::Ready => 'r',
            JobState::Delayed => 'd',
            JobState::Buried => 'b',
        }
    }

    /// Protocol verb that peeks the head of this state on the used tube.
    pub fn peek_verb(&self) -> &'static str {
        match self {
            JobState::Ready => "peek-ready",
            JobState::Delayed => "peek-delayed",
            JobState::Buried => "peek-buried",
        }
    }

    /// Key in `stats-tube` output counting jobs in this state.
    pub fn stats_key(&self) -> &'static str {
        match self {
            JobState::Ready => "current-jobs-ready",
            JobState::Delayed => "current-jobs-delayed",
            JobState::Buried => "current-jobs-buried",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u64,
    pub body: Vec<u8>,
}

impl Job {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions {
    pub priority: u32,
    pub delay: Duration,
    pub ttr: Duration,
}

impl From<crate::config::PutDefaults> for PutOptions {
    fn from(defaults: crate::config::PutDefaults) -> Self {
        Self {
            priority: defaults.priority,
            delay: Duration::from_secs(defaults.delay_secs),
            ttr: Duration::from_secs(defaults.ttr_secs),
        }
    }
}

/// One live connection to a queue server.
pub trait QueueClient {
    /// Tube the connection currently `use`s.
    fn used_tube(&mut self) -> Result<String>;
    fn use_tube(&mut self, tube: &str) -> Result<()>;
    /// Put onto the tube selected with `use_tube`.
    fn put(&mut self, body: &[u8], options: PutOptions) -> Result<u64>;
    fn peek(&mut self, tube: &str, state: JobState) -> Result<Job>;
    fn peek_job(&mut self, id: u64) -> Result<Vec<u8>>;
    fn delete(&mut self, id: u64) -> Result<()>;
    fn bury(&mut self, id: u64, priority: u32) -> Result<()>;
    /// Kick up to `bound` jobs on `tube`; returns how many moved.
    fn kick(&mut self, tube: &str, bound: u64) -> Result<u64>;
    fn list_tubes(&mut self) -> Result<Vec<String>>;
    fn stats(&mut self) -> Result<Stats>;
    fn stats_tube(&mut self, tube: &str) -> Result<Stats>;
    fn stats_job(&mut self, id: u64) -> Result<Stats>;
    fn close(&mut self) -> Result<()>;
}

/// Dials servers, yielding a fresh client per call.
pub trait Connector {
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<Box<dyn QueueClient>>;
}
