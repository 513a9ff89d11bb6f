//! Connection state for the console.
//!
//! A `Session` owns at most one live `QueueClient`. Every operation that
//! talks to the server goes through `client()`, which fails with
//! `Error::NotConnected` before any I/O when there is no connection.

use std::time::Duration;

use crate::client::{Connector, Job, JobState, PutOptions, QueueClient, Stats};
use crate::{blog, blog_debug, blog_warn, Error, Result};

/// Ready/delayed/buried counts for one tube, as shown by `list-tubes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TubeSummary {
    pub name: String,
    pub ready: String,
    pub delayed: String,
    pub buried: String,
}

pub struct Session {
    connector: Box<dyn Connector>,
    client: Option<Box<dyn QueueClient>>,
    host: String,
    port: u16,
    current_tube: String,
    timeout: Duration,
}

impl Session {
    /// A disconnected session that will dial through `connector`.
    pub fn new(connector: Box<dyn Connector>, timeout: Duration) -> Self {
        Self {
            connector,
            client: None,
            host: String::new(),
            port: 0,
            current_tube: String::new(),
            timeout,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn client(&mut self, op: &'static str) -> Result<&mut Box<dyn QueueClient>> {
        self.client.as_mut().ok_or(Error::NotConnected(op))
    }

    /// Dial `host:port`. On failure nothing changes, so an existing
    /// connection stays usable. On success the old client is closed and
    /// replaced, and the current tube resets to the server's default.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        blog!("Session::connect host={} port={}", host, port);
        let mut client = self.connector.connect(host, port, self.timeout)?;
        let tube = client.used_tube()?;

        if let Some(mut old) = self.client.take() {
            if let Err(e) = old.close() {
                blog_warn!("Closing previous connection failed: {}", e);
            }
        }

        self.client = Some(client);
        self.host = host.to_string();
        self.port = port;
        self.current_tube = tube;
        blog!("Connected to {}:{} using '{}'", host, port, self.current_tube);
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<()> {
        let mut client = self.client.take().ok_or(Error::NotConnected("disconnect"))?;
        blog!("Session::disconnect {}:{}", self.host, self.port);
        client.close()
    }

    /// Record `name` as the current tube. Tubes spring into existence on
    /// first use, so nothing is checked against the server.
    pub fn use_tube(&mut self, name: &str) {
        blog_debug!("Session::use_tube {}", name);
        self.current_tube = name.to_string();
    }

    pub fn current_tube_name(&self) -> Result<&str> {
        if !self.is_connected() {
            return Err(Error::NotConnected("determine current tube"));
        }
        Ok(&self.current_tube)
    }

    pub fn connection_string(&self) -> Result<String> {
        if !self.is_connected() {
            return Err(Error::NotConnected("show connection info"));
        }
        Ok(format!("{}:{}", self.host, self.port))
    }

    pub fn put(&mut self, tube: &str, body: &[u8], options: PutOptions) -> Result<u64> {
        let client = self.client("put")?;
        client.use_tube(tube)?;
        client.put(body, options)
    }

    pub fn peek(&mut self, tube: &str, state: JobState) -> Result<Job> {
        self.client("peek")?.peek(tube, state)
    }

    pub fn peek_job(&mut self, id: u64) -> Result<Vec<u8>> {
        self.client("peek")?.peek_job(id)
    }

    pub fn delete(&mut self, id: u64) -> Result<()> {
        self.client("delete")?.delete(id)
    }

    pub fn bury(&mut self, id: u64, priority: u32) -> Result<()> {
        self.client("bury")?.bury(id, priority)
    }

    pub fn kick(&mut self, tube: &str, bound: u64) -> Result<u64> {
        self.client("kick")?.kick(tube, bound)
    }

    pub fn list_tubes(&mut self) -> Result<Vec<String>> {
        self.client("list tubes")?.list_tubes()
    }

    /// Per-tube job counts for every tube. Tubes that disappear between
    /// listing and querying are skipped.
    pub fn tube_summaries(&mut self) -> Result<Vec<TubeSummary>> {
        let client = self.client("get tube stats")?;
        let mut tubes = client.list_tubes()?;
        tubes.sort();

        let mut summaries = Vec::with_capacity(tubes.len());
        for name in tubes {
            let stats = match client.stats_tube(&name) {
                Ok(stats) => stats,
                Err(e) if e.is_not_found() => {
                    blog_debug!("Tube '{}' vanished before stats-tube", name);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let count = |state: JobState| stats.get(state.stats_key()).cloned().unwrap_or_default();
            summaries.push(TubeSummary {
                ready: count(JobState::Ready),
                delayed: count(JobState::Delayed),
                buried: count(JobState::Buried),
                name,
            });
        }
        Ok(summaries)
    }

    pub fn stats(&mut self) -> Result<Stats> {
        self.client("provide stats")?.stats()
    }

    pub fn stats_tube(&mut self, tube: &str) -> Result<Stats> {
        self.client("stats tubes")?.stats_tube(tube)
    }

    pub fn stats_job(&mut self, id: u64) -> Result<Stats> {
        self.client("stats job")?.stats_job(id)
    }
}
