//! In-memory queue server for tests.
//!
//! `MockServer` is a `Connector`; every client it hands out shares the same
//! job store, records each call, and can be told to fail.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{Connector, Job, JobState, PutOptions, QueueClient, Stats, DEFAULT_TUBE};
use crate::error::ProtocolError;
use crate::{Error, Result};

/// A recorded call against the mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect { host: String, port: u16 },
    UsedTube,
    Use(String),
    Put { tube: String, body: Vec<u8> },
    Peek { tube: String, state: JobState },
    PeekJob(u64),
    Delete(u64),
    Bury(u64),
    Kick { tube: String, bound: u64 },
    ListTubes,
    Stats,
    StatsTube(String),
    StatsJob(u64),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockJob {
    pub id: u64,
    pub tube: String,
    pub state: JobState,
    pub priority: u32,
    pub body: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    jobs: BTreeMap<u64, MockJob>,
    tubes: BTreeSet<String>,
    calls: Vec<MockCall>,
    /// Scripted peek outcomes; `None` lets that peek through.
    peek_faults: VecDeque<Option<ProtocolError>>,
    refuse_connections: bool,
}

#[derive(Debug, Clone)]
pub struct MockServer {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    pub fn new() -> Self {
        let mut state = MockState::default();
        state.tubes.insert(DEFAULT_TUBE.to_string());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed a job directly, bypassing any client. Returns its id.
    pub fn add_job(&self, tube: &str, state: JobState, body: &[u8]) -> u64 {
        let mut guard = self.lock();
        guard.insert_job(tube, state, 1, body)
    }

    /// Make the next peek fail with `err`. Queued faults fire in order.
    pub fn fail_next_peek(&self, err: ProtocolError) {
        self.fail_peek_after(0, err);
    }

    /// Let `successes` further peeks through, then fail one with `err`.
    pub fn fail_peek_after(&self, successes: usize, err: ProtocolError) {
        let mut guard = self.lock();
        guard.peek_faults.extend((0..successes).map(|_| None));
        guard.peek_faults.push_back(Some(err));
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.lock().refuse_connections = refuse;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn job(&self, id: u64) -> Option<MockJob> {
        self.lock().jobs.get(&id).cloned()
    }

    pub fn count(&self, tube: &str, state: JobState) -> usize {
        self.lock()
            .jobs
            .values()
            .filter(|job| job.tube == tube && job.state == state)
            .count()
    }

    fn record(&self, call: MockCall) {
        self.lock().calls.push(call);
    }
}

impl MockState {
    fn insert_job(&mut self, tube: &str, state: JobState, priority: u32, body: &[u8]) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.tubes.insert(tube.to_string());
        self.jobs.insert(
            id,
            MockJob {
                id,
                tube: tube.to_string(),
                state,
                priority,
                body: body.to_vec(),
            },
        );
        id
    }

    fn oldest(&self, tube: &str, state: JobState) -> Option<&MockJob> {
        self.jobs
            .values()
            .filter(|job| job.tube == tube && job.state == state)
            .min_by_key(|job| (job.priority, job.id))
    }

    fn tube_counts(&self, tube: Option<&str>) -> Stats {
        let mut stats = Stats::new();
        for state in JobState::ALL {
            let count = self
                .jobs
                .values()
                .filter(|job| job.state == state && tube.map_or(true, |t| job.tube == t))
                .count();
            stats.insert(state.stats_key().to_string(), count.to_string());
        }
        stats
    }
}

impl Connector for MockServer {
    fn connect(&self, host: &str, port: u16, _timeout: Duration) -> Result<Box<dyn QueueClient>> {
        self.record(MockCall::Connect {
            host: host.to_string(),
            port,
        });
        if self.lock().refuse_connections {
            return Err(Error::Connection {
                address: format!("{}:{}", host, port),
                source: std::io::Error::new(ErrorKind::ConnectionRefused, "connection refused"),
            });
        }
        Ok(Box::new(MockClient {
            server: self.clone(),
            used: DEFAULT_TUBE.to_string(),
        }))
    }
}

pub struct MockClient {
    server: MockServer,
    used: String,
}

impl QueueClient for MockClient {
    fn used_tube(&mut self) -> Result<String> {
        self.server.record(MockCall::UsedTube);
        Ok(self.used.clone())
    }

    fn use_tube(&mut self, tube: &str) -> Result<()> {
        self.server.record(MockCall::Use(tube.to_string()));
        self.server.lock().tubes.insert(tube.to_string());
        self.used = tube.to_string();
        Ok(())
    }

    fn put(&mut self, body: &[u8], options: PutOptions) -> Result<u64> {
        self.server.record(MockCall::Put {
            tube: self.used.clone(),
            body: body.to_vec(),
        });
        let state = if options.delay.is_zero() {
            JobState::Ready
        } else {
            JobState::Delayed
        };
        Ok(self
            .server
            .lock()
            .insert_job(&self.used, state, options.priority, body))
    }

    fn peek(&mut self, tube: &str, state: JobState) -> Result<Job> {
        self.server.record(MockCall::Peek {
            tube: tube.to_string(),
            state,
        });
        let mut guard = self.server.lock();
        if let Some(Some(err)) = guard.peek_faults.pop_front() {
            return Err(err.into());
        }
        guard
            .oldest(tube, state)
            .map(|job| Job {
                id: job.id,
                body: job.body.clone(),
            })
            .ok_or(Error::Protocol(ProtocolError::NotFound))
    }

    fn peek_job(&mut self, id: u64) -> Result<Vec<u8>> {
        self.server.record(MockCall::PeekJob(id));
        self.server
            .job(id)
            .map(|job| job.body)
            .ok_or(Error::Protocol(ProtocolError::NotFound))
    }

    fn delete(&mut self, id: u64) -> Result<()> {
        self.server.record(MockCall::Delete(id));
        match self.server.lock().jobs.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ProtocolError::NotFound.into()),
        }
    }

    fn bury(&mut self, id: u64, priority: u32) -> Result<()> {
        self.server.record(MockCall::Bury(id));
        let mut guard = self.server.lock();
        let job = guard
            .jobs
            .get_mut(&id)
            .ok_or(Error::Protocol(ProtocolError::NotFound))?;
        job.state = JobState::Buried;
        job.priority = priority;
        Ok(())
    }

    fn kick(&mut self, tube: &str, bound: u64) -> Result<u64> {
        self.server.record(MockCall::Kick {
            tube: tube.to_string(),
            bound,
        });
        let mut guard = self.server.lock();
        // Buried jobs are kicked first; delayed only when none are buried
        let source = if guard.oldest(tube, JobState::Buried).is_some() {
            JobState::Buried
        } else {
            JobState::Delayed
        };
        let mut kicked = 0;
        for job in guard.jobs.values_mut() {
            if kicked == bound {
                break;
            }
            if job.tube == tube && job.state == source {
                job.state = JobState::Ready;
                kicked += 1;
            }
        }
        Ok(kicked)
    }

    fn list_tubes(&mut self) -> Result<Vec<String>> {
        self.server.record(MockCall::ListTubes);
        Ok(self.server.lock().tubes.iter().cloned().collect())
    }

    fn stats(&mut self) -> Result<Stats> {
        self.server.record(MockCall::Stats);
        let guard = self.server.lock();
        let mut stats = guard.tube_counts(None);
        stats.insert("current-tubes".to_string(), guard.tubes.len().to_string());
        stats.insert("version".to_string(), "mock".to_string());
        Ok(stats)
    }

    fn stats_tube(&mut self, tube: &str) -> Result<Stats> {
        self.server.record(MockCall::StatsTube(tube.to_string()));
        let guard = self.server.lock();
        if !guard.tubes.contains(tube) {
            return Err(ProtocolError::NotFound.into());
        }
        let mut stats = guard.tube_counts(Some(tube));
        stats.insert("name".to_string(), tube.to_string());
        Ok(stats)
    }

    fn stats_job(&mut self, id: u64) -> Result<Stats> {
        self.server.record(MockCall::StatsJob(id));
        let job = self
            .server
            .job(id)
            .ok_or(Error::Protocol(ProtocolError::NotFound))?;
        Ok(Stats::from([
            ("id".to_string(), job.id.to_string()),
            ("tube".to_string(), job.tube),
            ("state".to_string(), job.state.to_string()),
            ("pri".to_string(), job.priority.to_string()),
        ]))
    }

    fn close(&mut self) -> Result<()> {
        self.server.record(MockCall::Close);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &MockServer) -> Box<dyn QueueClient> {
        server
            .connect("127.0.0.1", 11300, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_peek_returns_oldest_then_not_found() {
        let server = MockServer::new();
        let first = server.add_job("jobs", JobState::Ready, b"a");
        server.add_job("jobs", JobState::Ready, b"b");
        let mut client = client(&server);

        assert_eq!(client.peek("jobs", JobState::Ready).unwrap().id, first);
        assert!(client
            .peek("jobs", JobState::Buried)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_kick_prefers_buried() {
        let server = MockServer::new();
        server.add_job("jobs", JobState::Buried, b"a");
        server.add_job("jobs", JobState::Delayed, b"b");
        let mut client = client(&server);

        assert_eq!(client.kick("jobs", 5).unwrap(), 1);
        assert_eq!(server.count("jobs", JobState::Delayed), 1);
        assert_eq!(client.kick("jobs", 5).unwrap(), 1);
        assert_eq!(server.count("jobs", JobState::Ready), 2);
    }

    #[test]
    fn test_queued_peek_fault_fires_once() {
        let server = MockServer::new();
        server.add_job("default", JobState::Ready, b"a");
        server.fail_next_peek(ProtocolError::InternalError);
        let mut client = client(&server);

        assert!(client.peek("default", JobState::Ready).is_err());
        assert!(client.peek("default", JobState::Ready).is_ok());
    }

    #[test]
    fn test_peek_fault_after_successes() {
        let server = MockServer::new();
        server.add_job("default", JobState::Ready, b"a");
        server.fail_peek_after(2, ProtocolError::Draining);
        let mut client = client(&server);

        assert!(client.peek("default", JobState::Ready).is_ok());
        assert!(client.peek("default", JobState::Ready).is_ok());
        assert!(matches!(
            client.peek("default", JobState::Ready),
            Err(Error::Protocol(ProtocolError::Draining))
        ));
        assert!(client.peek("default", JobState::Ready).is_ok());
    }

    #[test]
    fn test_refused_connection() {
        let server = MockServer::new();
        server.refuse_connections(true);
        let result = server.connect("127.0.0.1", 11300, Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
