//! Whole-state operations built from single-job protocol calls.
//!
//! beanstalkd can peek the head of a state but cannot list a state, so
//! deleting everything in a state alternates peek and delete until the peek
//! answers `NOT_FOUND`. Other producers and workers keep running meanwhile,
//! so counts here are what this scan observed, not a snapshot of the tube.

use crate::client::JobState;
use crate::session::Session;
use crate::{blog, blog_debug, blog_warn, Error, Result};

/// Why a scan stopped.
#[derive(Debug)]
pub enum Termination {
    /// The server reported no further job in the state.
    Exhausted,
    /// Anything else went wrong; the scan may have left jobs behind.
    Fault(Error),
}

#[derive(Debug)]
pub struct BulkOutcome {
    pub count: u64,
    pub termination: Termination,
}

impl BulkOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self.termination, Termination::Exhausted)
    }

    pub fn fault(&self) -> Option<&Error> {
        match &self.termination {
            Termination::Exhausted => None,
            Termination::Fault(e) => Some(e),
        }
    }
}

/// Delete every job in `state` on `tube`.
///
/// A delete answering `NOT_FOUND` means someone else removed the job after
/// our peek; that job is skipped once. Seeing the same job vanish twice in a
/// row is treated as a fault, since the peek is not making progress.
pub fn delete_all(session: &mut Session, state: JobState, tube: &str) -> BulkOutcome {
    blog!("delete_all state={} tube={}", state, tube);
    let mut count = 0;
    let mut raced: Option<u64> = None;

    let termination = loop {
        let job = match session.peek(tube, state) {
            Ok(job) => job,
            Err(e) if e.is_not_found() => break Termination::Exhausted,
            Err(e) => break Termination::Fault(e),
        };

        match session.delete(job.id) {
            Ok(()) => {
                count += 1;
                raced = None;
                blog_debug!("delete_all: deleted #{} ({} so far)", job.id, count);
            }
            Err(e) if e.is_not_found() && raced != Some(job.id) => {
                blog_debug!("delete_all: #{} vanished before delete", job.id);
                raced = Some(job.id);
            }
            Err(e) => break Termination::Fault(e),
        }
    };

    match &termination {
        Termination::Exhausted => blog!("delete_all: {} {} jobs deleted", count, state),
        Termination::Fault(e) => blog_warn!("delete_all: stopped after {} jobs: {}", count, e),
    }
    BulkOutcome { count, termination }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickOutcome {
    pub requested: u64,
    pub kicked: u64,
}

/// Kick up to `bound` jobs on `tube`. Without a bound, kicks as many jobs
/// as `stats-tube` reports buried right now.
pub fn kick(session: &mut Session, tube: &str, bound: Option<u64>) -> Result<KickOutcome> {
    let requested = match bound {
        Some(n) => n,
        None => buried_count(session, tube)?,
    };
    let kicked = session.kick(tube, requested)?;
    blog!("kick tube={} requested={} kicked={}", tube, requested, kicked);
    Ok(KickOutcome { requested, kicked })
}

fn buried_count(session: &mut Session, tube: &str) -> Result<u64> {
    let stats = session.stats_tube(tube)?;
    let key = JobState::Buried.stats_key();
    let raw = stats.get(key).map(String::as_str).unwrap_or("0");
    raw.parse().map_err(|_| {
        Error::Validation(format!("server reported non-numeric {}: '{}'", key, raw))
    })
}
