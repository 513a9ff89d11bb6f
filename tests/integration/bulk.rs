//! Delete-all and kick driven through the console.

use beany::client::mock::MockCall;
use beany::client::JobState;
use beany::console::Outcome;
use beany::error::ProtocolError;

use crate::fixtures::ConsoleHarness;

/// Test: delete-all removes exactly the jobs in one state on one tube
#[test]
fn test_delete_all_counts_and_scopes() {
    let mut h = ConsoleHarness::connected(&["y"]);
    for _ in 0..5 {
        h.server.add_job("jobs", JobState::Delayed, b"later");
    }
    h.server.add_job("jobs", JobState::Ready, b"now");
    h.server.add_job("default", JobState::Delayed, b"elsewhere");

    assert_eq!(h.execute("dd jobs"), Outcome::Continue);
    assert_eq!(h.output(), "Deleted 5 delayed jobs\n");
    assert_eq!(h.server.count("jobs", JobState::Delayed), 0);
    assert_eq!(h.server.count("jobs", JobState::Ready), 1);
    assert_eq!(h.server.count("default", JobState::Delayed), 1);
}

/// Test: an empty state gets an explicit message, not silence
#[test]
fn test_delete_all_empty_state() {
    let mut h = ConsoleHarness::connected(&["y"]);
    assert_eq!(h.execute("delete-buried"), Outcome::Continue);
    assert_eq!(h.output(), "No buried jobs to delete on tube 'default'\n");
}

/// Test: a server fault on the first peek is surfaced, unlike "no jobs"
#[test]
fn test_delete_all_fault_is_not_zero_result() {
    let mut h = ConsoleHarness::connected(&["y"]);
    h.server.add_job("default", JobState::Ready, b"x");
    h.server.fail_next_peek(ProtocolError::InternalError);

    assert_eq!(h.execute("dr"), Outcome::Failed);
    let out = h.output();
    assert!(!out.contains("No ready jobs"));
    assert_eq!(out.lines().count(), 1);
    assert_eq!(h.server.count("default", JobState::Ready), 1);
}

/// Test: a fault midway still reports what was deleted, then the fault
#[test]
fn test_delete_all_fault_after_progress() {
    let mut h = ConsoleHarness::connected(&["y"]);
    for _ in 0..3 {
        h.server.add_job("default", JobState::Buried, b"x");
    }
    h.server.fail_peek_after(2, ProtocolError::Draining);

    assert_eq!(h.execute("db"), Outcome::Failed);
    let out = h.output();
    assert!(out.starts_with("Deleted 2 buried jobs\n"));
    assert_eq!(out.lines().count(), 2);
    assert_eq!(h.server.count("default", JobState::Buried), 1);
}

/// Test: kick with no count kicks what stats-tube reports as buried
#[test]
fn test_kick_default_and_bounded() {
    let mut h = ConsoleHarness::connected(&[]);
    for _ in 0..4 {
        h.server.add_job("default", JobState::Buried, b"x");
    }

    assert_eq!(h.execute("kick 1"), Outcome::Continue);
    assert_eq!(h.server.count("default", JobState::Buried), 3);
    assert_eq!(h.execute("kick"), Outcome::Continue);
    assert_eq!(h.server.count("default", JobState::Buried), 0);
    assert_eq!(h.output(), "Kicked 1 jobs\nKicked 3 jobs\n");

    let calls = h.server.calls();
    assert!(calls.contains(&MockCall::Kick {
        tube: "default".to_string(),
        bound: 3
    }));
}

/// Test: kick never reports more than requested
#[test]
fn test_kick_bounded_by_available() {
    let mut h = ConsoleHarness::connected(&["use sparse"]);
    h.run();
    h.server.add_job("sparse", JobState::Buried, b"x");
    h.clear_output();

    assert_eq!(h.execute("kick 10"), Outcome::Continue);
    assert_eq!(h.output(), "Kicked 1 jobs\n");
}
