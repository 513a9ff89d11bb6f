//! Confirmation prompts and command history.

use beany::client::JobState;
use beany::console::{Outcome, Screen};

use crate::fixtures::ConsoleHarness;

fn delete_with_answer(answer: &str) -> (ConsoleHarness, u64) {
    let mut h = ConsoleHarness::connected(&[answer]);
    let id = h.server.add_job("default", JobState::Ready, b"x");
    h.execute(&format!("delete {}", id));
    (h, id)
}

#[test]
fn test_affirmative_answers_delete() {
    for answer in ["y", "yes", "Y", "YES"] {
        let (h, id) = delete_with_answer(answer);
        assert!(h.server.job(id).is_none(), "answer {}", answer);
        assert_eq!(h.output(), format!("Deleted job #{}\n", id));
    }
}

#[test]
fn test_negative_answers_keep_job_silently() {
    for answer in ["n", "no"] {
        let (h, id) = delete_with_answer(answer);
        assert!(h.server.job(id).is_some(), "answer {}", answer);
        assert_eq!(h.output(), "");
    }
}

#[test]
fn test_invalid_answer_defaults_to_no_with_notice() {
    let (mut h, id) = delete_with_answer("maybe");
    assert!(h.server.job(id).is_some());
    assert_eq!(h.output(), "not a valid choice, defaulting to 'n'\n");
    // Declining is not a failure
    assert_eq!(h.execute(""), Outcome::Continue);
}

/// Test: answers never reach history
/// Given a script mixing commands and confirmation answers
/// When the loop runs
/// Then history holds only the commands, and recording is back on
#[test]
fn test_history_excludes_answers() {
    let mut h = ConsoleHarness::connected(&["delete 1", "y", "dr", "maybe", "db", "n", "stats"]);
    h.server.add_job("default", JobState::Ready, b"x");
    h.run();

    assert_eq!(h.history(), vec!["delete 1", "dr", "db", "stats"]);
    assert!(h.screen.borrow().history_recording());
}

#[test]
fn test_end_of_input_at_prompt_declines() {
    let mut h = ConsoleHarness::connected(&["delete-buried"]);
    h.server.add_job("default", JobState::Buried, b"x");
    h.run();
    assert_eq!(h.server.count("default", JobState::Buried), 1);
    assert!(h.output().contains("not a valid choice"));
}
