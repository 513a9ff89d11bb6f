//! Operator sessions from connect to exit.

use beany::client::mock::MockCall;
use beany::client::JobState;
use beany::command::{Command, Registry};
use beany::console::Outcome;
use beany::Error;

use crate::fixtures::ConsoleHarness;

/// Test: put, peek, delete round trip
/// Given a fresh console
/// When the operator connects, puts a job on a tube, peeks and deletes it
/// Then peek-ready afterwards reports that no ready jobs are left
#[test]
fn test_put_peek_delete_round_trip() {
    let mut h = ConsoleHarness::with_bodies(
        &[
            "connect 127.0.0.1 11300",
            "use jobs",
            "put",
            "peek-ready",
            "delete 1",
            "y",
            "peek-ready",
        ],
        &["hello world"],
    );
    h.run();

    let out = h.output();
    assert!(out.contains("Connected to '127.0.0.1:11300'\n"));
    assert!(out.contains("Put job (#1) onto jobs\n"));
    assert!(out.contains("Job #1\nhello world\n"));
    assert!(out.contains("Deleted job #1\n"));
    assert!(out.ends_with("No ready jobs on tube 'jobs'\n"));
    assert!(h.server.job(1).is_none());

    assert_eq!(
        h.prompts(),
        vec![
            "[none] >>> ",
            "[default] >>> ",
            "[jobs] >>> ",
            "[jobs] >>> ",
            "[jobs] >>> ",
            "Are you sure you want to delete job #1 [yn]? ",
            "[jobs] >>> ",
            "[jobs] >>> ",
        ]
    );
}

/// Test: disconnected commands fail without network I/O
#[test]
fn test_disconnected_commands_do_no_io() {
    let mut h = ConsoleHarness::new(&[]);
    for line in ["stats", "peek 1", "use jobs", "list-tubes", "kick", "pr", "st"] {
        assert_eq!(h.execute(line), Outcome::Failed, "{}", line);
    }
    assert_eq!(h.server.call_count(), 0);

    let out = h.output();
    assert_eq!(out.lines().count(), 7);
    for line in out.lines() {
        assert!(line.ends_with("not connected to a beanstalk server"), "{}", line);
    }
}

/// Test: prompt follows the session through connect, use and disconnect
#[test]
fn test_prompt_tracks_state() {
    let mut h = ConsoleHarness::new(&["connect", "use emails", "disconnect", "use emails"]);
    h.run();
    assert_eq!(
        h.prompts(),
        vec![
            "[none] >>> ",
            "[default] >>> ",
            "[emails] >>> ",
            "[none] >>> ",
            "[none] >>> ",
        ]
    );
    assert!(h.output().contains("Disconnected from '127.0.0.1:11300'\n"));
}

/// Test: a refused connection leaves the console disconnected
#[test]
fn test_failed_connect_is_reported_and_loop_continues() {
    let mut h = ConsoleHarness::new(&["connect", "version"]);
    h.server.refuse_connections(true);
    h.run();

    let out = h.output();
    assert!(out.starts_with("unable to connect to 127.0.0.1:11300"));
    assert!(out.contains("beany version: "));
    assert!(!h.session.borrow().is_connected());
}

/// Test: unknown commands and bad quoting render one error line each
#[test]
fn test_unknown_command_and_bad_input() {
    let mut h = ConsoleHarness::connected(&[]);
    assert_eq!(h.execute("frobnicate"), Outcome::Failed);
    assert_eq!(h.execute("use 'half"), Outcome::Failed);
    assert_eq!(h.execute("   "), Outcome::Continue);
    assert_eq!(
        h.output(),
        "unknown command 'frobnicate', try 'help'\nunterminated quoted string\n"
    );
}

/// Test: exit stops the loop before the rest of the script
#[test]
fn test_exit_stops_loop() {
    let mut h = ConsoleHarness::connected(&["version", "quit", "stats"]);
    h.run();
    assert_eq!(h.prompts().len(), 2);
    assert!(!h.server.calls().contains(&MockCall::Stats));
}

/// Test: list-tubes renders a sorted table
#[test]
fn test_list_tubes_table() {
    let mut h = ConsoleHarness::connected(&[]);
    h.server.add_job("mail", JobState::Ready, b"a");
    h.server.add_job("mail", JobState::Buried, b"b");
    h.server.add_job("audit", JobState::Delayed, b"c");

    assert_eq!(h.execute("lt"), Outcome::Continue);
    assert_eq!(
        h.output(),
        "Tube     Ready  Delayed  Buried\n\
         audit    0      1        0\n\
         default  0      0        0\n\
         mail     1      0        1\n"
    );
}

/// Test: quoting cannot smuggle an invalid tube name onto the wire
/// Given a tube name with a space, typed with quotes
/// When peeking it
/// Then the name is refused before any server call
#[test]
fn test_quoted_tube_name_with_space_rejected() {
    let mut h = ConsoleHarness::connected(&[]);
    let calls = h.server.call_count();
    assert_eq!(h.execute(r#"peek-ready "night jobs""#), Outcome::Failed);
    assert_eq!(
        h.output(),
        "invalid tube name 'night jobs': ' ' is not allowed\n"
    );
    assert_eq!(h.server.call_count(), calls);
}

/// Test: a line break in a one-shot tube argument cannot inject commands
/// Given job 1 on the default tube
/// When `peek-ready` receives a tube argument carrying CRLF and a delete
/// Then the command fails validation and job 1 is still there
#[test]
fn test_tube_argument_with_crlf_rejected() {
    let mut h = ConsoleHarness::connected(&[]);
    let id = h.server.add_job("default", JobState::Ready, b"keep");
    let calls = h.server.call_count();

    let smuggled = format!("x\r\ndelete {}", id);
    assert_eq!(h.execute_words(&["peek-ready", &smuggled]), Outcome::Failed);
    assert_eq!(h.execute_words(&["use", &smuggled]), Outcome::Failed);

    assert!(h.output().starts_with("invalid tube name 'x\\r\\ndelete"));
    assert_eq!(h.server.call_count(), calls);
    assert!(h.server.job(id).is_some());
    assert_eq!(h.session.borrow().current_tube_name().unwrap(), "default");
}

/// Test: alias collisions are rejected while building the registry
#[test]
fn test_alias_collision_rejected_at_registration() {
    let mut registry = beany::command::builtin::standard().unwrap();
    let clash = Command::new("purge", "clashes with peek", |_, _| Ok(())).alias("p");
    assert!(matches!(
        registry.register(clash),
        Err(Error::DuplicateCommand(ref w)) if w == "p"
    ));
    assert!(registry.resolve("purge").is_none());

    let mut fresh = Registry::new();
    fresh.register(Command::new("stats", "a", |_, _| Ok(()))).unwrap();
    assert!(fresh
        .register(Command::new("st", "b", |_, _| Ok(())).alias("stats"))
        .is_err());
}
