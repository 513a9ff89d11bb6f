//! Inline vs paged output.

use beany::client::JobState;

use crate::fixtures::ConsoleHarness;

fn seeded(rows: u16, tubes: usize) -> ConsoleHarness {
    let h = ConsoleHarness::with_height(&[], rows);
    h.session
        .borrow_mut()
        .connect("127.0.0.1", 11300)
        .expect("mock connect");
    for i in 0..tubes {
        h.server
            .add_job(&format!("tube-{:02}", i), JobState::Ready, b"x");
    }
    h
}

/// Test: output shorter than the terminal prints inline
#[test]
fn test_short_table_inline() {
    // Header plus default plus two tubes: 4 lines in 10 rows
    let mut h = seeded(10, 2);
    h.execute("list-tubes");
    assert!(h.paged().is_empty());
    assert_eq!(h.output().lines().count(), 4);
}

/// Test: output as tall as the terminal goes through the pager
#[test]
fn test_tall_table_paged() {
    let mut h = seeded(10, 9);
    h.execute("list-tubes");
    assert!(h.output().is_empty());
    let paged = h.paged();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].lines().count(), 11);
}

/// Test: terminal height is read at each render
#[test]
fn test_resize_between_commands() {
    let mut h = seeded(50, 5);
    h.execute("stats");
    assert!(h.paged().is_empty());

    h.screen.borrow_mut().set_height(Some(3));
    h.execute("stats");
    assert_eq!(h.paged().len(), 1);
}

/// Test: short messages never page, even in a tiny terminal
#[test]
fn test_info_lines_are_never_paged() {
    let mut h = seeded(1, 0);
    h.execute("version");
    assert!(h.paged().is_empty());
    assert!(h.output().starts_with("beany version: "));
}
