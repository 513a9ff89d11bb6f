//! Tab completion for the interactive screen.
//!
//! The first word completes against command names and aliases. Later words
//! ask the command's own completer, which may query the server, so the
//! candidates always reflect the live session.

use std::cell::RefCell;
use std::rc::Rc;

use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;

use crate::blog_trace;
use crate::command::Registry;
use crate::session::Session;

pub struct ConsoleHelper {
    registry: Rc<Registry>,
    session: Rc<RefCell<Session>>,
}

impl ConsoleHelper {
    pub fn new(registry: Rc<Registry>, session: Rc<RefCell<Session>>) -> Self {
        Self { registry, session }
    }
}

/// Candidates for the word under the cursor in `line` (the text before the
/// cursor). Returns the byte offset where that word starts.
pub fn complete_line(registry: &Registry, session: &mut Session, line: &str) -> (usize, Vec<String>) {
    let partial_start = line
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + line[i..].chars().next().map_or(1, char::len_utf8));
    let partial = &line[partial_start..];
    let mut words = line[..partial_start].split_whitespace();

    let candidates = match words.next() {
        None => registry
            .words()
            .into_iter()
            .filter(|w| w.starts_with(partial))
            .map(str::to_string)
            .collect(),
        Some(command) => {
            let args: Vec<String> = words.map(str::to_string).collect();
            let mut found: Vec<String> = registry
                .complete(command, session, &args)
                .into_iter()
                .filter(|c| c.starts_with(partial))
                .collect();
            found.sort();
            found.dedup();
            found
        }
    };
    blog_trace!("complete '{}' -> {} candidates", line, candidates.len());
    (partial_start, candidates)
}

impl Completer for ConsoleHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        // The engine holds the session while a command runs
        let Ok(mut session) = self.session.try_borrow_mut() else {
            return Ok((pos, Vec::new()));
        };
        Ok(complete_line(&self.registry, &mut session, &line[..pos]))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
}

impl Highlighter for ConsoleHelper {}

impl Validator for ConsoleHelper {}

impl Helper for ConsoleHelper {}
