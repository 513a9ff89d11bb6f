//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - A console wired to the mock server and a scripted screen
//! - Canned job bodies standing in for the editor

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use beany::client::mock::MockServer;
use beany::command::builtin;
use beany::config::Config;
use beany::console::{Console, Outcome, Palette, Screen, ScriptedScreen};
use beany::external::Composer;
use beany::{Result, Session};

/// Screen handle shared between the console and the test.
pub struct SharedScreen(pub Rc<RefCell<ScriptedScreen>>);

impl Screen for SharedScreen {
    fn write(&mut self, text: &str) -> Result<()> {
        self.0.borrow_mut().write(text)
    }

    fn page(&mut self, text: &str) -> Result<()> {
        self.0.borrow_mut().page(text)
    }

    fn height(&self) -> Option<u16> {
        self.0.borrow().height()
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.0.borrow_mut().read_line(prompt)
    }

    fn history_recording(&self) -> bool {
        self.0.borrow().history_recording()
    }

    fn set_history_recording(&mut self, enabled: bool) {
        self.0.borrow_mut().set_history_recording(enabled)
    }

    fn clear(&mut self) -> Result<()> {
        self.0.borrow_mut().clear()
    }
}

/// Hands out queued bodies in order, then empty ones.
pub struct CannedBodies(RefCell<VecDeque<Vec<u8>>>);

impl CannedBodies {
    pub fn new(bodies: &[&str]) -> Self {
        Self(RefCell::new(
            bodies.iter().map(|b| b.as_bytes().to_vec()).collect(),
        ))
    }
}

impl Composer for CannedBodies {
    fn compose(&self) -> Result<Vec<u8>> {
        Ok(self.0.borrow_mut().pop_front().unwrap_or_default())
    }
}

/// A console on the mock server, fed from scripted input.
pub struct ConsoleHarness {
    pub server: MockServer,
    pub screen: Rc<RefCell<ScriptedScreen>>,
    pub session: Rc<RefCell<Session>>,
    pub console: Console,
}

impl ConsoleHarness {
    pub fn new(input: &[&str]) -> Self {
        Self::build(input, &[], None)
    }

    pub fn with_bodies(input: &[&str], bodies: &[&str]) -> Self {
        Self::build(input, bodies, None)
    }

    pub fn with_height(input: &[&str], rows: u16) -> Self {
        Self::build(input, &[], Some(rows))
    }

    /// Harness already connected to the mock server on its default tube.
    pub fn connected(input: &[&str]) -> Self {
        let harness = Self::new(input);
        harness
            .session
            .borrow_mut()
            .connect("127.0.0.1", 11300)
            .expect("mock connect");
        harness
    }

    fn build(input: &[&str], bodies: &[&str], rows: Option<u16>) -> Self {
        let server = MockServer::new();
        let mut scripted = ScriptedScreen::new(input.iter().copied());
        scripted.set_height(rows);
        let screen = Rc::new(RefCell::new(scripted));
        let session = Rc::new(RefCell::new(Session::new(
            Box::new(server.clone()),
            Duration::from_secs(5),
        )));
        let registry = Rc::new(builtin::standard().expect("builtin commands register"));

        let console = Console::new(
            registry,
            Rc::clone(&session),
            Box::new(SharedScreen(Rc::clone(&screen))),
            Box::new(CannedBodies::new(bodies)),
            Config::default(),
            Palette::plain(),
        );

        Self {
            server,
            screen,
            session,
            console,
        }
    }

    /// Run the read-eval loop until the script runs out or `exit`.
    pub fn run(&mut self) {
        self.console.run().expect("console loop");
    }

    pub fn execute(&mut self, line: &str) -> Outcome {
        self.console.execute_line(line)
    }

    /// Dispatch pre-split words, the way one-shot argv arrives.
    pub fn execute_words(&mut self, words: &[&str]) -> Outcome {
        let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        self.console.execute(&words)
    }

    pub fn output(&self) -> String {
        self.screen.borrow().written.clone()
    }

    pub fn clear_output(&self) {
        self.screen.borrow_mut().written.clear();
    }

    pub fn paged(&self) -> Vec<String> {
        self.screen.borrow().paged.clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.screen.borrow().prompts.clone()
    }

    pub fn history(&self) -> Vec<String> {
        self.screen.borrow().history.clone()
    }
}
