//! Command table for the console.
//!
//! Names and aliases share one namespace. Registering a word twice is a
//! startup error, so lookup never depends on registration order.

pub mod builtin;

use std::collections::HashMap;
use std::fmt;

use crate::client::JobState;
use crate::console::Context;
use crate::session::Session;
use crate::{Error, Result};

pub type Handler = Box<dyn Fn(&mut Context<'_>, &[String]) -> Result<()>>;

/// Produces argument candidates from the arguments typed so far.
pub type Completer = fn(&mut Session, &[String]) -> Vec<String>;

pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub long_help: String,
    completer: Option<Completer>,
    handler: Handler,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, help: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, &[String]) -> Result<()> + 'static,
    {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: help.into(),
            long_help: String::new(),
            completer: None,
            handler: Box::new(handler),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn long_help(mut self, text: impl Into<String>) -> Self {
        self.long_help = text.into();
        self
    }

    pub fn completer(mut self, completer: Completer) -> Self {
        self.completer = Some(completer);
        self
    }

    pub fn run(&self, ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
        (self.handler)(ctx, args)
    }

    pub fn complete(&self, session: &mut Session, args: &[String]) -> Vec<String> {
        match self.completer {
            Some(completer) => completer(session, args),
            None => Vec::new(),
        }
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("completer", &self.completer.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `command`, rejecting it if its name or any alias is already
    /// taken (or repeated within the command itself).
    pub fn register(&mut self, command: Command) -> Result<()> {
        let mut seen = Vec::new();
        for word in command.words() {
            if self.index.contains_key(word) || seen.contains(&word) {
                return Err(Error::DuplicateCommand(word.to_string()));
            }
            seen.push(word);
        }

        let slot = self.commands.len();
        for word in command.words() {
            self.index.insert(word.to_string(), slot);
        }
        self.commands.push(command);
        Ok(())
    }

    /// Register one command per job state from a single factory.
    pub fn register_family<F>(&mut self, states: &[JobState], factory: F) -> Result<()>
    where
        F: Fn(JobState) -> Command,
    {
        for &state in states {
            self.register(factory(state))?;
        }
        Ok(())
    }

    pub fn resolve(&self, word: &str) -> Option<&Command> {
        self.index.get(word).map(|&slot| &self.commands[slot])
    }

    /// Argument candidates for `word`; empty for unknown commands and
    /// commands without a completer.
    pub fn complete(&self, word: &str, session: &mut Session, args: &[String]) -> Vec<String> {
        self.resolve(word)
            .map(|command| command.complete(session, args))
            .unwrap_or_default()
    }

    /// Commands sorted by name.
    pub fn commands(&self) -> Vec<&Command> {
        let mut commands: Vec<_> = self.commands.iter().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Every name and alias, sorted.
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<_> = self.index.keys().map(String::as_str).collect();
        words.sort_unstable();
        words
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
