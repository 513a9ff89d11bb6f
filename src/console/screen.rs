//! Terminal I/O behind the console.
//!
//! The engine never touches stdin/stdout directly; it goes through a
//! `Screen`, which also reports the terminal height for the paging
//! decision and owns command history.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{CompletionType, Editor};

use super::ConsoleHelper;
use crate::external;
use crate::{blog_debug, blog_error, blog_warn, Result};

pub trait Screen {
    fn write(&mut self, text: &str) -> Result<()>;

    /// Hand `text` to the pager.
    fn page(&mut self, text: &str) -> Result<()>;

    /// Rows in the terminal right now, or `None` when not a terminal.
    fn height(&self) -> Option<u16>;

    /// Read one line after showing `prompt`. `None` means end of input.
    /// Non-empty lines go to history while recording is on.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    fn history_recording(&self) -> bool;

    fn set_history_recording(&mut self, enabled: bool);

    fn clear(&mut self) -> Result<()>;
}

/// Print inline when `text` fits in the terminal, otherwise page it.
/// The height is asked for on every call since the window can be resized.
pub fn show(screen: &mut dyn Screen, text: &str) -> Result<()> {
    let lines = text.lines().count();
    match screen.height() {
        Some(height) if lines >= usize::from(height) => {
            blog_debug!("Paging {} lines (terminal height {})", lines, height);
            screen.page(text)
        }
        _ if text.ends_with('\n') => screen.write(text),
        _ => screen.write(&format!("{}\n", text)),
    }
}

/// Whether a line read from the operator belongs in command history.
fn should_record(recording: bool, line: &str) -> bool {
    recording && !line.trim().is_empty()
}

/// Output side shared by the real screens.
struct Terminal {
    pager: Vec<String>,
}

impl Terminal {
    fn write(&self, text: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Only a pager that never started falls back to inline output. Once
    /// it has run, the text was shown and failures are reported instead.
    fn page(&self, text: &str) -> Result<()> {
        match external::spawn_pager(&self.pager) {
            Ok(child) => external::feed_pager(child, text),
            Err(e) => {
                blog_warn!("Pager unavailable, printing inline: {}", e);
                self.write(text)
            }
        }
    }

    fn height(&self) -> Option<u16> {
        crossterm::terminal::size().ok().map(|(_, rows)| rows)
    }

    fn clear(&self) -> Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
        Ok(())
    }
}

/// Interactive screen: line editing, tab completion and a history file.
pub struct ReadlineScreen {
    editor: Editor<ConsoleHelper, FileHistory>,
    history_path: PathBuf,
    recording: bool,
    terminal: Terminal,
}

impl ReadlineScreen {
    pub fn new(helper: ConsoleHelper, history_path: PathBuf, pager: Vec<String>) -> Result<Self> {
        let config = rustyline::Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(helper));
        if history_path.exists() {
            editor.load_history(&history_path)?;
        }
        blog_debug!("History file: {}", history_path.display());

        Ok(Self {
            editor,
            history_path,
            recording: true,
            terminal: Terminal { pager },
        })
    }

    /// Add `line` to history and save the file, unless recording is off.
    /// Saved per line so history survives the process being killed.
    fn record(&mut self, line: &str) -> Result<()> {
        if !should_record(self.recording, line) {
            return Ok(());
        }
        self.editor.add_history_entry(line)?;
        if let Err(e) = self.editor.save_history(&self.history_path) {
            blog_error!("Failed to save history: {}", e);
        }
        Ok(())
    }
}

impl Screen for ReadlineScreen {
    fn write(&mut self, text: &str) -> Result<()> {
        self.terminal.write(text)
    }

    fn page(&mut self, text: &str) -> Result<()> {
        self.terminal.page(text)
    }

    fn height(&self) -> Option<u16> {
        self.terminal.height()
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                self.record(&line)?;
                Ok(Some(line))
            }
            // Ctrl+C abandons the current line
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn history_recording(&self) -> bool {
        self.recording
    }

    fn set_history_recording(&mut self, enabled: bool) {
        self.recording = enabled;
    }

    fn clear(&mut self) -> Result<()> {
        self.terminal.clear()
    }
}

/// Line-at-a-time stdin/stdout, used for one-shot commands. Keeps no
/// history.
pub struct PlainScreen {
    terminal: Terminal,
}

impl PlainScreen {
    pub fn new(pager: Vec<String>) -> Self {
        Self {
            terminal: Terminal { pager },
        }
    }
}

impl Screen for PlainScreen {
    fn write(&mut self, text: &str) -> Result<()> {
        self.terminal.write(text)
    }

    fn page(&mut self, text: &str) -> Result<()> {
        self.terminal.page(text)
    }

    fn height(&self) -> Option<u16> {
        self.terminal.height()
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.terminal.write(prompt)?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn history_recording(&self) -> bool {
        false
    }

    fn set_history_recording(&mut self, _enabled: bool) {}

    fn clear(&mut self) -> Result<()> {
        self.terminal.clear()
    }
}

/// In-memory screen fed from a script of input lines. Captures everything
/// written, paged and recorded to history.
#[derive(Debug, Default)]
pub struct ScriptedScreen {
    input: VecDeque<String>,
    height: Option<u16>,
    recording: bool,
    pub written: String,
    pub paged: Vec<String>,
    pub prompts: Vec<String>,
    pub history: Vec<String>,
    pub clears: usize,
}

impl ScriptedScreen {
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            recording: true,
            ..Self::default()
        }
    }

    pub fn with_height(mut self, rows: u16) -> Self {
        self.height = Some(rows);
        self
    }

    pub fn set_height(&mut self, rows: Option<u16>) {
        self.height = rows;
    }
}

impl Screen for ScriptedScreen {
    fn write(&mut self, text: &str) -> Result<()> {
        self.written.push_str(text);
        Ok(())
    }

    fn page(&mut self, text: &str) -> Result<()> {
        self.paged.push(text.to_string());
        Ok(())
    }

    fn height(&self) -> Option<u16> {
        self.height
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        let line = self.input.pop_front();
        if let Some(line) = &line {
            if should_record(self.recording, line) {
                self.history.push(line.clone());
            }
        }
        Ok(line)
    }

    fn history_recording(&self) -> bool {
        self.recording
    }

    fn set_history_recording(&mut self, enabled: bool) {
        self.recording = enabled;
    }

    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }
}
