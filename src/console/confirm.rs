//! Yes/no prompts guarding destructive commands.

use super::{Palette, Screen};
use crate::{blog_debug, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Invalid,
}

impl Choice {
    pub fn parse(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Choice::Yes,
            "n" | "no" => Choice::No,
            _ => Choice::Invalid,
        }
    }
}

/// Turns history recording off for its lifetime and restores the previous
/// setting on drop, including when the read in between fails.
struct HistoryPause<'a> {
    screen: &'a mut dyn Screen,
    previous: bool,
}

impl<'a> HistoryPause<'a> {
    fn new(screen: &'a mut dyn Screen) -> Self {
        let previous = screen.history_recording();
        screen.set_history_recording(false);
        Self { screen, previous }
    }
}

impl Drop for HistoryPause<'_> {
    fn drop(&mut self) {
        self.screen.set_history_recording(self.previous);
    }
}

/// Ask `message` and wait for an answer. Anything other than yes or no,
/// end of input included, is reported and counts as no. The answer is
/// never added to command history.
pub fn confirm(screen: &mut dyn Screen, palette: &Palette, message: &str) -> Result<bool> {
    let answer = {
        let mut pause = HistoryPause::new(screen);
        pause.screen.read_line(&format!("{} [yn]? ", message))?
    };

    let choice = answer.as_deref().map_or(Choice::Invalid, Choice::parse);
    blog_debug!("confirm '{}' -> {:?}", message, choice);
    match choice {
        Choice::Yes => Ok(true),
        Choice::No => Ok(false),
        Choice::Invalid => {
            let line = format!("{}\n", palette.error("not a valid choice, defaulting to 'n'"));
            screen.write(&line)?;
            Ok(false)
        }
    }
}
