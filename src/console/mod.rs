//! The read-eval loop.
//!
//! Each cycle: render the prompt from the live session, read a line, split
//! it into words, resolve the first word in the registry and run the
//! handler. Handler errors are printed as one highlighted line; they never
//! end the loop.

pub mod complete;
pub mod confirm;
pub mod screen;
pub mod style;

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::Registry;
use crate::config::Config;
use crate::external::Composer;
use crate::session::Session;
use crate::{blog, blog_error, Error, Result};

pub use complete::ConsoleHelper;
pub use screen::{PlainScreen, ReadlineScreen, Screen, ScriptedScreen};
pub use style::Palette;

/// What the loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Failed,
    Quit,
}

/// Everything a command handler may touch.
pub struct Context<'a> {
    pub session: &'a mut Session,
    pub registry: &'a Registry,
    pub screen: &'a mut dyn Screen,
    pub composer: &'a dyn Composer,
    pub config: &'a Config,
    pub palette: Palette,
    quit: bool,
}

impl<'a> Context<'a> {
    pub fn new(
        session: &'a mut Session,
        registry: &'a Registry,
        screen: &'a mut dyn Screen,
        composer: &'a dyn Composer,
        config: &'a Config,
        palette: Palette,
    ) -> Self {
        Self {
            session,
            registry,
            screen,
            composer,
            config,
            palette,
            quit: false,
        }
    }

    pub fn info(&mut self, message: &str) -> Result<()> {
        let line = format!("{}\n", self.palette.info(message));
        self.screen.write(&line)
    }

    /// Print `text`, through the pager when it is taller than the terminal.
    pub fn show(&mut self, text: &str) -> Result<()> {
        screen::show(self.screen, text)
    }

    /// Ask a yes/no question; declining becomes `Error::Cancelled`.
    pub fn confirm(&mut self, message: &str) -> Result<()> {
        if confirm::confirm(self.screen, &self.palette, message)? {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

pub struct Console {
    registry: Rc<Registry>,
    session: Rc<RefCell<Session>>,
    screen: Box<dyn Screen>,
    composer: Box<dyn Composer>,
    config: Config,
    palette: Palette,
}

impl Console {
    pub fn new(
        registry: Rc<Registry>,
        session: Rc<RefCell<Session>>,
        screen: Box<dyn Screen>,
        composer: Box<dyn Composer>,
        config: Config,
        palette: Palette,
    ) -> Self {
        Self {
            registry,
            session,
            screen,
            composer,
            config,
            palette,
        }
    }

    pub fn prompt(&self) -> String {
        render_prompt(&self.session.borrow(), &self.palette)
    }

    /// Run until `exit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = self.prompt();
            let Some(line) = self.screen.read_line(&prompt)? else {
                blog!("End of input");
                break;
            };
            if self.execute_line(&line) == Outcome::Quit {
                break;
            }
        }
        Ok(())
    }

    pub fn execute_line(&mut self, line: &str) -> Outcome {
        match split_args(line) {
            Ok(words) => self.execute(&words),
            Err(e) => {
                self.render_error(&e);
                Outcome::Failed
            }
        }
    }

    pub fn execute(&mut self, words: &[String]) -> Outcome {
        let Some((name, args)) = words.split_first() else {
            return Outcome::Continue;
        };
        let registry = Rc::clone(&self.registry);
        let Some(command) = registry.resolve(name) else {
            self.render_error(&Error::Validation(format!(
                "unknown command '{}', try 'help'",
                name
            )));
            return Outcome::Failed;
        };
        blog!("Dispatch {} args={:?}", command.name, args);

        let (result, quit) = {
            let mut session = self.session.borrow_mut();
            let mut ctx = Context::new(
                &mut session,
                &registry,
                self.screen.as_mut(),
                self.composer.as_ref(),
                &self.config,
                self.palette,
            );
            let result = command.run(&mut ctx, args);
            (result, ctx.quit_requested())
        };

        match result {
            Ok(()) if quit => Outcome::Quit,
            Ok(()) | Err(Error::Cancelled) => Outcome::Continue,
            Err(e) => {
                blog!("{} failed: {}", command.name, e);
                self.render_error(&e);
                Outcome::Failed
            }
        }
    }

    fn render_error(&mut self, err: &Error) {
        let line = format!("{}\n", self.palette.error(&err.to_string()));
        if let Err(e) = self.screen.write(&line) {
            blog_error!("Could not write error '{}': {}", err, e);
        }
    }
}

/// Prompt for the current session state: `[tube] >>> ` when connected,
/// `[none] >>> ` otherwise.
pub fn render_prompt(session: &Session, palette: &Palette) -> String {
    let label = match session.current_tube_name() {
        Ok(tube) => palette.tube(tube),
        Err(_) => palette.disconnected("none"),
    };
    format!(
        "{}{}{}",
        palette.bracket("["),
        label,
        palette.bracket("] >>> ")
    )
}

/// Split a command line into words. Single and double quotes group words;
/// a backslash escapes the next character outside single quotes.
pub fn split_args(line: &str) -> Result<Vec<String>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Normal,
        SingleQuoted,
        DoubleQuoted,
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut mode = Mode::Normal;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match mode {
            Mode::Normal => match ch {
                '\'' => {
                    mode = Mode::SingleQuoted;
                    in_word = true;
                }
                '"' => {
                    mode = Mode::DoubleQuoted;
                    in_word = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
            Mode::SingleQuoted => match ch {
                '\'' => mode = Mode::Normal,
                c => current.push(c),
            },
            Mode::DoubleQuoted => match ch {
                '"' => mode = Mode::Normal,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                c => current.push(c),
            },
        }
    }

    if mode != Mode::Normal {
        return Err(Error::Validation("unterminated quoted string".to_string()));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockServer;
    use std::time::Duration;

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("  peek   42 ").unwrap(), vec!["peek", "42"]);
        assert_eq!(
            split_args(r#"use "my tube" 'x y' a\ b"#).unwrap(),
            vec!["use", "my tube", "x y", "a b"]
        );
        assert_eq!(split_args(r#"use """#).unwrap(), vec!["use", ""]);
        assert!(split_args("").unwrap().is_empty());
        assert!(matches!(
            split_args("use 'open"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_render_prompt_tracks_session() {
        let server = MockServer::new();
        let mut session = Session::new(Box::new(server), Duration::from_secs(5));
        let palette = Palette::plain();

        assert_eq!(render_prompt(&session, &palette), "[none] >>> ");
        session.connect("127.0.0.1", 11300).unwrap();
        assert_eq!(render_prompt(&session, &palette), "[default] >>> ");
        session.use_tube("jobs");
        assert_eq!(render_prompt(&session, &palette), "[jobs] >>> ");
        session.disconnect().unwrap();
        assert_eq!(render_prompt(&session, &palette), "[none] >>> ");
    }

    #[test]
    fn test_colored_prompt_keeps_text() {
        let server = MockServer::new();
        let session = Session::new(Box::new(server), Duration::from_secs(5));
        let prompt = render_prompt(&session, &Palette::new(true));
        assert!(prompt.contains("none"));
        assert!(prompt.contains('\u{1b}'));
    }
}
