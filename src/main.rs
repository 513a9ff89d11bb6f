use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;

use beany::client::TcpConnector;
use beany::command::builtin;
use beany::config::{self, Config};
use beany::console::{Console, ConsoleHelper, Outcome, Palette, PlainScreen, ReadlineScreen};
use beany::external::ExternalEditor;
use beany::{blog, blog_warn, Result, Session};

/// Beany - interactive console for beanstalkd
#[derive(Parser, Debug)]
#[command(name = "beany")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    BEANY_DEBUG=1   Enable debug logging (alternative to --debug)\n    EDITOR          Editor used by 'put'\n    PAGER           Pager for long output (default: less -R)")]
pub struct Cli {
    /// Server to connect to on startup
    #[arg(short = 'c', long, value_name = "HOST[:PORT]")]
    pub connect: Option<String>,

    /// Disable color output
    #[arg(short = 'b', long)]
    pub boring: bool,

    /// Enable debug logging (writes to ~/.beany/beany.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Run a single console command and exit
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    beany::log::init_with_debug(cli.debug);
    if beany::log::is_debug() {
        blog!("beany starting (debug mode enabled)");
    }

    let mut config = Config::load()?;
    if let Some(address) = &cli.connect {
        let (host, port) = config::parse_address(address)?;
        config.host = host;
        if let Some(port) = port {
            config.port = port;
        }
    }

    let one_shot = !cli.command.is_empty();
    let palette = Palette::new(!cli.boring && !one_shot);
    let registry = Rc::new(builtin::standard()?);
    let session = Rc::new(RefCell::new(Session::new(
        Box::new(TcpConnector),
        config.connect_timeout(),
    )));

    // Starting disconnected is fine; `connect` can be run later
    if let Err(e) = session.borrow_mut().connect(&config.host, config.port) {
        blog_warn!("Startup connect to {}:{} failed: {}", config.host, config.port, e);
    }

    let composer = Box::new(ExternalEditor::new(config.editor_command()));
    let pager = config.pager_command();

    if one_shot {
        blog!("One-shot command: {:?}", cli.command);
        let screen = Box::new(PlainScreen::new(pager));
        let mut console = Console::new(registry, session, screen, composer, config, palette);
        if console.execute(&cli.command) == Outcome::Failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let helper = ConsoleHelper::new(Rc::clone(&registry), Rc::clone(&session));
    let screen = Box::new(ReadlineScreen::new(helper, config.history_path()?, pager)?);
    let mut console = Console::new(registry, session, screen, composer, config, palette);
    console.execute(&["info".to_string()]);
    console.run()?;

    blog!("beany exiting");
    Ok(())
}
