//! The console's command set.

use super::{Command, Registry};
use crate::bulk::{self, Termination};
use crate::client::{validate_tube_name, JobState, PutOptions};
use crate::config;
use crate::console::style::{self, Palette};
use crate::console::Context;
use crate::session::Session;
use crate::{blog_debug, Error, Result};

/// Registry holding every built-in command. Fails if two commands claim
/// the same word.
pub fn standard() -> Result<Registry> {
    let mut registry = Registry::new();

    registry.register(
        Command::new("connect", "connects to a beanstalk server", connect)
            .long_help(HELP_CONNECT),
    )?;
    registry.register(
        Command::new("disconnect", "disconnects from the beanstalk server", disconnect)
            .long_help("Closes the connection to the current beanstalk server."),
    )?;
    registry.register(
        Command::new("info", "info about the current connection", info)
            .long_help("Shows the host and port of the current connection."),
    )?;
    registry.register(
        Command::new("use", "use a tube", use_tube)
            .alias("ut")
            .long_help(HELP_USE)
            .completer(complete_tubes),
    )?;
    registry.register(
        Command::new("list-tubes", "lists tubes", list_tubes)
            .alias("lt")
            .alias("list")
            .long_help(HELP_LIST_TUBES),
    )?;
    registry.register(
        Command::new("put", "puts data on the current tube", put)
            .long_help(HELP_PUT)
            .completer(complete_tubes),
    )?;
    registry.register(
        Command::new("peek", "peek at the given job", peek)
            .alias("p")
            .long_help("Shows the body of a job by id:\n\n  peek <ID>\n\nAlias: 'p'."),
    )?;
    registry.register_family(&JobState::ALL, peek_state)?;
    registry.register(
        Command::new("delete", "delete a job", delete)
            .alias("del")
            .alias("dj")
            .long_help("Deletes one job by id, after asking:\n\n  delete <ID>\n\nAliases: 'del', 'dj'."),
    )?;
    registry.register_family(&JobState::ALL, delete_state)?;
    registry.register(
        Command::new("bury", "bury a job", bury).long_help(HELP_BURY),
    )?;
    registry.register(
        Command::new("kick", "kick jobs from the current tube", kick).long_help(HELP_KICK),
    )?;
    registry.register(
        Command::new("stats", "display server statistics", stats)
            .long_help("Shows the statistics the server reports about itself."),
    )?;
    registry.register(
        Command::new("stats-job", "prints the stats for a job", stats_job)
            .alias("sj")
            .long_help("Shows the statistics of one job:\n\n  stats-job <ID>\n\nAlias: 'sj'."),
    )?;
    registry.register(
        Command::new("stats-tube", "stats the current tube", stats_tube)
            .alias("st")
            .long_help(HELP_STATS_TUBE)
            .completer(complete_tubes),
    )?;
    registry.register(
        Command::new("version", "display version information", version)
            .long_help("Shows the beany version."),
    )?;
    registry.register(
        Command::new("help", "display help", help)
            .long_help("Lists every command, or shows the full help of one:\n\n  help <COMMAND>"),
    )?;
    registry.register(
        Command::new("exit", "leave the console", exit)
            .alias("quit")
            .long_help("Leaves the console. End of input (Ctrl+D) does the same."),
    )?;
    registry.register(
        Command::new("clear", "clear the screen", clear).long_help("Clears the terminal."),
    )?;

    Ok(registry)
}

const HELP_CONNECT: &str = "\
Connects to a beanstalk server. Without arguments the configured server is
used (127.0.0.1:11300 unless changed in ~/.beany/beany.toml).

  connect <HOST>          port from the configuration
  connect <HOST> <PORT>

A failed attempt keeps any existing connection.";

const HELP_USE: &str = "\
Makes <TUBE> the current tube. Tubes need not exist yet; the server creates
them when a job is put.

  use <TUBE>

Alias: 'ut'.";

const HELP_LIST_TUBES: &str = "\
Shows a table of every tube on the server with its ready, delayed and
buried job counts.

Aliases: 'lt', 'list'.";

const HELP_PUT: &str = "\
Opens an editor and puts what you save onto the current tube, or onto
<TUBE> when given:

  put <TUBE>

The editor comes from the configuration, then $EDITOR, then vi. Saving an
empty file puts nothing.";

const HELP_BURY: &str = "\
Buries a job by id, after asking. The priority defaults to the configured
put priority.

  bury <ID> [PRIORITY]";

const HELP_KICK: &str = "\
Kicks jobs on the current tube back to ready. Without a count, kicks as many
jobs as are buried right now:

  kick <COUNT>";

const HELP_STATS_TUBE: &str = "\
Shows statistics for the current tube, or for <TUBE>:

  stats-tube <TUBE>

Alias: 'st'.";

fn peek_state(state: JobState) -> Command {
    Command::new(
        format!("peek-{}", state),
        format!("peek at {} jobs", state),
        move |ctx, args| {
            let tube = tube_arg(ctx, args)?;
            match ctx.session.peek(&tube, state) {
                Ok(job) => {
                    let text = job_details(&ctx.palette, job.id, &job.body_text());
                    ctx.show(&text)
                }
                Err(e) if e.is_not_found() => {
                    ctx.info(&format!("No {} jobs on tube '{}'", state, tube))
                }
                Err(e) => Err(e),
            }
        },
    )
    .alias(format!("p{}", state.initial()))
    .long_help(format!(
        "Shows the job at the front of the {state} queue of the current tube, or\n\
         of <TUBE>:\n\n  peek-{state} <TUBE>\n\nAlias: 'p{initial}'.",
        state = state,
        initial = state.initial()
    ))
    .completer(complete_tubes)
}

fn delete_state(state: JobState) -> Command {
    Command::new(
        format!("delete-{}", state),
        format!("deletes all {} jobs on the current tube", state),
        move |ctx, args| {
            require_connection(ctx, "delete jobs")?;
            let tube = tube_arg(ctx, args)?;
            ctx.confirm(&format!(
                "Are you sure you want to delete all {} jobs from the {} tube",
                state, tube
            ))?;

            let outcome = bulk::delete_all(ctx.session, state, &tube);
            if outcome.count > 0 {
                ctx.info(&format!("Deleted {} {} jobs", outcome.count, state))?;
            }
            match outcome.termination {
                Termination::Exhausted if outcome.count == 0 => {
                    ctx.info(&format!("No {} jobs to delete on tube '{}'", state, tube))
                }
                Termination::Exhausted => Ok(()),
                Termination::Fault(e) => Err(e),
            }
        },
    )
    .alias(format!("d{}", state.initial()))
    .long_help(format!(
        "Deletes every {state} job on the current tube, or on <TUBE>, after\n\
         asking:\n\n  delete-{state} <TUBE>\n\nAlias: 'd{initial}'.",
        state = state,
        initial = state.initial()
    ))
    .completer(complete_tubes)
}

fn connect(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let (host, port) = match args {
        [] => (ctx.config.host.clone(), ctx.config.port),
        [host] => (host.clone(), ctx.config.port),
        [host, port] => (host.clone(), config::parse_port(port)?),
        _ => return Err(too_many()),
    };
    ctx.session.connect(&host, port)?;
    info(ctx, &[])
}

fn disconnect(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    ctx.session.disconnect()?;
    let message = format!(
        "Disconnected from '{}:{}'",
        ctx.session.host(),
        ctx.session.port()
    );
    ctx.info(&message)
}

fn info(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    let address = ctx.session.connection_string()?;
    ctx.info(&format!("Connected to '{}'", address))
}

fn use_tube(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let tube = match args {
        [] => return Err(Error::Validation("tube required".to_string())),
        [tube] => tube,
        _ => return Err(too_many()),
    };
    require_connection(ctx, "use tube")?;
    validate_tube_name(tube)?;
    ctx.session.use_tube(tube);
    Ok(())
}

fn list_tubes(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    let tubes = ctx.session.tube_summaries()?;
    let table = style::tube_table(&ctx.palette, &tubes);
    ctx.show(&table)
}

fn put(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    require_connection(ctx, "put")?;
    let tube = tube_arg(ctx, args)?;

    let body = ctx.composer.compose()?;
    if body.is_empty() {
        return Err(Error::Validation(
            "no data in job, not adding to tube".to_string(),
        ));
    }

    let id = ctx.session.put(&tube, &body, PutOptions::from(ctx.config.put))?;
    ctx.info(&format!("Put job (#{}) onto {}", id, tube))
}

fn peek(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let id = job_arg(args)?;
    let body = ctx.session.peek_job(id)?;
    let text = job_details(&ctx.palette, id, &String::from_utf8_lossy(&body));
    ctx.show(&text)
}

fn delete(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let id = job_arg(args)?;
    require_connection(ctx, "delete")?;
    ctx.confirm(&format!("Are you sure you want to delete job #{}", id))?;
    ctx.session.delete(id)?;
    ctx.info(&format!("Deleted job #{}", id))
}

fn bury(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let (id, priority) = match args {
        [id] => (parse_id(id)?, ctx.config.put.priority),
        [id, priority] => (
            parse_id(id)?,
            priority.parse().map_err(|_| {
                Error::Validation(format!("unable to parse priority '{}'", priority))
            })?,
        ),
        [] => return Err(too_few()),
        _ => return Err(too_many()),
    };
    require_connection(ctx, "bury")?;
    ctx.confirm(&format!("Are you sure you want to bury job #{}", id))?;
    ctx.session.bury(id, priority)?;
    ctx.info(&format!("Buried job #{}", id))
}

fn kick(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let tube = ctx.session.current_tube_name()?.to_string();
    let bound = match args {
        [] => None,
        [count] => Some(count.parse().map_err(|_| {
            Error::Validation(format!("unable to parse job count '{}'", count))
        })?),
        _ => return Err(too_many()),
    };
    let outcome = bulk::kick(ctx.session, &tube, bound)?;
    ctx.info(&format!("Kicked {} jobs", outcome.kicked))
}

fn stats(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    let stats = ctx.session.stats()?;
    let text = style::listing(&ctx.palette, &stats);
    ctx.show(&text)
}

fn stats_job(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let id = job_arg(args)?;
    let stats = ctx.session.stats_job(id)?;
    let text = style::listing(&ctx.palette, &stats);
    ctx.show(&text)
}

fn stats_tube(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let tube = tube_arg(ctx, args)?;
    let stats = ctx.session.stats_tube(&tube)?;
    let text = style::listing(&ctx.palette, &stats);
    ctx.show(&text)
}

fn version(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    ctx.info(&format!("beany version: {}", env!("CARGO_PKG_VERSION")))
}

fn help(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let registry = ctx.registry;
    match args {
        [] => {
            let commands = registry.commands();
            let width = commands.iter().map(|c| c.name.len()).max().unwrap_or(0);
            let mut out = String::from("Commands:\n");
            for command in commands {
                let aliases = if command.aliases.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", command.aliases.join(", "))
                };
                out.push_str(&format!(
                    "  {:width$}  {}{}\n",
                    command.name,
                    command.help,
                    aliases,
                    width = width
                ));
            }
            ctx.show(&out)
        }
        [name] => {
            let command = registry
                .resolve(name)
                .ok_or_else(|| Error::Validation(format!("unknown command '{}'", name)))?;
            if command.long_help.is_empty() {
                ctx.show(&command.help)
            } else {
                ctx.show(&command.long_help)
            }
        }
        _ => Err(too_many()),
    }
}

fn exit(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    ctx.request_quit();
    Ok(())
}

fn clear(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    no_args(args)?;
    ctx.screen.clear()
}

fn complete_tubes(session: &mut Session, args: &[String]) -> Vec<String> {
    if !args.is_empty() || !session.is_connected() {
        return Vec::new();
    }
    session.list_tubes().unwrap_or_else(|e| {
        blog_debug!("Tube completion failed: {}", e);
        Vec::new()
    })
}

fn job_details(palette: &Palette, id: u64, body: &str) -> String {
    format!("{}\n{}", palette.info(&format!("Job #{}", id)), body)
}

fn require_connection(ctx: &Context<'_>, op: &'static str) -> Result<()> {
    if ctx.session.is_connected() {
        Ok(())
    } else {
        Err(Error::NotConnected(op))
    }
}

/// The explicit tube argument, or the current tube when none was given.
fn tube_arg(ctx: &Context<'_>, args: &[String]) -> Result<String> {
    match args {
        [] => Ok(ctx.session.current_tube_name()?.to_string()),
        [tube] => {
            validate_tube_name(tube)?;
            Ok(tube.clone())
        }
        _ => Err(too_many()),
    }
}

fn job_arg(args: &[String]) -> Result<u64> {
    match args {
        [] => Err(too_few()),
        [id] => parse_id(id),
        _ => Err(too_many()),
    }
}

fn parse_id(id: &str) -> Result<u64> {
    id.parse()
        .map_err(|_| Error::Validation(format!("unable to parse job id '{}'", id)))
}

fn no_args(args: &[String]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(too_many())
    }
}

fn too_few() -> Error {
    Error::Validation("too few arguments provided".to_string())
}

fn too_many() -> Error {
    Error::Validation("too many arguments provided".to_string())
}
