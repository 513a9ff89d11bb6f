use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{blog_debug, Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 11300;
const DEFAULT_EDITOR: &str = "vi";
const DEFAULT_PAGER: &str = "less -R";
const HISTORY_FILE: &str = ".beany_history";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
    pub history_file: Option<String>,
    pub editor: Option<String>,
    pub pager: Option<String>,
    pub put: PutDefaults,
}

/// Job parameters used by `put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PutDefaults {
    pub priority: u32,
    pub delay_secs: u64,
    pub ttr_secs: u64,
}

impl Default for PutDefaults {
    fn default() -> Self {
        Self {
            priority: 1,
            delay_secs: 0,
            ttr_secs: 180,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 5,
            history_file: None,
            editor: None,
            pager: None,
            put: PutDefaults::default(),
        }
    }
}

impl Config {
    pub fn beany_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".beany"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::beany_dir()?.join("beany.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        blog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            blog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        blog_debug!(
            "Config loaded: host={} port={} editor={:?} pager={:?}",
            config.host,
            config.port,
            config.editor,
            config.pager
        );
        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn history_path(&self) -> Result<PathBuf> {
        match &self.history_file {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(HISTORY_FILE)),
        }
    }

    /// Editor command line: config, then `$EDITOR`, then `vi`.
    pub fn editor_command(&self) -> Vec<String> {
        resolve_command(
            self.editor.as_deref(),
            std::env::var("EDITOR").ok().as_deref(),
            DEFAULT_EDITOR,
        )
    }

    /// Pager command line: config, then `$PAGER`, then `less -R`.
    pub fn pager_command(&self) -> Vec<String> {
        resolve_command(
            self.pager.as_deref(),
            std::env::var("PAGER").ok().as_deref(),
            DEFAULT_PAGER,
        )
    }
}

fn resolve_command(configured: Option<&str>, env: Option<&str>, fallback: &str) -> Vec<String> {
    [configured, env]
        .into_iter()
        .flatten()
        .map(split_command)
        .find(|words| !words.is_empty())
        .unwrap_or_else(|| split_command(fallback))
}

fn split_command(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// Split `host[:port]` as given to `--connect`.
pub fn parse_address(address: &str) -> Result<(String, Option<u16>)> {
    match address.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') || host.starts_with('[') => {
            let port = parse_port(port)?;
            let host = host.trim_start_matches('[').trim_end_matches(']');
            Ok((host.to_string(), Some(port)))
        }
        _ => Ok((address.to_string(), None)),
    }
}

/// Ports are 1-65535; zero is rejected along with anything non-numeric.
pub fn parse_port(port: &str) -> Result<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(Error::Validation(format!(
            "unable to parse port '{}'",
            port
        ))),
        Ok(port) => Ok(port),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
