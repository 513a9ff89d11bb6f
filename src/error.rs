use thiserror::Error;

/// Error responses defined by the beanstalkd protocol, plus anything the
/// server sends that we don't understand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("not found")]
    NotFound,

    #[error("job #{0} was buried (server out of memory)")]
    Buried(u64),

    #[error("expected CRLF after job body")]
    ExpectedCrlf,

    #[error("job too big")]
    JobTooBig,

    #[error("server is draining")]
    Draining,

    #[error("server out of memory")]
    OutOfMemory,

    #[error("internal server error")]
    InternalError,

    #[error("bad format")]
    BadFormat,

    #[error("unknown command")]
    UnknownCommand,

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ProtocolError {
    /// Map a status line the server may send for any command.
    pub fn from_status(line: &str) -> Self {
        match line {
            "NOT_FOUND" => ProtocolError::NotFound,
            "EXPECTED_CRLF" => ProtocolError::ExpectedCrlf,
            "JOB_TOO_BIG" => ProtocolError::JobTooBig,
            "DRAINING" => ProtocolError::Draining,
            "OUT_OF_MEMORY" => ProtocolError::OutOfMemory,
            "INTERNAL_ERROR" => ProtocolError::InternalError,
            "BAD_FORMAT" => ProtocolError::BadFormat,
            "UNKNOWN_COMMAND" => ProtocolError::UnknownCommand,
            other => ProtocolError::Unexpected(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("can't {0}, not connected to a beanstalk server")]
    NotConnected(&'static str),

    #[error("unable to connect to {address}: {source}")]
    Connection {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Validation(String),

    #[error("cancelled")]
    Cancelled,

    #[error("command or alias registered twice: {0}")]
    DuplicateCommand(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("Pager error: {0}")]
    Pager(String),
}

impl Error {
    /// True when the server answered `NOT_FOUND`. Bulk scans and peeks read
    /// this as "nothing left" rather than as a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Protocol(ProtocolError::NotFound))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
