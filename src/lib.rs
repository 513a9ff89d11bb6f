pub mod bulk;
pub mod client;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod external;
pub mod log;
pub mod session;

pub use error::{Error, Result};
pub use session::Session;
