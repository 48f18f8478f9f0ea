//! Line-oriented input: parsing typed commands and running them.

pub mod command;
pub mod handler;

pub use command::{parse_command, ParseError, SessionCommand};
pub use handler::{CommandHandler, Reply};
