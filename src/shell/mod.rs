//! Backend query execution.

pub mod command;

pub use command::{execute, execute_checked, CommandOptions, CommandResult};
