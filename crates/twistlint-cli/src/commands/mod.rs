//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_msgs;
pub mod output;
