//! Command handlers for the bl4save CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod save;
pub mod serial;
