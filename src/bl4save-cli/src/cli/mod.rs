//! CLI argument definitions for bl4save
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

mod core;
mod save;
mod serial;

pub use core::{Cli, Commands};
pub use save::{ContainerArgs, SaveCommand};
pub use serial::{SerialCommand, StatOverrides};
