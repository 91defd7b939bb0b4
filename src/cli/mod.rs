//! Command-line interface for teevee.
//!
//! This module provides CLI commands for probing audio file metadata and
//! rendering map composites without launching the companion display.

mod commands;

pub use commands::{Cli, Commands, run_command};
