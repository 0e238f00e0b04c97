//! Command line interface module
//!
//! This module provides argument parsing, configuration loading (flags merged
//! over environment variables) and the runner that executes a command.

pub mod args;
pub mod config;
pub mod runner;

pub use args::{Cli, Command};
pub use config::AppConfig;
pub use runner::Runner;
