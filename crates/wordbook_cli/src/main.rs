//! `wordbook` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, open the shared word store once and dispatch one
//!   command against `wordbook_core`.
//! - Map core errors to exit statuses: 2 for rejected input, 1 otherwise.

mod cli;
mod commands;
mod prompt;
mod render;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    commands::run(cli.global, cli.command)
}
