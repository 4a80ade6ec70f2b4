//! Command line interface: `chat` and the REST harness.

mod args;
mod commands;

pub use args::Cli;
pub use commands::execute;
