//! dsweb - deepstream web chat simulator and REST harness.
//!
//! Architecture:
//! - `chat`: participant flow (bootstrap, submission, inbound listener)
//! - `timeline`: formatting and rendering onto a UI surface
//! - `pubsub`: client seam plus an in-process broker
//! - `rest`: REST backend client used by the harness and for registration

mod chat;
mod cli;
mod config;
mod error;
mod logging;
mod models;
mod pubsub;
mod rest;
mod timeline;

use anyhow::Result;
use clap::Parser;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli).await
}
