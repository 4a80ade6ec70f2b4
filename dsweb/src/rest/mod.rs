//! REST backend access.

mod client;
mod command;

pub use client::RestClient;
pub use command::RestCommand;
