//! Data models for the chat simulator.

mod message;
mod session;
mod update;

pub use message::{Direction, Message};
pub use session::{Credentials, LoginRequest, RegistrationRequest, Session};
pub use update::MessageUpdate;
