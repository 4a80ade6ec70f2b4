//! Chat simulator flow: bootstrap, submission and inbound delivery.

mod bootstrap;
mod inbound;
mod submission;

pub use bootstrap::{BootstrapSettings, ChatSession, Registrar, SessionBootstrap};
pub use submission::{
    Key, KeyOutcome, PendingIndicator, SessionSender, SubmissionHandler, SubmissionOutcome,
};
