//! Wire protocol for uia-bridge: command envelopes in, status-coded results
//! out.

#![deny(clippy::all)]

mod command;
mod error;
mod result;
mod status;

pub use command::Command;
pub use command::Envelope;
pub use error::CommandError;
pub use result::CommandResult;
pub use status::ErrorCategory;
pub use status::Status;

/// Reply to the `shutdown` control message.
pub const SHUTDOWN_ACK: &str = "OK, shutting down";
