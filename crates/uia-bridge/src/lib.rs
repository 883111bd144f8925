#![deny(clippy::all)]

pub mod client;
pub mod commands;
pub mod handlers;

pub use client::BridgeClient;
pub use client::ClientError;
pub use handlers::HandlerResult;
