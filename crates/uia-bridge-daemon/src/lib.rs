//! Command router, handlers and the TCP server of uia-bridge.
//!
//! A [`BridgeServer`] owns one [`BridgeSession`] and serves newline-delimited
//! JSON commands over TCP, one connection at a time. Each command goes
//! through the [`Router`] to a handler, and its outcome is encoded as a
//! status-coded result.

#![deny(clippy::all)]

pub mod adapters;
mod config;
mod error;
mod handlers;
mod router;
mod server;
mod session;
#[cfg(unix)]
mod signal_handler;
pub mod transport;

pub use config::BridgeConfig;
pub use config::BIND_ENV;
pub use config::DEFAULT_PORT;
pub use config::IDLE_TIMEOUT_ENV;
pub use config::MAX_REQUEST_ENV;
pub use config::PORT_ENV;
pub use config::UNICODE_KEYBOARD_ENV;
pub use error::DaemonError;
pub use router::Router;
pub use server::bind;
pub use server::run;
pub use server::BridgeServer;
pub use server::ClientOutcome;
pub use session::BridgeSession;
