pub mod tcp;

pub use tcp::TcpConnection;
pub use tcp::TcpTransportListener;

use std::time::Duration;

use uia_bridge_protocol::CommandResult;
use uia_bridge_protocol::Envelope;

#[derive(Debug)]
pub enum TransportError {
    Io(std::io::Error),
    Parse(String),
    Serialize(String),
    SizeLimit { max_bytes: usize },
    Timeout,
    ConnectionClosed,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Parse(msg) => write!(f, "{}", msg),
            Self::Serialize(msg) => write!(f, "Failed to serialize result: {}", msg),
            Self::SizeLimit { max_bytes } => {
                write!(f, "Request size limit exceeded (max {} bytes)", max_bytes)
            }
            Self::Timeout => write!(f, "Connection timeout"),
            Self::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Self::Timeout,
            std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset => Self::ConnectionClosed,
            _ => Self::Io(err),
        }
    }
}

/// One client connection carrying newline-delimited JSON.
pub trait TransportConnection: Send {
    /// Next command envelope; blank lines are skipped.
    fn read_request(&mut self) -> Result<Envelope, TransportError>;
    fn write_response(&mut self, response: &CommandResult) -> Result<(), TransportError>;
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError>;
    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> Result<(), TransportError>;
}

pub trait TransportListener {
    type Connection: TransportConnection;
    fn accept(&self) -> Result<Self::Connection, TransportError>;
    fn set_nonblocking(&self, nonblocking: bool) -> Result<(), TransportError>;
}
