use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::time::Duration;

use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uia_bridge_protocol::CommandResult;
use uia_bridge_protocol::ErrorCategory;
use uia_bridge_protocol::Status;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect to bridge at {addr}: {source}")]
    ConnectionFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Bridge connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bridge closed the connection without a response")]
    NoResponse,

    #[error("Command failed with {status}: {message}")]
    Command { status: Status, message: String },
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::ConnectionFailed { .. } => ErrorCategory::NotFound,
            ClientError::Json(_) => ErrorCategory::InvalidInput,
            ClientError::Io(_) | ClientError::NoResponse => ErrorCategory::Internal,
            ClientError::Command { status, .. } => {
                status.category().unwrap_or(ErrorCategory::Internal)
            }
        }
    }

    pub fn suggestion(&self) -> Option<String> {
        match self {
            ClientError::ConnectionFailed { .. } => Some(
                "Start the bridge with 'uia-bridge serve' or check --host/--port.".to_string(),
            ),
            ClientError::Json(_) => Some(
                r#"Requests look like {"cmd": "find", "params": {"strategy": "id", "selector": "login"}}"#
                    .to_string(),
            ),
            ClientError::Command { status, .. } if *status == Status::StaleElementReference => {
                Some("Find the element again to get a fresh elementId.".to_string())
            }
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed { .. } | ClientError::NoResponse => true,
            ClientError::Command { status, .. } => status.is_retryable(),
            ClientError::Io(_) | ClientError::Json(_) => false,
        }
    }
}

/// Sends commands to a running bridge, one connection per request.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    addr: SocketAddr,
    read_timeout: Duration,
}

impl BridgeClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Sends one request line as-is and decodes the reply.
    pub fn send_raw(&self, request: &str) -> Result<CommandResult, ClientError> {
        let mut stream = TcpStream::connect_timeout(&self.addr, CONNECT_TIMEOUT).map_err(
            |source| ClientError::ConnectionFailed {
                addr: self.addr,
                source,
            },
        )?;
        stream.set_read_timeout(Some(self.read_timeout))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

        debug!(addr = %self.addr, request, "sending request");
        stream.write_all(format!("{}\n", request.trim_end()).as_bytes())?;
        stream.flush()?;

        let mut reader = BufReader::new(&stream);
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(ClientError::NoResponse);
        }
        Ok(serde_json::from_str(&line)?)
    }

    pub fn send(&self, request: &Value) -> Result<CommandResult, ClientError> {
        self.send_raw(&serde_json::to_string(request)?)
    }

    /// Runs `name` and returns its value, turning a non-zero status into
    /// [`ClientError::Command`].
    pub fn call(&self, name: &str, params: Map<String, Value>) -> Result<Value, ClientError> {
        let result = self.send(&json!({ "cmd": name, "params": params }))?;
        into_value(result)
    }
}

pub fn into_value(result: CommandResult) -> Result<Value, ClientError> {
    if result.is_success() {
        return Ok(result.value);
    }
    let message = match result.value {
        Value::String(message) => message,
        other => other.to_string(),
    };
    Err(ClientError::Command {
        status: result.status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn one_shot_server(reply: &'static str) -> (SocketAddr, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            reader.read_line(&mut request).unwrap();
            let mut writer = stream;
            writer.write_all(reply.as_bytes()).unwrap();
            request
        });
        (addr, handle)
    }

    #[test]
    fn test_call_returns_value() {
        let (addr, server) = one_shot_server("{\"status\":0,\"value\":{\"ELEMENT\":\"1\"}}\n");
        let client = BridgeClient::new(addr);
        let params = json!({ "strategy": "id", "selector": "login" })
            .as_object()
            .cloned()
            .unwrap();
        let value = client.call("find", params).unwrap();
        assert_eq!(value, json!({ "ELEMENT": "1" }));

        let request: Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(request["cmd"], "find");
        assert_eq!(request["params"]["selector"], "login");
    }

    #[test]
    fn test_error_status_becomes_command_error() {
        let (addr, _server) = one_shot_server("{\"status\":10,\"value\":\"gone\"}\n");
        let err = BridgeClient::new(addr).call("element:click", Map::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Command failed with stale element reference (10): gone"
        );
        assert!(err.suggestion().unwrap().contains("Find the element again"));
    }

    #[test]
    fn test_connection_refused() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = BridgeClient::new(addr).send_raw("{\"cmd\":\"pressBack\"}").unwrap_err();
        assert!(matches!(err, ClientError::ConnectionFailed { .. }));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_closed_without_reply() {
        let (addr, _server) = one_shot_server("");
        let err = BridgeClient::new(addr).send_raw("{\"cmd\":\"pressBack\"}").unwrap_err();
        assert!(matches!(err, ClientError::NoResponse));
    }
}
