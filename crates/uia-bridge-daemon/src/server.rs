use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use uia_bridge_core::Platform;
use uia_bridge_protocol::CommandResult;
use uia_bridge_protocol::Envelope;
use uia_bridge_protocol::Status;
use uia_bridge_protocol::SHUTDOWN_ACK;

use crate::config::BridgeConfig;
use crate::error::DaemonError;
use crate::router::Router;
use crate::session::BridgeSession;
use crate::transport::TcpTransportListener;
use crate::transport::TransportConnection;
use crate::transport::TransportError;
use crate::transport::TransportListener;

const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a client connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientOutcome {
    /// The client went away; keep accepting.
    Continue,
    /// The client asked the bridge to stop.
    Shutdown,
}

/// Serves one connection at a time against a single session.
pub struct BridgeServer<P: Platform> {
    session: BridgeSession<P>,
    config: BridgeConfig,
    shutdown: Arc<AtomicBool>,
}

impl<P: Platform> BridgeServer<P> {
    pub fn new(session: BridgeSession<P>, config: BridgeConfig) -> Self {
        Self {
            session,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the accept loop once set.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn session(&self) -> &BridgeSession<P> {
        &self.session
    }

    pub fn handle_client(&self, mut conn: impl TransportConnection) -> ClientOutcome {
        if let Err(e) = conn.set_read_timeout(Some(self.config.idle_timeout())) {
            warn!(error = %e, "Failed to set read timeout");
            return ClientOutcome::Continue;
        }
        if let Err(e) = conn.set_write_timeout(Some(WRITE_TIMEOUT)) {
            warn!(error = %e, "Failed to set write timeout");
            return ClientOutcome::Continue;
        }

        let router = Router::new(&self.session);
        loop {
            let command = match conn.read_request() {
                Ok(Envelope::Command(command)) => command,
                Ok(Envelope::Shutdown) => {
                    info!("Shutdown requested by client");
                    let _ = conn.write_response(&CommandResult::success(SHUTDOWN_ACK));
                    return ClientOutcome::Shutdown;
                }
                Err(TransportError::ConnectionClosed) => {
                    debug!("Client disconnected");
                    break;
                }
                Err(TransportError::Timeout) => {
                    debug!(
                        idle_timeout_secs = self.config.idle_timeout().as_secs(),
                        "Client idle, closing connection"
                    );
                    break;
                }
                Err(e @ TransportError::SizeLimit { .. }) => {
                    warn!(error = %e, "Oversized request, closing connection");
                    let response = CommandResult::error(Status::InvalidCommand, e.to_string());
                    let _ = conn.write_response(&response);
                    break;
                }
                Err(TransportError::Parse(msg)) => {
                    debug!(error = %msg, "Undecodable request");
                    let response = CommandResult::error(Status::InvalidCommand, msg);
                    if conn.write_response(&response).is_err() {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    error!(error = %e, "Client connection error");
                    break;
                }
            };

            let response = router.dispatch(&command);
            if let Err(e) = conn.write_response(&response) {
                match e {
                    TransportError::ConnectionClosed => debug!("Client went away before the response"),
                    _ => error!(error = %e, command = %command.name, "Client write error"),
                }
                break;
            }
        }
        ClientOutcome::Continue
    }

    /// Accepts and serves connections until the shutdown flag is set, either
    /// by a signal or by a client's `shutdown` command.
    pub fn serve<L: TransportListener>(&self, listener: &L) -> Result<(), DaemonError> {
        listener.set_nonblocking(true)?;
        let mut next_conn_id: u64 = 0;

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok(conn) => {
                    next_conn_id += 1;
                    let span = info_span!("connection", conn_id = next_conn_id);
                    let _guard = span.enter();
                    debug!("Client connected");
                    if self.handle_client(conn) == ClientOutcome::Shutdown {
                        self.shutdown.store(true, Ordering::SeqCst);
                    }
                }
                Err(TransportError::Timeout) => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        warn!(error = %e, "Error accepting connection");
                    }
                }
            }
        }

        info!(
            registered_elements = self.session.registry().len(),
            "Bridge stopped"
        );
        Ok(())
    }
}

/// Binds the TCP listener described by `config`.
pub fn bind(config: &BridgeConfig) -> Result<TcpTransportListener, DaemonError> {
    let addr = config.addr();
    TcpTransportListener::bind(addr, config.max_request_bytes()).map_err(|e| DaemonError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}

/// Runs the bridge over `platform` until SIGINT/SIGTERM or a `shutdown`
/// command.
pub fn run<P: Platform>(platform: P, config: BridgeConfig) -> Result<(), DaemonError> {
    let listener = bind(&config)?;
    let local_addr = listener.local_addr()?;
    eprintln!("uia-bridge listening on {}", local_addr);
    info!(
        addr = %local_addr,
        idle_timeout_secs = config.idle_timeout().as_secs(),
        max_request_bytes = config.max_request_bytes(),
        "Bridge started"
    );

    let session = BridgeSession::new(platform, &config);
    let server = BridgeServer::new(session, config);

    #[cfg(unix)]
    let _signals = crate::signal_handler::ShutdownSignals::install(server.shutdown_handle())?;

    server.serve(&listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DeviceEvent;
    use crate::adapters::SimulatedDevice;
    use std::collections::VecDeque;
    use uia_bridge_protocol::Command;

    /// Replays scripted reads and records every response.
    struct ScriptedConnection {
        reads: VecDeque<Result<Envelope, TransportError>>,
        responses: Arc<std::sync::Mutex<Vec<CommandResult>>>,
    }

    impl ScriptedConnection {
        fn new(
            reads: Vec<Result<Envelope, TransportError>>,
        ) -> (Self, Arc<std::sync::Mutex<Vec<CommandResult>>>) {
            let responses = Arc::new(std::sync::Mutex::new(Vec::new()));
            let conn = Self {
                reads: reads.into(),
                responses: Arc::clone(&responses),
            };
            (conn, responses)
        }
    }

    impl TransportConnection for ScriptedConnection {
        fn read_request(&mut self) -> Result<Envelope, TransportError> {
            self.reads
                .pop_front()
                .unwrap_or(Err(TransportError::ConnectionClosed))
        }

        fn write_response(&mut self, response: &CommandResult) -> Result<(), TransportError> {
            self.responses.lock().unwrap().push(response.clone());
            Ok(())
        }

        fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> Result<(), TransportError> {
            Ok(())
        }

        fn set_write_timeout(&mut self, _timeout: Option<Duration>) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn server() -> BridgeServer<SimulatedDevice> {
        let config = BridgeConfig::from_env();
        let session = BridgeSession::new(SimulatedDevice::sample().unwrap(), &config);
        BridgeServer::new(session, config)
    }

    fn command(line: &str) -> Result<Envelope, TransportError> {
        Ok(Envelope::decode(line).unwrap())
    }

    #[test]
    fn test_one_response_per_request() {
        let server = server();
        let (conn, responses) = ScriptedConnection::new(vec![
            command(r#"{"cmd":"find","params":{"strategy":"id","selector":"Login"}}"#),
            command(r#"{"cmd":"action","action":"element:click","params":{"elementId":"1"}}"#),
            command(r#"{"cmd":"nope"}"#),
        ]);
        assert_eq!(server.handle_client(conn), ClientOutcome::Continue);

        let responses = responses.lock().unwrap();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].value, serde_json::json!({ "ELEMENT": "1" }));
        assert_eq!(responses[1], CommandResult::success(true));
        assert_eq!(responses[2].status, Status::UnknownCommand);
        assert!(matches!(
            server.session().platform().events().last(),
            Some(DeviceEvent::Click(_))
        ));
    }

    #[test]
    fn test_parse_error_keeps_connection() {
        let server = server();
        let (conn, responses) = ScriptedConnection::new(vec![
            Err(TransportError::Parse("Could not decode command: malformed JSON".to_string())),
            command(r#"{"cmd":"pressBack"}"#),
        ]);
        server.handle_client(conn);

        let responses = responses.lock().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].status, Status::InvalidCommand);
        assert_eq!(
            responses[0].message(),
            Some("Could not decode command: malformed JSON")
        );
        assert_eq!(responses[1], CommandResult::success(true));
    }

    #[test]
    fn test_size_limit_closes_connection() {
        let server = server();
        let (conn, responses) = ScriptedConnection::new(vec![
            Err(TransportError::SizeLimit { max_bytes: 16 }),
            command(r#"{"cmd":"pressBack"}"#),
        ]);
        server.handle_client(conn);

        let responses = responses.lock().unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status, Status::InvalidCommand);
        assert_eq!(
            responses[0].message(),
            Some("Request size limit exceeded (max 16 bytes)")
        );
    }

    #[test]
    fn test_shutdown_is_acknowledged() {
        let server = server();
        let (conn, responses) = ScriptedConnection::new(vec![
            Ok(Envelope::Shutdown),
            command(r#"{"cmd":"pressBack"}"#),
        ]);
        assert_eq!(server.handle_client(conn), ClientOutcome::Shutdown);
        assert_eq!(
            *responses.lock().unwrap(),
            vec![CommandResult::success(SHUTDOWN_ACK)]
        );
    }

    #[test]
    fn test_registry_survives_reconnect() {
        let server = server();
        let (conn, _) = ScriptedConnection::new(vec![command(
            r#"{"cmd":"find","params":{"strategy":"id","selector":"Login"}}"#,
        )]);
        server.handle_client(conn);

        let (conn, responses) = ScriptedConnection::new(vec![Ok(Envelope::Command(
            Command::new(
                "element:getText",
                serde_json::json!({ "elementId": "1" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap(),
        ))]);
        server.handle_client(conn);
        assert_eq!(
            *responses.lock().unwrap(),
            vec![CommandResult::success("Login")]
        );
    }

    #[test]
    fn test_bind_error_names_address() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let config = BridgeConfig::from_env()
            .with_bind("127.0.0.1".parse().unwrap())
            .with_port(port);
        match bind(&config) {
            Err(DaemonError::Bind { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{}", port)),
            other => panic!("expected bind error, got {:?}", other.map(|_| ())),
        }
    }
}
