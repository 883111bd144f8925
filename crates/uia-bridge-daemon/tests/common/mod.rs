//! In-process bridge for end-to-end tests over a real TCP socket.

#![allow(dead_code)]

use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::thread::{self};
use std::time::Duration;

use serde_json::Value;
use uia_bridge_daemon::adapters::SimulatedDevice;
use uia_bridge_daemon::bind;
use uia_bridge_daemon::BridgeConfig;
use uia_bridge_daemon::BridgeServer;
use uia_bridge_daemon::BridgeSession;
use uia_bridge_daemon::DaemonError;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A bridge serving the sample device on an ephemeral localhost port.
pub struct TestBridge {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<(), DaemonError>>>,
}

impl TestBridge {
    pub fn start() -> Self {
        Self::start_with(|config| config)
    }

    pub fn start_with(configure: impl FnOnce(BridgeConfig) -> BridgeConfig) -> Self {
        let config = configure(
            BridgeConfig::from_env()
                .with_bind("127.0.0.1".parse().unwrap())
                .with_port(0)
                .with_idle_timeout(Duration::from_secs(5))
                .with_unicode_keyboard(false),
        );
        let listener = bind(&config).expect("bind test bridge");
        let addr = listener.local_addr().expect("local addr");

        let session = BridgeSession::new(SimulatedDevice::sample().unwrap(), &config);
        let server = BridgeServer::new(session, config);
        let shutdown = server.shutdown_handle();
        let handle = thread::Builder::new()
            .name("test-bridge".to_string())
            .spawn(move || server.serve(&listener))
            .expect("spawn bridge thread");

        Self {
            addr,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn client(&self) -> TestClient {
        TestClient::connect(self.addr)
    }

    /// Waits for the server thread, which must already be stopping.
    pub fn join(mut self) -> Result<(), DaemonError> {
        match self.handle.take() {
            Some(handle) => handle.join().expect("bridge thread panicked"),
            None => Ok(()),
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub struct TestClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TestClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to bridge");
        stream.set_read_timeout(Some(CLIENT_TIMEOUT)).unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self {
            reader,
            writer: stream,
        }
    }

    /// Writes one raw line and reads the reply, `None` once the bridge has
    /// closed the connection.
    pub fn send_line(&mut self, line: &str) -> Option<Value> {
        // One write per request so the whole line lands in a single segment.
        if self.writer.write_all(format!("{}\n", line).as_bytes()).is_err() {
            return None;
        }
        self.writer.flush().ok()?;
        self.read_response()
    }

    pub fn send(&mut self, request: &Value) -> Value {
        self.send_line(&request.to_string())
            .expect("bridge closed the connection")
    }

    pub fn read_response(&mut self) -> Option<Value> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(serde_json::from_str(&line).expect("response is JSON")),
        }
    }
}
