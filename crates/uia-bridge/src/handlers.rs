use std::collections::BTreeMap;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uia_bridge_common::telemetry::LOG_FILE_ENV;
use uia_bridge_daemon::adapters::SimulatedDevice;
use uia_bridge_daemon::BridgeConfig;
use uia_bridge_daemon::BIND_ENV;
use uia_bridge_daemon::IDLE_TIMEOUT_ENV;
use uia_bridge_daemon::MAX_REQUEST_ENV;
use uia_bridge_daemon::PORT_ENV;
use uia_bridge_daemon::UNICODE_KEYBOARD_ENV;

use crate::client::into_value;
use crate::client::BridgeClient;
use crate::client::ClientError;

pub type HandlerResult = Result<(), Box<dyn std::error::Error>>;

const FIXTURE_ENV: &str = "UIA_BRIDGE_FIXTURE";

/// Applies `serve` flags on top of the environment configuration.
pub fn serve_config(bind: Option<IpAddr>, port: Option<u16>) -> BridgeConfig {
    let mut config = BridgeConfig::from_env();
    if let Some(bind) = bind {
        config = config.with_bind(bind);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    config
}

pub fn handle_serve(
    bind: Option<IpAddr>,
    port: Option<u16>,
    fixture: Option<PathBuf>,
) -> HandlerResult {
    let config = serve_config(bind, port);
    let device = match &fixture {
        Some(path) => {
            info!(fixture = %path.display(), "loading device fixture");
            SimulatedDevice::load(path)?
        }
        None => SimulatedDevice::sample()?,
    };
    uia_bridge_daemon::run(device, config)?;
    Ok(())
}

/// Prints the result line; a failing status becomes a [`ClientError`] so the
/// exit code reflects it.
pub fn handle_send(request: &str, host: IpAddr, port: u16, timeout_secs: u64) -> HandlerResult {
    let request: Value = serde_json::from_str(request).map_err(ClientError::Json)?;
    let client = BridgeClient::new(SocketAddr::new(host, port))
        .with_read_timeout(Duration::from_secs(timeout_secs));
    let result = client.send(&request)?;
    println!("{}", result.to_line().map_err(ClientError::Json)?);
    into_value(result)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct EnvReport {
    bind: String,
    port: u16,
    idle_timeout_secs: u64,
    max_request_bytes: usize,
    unicode_keyboard: bool,
    environment: BTreeMap<&'static str, Option<String>>,
}

fn env_report(config: &BridgeConfig) -> EnvReport {
    let environment = [
        BIND_ENV,
        PORT_ENV,
        IDLE_TIMEOUT_ENV,
        MAX_REQUEST_ENV,
        UNICODE_KEYBOARD_ENV,
        FIXTURE_ENV,
        LOG_FILE_ENV,
        "RUST_LOG",
    ]
    .into_iter()
    .map(|key| (key, std::env::var(key).ok()))
    .collect();

    EnvReport {
        bind: config.bind().to_string(),
        port: config.port(),
        idle_timeout_secs: config.idle_timeout().as_secs(),
        max_request_bytes: config.max_request_bytes(),
        unicode_keyboard: config.unicode_keyboard(),
        environment,
    }
}

pub fn handle_env(json: bool) -> HandlerResult {
    let report = env_report(&BridgeConfig::from_env());
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Bridge Configuration:");
    println!("  Listen: {}:{}", report.bind, report.port);
    println!("  Idle timeout: {}s", report.idle_timeout_secs);
    println!("  Max request: {} bytes", report.max_request_bytes);
    println!("  Unicode keyboard: {}", report.unicode_keyboard);
    println!();
    println!("Environment Variables:");
    for (name, value) in &report.environment {
        println!("  {}: {}", name, value.as_deref().unwrap_or("(not set)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_flags_override_environment() {
        let config = serve_config(Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), Some(4800));
        assert_eq!(config.addr().to_string(), "0.0.0.0:4800");
    }

    #[test]
    fn test_env_report_lists_every_key() {
        let report = env_report(&BridgeConfig::from_env().with_port(4724));
        assert_eq!(report.port, 4724);
        for key in [BIND_ENV, PORT_ENV, FIXTURE_ENV, LOG_FILE_ENV] {
            assert!(report.environment.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_send_rejects_invalid_json() {
        let err = handle_send("{not json", IpAddr::V4(Ipv4Addr::LOCALHOST), 1, 1).unwrap_err();
        assert!(err.downcast_ref::<ClientError>().is_some());
    }
}
