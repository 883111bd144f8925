use std::env;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 4724;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MAX_REQUEST_BYTES: usize = 1_048_576; // 1MB

pub const BIND_ENV: &str = "UIA_BRIDGE_BIND";
pub const PORT_ENV: &str = "UIA_BRIDGE_PORT";
pub const IDLE_TIMEOUT_ENV: &str = "UIA_BRIDGE_IDLE_TIMEOUT";
pub const MAX_REQUEST_ENV: &str = "UIA_BRIDGE_MAX_REQUEST";
pub const UNICODE_KEYBOARD_ENV: &str = "UIA_BRIDGE_UNICODE_KEYBOARD";

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    bind: IpAddr,
    port: u16,
    idle_timeout: Duration,
    max_request_bytes: usize,
    unicode_keyboard: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self {
            bind: parse_env_addr(BIND_ENV, IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: parse_env_u16(PORT_ENV, DEFAULT_PORT),
            idle_timeout: Duration::from_secs(parse_env_u64(
                IDLE_TIMEOUT_ENV,
                DEFAULT_IDLE_TIMEOUT_SECS,
            )),
            max_request_bytes: parse_env_usize(MAX_REQUEST_ENV, DEFAULT_MAX_REQUEST_BYTES),
            unicode_keyboard: parse_env_bool(UNICODE_KEYBOARD_ENV, false),
        }
    }

    pub fn bind(&self) -> IpAddr {
        self.bind
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    /// Default for `element:setText` when the command leaves
    /// `unicodeKeyboard` out.
    pub fn unicode_keyboard(&self) -> bool {
        self.unicode_keyboard
    }

    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_max_request_bytes(mut self, max: usize) -> Self {
        self.max_request_bytes = max;
        self
    }

    pub fn with_unicode_keyboard(mut self, enabled: bool) -> Self {
        self.unicode_keyboard = enabled;
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    let Some(value) = env_value(key) else {
        return default;
    };
    match value.trim().parse::<usize>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    let Some(value) = env_value(key) else {
        return default;
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid numeric config; using default");
            default
        }
    }
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    let Some(value) = env_value(key) else {
        return default;
    };
    match value.trim().parse::<u16>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid port config; using default");
            default
        }
    }
}

fn parse_env_addr(key: &str, default: IpAddr) -> IpAddr {
    let Some(value) = env_value(key) else {
        return default;
    };
    match value.trim().parse::<IpAddr>() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!(value = %value, key, "Invalid bind address; using default");
            default
        }
    }
}

fn parse_env_bool(key: &str, default: bool) -> bool {
    let Some(value) = env_value(key) else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(value = %value, key, "Invalid boolean config; using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = env::var(key).ok();
            env::set_var(key, value);
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match self.prev.take() {
                Some(prev) => env::set_var(self.key, prev),
                None => env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let config = BridgeConfig::default();
        assert_eq!(config.bind(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(
            config.idle_timeout(),
            Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)
        );
        assert_eq!(config.max_request_bytes(), DEFAULT_MAX_REQUEST_BYTES);
        assert!(!config.unicode_keyboard());
        assert_eq!(config.addr().to_string(), "127.0.0.1:4724");
    }

    #[test]
    fn test_builder_pattern() {
        let config = BridgeConfig::from_env()
            .with_bind(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .with_port(5000)
            .with_idle_timeout(Duration::from_secs(5))
            .with_max_request_bytes(2048)
            .with_unicode_keyboard(true);

        assert_eq!(config.addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_request_bytes(), 2048);
        assert!(config.unicode_keyboard());
    }

    #[test]
    fn test_env_overrides() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _bind = EnvGuard::set(BIND_ENV, "0.0.0.0");
        let _port = EnvGuard::set(PORT_ENV, "4800");
        let _unicode = EnvGuard::set(UNICODE_KEYBOARD_ENV, "TRUE");

        let config = BridgeConfig::from_env();
        assert_eq!(config.addr().to_string(), "0.0.0.0:4800");
        assert!(config.unicode_keyboard());
    }

    #[test]
    fn test_invalid_env_uses_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _bind = EnvGuard::set(BIND_ENV, "localhost:1");
        let _port = EnvGuard::set(PORT_ENV, "99999");
        let _idle = EnvGuard::set(IDLE_TIMEOUT_ENV, "bad");
        let _max_req = EnvGuard::set(MAX_REQUEST_ENV, "bad");
        let _unicode = EnvGuard::set(UNICODE_KEYBOARD_ENV, "maybe");

        let config = BridgeConfig::from_env();
        assert_eq!(config.bind(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(
            config.idle_timeout(),
            Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)
        );
        assert_eq!(config.max_request_bytes(), DEFAULT_MAX_REQUEST_BYTES);
        assert!(!config.unicode_keyboard());
    }

    #[test]
    fn test_blank_env_uses_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _port = EnvGuard::set(PORT_ENV, "  ");
        assert_eq!(BridgeConfig::from_env().port(), DEFAULT_PORT);
    }
}
