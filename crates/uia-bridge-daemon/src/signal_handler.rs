//! Stops the accept loop on SIGINT or SIGTERM.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Signals;
use tracing::info;

use crate::error::DaemonError;

const STOP_SIGNALS: [i32; 2] = [SIGINT, SIGTERM];

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        _ => "unknown",
    }
}

/// Watches for stop signals on a background thread and raises the server's
/// shutdown flag on the first one.
pub struct ShutdownSignals {
    _watcher: JoinHandle<()>,
}

impl ShutdownSignals {
    pub fn install(shutdown: Arc<AtomicBool>) -> Result<Self, DaemonError> {
        let mut signals =
            Signals::new(STOP_SIGNALS).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

        let watcher = thread::Builder::new()
            .name("bridge-signals".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(signal = signal_name(signal), "stop signal received");
                    shutdown.store(true, Ordering::SeqCst);
                }
            })
            .map_err(|e| DaemonError::SignalSetup(format!("cannot start signal watcher: {}", e)))?;

        Ok(Self { _watcher: watcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use std::time::Instant;

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(SIGINT), "SIGINT");
        assert_eq!(signal_name(SIGTERM), "SIGTERM");
        assert_eq!(signal_name(0), "unknown");
    }

    #[test]
    fn test_sigterm_raises_shutdown_flag() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let _signals = ShutdownSignals::install(shutdown.clone()).unwrap();
        signal_hook::low_level::raise(SIGTERM).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !shutdown.load(Ordering::SeqCst) {
            assert!(Instant::now() < deadline, "shutdown flag was not set");
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}
