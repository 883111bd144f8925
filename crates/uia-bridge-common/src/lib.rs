#![deny(clippy::all)]

mod sync;
pub mod telemetry;

pub use sync::mutex_lock_or_recover;
pub use sync::poison_recovery_count;
pub use telemetry::init_tracing;
pub use telemetry::LogSink;
pub use telemetry::TelemetryGuard;
