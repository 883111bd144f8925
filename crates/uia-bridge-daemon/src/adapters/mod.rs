//! Platform adapters.

pub mod simulated;

pub use simulated::DeviceEvent;
pub use simulated::DeviceFixture;
pub use simulated::SimElement;
pub use simulated::SimulatedDevice;
