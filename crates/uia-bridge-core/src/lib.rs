//! Session state and pure logic for uia-bridge.
//!
//! Selector resolution, the element registry, gesture math and the
//! orientation state machine live here, together with the [`Platform`] port
//! that device adapters implement.

#![deny(clippy::all)]

pub mod geometry;
pub mod gesture;
pub mod orientation;
pub mod platform;
mod registry;
pub mod selector;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use geometry::Point;
pub use geometry::Rect;
pub use geometry::Size;
pub use gesture::GestureError;
pub use gesture::GestureVector;
pub use gesture::PinchDirection;
pub use gesture::PinchGesture;
pub use orientation::Orientation;
pub use orientation::OrientationError;
pub use orientation::RotateDirection;
pub use orientation::Rotation;
pub use platform::ElementInfo;
pub use platform::Platform;
pub use platform::PlatformError;
pub use registry::ElementRegistry;
pub use registry::RegistryError;
pub use selector::ClassMap;
pub use selector::FindPlan;
pub use selector::SelectorError;
pub use selector::Strategy;
pub use selector::UiQuery;
pub use time::Clock;
pub use time::RealSleeper;
pub use time::Sleeper;
pub use time::SystemClock;
