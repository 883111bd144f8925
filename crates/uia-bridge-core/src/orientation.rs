//! Orientation state machine.
//!
//! A requested orientation class (portrait or landscape) is turned into a
//! rotation request relative to the current rotation, then the display is
//! polled until it reports the target rotation or the timeout runs out.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::platform::Platform;
use crate::platform::PlatformError;
use crate::time::Clock;
use crate::time::Sleeper;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const CONVERGENCE_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrientationError {
    #[error("Invalid orientation '{0}', expected PORTRAIT or LANDSCAPE")]
    InvalidOrientation(String),
    #[error("Invalid rotation: {0} degrees")]
    InvalidRotation(u32),
    #[error("Set the orientation, but app refused to rotate.")]
    RefusedToRotate { target: Rotation, last: Rotation },
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Display rotation in 90 degree steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Result<Self, OrientationError> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(OrientationError::InvalidRotation(other)),
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            Rotation::Deg0 | Rotation::Deg180 => Orientation::Portrait,
            Rotation::Deg90 | Rotation::Deg270 => Orientation::Landscape,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ROTATION_{}", self.degrees())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "PORTRAIT",
            Orientation::Landscape => "LANDSCAPE",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PORTRAIT" => Ok(Orientation::Portrait),
            "LANDSCAPE" => Ok(Orientation::Landscape),
            _ => Err(OrientationError::InvalidOrientation(s.to_string())),
        }
    }
}

/// Rotation request understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
    Natural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPlan {
    Already(Orientation),
    Rotate {
        direction: RotateDirection,
        target: Rotation,
    },
}

/// Transition table from the current rotation to a requested class.
pub fn plan_rotation(current: Rotation, requested: Orientation) -> RotationPlan {
    match (requested, current) {
        (Orientation::Landscape, Rotation::Deg0) => RotationPlan::Rotate {
            direction: RotateDirection::Right,
            target: Rotation::Deg270,
        },
        (Orientation::Landscape, Rotation::Deg180) => RotationPlan::Rotate {
            direction: RotateDirection::Left,
            target: Rotation::Deg270,
        },
        (Orientation::Portrait, Rotation::Deg90 | Rotation::Deg270) => RotationPlan::Rotate {
            direction: RotateDirection::Natural,
            target: Rotation::Deg0,
        },
        (requested, _) => RotationPlan::Already(requested),
    }
}

/// Bounds for the convergence poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            timeout: CONVERGENCE_TIMEOUT,
        }
    }
}

/// Polls `read` until it reports `target` or `policy.timeout` elapses.
///
/// `read` is checked once before the first sleep and once more after the
/// last one, so a rotation that lands exactly at the deadline still counts.
pub fn await_rotation<F>(
    mut read: F,
    target: Rotation,
    clock: &dyn Clock,
    sleeper: &dyn Sleeper,
    policy: PollPolicy,
) -> Result<(), OrientationError>
where
    F: FnMut() -> Result<Rotation, PlatformError>,
{
    let started = clock.now();
    loop {
        let current = read()?;
        if current == target {
            return Ok(());
        }
        if clock.now().duration_since(started) >= policy.timeout {
            return Err(OrientationError::RefusedToRotate {
                target,
                last: current,
            });
        }
        debug!(%current, %target, "waiting for rotation");
        sleeper.sleep(policy.interval);
    }
}

/// Outcome of [`set_orientation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationChange {
    Already(Orientation),
    Rotated(Orientation),
}

impl OrientationChange {
    pub fn message(&self) -> String {
        match self {
            OrientationChange::Already(o) => {
                format!("Already in {} mode.", o.as_str().to_lowercase())
            }
            OrientationChange::Rotated(o) => o.as_str().to_string(),
        }
    }
}

/// Rotates `platform` into `requested` and waits for it to settle.
pub fn set_orientation<P: Platform + ?Sized>(
    platform: &P,
    requested: Orientation,
    clock: &dyn Clock,
    sleeper: &dyn Sleeper,
    policy: PollPolicy,
) -> Result<OrientationChange, OrientationError> {
    let current = platform.rotation()?;
    match plan_rotation(current, requested) {
        RotationPlan::Already(orientation) => {
            debug!(%current, "orientation already satisfied");
            Ok(OrientationChange::Already(orientation))
        }
        RotationPlan::Rotate { direction, target } => {
            info!(%current, %target, ?direction, "rotating display");
            platform.set_rotation(direction)?;
            await_rotation(|| platform.rotation(), target, clock, sleeper, policy)?;
            Ok(OrientationChange::Rotated(requested))
        }
    }
}
