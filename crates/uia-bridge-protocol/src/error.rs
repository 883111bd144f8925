use thiserror::Error;
use uia_bridge_core::GestureError;
use uia_bridge_core::OrientationError;
use uia_bridge_core::PlatformError;
use uia_bridge_core::RegistryError;
use uia_bridge_core::SelectorError;

use crate::status::Status;

/// Every way a command can fail, as seen at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Could not decode command: {0}")]
    InvalidCommand(String),

    #[error("Parameter '{name}' must be {expected}")]
    InvalidParameter { name: String, expected: &'static str },

    #[error("Missing parameter '{0}'")]
    MissingParameter(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0} requires an elementId")]
    ElementRequired(String),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("{0}")]
    NoSuchElement(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    StaleElement(String),

    #[error("{0}")]
    InvalidCoordinates(String),

    #[error("{0}")]
    PlatformActionFailed(String),
}

impl CommandError {
    pub fn status(&self) -> Status {
        match self {
            CommandError::InvalidCommand(_) | CommandError::InvalidParameter { .. } => {
                Status::InvalidCommand
            }
            CommandError::UnknownCommand(_) => Status::UnknownCommand,
            CommandError::Selector(_) => Status::InvalidSelector,
            CommandError::NoSuchElement(_) => Status::NoSuchElement,
            CommandError::Registry(RegistryError::NotInRegistry { .. }) => Status::NoSuchElement,
            CommandError::Registry(RegistryError::Cleared { .. }) | CommandError::StaleElement(_) => {
                Status::StaleElementReference
            }
            CommandError::InvalidCoordinates(_) => Status::InvalidElementCoordinates,
            CommandError::MissingParameter(_)
            | CommandError::InvalidArgument(_)
            | CommandError::ElementRequired(_)
            | CommandError::PlatformActionFailed(_) => Status::UnknownError,
        }
    }

    pub fn invalid_parameter(name: &str, expected: &'static str) -> Self {
        CommandError::InvalidParameter {
            name: name.to_string(),
            expected,
        }
    }

    /// Reinterprets "element not found" as a stale reference.
    ///
    /// Used when the element came out of the registry: it existed when it
    /// was registered, so its disappearance makes the reference stale.
    pub fn into_stale(self) -> Self {
        match self {
            CommandError::NoSuchElement(msg) => CommandError::StaleElement(msg),
            other => other,
        }
    }
}

impl From<PlatformError> for CommandError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::ElementNotFound(_) => CommandError::NoSuchElement(err.to_string()),
            PlatformError::Unsupported(_) | PlatformError::Failed(_) => {
                CommandError::PlatformActionFailed(err.to_string())
            }
        }
    }
}

impl From<GestureError> for CommandError {
    fn from(err: GestureError) -> Self {
        match err {
            GestureError::InvalidCoordinates { .. } => {
                CommandError::InvalidCoordinates(err.to_string())
            }
            GestureError::InvalidSpeed(_)
            | GestureError::InvalidSteps
            | GestureError::InvalidDirection(_) => CommandError::InvalidArgument(err.to_string()),
        }
    }
}

impl From<OrientationError> for CommandError {
    fn from(err: OrientationError) -> Self {
        match err {
            OrientationError::Platform(inner) => inner.into(),
            OrientationError::InvalidOrientation(_) => CommandError::InvalidArgument(err.to_string()),
            OrientationError::InvalidRotation(_) | OrientationError::RefusedToRotate { .. } => {
                CommandError::PlatformActionFailed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uia_bridge_core::Point;
    use uia_bridge_core::Rotation;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CommandError::InvalidCommand("x".into()), 35),
            (CommandError::invalid_parameter("x", "a number"), 35),
            (CommandError::MissingParameter("x".into()), 13),
            (CommandError::UnknownCommand("x".into()), 9),
            (CommandError::ElementRequired("element:click".into()), 13),
            (SelectorError::InvalidStrategy("x".into()).into(), 32),
            (SelectorError::UnallowedTagName("secure".into()).into(), 32),
            (CommandError::NoSuchElement("x".into()), 7),
            (RegistryError::NotInRegistry { id: "9".into() }.into(), 7),
            (RegistryError::Cleared { id: "1".into() }.into(), 10),
            (CommandError::InvalidCoordinates("x".into()), 29),
            (CommandError::PlatformActionFailed("x".into()), 13),
        ];
        for (err, code) in cases {
            assert_eq!(err.status().code(), code, "{:?}", err);
        }
    }

    #[test]
    fn test_platform_errors() {
        let not_found: CommandError = PlatformError::ElementNotFound("gone".into()).into();
        assert_eq!(not_found.status(), Status::NoSuchElement);
        assert_eq!(not_found.into_stale().status(), Status::StaleElementReference);

        let failed: CommandError = PlatformError::Unsupported("pinch".into()).into();
        assert_eq!(failed.status(), Status::UnknownError);
        assert_eq!(failed.clone().into_stale(), failed);
    }

    #[test]
    fn test_gesture_errors() {
        let coords: CommandError = GestureError::InvalidCoordinates {
            point: Point::new(5000.0, 0.0),
            rect: "[0,0][1080,1920]".into(),
        }
        .into();
        assert_eq!(coords.status(), Status::InvalidElementCoordinates);

        let speed: CommandError = GestureError::InvalidSpeed(0.0).into();
        assert_eq!(speed.status(), Status::UnknownError);
    }

    #[test]
    fn test_orientation_errors() {
        let refused: CommandError = OrientationError::RefusedToRotate {
            target: Rotation::Deg270,
            last: Rotation::Deg0,
        }
        .into();
        assert_eq!(refused.status(), Status::UnknownError);
        assert_eq!(refused.to_string(), "Set the orientation, but app refused to rotate.");

        let invalid: CommandError = OrientationError::InvalidOrientation("up".into()).into();
        assert_eq!(invalid.status(), Status::UnknownError);
    }
}
