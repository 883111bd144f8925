//! Result status codes.
//!
//! The numeric values follow the WebDriver wire protocol:
//! - 0: success
//! - 7, 10: element lookups
//! - 9, 13: dispatch and server-side failures
//! - 29, 32, 35: rejected input

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    Success,
    NoSuchElement,
    UnknownCommand,
    StaleElementReference,
    UnknownError,
    InvalidElementCoordinates,
    InvalidSelector,
    InvalidCommand,
}

impl Status {
    pub const ALL: [Status; 8] = [
        Status::Success,
        Status::NoSuchElement,
        Status::UnknownCommand,
        Status::StaleElementReference,
        Status::UnknownError,
        Status::InvalidElementCoordinates,
        Status::InvalidSelector,
        Status::InvalidCommand,
    ];

    pub fn code(&self) -> u8 {
        match self {
            Status::Success => 0,
            Status::NoSuchElement => 7,
            Status::UnknownCommand => 9,
            Status::StaleElementReference => 10,
            Status::UnknownError => 13,
            Status::InvalidElementCoordinates => 29,
            Status::InvalidSelector => 32,
            Status::InvalidCommand => 35,
        }
    }

    pub fn from_code(code: u8) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.code() == code)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Status::Success => None,
            Status::NoSuchElement | Status::StaleElementReference => Some(ErrorCategory::NotFound),
            Status::UnknownCommand
            | Status::InvalidElementCoordinates
            | Status::InvalidSelector
            | Status::InvalidCommand => Some(ErrorCategory::InvalidInput),
            Status::UnknownError => Some(ErrorCategory::Internal),
        }
    }

    /// A stale reference can succeed after the element is found again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Status::StaleElementReference)
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Status::from_code(code).ok_or_else(|| format!("unknown status code {}", code))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Success => "success",
            Status::NoSuchElement => "no such element",
            Status::UnknownCommand => "unknown command",
            Status::StaleElementReference => "stale element reference",
            Status::UnknownError => "unknown error",
            Status::InvalidElementCoordinates => "invalid element coordinates",
            Status::InvalidSelector => "invalid selector",
            Status::InvalidCommand => "invalid command",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Error category for programmatic handling by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The referenced element does not exist (any more).
    NotFound,
    /// The command or its parameters were rejected.
    InvalidInput,
    /// The platform failed to carry out the action.
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let codes: Vec<u8> = Status::ALL.iter().map(Status::code).collect();
        assert_eq!(codes, vec![0, 7, 9, 10, 13, 29, 32, 35]);
    }

    #[test]
    fn test_from_code_rejects_unknown() {
        assert_eq!(Status::from_code(10), Some(Status::StaleElementReference));
        assert_eq!(Status::from_code(11), None);
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Status::InvalidSelector).unwrap(), "32");
        let status: Status = serde_json::from_str("7").unwrap();
        assert_eq!(status, Status::NoSuchElement);
        assert!(serde_json::from_str::<Status>("8").is_err());
    }

    #[test]
    fn test_categories() {
        assert_eq!(Status::Success.category(), None);
        assert_eq!(Status::StaleElementReference.category(), Some(ErrorCategory::NotFound));
        assert_eq!(Status::InvalidCommand.category(), Some(ErrorCategory::InvalidInput));
        assert_eq!(Status::UnknownError.category(), Some(ErrorCategory::Internal));
        assert!(Status::StaleElementReference.is_retryable());
        assert!(!Status::NoSuchElement.is_retryable());
    }
}
