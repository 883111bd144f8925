use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::error::CommandError;
use crate::status::Status;

/// Outbound envelope: `{"status": <code>, "value": <payload or message>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub status: Status,
    #[serde(default)]
    pub value: Value,
}

impl CommandResult {
    pub fn success(value: impl Into<Value>) -> Self {
        Self {
            status: Status::Success,
            value: value.into(),
        }
    }

    pub fn error(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            value: Value::String(message.into()),
        }
    }

    pub fn from_error(err: &CommandError) -> Self {
        Self::error(err.status(), err.to_string())
    }

    /// `{"ELEMENT": id}`, the reference form returned by `find`.
    pub fn element_ref(id: &str) -> Value {
        json!({ "ELEMENT": id })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Error message carried in `value`, if any.
    pub fn message(&self) -> Option<&str> {
        if self.is_success() {
            None
        } else {
            self.value.as_str()
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Result<Value, CommandError>> for CommandResult {
    fn from(result: Result<Value, CommandError>) -> Self {
        match result {
            Ok(value) => CommandResult::success(value),
            Err(err) => CommandResult::from_error(&err),
        }
    }
}
