//! Inbound command envelopes.
//!
//! One JSON object per request:
//!
//! ```json
//! {"cmd": "element:click", "params": {"elementId": "1"}}
//! {"cmd": "action", "action": "element:click", "params": {"elementId": "1"}}
//! {"cmd": "shutdown"}
//! ```

use serde_json::Map;
use serde_json::Value;

use crate::error::CommandError;

const ACTION_CMD: &str = "action";
const SHUTDOWN_CMD: &str = "shutdown";

/// A decoded request line.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Command(Command),
    Shutdown,
}

/// A named action with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub params: Map<String, Value>,
    pub element_id: Option<String>,
    pub dest_element_id: Option<String>,
}

impl Envelope {
    pub fn decode(line: &str) -> Result<Envelope, CommandError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| CommandError::InvalidCommand(format!("malformed JSON: {}", e)))?;
        Envelope::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Envelope, CommandError> {
        let Value::Object(mut object) = value else {
            return Err(CommandError::InvalidCommand(
                "command must be a JSON object".to_string(),
            ));
        };
        let cmd = match object.get("cmd") {
            Some(Value::String(cmd)) => cmd.clone(),
            Some(_) => return Err(CommandError::invalid_parameter("cmd", "a string")),
            None => return Err(CommandError::InvalidCommand("missing 'cmd'".to_string())),
        };

        if cmd == SHUTDOWN_CMD {
            return Ok(Envelope::Shutdown);
        }
        let name = if cmd == ACTION_CMD {
            match object.get("action") {
                Some(Value::String(action)) => action.clone(),
                Some(_) => return Err(CommandError::invalid_parameter("action", "a string")),
                None => {
                    return Err(CommandError::InvalidCommand(
                        "'action' command without an action name".to_string(),
                    ))
                }
            }
        } else {
            cmd
        };
        if name.trim().is_empty() {
            return Err(CommandError::InvalidCommand("empty command name".to_string()));
        }

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => return Err(CommandError::invalid_parameter("params", "an object")),
        };
        Command::new(name, params).map(Envelope::Command)
    }
}

impl Command {
    /// Builds a command, pulling the element references out of `params`.
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Result<Self, CommandError> {
        let element_id = element_ref(&params, "elementId")?;
        let dest_element_id = match element_ref(&params, "destElId")? {
            Some(id) => Some(id),
            None => element_ref(&params, "destElementId")?,
        };
        Ok(Self {
            name: name.into(),
            params,
            element_id,
            dest_element_id,
        })
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(|v| v.as_str())
    }

    pub fn require(&self, key: &str) -> Result<&Value, CommandError> {
        self.param(key)
            .ok_or_else(|| CommandError::MissingParameter(key.to_string()))
    }

    pub fn require_str(&self, key: &str) -> Result<&str, CommandError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| CommandError::invalid_parameter(key, "a string"))
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, CommandError> {
        as_f64(key, self.require(key)?)
    }

    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, CommandError> {
        self.param(key).map(|v| as_f64(key, v)).transpose()
    }

    pub fn require_u32(&self, key: &str) -> Result<u32, CommandError> {
        as_u32(key, self.require(key)?)
    }

    pub fn optional_u64(&self, key: &str) -> Result<Option<u64>, CommandError> {
        self.param(key)
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| CommandError::invalid_parameter(key, "a non-negative integer"))
            })
            .transpose()
    }

    pub fn require_i32(&self, key: &str) -> Result<i32, CommandError> {
        as_i32(key, self.require(key)?)
    }

    pub fn optional_i32(&self, key: &str) -> Result<Option<i32>, CommandError> {
        self.param(key).map(|v| as_i32(key, v)).transpose()
    }

    pub fn param_bool(&self, key: &str, default: bool) -> Result<bool, CommandError> {
        match self.param(key) {
            None => Ok(default),
            Some(v) => v
                .as_bool()
                .ok_or_else(|| CommandError::invalid_parameter(key, "a boolean")),
        }
    }
}

fn element_ref(params: &Map<String, Value>, key: &str) -> Result<Option<String>, CommandError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) if id.is_empty() => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(_) => Err(CommandError::invalid_parameter(key, "a string")),
    }
}

fn as_f64(key: &str, value: &Value) -> Result<f64, CommandError> {
    value
        .as_f64()
        .ok_or_else(|| CommandError::invalid_parameter(key, "a number"))
}

fn as_u32(key: &str, value: &Value) -> Result<u32, CommandError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| CommandError::invalid_parameter(key, "a non-negative integer"))
}

fn as_i32(key: &str, value: &Value) -> Result<i32, CommandError> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| CommandError::invalid_parameter(key, "an integer"))
}
