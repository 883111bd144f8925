use std::time::Duration;

use serde_json::json;
use serde_json::Value;
use tracing::info;
use uia_bridge_core::orientation::set_orientation;
use uia_bridge_core::Orientation;
use uia_bridge_core::Platform;
use uia_bridge_protocol::Command;
use uia_bridge_protocol::CommandError;

use super::common::handler_span;
use crate::session::BridgeSession;

const DEFAULT_IDLE_TIMEOUT_MS: u64 = 10_000;

/// `orientation`: reads the orientation, or sets it when `orientation` is
/// given.
pub fn handle_orientation<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    if command.param("orientation").is_some() {
        handle_set_orientation(session, command)
    } else {
        handle_get_orientation(session, command)
    }
}

pub fn handle_get_orientation<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "get_orientation").entered();
    let rotation = session.platform().rotation()?;
    Ok(Value::String(rotation.orientation().as_str().to_string()))
}

pub fn handle_set_orientation<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "set_orientation").entered();
    let requested: Orientation = command.require_str("orientation")?.parse()?;
    let change = set_orientation(
        session.platform(),
        requested,
        session.clock(),
        session.sleeper(),
        session.poll_policy(),
    )?;
    info!(requested = requested.as_str(), outcome = ?change, "orientation set");
    Ok(Value::String(change.message()))
}

pub fn handle_press_key_code<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "press_key_code").entered();
    let keycode = command.require_i32("keycode")?;
    let meta_state = command.optional_i32("metastate")?.unwrap_or(0);
    Ok(Value::Bool(session.platform().press_key(keycode, meta_state)?))
}

pub fn handle_press_back<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "press_back").entered();
    Ok(Value::Bool(session.platform().press_back()?))
}

pub fn handle_get_device_size<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "get_device_size").entered();
    let size = session.platform().display_size()?;
    Ok(json!({ "width": size.width, "height": size.height }))
}

pub fn handle_wait_for_idle<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "wait_for_idle").entered();
    let timeout_ms = command
        .optional_u64("timeout")?
        .unwrap_or(DEFAULT_IDLE_TIMEOUT_MS);
    session
        .platform()
        .wait_for_idle(Duration::from_millis(timeout_ms))?;
    Ok(Value::Bool(true))
}

pub fn handle_dump_window_hierarchy<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "dump_window_hierarchy").entered();
    Ok(Value::String(session.platform().dump_hierarchy()?))
}

/// Drops every registered handle; ids keep counting up afterwards.
pub fn handle_clear_element_cache<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "clear_element_cache").entered();
    let dropped = session.registry().clear();
    info!(dropped, "element cache cleared");
    Ok(json!(dropped))
}
