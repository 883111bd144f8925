use serde_json::json;
use serde_json::Value;
use tracing::debug;
use uia_bridge_core::platform::keycode;
use uia_bridge_core::Platform;
use uia_bridge_protocol::Command;
use uia_bridge_protocol::CommandError;

use super::common::handler_span;
use super::common::Target;
use crate::session::BridgeSession;

pub fn handle_click<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "click").entered();
    let element = target.require(command)?;
    Ok(Value::Bool(session.platform().click(element)?))
}

pub fn handle_long_click<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "long_click").entered();
    let element = target.require(command)?;
    Ok(Value::Bool(session.platform().long_click(element)?))
}

/// Types `text` into the element, appending to what is there unless
/// `replace` is set. A trailing newline is sent as an Enter key press.
pub fn handle_set_text<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "set_text").entered();
    let element = target.require(command)?;
    let text = command.require_str("text")?;
    let replace = command.param_bool("replace", false)?;
    let unicode_keyboard = command.param_bool("unicodeKeyboard", session.unicode_keyboard())?;
    let platform = session.platform();

    let (body, press_enter) = match text.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (text, false),
    };
    let full_text = if replace {
        body.to_string()
    } else {
        platform.text(element)? + body
    };

    let accepted = platform.set_text(element, &full_text, unicode_keyboard)?;
    if accepted && press_enter {
        platform.press_key(keycode::ENTER, 0)?;
    }
    Ok(Value::Bool(accepted))
}

pub fn handle_get_text<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "get_text").entered();
    let element = target.require(command)?;
    Ok(Value::String(session.platform().text(element)?))
}

/// Clears the element's text, falling back to delete keys when the
/// platform's own clear leaves text behind.
pub fn handle_clear<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "clear").entered();
    let element = target.require(command)?;
    let platform = session.platform();

    platform.clear_text(element)?;
    let mut previous: Option<String> = None;
    loop {
        let current = platform.text(element)?;
        if current.is_empty() {
            return Ok(Value::Bool(true));
        }
        // Stop once a round of delete keys changes nothing.
        if previous.as_deref() == Some(current.as_str()) {
            debug!(remaining = %current, "text survived delete keys");
            return Err(CommandError::PlatformActionFailed(
                "Clear text not successful.".to_string(),
            ));
        }
        debug!(length = current.chars().count(), "clearing with delete keys");
        platform.click(element)?;
        for _ in 0..current.chars().count() {
            platform.press_key(keycode::DEL, 0)?;
        }
        previous = Some(current);
    }
}

pub fn handle_get_attribute<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "get_attribute").entered();
    let element = target.require(command)?;
    let name = command.require_str("attribute")?;
    let info = session.platform().element_info(element)?;
    info.attribute(name)
        .map(Value::String)
        .ok_or_else(|| CommandError::InvalidArgument(format!("No such attribute '{}'", name)))
}

pub fn handle_get_location<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "get_location").entered();
    let element = target.require(command)?;
    let bounds = session.platform().bounds(element)?;
    Ok(json!({ "x": bounds.left, "y": bounds.top }))
}

pub fn handle_get_size<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "get_size").entered();
    let element = target.require(command)?;
    let bounds = session.platform().bounds(element)?;
    Ok(json!({ "width": bounds.width(), "height": bounds.height() }))
}
