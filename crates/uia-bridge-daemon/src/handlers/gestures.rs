//! Touch gestures: taps, flicks, swipes, drags and pinches.
//!
//! Device-level points may be normalised (see
//! [`absolute_position`](uia_bridge_core::gesture::absolute_position)) and
//! must land on the display; element-relative points are resolved against
//! the element bounds and are not bounds-checked.

use serde_json::Value;
use tracing::debug;
use uia_bridge_core::gesture::absolute_position;
use uia_bridge_core::gesture::device_motion;
use uia_bridge_core::gesture::element_flick;
use uia_bridge_core::gesture::element_motion;
use uia_bridge_core::gesture::flick;
use uia_bridge_core::gesture::DEFAULT_FLICK_START;
use uia_bridge_core::PinchDirection;
use uia_bridge_core::PinchGesture;
use uia_bridge_core::Platform;
use uia_bridge_core::Point;
use uia_bridge_protocol::Command;
use uia_bridge_protocol::CommandError;

use super::common::handler_span;
use super::common::Target;
use super::elements;
use crate::session::BridgeSession;

fn point(command: &Command, x_key: &str, y_key: &str) -> Result<Point, CommandError> {
    Ok(Point::new(command.require_f64(x_key)?, command.require_f64(y_key)?))
}

/// Resolves a device-level point against the current display.
fn on_display<P: Platform>(session: &BridgeSession<P>, point: Point) -> Result<Point, CommandError> {
    let display = session.platform().display_size()?;
    Ok(absolute_position(point, display.as_rect(), true)?)
}

/// `click`: taps the element when one is given, otherwise `x`/`y`.
pub fn handle_click<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    if target.element.is_some() {
        return elements::handle_click(session, command, target);
    }
    let _span = handler_span(command, "tap").entered();
    let point = on_display(session, point(command, "x", "y")?)?;
    debug!(%point, "tap");
    Ok(Value::Bool(session.platform().click_at(point)?))
}

/// Device flick from `startX`/`startY` (screen centre by default), or an
/// element flick from the element centre when an element is given.
pub fn handle_flick<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "flick").entered();
    let platform = session.platform();
    let gesture = match &target.element {
        Some(element) => {
            let start = platform.bounds(element)?.center();
            element_flick(
                start,
                command.require_f64("xoffset")?,
                command.require_f64("yoffset")?,
                command.require_f64("speed")?,
            )?
        }
        None if command.name.starts_with("element:") => {
            return Err(CommandError::ElementRequired(command.name.clone()))
        }
        None => {
            let start = Point::new(
                command.optional_f64("startX")?.unwrap_or(DEFAULT_FLICK_START.x),
                command.optional_f64("startY")?.unwrap_or(DEFAULT_FLICK_START.y),
            );
            let x_speed = command.require_f64("xSpeed")?;
            let y_speed = command.require_f64("ySpeed")?;
            let display = platform.display_size()?;
            let start = absolute_position(start, display.as_rect(), true)?;
            flick(start, x_speed, y_speed, display)?
        }
    };
    debug!(%gesture, "flick");
    Ok(Value::Bool(platform.swipe(&gesture)?))
}

pub fn handle_swipe<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "swipe").entered();
    let platform = session.platform();
    let start = point(command, "startX", "startY")?;
    let end = point(command, "endX", "endY")?;
    let steps = command.require_u32("steps")?;

    let gesture = match &target.element {
        Some(element) => element_motion(start, end, steps, platform.bounds(element)?)?,
        None if command.name.starts_with("element:") => {
            return Err(CommandError::ElementRequired(command.name.clone()))
        }
        None => device_motion(start, end, steps, platform.display_size()?)?,
    };
    debug!(%gesture, "swipe");
    Ok(Value::Bool(platform.swipe(&gesture)?))
}

/// Device drag between two points, or an element drag onto a point or onto
/// `destElId`.
pub fn handle_drag<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "drag").entered();
    let platform = session.platform();
    let steps = command.require_u32("steps")?;
    if steps == 0 {
        return Err(CommandError::InvalidArgument(
            "steps must be at least 1".to_string(),
        ));
    }

    let accepted = match (&target.element, &target.dest) {
        (Some(element), Some(dest)) => {
            debug!(steps, "drag onto element");
            platform.drag_to_element(element, dest, steps)?
        }
        (Some(element), None) => {
            let end = on_display(session, point(command, "endX", "endY")?)?;
            debug!(%end, steps, "drag element");
            platform.drag_to_point(element, end, steps)?
        }
        (None, _) if command.name.starts_with("element:") => {
            return Err(CommandError::ElementRequired(command.name.clone()))
        }
        (None, _) => {
            let start = point(command, "startX", "startY")?;
            let end = point(command, "endX", "endY")?;
            let gesture = device_motion(start, end, steps, platform.display_size()?)?;
            debug!(%gesture, "drag");
            platform.drag(&gesture)?
        }
    };
    Ok(Value::Bool(accepted))
}

pub fn handle_pinch<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
    target: &Target<P::Element>,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "pinch").entered();
    let element = target.require(command)?;
    let direction: PinchDirection = command.require_str("direction")?.parse()?;
    let percent = command.require_u32("percent")?;
    if percent > 100 {
        return Err(CommandError::InvalidArgument(format!(
            "percent must be between 0 and 100, got {}",
            percent
        )));
    }
    let pinch = PinchGesture {
        direction,
        percent,
        steps: command.require_u32("steps")?,
    };
    debug!(direction = direction.as_str(), percent, steps = pinch.steps, "pinch");
    Ok(Value::Bool(session.platform().pinch(element, &pinch)?))
}
