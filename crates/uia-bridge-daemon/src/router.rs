use std::time::Instant;

use serde_json::Value;
use tracing::debug;
use uia_bridge_core::Platform;
use uia_bridge_protocol::Command;
use uia_bridge_protocol::CommandError;
use uia_bridge_protocol::CommandResult;

use crate::handlers;
use crate::handlers::common::Target;
use crate::session::BridgeSession;

const FIND: &str = "find";

pub struct Router<'a, P: Platform> {
    session: &'a BridgeSession<P>,
}

impl<'a, P: Platform> Router<'a, P> {
    pub fn new(session: &'a BridgeSession<P>) -> Self {
        Self { session }
    }

    /// Runs one command and encodes its outcome. Never panics on bad input;
    /// every failure becomes a status-coded result.
    pub fn dispatch(&self, command: &Command) -> CommandResult {
        let started = Instant::now();
        let result = self.resolve_target(command).and_then(|target| {
            self.route(command, &target).map_err(|e| {
                // The element was alive when it was registered.
                if target.has_elements() && command.name != FIND {
                    e.into_stale()
                } else {
                    e
                }
            })
        });
        match &result {
            Ok(_) => debug!(
                command = %command.name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "command succeeded"
            ),
            Err(e) => debug!(
                command = %command.name,
                status = e.status().code(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "command failed"
            ),
        }
        CommandResult::from(result)
    }

    fn resolve_target(&self, command: &Command) -> Result<Target<P::Element>, CommandError> {
        let registry = self.session.registry();
        let element = command
            .element_id
            .as_deref()
            .map(|id| registry.get(id))
            .transpose()?;
        let dest = command
            .dest_element_id
            .as_deref()
            .map(|id| registry.get(id))
            .transpose()?;
        Ok(Target { element, dest })
    }

    fn route(&self, command: &Command, target: &Target<P::Element>) -> Result<Value, CommandError> {
        let session = self.session;
        match command.name.as_str() {
            FIND => handlers::find::handle_find(session, command),

            "element:click" => handlers::elements::handle_click(session, command, target),
            "element:longClick" | "element:touchLongClick" => {
                handlers::elements::handle_long_click(session, command, target)
            }
            "element:setText" => handlers::elements::handle_set_text(session, command, target),
            "element:getText" => handlers::elements::handle_get_text(session, command, target),
            "element:clear" => handlers::elements::handle_clear(session, command, target),
            "element:getAttribute" => {
                handlers::elements::handle_get_attribute(session, command, target)
            }
            "element:getLocation" => {
                handlers::elements::handle_get_location(session, command, target)
            }
            "element:getSize" => handlers::elements::handle_get_size(session, command, target),

            "click" => handlers::gestures::handle_click(session, command, target),
            "flick" | "element:flick" => handlers::gestures::handle_flick(session, command, target),
            "swipe" | "element:swipe" => handlers::gestures::handle_swipe(session, command, target),
            "drag" | "element:drag" => handlers::gestures::handle_drag(session, command, target),
            "pinch" | "element:pinch" => {
                handlers::gestures::handle_pinch(session, command, target)
            }

            "orientation" => handlers::device::handle_orientation(session, command),
            "getOrientation" => handlers::device::handle_get_orientation(session, command),
            "setOrientation" => handlers::device::handle_set_orientation(session, command),
            "pressKeyCode" => handlers::device::handle_press_key_code(session, command),
            "pressBack" => handlers::device::handle_press_back(session, command),
            "getDeviceSize" => handlers::device::handle_get_device_size(session, command),
            "waitForIdle" => handlers::device::handle_wait_for_idle(session, command),
            "dumpWindowHierarchy" => {
                handlers::device::handle_dump_window_hierarchy(session, command)
            }
            "clearElementCache" => handlers::device::handle_clear_element_cache(session, command),

            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}
