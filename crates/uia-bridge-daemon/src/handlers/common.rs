use tracing::debug_span;
use tracing::Span;
use uia_bridge_protocol::Command;
use uia_bridge_protocol::CommandError;

/// Element handles named by `elementId` / `destElId`, already resolved
/// through the registry.
#[derive(Debug, Clone)]
pub struct Target<E> {
    pub element: Option<E>,
    pub dest: Option<E>,
}

impl<E> Target<E> {
    pub fn has_elements(&self) -> bool {
        self.element.is_some() || self.dest.is_some()
    }

    /// The command's element, or a "requires an elementId" failure.
    pub fn require(&self, command: &Command) -> Result<&E, CommandError> {
        self.element
            .as_ref()
            .ok_or_else(|| CommandError::ElementRequired(command.name.clone()))
    }
}

pub fn handler_span(command: &Command, handler: &'static str) -> Span {
    debug_span!(
        "command_handler",
        handler = handler,
        command = %command.name,
        element = ?command.element_id
    )
}
