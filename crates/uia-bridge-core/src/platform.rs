//! The platform port: everything the bridge needs from the device.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::geometry::Point;
use crate::geometry::Rect;
use crate::geometry::Size;
use crate::gesture::GestureVector;
use crate::gesture::PinchGesture;
use crate::orientation::RotateDirection;
use crate::orientation::Rotation;
use crate::selector::UiQuery;

/// Key codes the bridge sends on its own.
pub mod keycode {
    pub const ENTER: i32 = 66;
    pub const DEL: i32 = 67;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Not supported on this platform: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Failed(String),
}

/// Attribute snapshot of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub text: String,
    pub content_description: String,
    pub class_name: String,
    pub resource_id: String,
    pub package: String,
    pub bounds: Rect,
    /// Position among the parent's children.
    pub index: u32,
    pub enabled: bool,
    pub checkable: bool,
    pub checked: bool,
    pub clickable: bool,
    pub focusable: bool,
    pub focused: bool,
    pub long_clickable: bool,
    pub scrollable: bool,
    pub selected: bool,
    pub displayed: bool,
}

impl ElementInfo {
    /// Value of a named attribute rendered as a string, or `None` if the name
    /// is not an element attribute.
    ///
    /// `name` is the content description, falling back to the text when the
    /// description is empty.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let flag = |value: bool| Some(value.to_string());
        match name {
            "name" => {
                if self.content_description.is_empty() {
                    Some(self.text.clone())
                } else {
                    Some(self.content_description.clone())
                }
            }
            "text" => Some(self.text.clone()),
            "className" => Some(self.class_name.clone()),
            "resourceId" => Some(self.resource_id.clone()),
            "contentDescription" => Some(self.content_description.clone()),
            "enabled" => flag(self.enabled),
            "checkable" => flag(self.checkable),
            "checked" => flag(self.checked),
            "clickable" => flag(self.clickable),
            "focusable" => flag(self.focusable),
            "focused" => flag(self.focused),
            "longClickable" => flag(self.long_clickable),
            "scrollable" => flag(self.scrollable),
            "selected" => flag(self.selected),
            "displayed" => flag(self.displayed),
            _ => None,
        }
    }
}

/// UI automation capabilities of a device.
///
/// Boolean results report whether the platform accepted the action; `Err`
/// is reserved for calls that could not be attempted at all. A call on an
/// element that no longer exists fails with
/// [`PlatformError::ElementNotFound`].
pub trait Platform: Send + Sync {
    type Element: Clone + Send + Sync + fmt::Debug + PartialEq;

    /// Every element matching `query` in document order, beneath `context`
    /// when given. An `Instance` criterion narrows the result to that match.
    fn find_elements(
        &self,
        query: &UiQuery,
        context: Option<&Self::Element>,
    ) -> Result<Vec<Self::Element>, PlatformError>;

    fn find_element(
        &self,
        query: &UiQuery,
        context: Option<&Self::Element>,
    ) -> Result<Option<Self::Element>, PlatformError> {
        Ok(self.find_elements(query, context)?.into_iter().next())
    }

    /// Scrolls the first scrollable container until `query` is visible.
    fn scroll_into_view(&self, query: &UiQuery) -> Result<bool, PlatformError>;

    fn element_info(&self, element: &Self::Element) -> Result<ElementInfo, PlatformError>;

    fn text(&self, element: &Self::Element) -> Result<String, PlatformError> {
        Ok(self.element_info(element)?.text)
    }

    fn bounds(&self, element: &Self::Element) -> Result<Rect, PlatformError> {
        Ok(self.element_info(element)?.bounds)
    }

    fn set_text(
        &self,
        element: &Self::Element,
        text: &str,
        unicode_keyboard: bool,
    ) -> Result<bool, PlatformError>;

    fn clear_text(&self, element: &Self::Element) -> Result<(), PlatformError>;

    fn click(&self, element: &Self::Element) -> Result<bool, PlatformError>;

    fn long_click(&self, element: &Self::Element) -> Result<bool, PlatformError>;

    fn click_at(&self, point: Point) -> Result<bool, PlatformError>;

    fn swipe(&self, gesture: &GestureVector) -> Result<bool, PlatformError>;

    fn drag(&self, gesture: &GestureVector) -> Result<bool, PlatformError>;

    fn drag_to_point(
        &self,
        element: &Self::Element,
        destination: Point,
        steps: u32,
    ) -> Result<bool, PlatformError>;

    fn drag_to_element(
        &self,
        element: &Self::Element,
        destination: &Self::Element,
        steps: u32,
    ) -> Result<bool, PlatformError>;

    fn pinch(&self, element: &Self::Element, pinch: &PinchGesture) -> Result<bool, PlatformError>;

    fn rotation(&self) -> Result<Rotation, PlatformError>;

    fn set_rotation(&self, direction: RotateDirection) -> Result<(), PlatformError>;

    fn press_key(&self, keycode: i32, meta_state: i32) -> Result<bool, PlatformError>;

    fn press_back(&self) -> Result<bool, PlatformError>;

    fn display_size(&self) -> Result<Size, PlatformError>;

    fn wait_for_idle(&self, timeout: Duration) -> Result<(), PlatformError>;

    /// XML rendering of the current window hierarchy.
    fn dump_hierarchy(&self) -> Result<String, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_attribute_falls_back_to_text() {
        let mut info = ElementInfo {
            text: "Submit".into(),
            ..ElementInfo::default()
        };
        assert_eq!(info.attribute("name").as_deref(), Some("Submit"));
        info.content_description = "submit button".into();
        assert_eq!(info.attribute("name").as_deref(), Some("submit button"));
    }

    #[test]
    fn test_boolean_attributes_render_as_strings() {
        let info = ElementInfo {
            checked: true,
            ..ElementInfo::default()
        };
        assert_eq!(info.attribute("checked").as_deref(), Some("true"));
        assert_eq!(info.attribute("longClickable").as_deref(), Some("false"));
        assert_eq!(info.attribute("bogus"), None);
    }
}
