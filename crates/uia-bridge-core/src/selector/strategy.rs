use std::fmt;
use std::str::FromStr;

use super::SelectorError;

/// Locator strategies accepted by `find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    ClassName,
    CssSelector,
    Id,
    Name,
    LinkText,
    PartialLinkText,
    XPath,
    AccessibilityId,
    AndroidUiAutomator,
    TagName,
    Dynamic,
}

impl Strategy {
    pub const ALL: [Strategy; 11] = [
        Strategy::ClassName,
        Strategy::CssSelector,
        Strategy::Id,
        Strategy::Name,
        Strategy::LinkText,
        Strategy::PartialLinkText,
        Strategy::XPath,
        Strategy::AccessibilityId,
        Strategy::AndroidUiAutomator,
        Strategy::TagName,
        Strategy::Dynamic,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ClassName => "class name",
            Strategy::CssSelector => "css selector",
            Strategy::Id => "id",
            Strategy::Name => "name",
            Strategy::LinkText => "link text",
            Strategy::PartialLinkText => "partial link text",
            Strategy::XPath => "xpath",
            Strategy::AccessibilityId => "accessibility id",
            Strategy::AndroidUiAutomator => "-android uiautomator",
            Strategy::TagName => "tag name",
            Strategy::Dynamic => "dynamic",
        }
    }

    /// Web-only strategies that are recognised but cannot be served on device.
    pub fn is_supported(&self) -> bool {
        !matches!(
            self,
            Strategy::CssSelector | Strategy::LinkText | Strategy::PartialLinkText
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| SelectorError::InvalidStrategy(s.to_string()))
    }
}
