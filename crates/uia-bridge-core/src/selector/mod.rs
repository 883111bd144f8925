//! Selector strategy resolution.
//!
//! `find` receives a strategy name and a selector value; this module turns
//! them into a [`FindPlan`] of [`UiQuery`]s the platform can evaluate.

mod class_map;
mod dynamic;
mod query;
mod strategy;
mod uiautomator;
mod xpath;

pub use class_map::ClassMap;
pub use class_map::GENERIC_VIEW_CLASS;
pub use dynamic::parse_dynamic;
pub use dynamic::DynamicMode;
pub use dynamic::DynamicSelector;
pub use query::Criterion;
pub use query::QueryMatcher;
pub use query::UiQuery;
pub use strategy::Strategy;
pub use uiautomator::is_ui_scrollable;
pub use uiautomator::parse_ui_scrollable;
pub use uiautomator::parse_ui_selector;
pub use uiautomator::ListOrientation;
pub use uiautomator::ScrollableSelector;
pub use xpath::PathStep;
pub use xpath::XPathSelector;

use serde_json::Value;
use thiserror::Error;

const BUTTON_CLASS: &str = "android.widget.Button";
const BUTTON_LIKE_PATTERN: &str = r"android\.widget\.Button|android\.widget\.ImageButton";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Invalid locator strategy: {0}")]
    InvalidStrategy(String),
    #[error("Sorry, we don't support the '{0}' locator strategy yet")]
    UnsupportedStrategy(String),
    #[error("Tag name '{0}' is not allowed")]
    UnallowedTagName(String),
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// How `find` should look for elements.
#[derive(Debug, Clone, PartialEq)]
pub enum FindPlan {
    /// Alternatives in priority order. The first alternative that matches
    /// anything wins; later ones are only tried when it matches nothing.
    Candidates(Vec<UiQuery>),
    Dynamic(DynamicSelector),
    Scrollable(ScrollableSelector),
}

impl FindPlan {
    fn single(query: UiQuery) -> Self {
        FindPlan::Candidates(vec![query])
    }
}

pub fn resolve_strategy(text: &str) -> Result<Strategy, SelectorError> {
    text.parse()
}

pub fn resolve_class_name(class_map: &ClassMap, tag: &str) -> Result<String, SelectorError> {
    class_map.resolve(tag)
}

/// Translates a strategy and its selector value into a [`FindPlan`].
pub fn plan_find(
    strategy: Strategy,
    selector: &Value,
    class_map: &ClassMap,
) -> Result<FindPlan, SelectorError> {
    if !strategy.is_supported() {
        return Err(SelectorError::UnsupportedStrategy(strategy.to_string()));
    }
    match strategy {
        Strategy::Dynamic => parse_dynamic(selector).map(FindPlan::Dynamic),
        Strategy::XPath => XPathSelector::from_value(selector)?
            .to_query(class_map)
            .map(FindPlan::single),
        _ => {
            let text = selector.as_str().ok_or_else(|| {
                SelectorError::InvalidSelector(format!(
                    "'{}' selector must be a string, got {}",
                    strategy, selector
                ))
            })?;
            plan_text(strategy, text, class_map)
        }
    }
}

fn plan_text(strategy: Strategy, text: &str, class_map: &ClassMap) -> Result<FindPlan, SelectorError> {
    let plan = match strategy {
        Strategy::ClassName => FindPlan::single(UiQuery::class_name(text)),
        Strategy::Id => FindPlan::Candidates(vec![
            UiQuery::resource_id(text),
            UiQuery::description(text),
            UiQuery::text(text),
        ]),
        Strategy::AccessibilityId => FindPlan::single(UiQuery::description(text)),
        Strategy::Name => {
            FindPlan::Candidates(vec![UiQuery::description(text), UiQuery::text(text)])
        }
        Strategy::AndroidUiAutomator if is_ui_scrollable(text) => {
            FindPlan::Scrollable(parse_ui_scrollable(text)?)
        }
        Strategy::AndroidUiAutomator => FindPlan::single(parse_ui_selector(text)?),
        Strategy::TagName => {
            let class = resolve_class_name(class_map, text)?;
            let query = if class == BUTTON_CLASS {
                UiQuery::new().with(Criterion::ClassNameMatches(BUTTON_LIKE_PATTERN.to_string()))
            } else {
                UiQuery::class_name(class)
            };
            FindPlan::single(query)
        }
        Strategy::CssSelector
        | Strategy::LinkText
        | Strategy::PartialLinkText
        | Strategy::XPath
        | Strategy::Dynamic => return Err(SelectorError::UnsupportedStrategy(strategy.to_string())),
    };
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ElementInfo;
    use serde_json::json;

    fn plan(strategy: &str, selector: Value) -> Result<FindPlan, SelectorError> {
        plan_find(resolve_strategy(strategy)?, &selector, ClassMap::standard())
    }

    #[test]
    fn test_id_falls_back_through_description_and_text() {
        let FindPlan::Candidates(queries) = plan("id", json!("login")).unwrap() else {
            panic!("expected candidates");
        };
        assert_eq!(
            queries,
            vec![
                UiQuery::resource_id("login"),
                UiQuery::description("login"),
                UiQuery::text("login"),
            ]
        );
    }

    #[test]
    fn test_name_prefers_description() {
        assert_eq!(
            plan("name", json!("Go")).unwrap(),
            FindPlan::Candidates(vec![UiQuery::description("Go"), UiQuery::text("Go")])
        );
    }

    #[test]
    fn test_tag_name_button_matches_image_button() {
        let FindPlan::Candidates(queries) = plan("tag name", json!("button")).unwrap() else {
            panic!("expected candidates");
        };
        let image_button = ElementInfo {
            class_name: "android.widget.ImageButton".into(),
            ..ElementInfo::default()
        };
        let buttonish = ElementInfo {
            class_name: "android.widget.ButtonBar".into(),
            ..ElementInfo::default()
        };
        assert!(queries[0].matches(&image_button));
        assert!(!queries[0].matches(&buttonish));
    }

    #[test]
    fn test_tag_name_uses_class_map() {
        assert_eq!(
            plan("tag name", json!("textfield")).unwrap(),
            FindPlan::single(UiQuery::class_name("android.widget.EditText"))
        );
        assert_eq!(
            plan("tag name", json!("Secure")),
            Err(SelectorError::UnallowedTagName("Secure".into()))
        );
    }

    #[test]
    fn test_web_strategies_unsupported() {
        for strategy in ["css selector", "link text", "partial link text"] {
            assert!(matches!(
                plan(strategy, json!("a")),
                Err(SelectorError::UnsupportedStrategy(_))
            ));
        }
    }

    #[test]
    fn test_non_string_selector_rejected() {
        assert!(matches!(
            plan("class name", json!(5)),
            Err(SelectorError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_dynamic_and_uiautomator_plans() {
        assert!(matches!(
            plan("dynamic", json!([[[1, "OK"]]])).unwrap(),
            FindPlan::Dynamic(_)
        ));
        assert_eq!(
            plan("-android uiautomator", json!(r#"new UiSelector().text("OK")"#)).unwrap(),
            FindPlan::single(UiQuery::text("OK"))
        );
    }
}
