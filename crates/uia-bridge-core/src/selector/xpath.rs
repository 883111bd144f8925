//! Pre-compiled xpath selectors.
//!
//! The client compiles an xpath expression into a path object before sending
//! it:
//!
//! ```json
//! {"path": [{"node": "list", "search": "desc"}, {"node": "text", "search": "child"}],
//!  "attr": "text", "constraint": "Item", "substr": true}
//! ```

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::class_map::ClassMap;
use super::query::Criterion;
use super::query::UiQuery;
use super::SelectorError;

const ANY_NODE: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathStep {
    pub node: String,
    pub search: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct XPathSelector {
    pub path: Vec<PathStep>,
    #[serde(default)]
    pub attr: String,
    #[serde(default)]
    pub constraint: String,
    #[serde(default)]
    pub substr: bool,
}

impl XPathSelector {
    /// Accepts the path object itself or a string holding its JSON form.
    pub fn from_value(value: &Value) -> Result<Self, SelectorError> {
        let parsed = match value {
            Value::String(text) => serde_json::from_str::<XPathSelector>(text),
            other => XPathSelector::deserialize(other),
        };
        let selector = parsed.map_err(|e| {
            SelectorError::InvalidSelector(format!("Error parsing xpath path obj from JSON: {}", e))
        })?;
        if selector.path.is_empty() {
            return Err(SelectorError::InvalidSelector(
                "xpath path must contain at least one node".to_string(),
            ));
        }
        Ok(selector)
    }

    /// Builds the query.
    ///
    /// Each step resolves its node through `class_map`. A `child` step opens
    /// a nested query; any other step sets the class of the innermost one.
    /// The attribute constraint applies to the innermost query.
    pub fn to_query(&self, class_map: &ClassMap) -> Result<UiQuery, SelectorError> {
        if let Some(query) = self.shortcut() {
            debug!(query = %query, "xpath shortcut");
            return Ok(query);
        }

        let mut levels = vec![UiQuery::new()];
        for step in &self.path {
            if step.search == "child" {
                levels.push(UiQuery::new());
            }
            if step.node != ANY_NODE {
                let class = class_map.resolve(&step.node)?;
                if let Some(current) = levels.pop() {
                    levels.push(current.with(Criterion::ClassName(class)));
                }
            }
        }

        let constraint = self.constraint.clone();
        let attribute = match self.attr.as_str() {
            "desc" | "name" if self.substr => Some(Criterion::DescriptionContains(constraint)),
            "desc" | "name" => Some(Criterion::Description(constraint)),
            "text" | "value" if self.substr => Some(Criterion::TextContains(constraint)),
            "text" | "value" => Some(Criterion::Text(constraint)),
            _ => None,
        };
        if let Some(criterion) = attribute {
            if let Some(innermost) = levels.pop() {
                levels.push(innermost.with(criterion));
            }
        }

        let query = levels
            .into_iter()
            .rev()
            .reduce(|child, parent| parent.with_child(child))
            .unwrap_or_default();
        debug!(query = %query, "xpath query");
        Ok(query)
    }

    /// `//*[contains(@text, ..)]` and `//*[contains(@tag, ..)]`.
    fn shortcut(&self) -> Option<UiQuery> {
        let first_is_any = self.path.first().map(|s| s.node == ANY_NODE).unwrap_or(false);
        if !first_is_any || !self.substr || self.constraint.is_empty() {
            return None;
        }
        match self.attr.to_lowercase().as_str() {
            "text" => Some(UiQuery::new().with(Criterion::TextContains(self.constraint.clone()))),
            "tag" => {
                let pattern = format!("(?i).*{}.*", regex::escape(&self.constraint));
                Some(UiQuery::new().with(Criterion::ClassNameMatches(pattern)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ElementInfo;
    use serde_json::json;

    fn query(value: Value) -> Result<UiQuery, SelectorError> {
        XPathSelector::from_value(&value)?.to_query(ClassMap::standard())
    }

    #[test]
    fn test_text_contains_shortcut() {
        let q = query(json!({
            "path": [{"node": "*", "search": "desc"}],
            "attr": "text", "constraint": "agree", "substr": true
        }))
        .unwrap();
        assert_eq!(q, UiQuery::new().with(Criterion::TextContains("agree".into())));
    }

    #[test]
    fn test_tag_contains_shortcut_is_case_insensitive() {
        let q = query(json!({
            "path": [{"node": "*", "search": "desc"}],
            "attr": "tag", "constraint": "button", "substr": true
        }))
        .unwrap();
        let info = ElementInfo {
            class_name: "android.widget.ImageButton".into(),
            ..ElementInfo::default()
        };
        assert!(q.matches(&info));
    }

    #[test]
    fn test_class_and_description() {
        let q = query(json!({
            "path": [{"node": "button", "search": "desc"}],
            "attr": "name", "constraint": "Login", "substr": false
        }))
        .unwrap();
        assert_eq!(
            q.criteria,
            vec![
                Criterion::ClassName("android.widget.Button".into()),
                Criterion::Description("Login".into()),
            ]
        );
    }

    #[test]
    fn test_child_step_nests_query() {
        let q = query(json!({
            "path": [{"node": "list", "search": "desc"}, {"node": "text", "search": "child"}],
            "attr": "value", "constraint": "Item", "substr": true
        }))
        .unwrap();
        assert_eq!(q.criteria, vec![Criterion::ClassName("android.widget.ListView".into())]);
        let child = q.child.as_deref().unwrap();
        assert_eq!(
            child.criteria,
            vec![
                Criterion::ClassName("android.widget.TextView".into()),
                Criterion::TextContains("Item".into()),
            ]
        );
    }

    #[test]
    fn test_accepts_json_string() {
        let text = r#"{"path":[{"node":"image","search":"desc"}],"attr":"","constraint":"","substr":false}"#;
        let q = query(Value::String(text.into())).unwrap();
        assert_eq!(q, UiQuery::class_name("android.widget.ImageView"));
    }

    #[test]
    fn test_plain_xpath_string_rejected() {
        assert!(matches!(
            query(json!("//android.widget.Button")),
            Err(SelectorError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_denied_node_rejected() {
        let err = query(json!({"path": [{"node": "secure", "search": "desc"}]})).unwrap_err();
        assert_eq!(err, SelectorError::UnallowedTagName("secure".into()));
    }
}
