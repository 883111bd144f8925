//! Platform-neutral element queries.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use super::SelectorError;
use crate::platform::ElementInfo;

/// One constraint of a [`UiQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Criterion {
    Text(String),
    TextStartsWith(String),
    TextContains(String),
    TextMatches(String),
    ClassName(String),
    ClassNameMatches(String),
    Description(String),
    DescriptionStartsWith(String),
    DescriptionContains(String),
    DescriptionMatches(String),
    ResourceId(String),
    ResourceIdMatches(String),
    PackageName(String),
    PackageNameMatches(String),
    Index(u32),
    Instance(u32),
    Enabled(bool),
    Focused(bool),
    Focusable(bool),
    Scrollable(bool),
    Clickable(bool),
    Checked(bool),
    Checkable(bool),
    Selected(bool),
    LongClickable(bool),
}

impl Criterion {
    fn label(&self) -> &'static str {
        match self {
            Criterion::Text(_) => "TEXT",
            Criterion::TextStartsWith(_) => "START_TEXT",
            Criterion::TextContains(_) => "CONTAINS_TEXT",
            Criterion::TextMatches(_) => "TEXT_REGEX",
            Criterion::ClassName(_) => "CLASS",
            Criterion::ClassNameMatches(_) => "CLASS_REGEX",
            Criterion::Description(_) => "DESCRIPTION",
            Criterion::DescriptionStartsWith(_) => "START_DESCRIPTION",
            Criterion::DescriptionContains(_) => "CONTAINS_DESCRIPTION",
            Criterion::DescriptionMatches(_) => "DESCRIPTION_REGEX",
            Criterion::ResourceId(_) => "RESOURCE_ID",
            Criterion::ResourceIdMatches(_) => "RESOURCE_ID_REGEX",
            Criterion::PackageName(_) => "PACKAGE_NAME",
            Criterion::PackageNameMatches(_) => "PACKAGE_NAME_REGEX",
            Criterion::Index(_) => "INDEX",
            Criterion::Instance(_) => "INSTANCE",
            Criterion::Enabled(_) => "ENABLED",
            Criterion::Focused(_) => "FOCUSED",
            Criterion::Focusable(_) => "FOCUSABLE",
            Criterion::Scrollable(_) => "SCROLLABLE",
            Criterion::Clickable(_) => "CLICKABLE",
            Criterion::Checked(_) => "CHECKED",
            Criterion::Checkable(_) => "CHECKABLE",
            Criterion::Selected(_) => "SELECTED",
            Criterion::LongClickable(_) => "LONG_CLICKABLE",
        }
    }

    fn pattern(&self) -> Option<&str> {
        match self {
            Criterion::TextMatches(p)
            | Criterion::ClassNameMatches(p)
            | Criterion::DescriptionMatches(p)
            | Criterion::ResourceIdMatches(p)
            | Criterion::PackageNameMatches(p) => Some(p),
            _ => None,
        }
    }

    /// Rejects regex criteria whose pattern does not compile.
    pub fn validate(&self) -> Result<(), SelectorError> {
        if let Some(pattern) = self.pattern() {
            full_match_regex(pattern)?;
        }
        Ok(())
    }

    /// Whether `info` satisfies this criterion. Regex criteria use `regex`,
    /// the compiled form of their pattern; without it they never match.
    ///
    /// `Instance` is positional and always matches here; callers pick the
    /// n-th match themselves.
    fn matches_with(&self, info: &ElementInfo, regex: Option<&Regex>) -> bool {
        let is_match = |value: &str| regex.is_some_and(|re| re.is_match(value));
        match self {
            Criterion::Text(v) => info.text == *v,
            Criterion::TextStartsWith(v) => info.text.starts_with(v.as_str()),
            Criterion::TextContains(v) => info.text.contains(v.as_str()),
            Criterion::TextMatches(_) => is_match(&info.text),
            Criterion::ClassName(v) => info.class_name == *v,
            Criterion::ClassNameMatches(_) => is_match(&info.class_name),
            Criterion::Description(v) => info.content_description == *v,
            Criterion::DescriptionStartsWith(v) => {
                info.content_description.starts_with(v.as_str())
            }
            Criterion::DescriptionContains(v) => info.content_description.contains(v.as_str()),
            Criterion::DescriptionMatches(_) => is_match(&info.content_description),
            Criterion::ResourceId(v) => info.resource_id == *v,
            Criterion::ResourceIdMatches(_) => is_match(&info.resource_id),
            Criterion::PackageName(v) => info.package == *v,
            Criterion::PackageNameMatches(_) => is_match(&info.package),
            Criterion::Index(i) => info.index == *i,
            Criterion::Instance(_) => true,
            Criterion::Enabled(b) => info.enabled == *b,
            Criterion::Focused(b) => info.focused == *b,
            Criterion::Focusable(b) => info.focusable == *b,
            Criterion::Scrollable(b) => info.scrollable == *b,
            Criterion::Clickable(b) => info.clickable == *b,
            Criterion::Checked(b) => info.checked == *b,
            Criterion::Checkable(b) => info.checkable == *b,
            Criterion::Selected(b) => info.selected == *b,
            Criterion::LongClickable(b) => info.long_clickable == *b,
        }
    }

    /// Convenience for a one-off check; compiles regex patterns on every
    /// call. Use [`UiQuery::matcher`] when testing many elements.
    pub fn matches(&self, info: &ElementInfo) -> bool {
        let regex = match self.pattern() {
            Some(pattern) => match full_match_regex(pattern) {
                Ok(re) => Some(re),
                Err(_) => return false,
            },
            None => None,
        };
        self.matches_with(info, regex.as_ref())
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Text(v)
            | Criterion::TextStartsWith(v)
            | Criterion::TextContains(v)
            | Criterion::TextMatches(v)
            | Criterion::ClassName(v)
            | Criterion::ClassNameMatches(v)
            | Criterion::Description(v)
            | Criterion::DescriptionStartsWith(v)
            | Criterion::DescriptionContains(v)
            | Criterion::DescriptionMatches(v)
            | Criterion::ResourceId(v)
            | Criterion::ResourceIdMatches(v)
            | Criterion::PackageName(v)
            | Criterion::PackageNameMatches(v) => write!(f, "{}={}", self.label(), v),
            Criterion::Index(n) | Criterion::Instance(n) => write!(f, "{}={}", self.label(), n),
            Criterion::Enabled(b)
            | Criterion::Focused(b)
            | Criterion::Focusable(b)
            | Criterion::Scrollable(b)
            | Criterion::Clickable(b)
            | Criterion::Checked(b)
            | Criterion::Checkable(b)
            | Criterion::Selected(b)
            | Criterion::LongClickable(b) => write!(f, "{}={}", self.label(), b),
        }
    }
}

/// Describes which element(s) an adapter should look for.
///
/// Criteria are ANDed. A `child` query matches descendants of the elements
/// matched by the outer criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiQuery {
    pub criteria: Vec<Criterion>,
    pub child: Option<Box<UiQuery>>,
}

impl UiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a criterion; one already present of the same kind is replaced.
    pub fn with(mut self, criterion: Criterion) -> Self {
        let same_kind = |c: &Criterion| std::mem::discriminant(c) == std::mem::discriminant(&criterion);
        if let Some(existing) = self.criteria.iter_mut().find(|c| same_kind(c)) {
            *existing = criterion;
        } else {
            self.criteria.push(criterion);
        }
        self
    }

    pub fn with_child(mut self, child: UiQuery) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new().with(Criterion::Text(value.into()))
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new().with(Criterion::ClassName(value.into()))
    }

    pub fn description(value: impl Into<String>) -> Self {
        Self::new().with(Criterion::Description(value.into()))
    }

    pub fn resource_id(value: impl Into<String>) -> Self {
        Self::new().with(Criterion::ResourceId(value.into()))
    }

    pub fn instance(&self) -> Option<u32> {
        self.criteria.iter().find_map(|c| match c {
            Criterion::Instance(n) => Some(*n),
            _ => None,
        })
    }

    /// Same query without its `Instance` criterion.
    pub fn without_instance(&self) -> Self {
        Self {
            criteria: self
                .criteria
                .iter()
                .filter(|c| !matches!(c, Criterion::Instance(_)))
                .cloned()
                .collect(),
            child: self.child.clone(),
        }
    }

    /// Compiles the regex criteria of this level once, for matching many
    /// elements.
    pub fn matcher(&self) -> Result<QueryMatcher<'_>, SelectorError> {
        let regexes = self
            .criteria
            .iter()
            .map(|c| c.pattern().map(full_match_regex).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(QueryMatcher {
            query: self,
            regexes,
        })
    }

    /// Whether `info` satisfies every criterion of this level (the child
    /// query is not consulted).
    pub fn matches(&self, info: &ElementInfo) -> bool {
        self.matcher().is_ok_and(|m| m.matches(info))
    }

    pub fn validate(&self) -> Result<(), SelectorError> {
        for criterion in &self.criteria {
            criterion.validate()?;
        }
        match &self.child {
            Some(child) => child.validate(),
            None => Ok(()),
        }
    }
}

impl fmt::Display for UiQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UiSelector[")?;
        let mut first = true;
        for criterion in &self.criteria {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}", criterion)?;
            first = false;
        }
        if let Some(child) = &self.child {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "CHILD={}", child)?;
        }
        f.write_str("]")
    }
}

/// A [`UiQuery`] level with its patterns compiled.
#[derive(Debug)]
pub struct QueryMatcher<'a> {
    query: &'a UiQuery,
    regexes: Vec<Option<Regex>>,
}

impl QueryMatcher<'_> {
    pub fn matches(&self, info: &ElementInfo) -> bool {
        self.query
            .criteria
            .iter()
            .zip(&self.regexes)
            .all(|(criterion, regex)| criterion.matches_with(info, regex.as_ref()))
    }
}

fn full_match_regex(pattern: &str) -> Result<Regex, SelectorError> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| SelectorError::InvalidSelector(format!("invalid regex '{}': {}", pattern, e)))
}
