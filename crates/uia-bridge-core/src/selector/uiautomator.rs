//! Parser for `-android uiautomator` expressions such as
//! `new UiSelector().className("android.widget.ListView").childSelector(new UiSelector().text("Item"))`
//! and `new UiScrollable(new UiSelector().scrollable(true)).getChildByText(new UiSelector(), "Item")`.

use super::query::Criterion;
use super::query::UiQuery;
use super::SelectorError;

#[derive(Debug, Clone, Copy)]
enum ArgKind {
    Str,
    Bool,
    Int,
    Selector,
}

fn method_arg_kind(name: &str) -> Option<ArgKind> {
    let kind = match name {
        "text" | "textStartsWith" | "textContains" | "textMatches" | "className"
        | "classNameMatches" | "description" | "descriptionStartsWith"
        | "descriptionContains" | "descriptionMatches" | "resourceId" | "resourceIdMatches"
        | "packageName" | "packageNameMatches" => ArgKind::Str,
        "index" | "instance" => ArgKind::Int,
        "enabled" | "focused" | "focusable" | "scrollable" | "clickable" | "checked"
        | "checkable" | "selected" | "longClickable" => ArgKind::Bool,
        "childSelector" => ArgKind::Selector,
        _ => return None,
    };
    Some(kind)
}

enum Arg {
    Str(String),
    Bool(bool),
    Int(u32),
    Selector(UiQuery),
}

/// Parses a `UiSelector` builder chain into a [`UiQuery`].
pub fn parse_ui_selector(input: &str) -> Result<UiQuery, SelectorError> {
    let query = parse(input).map_err(|msg| {
        SelectorError::InvalidSelector(format!("Could not parse UiSelector argument: {}", msg))
    })?;
    query.validate()?;
    Ok(query)
}

fn parse(input: &str) -> Result<UiQuery, String> {
    let trimmed = input.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("new UiSelector()") {
        rest.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("UiSelector()") {
        rest.to_string()
    } else if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{}", trimmed)
    };

    let mut query = UiQuery::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        rest = consume_period(rest)?;
        let (method, argument, remaining) = consume_call(rest)?;
        query = apply(query, method, argument)?;
        rest = remaining.trim_start();
    }
    Ok(query)
}

fn consume_period(text: &str) -> Result<&str, String> {
    match text.strip_prefix('.') {
        Some(rest) => Ok(rest),
        None => {
            let seen = text.chars().next().unwrap_or(' ');
            Err(format!("Expected \".\" but saw \"{}\"", seen))
        }
    }
}

/// Splits `name(arg)rest`, balancing nested parentheses outside of string
/// literals.
fn consume_call(text: &str) -> Result<(&str, &str, &str), String> {
    let paren = text
        .find('(')
        .ok_or_else(|| format!("Expected \"(\" after \"{}\"", text))?;
    let method = text[..paren].trim();
    if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("\"{}\" is not a method name", method));
    }
    let (argument, rest) = consume_parens(&text[paren..])?;
    if argument.is_empty() {
        return Err(format!("{} method expects an argument", method));
    }
    Ok((method, argument, rest))
}

/// Splits `(arg)rest` into the trimmed argument and the rest.
fn consume_parens(text: &str) -> Result<(&str, &str), String> {
    let Some(inner) = text.strip_prefix('(') else {
        let seen = text.chars().next().unwrap_or(' ');
        return Err(format!("Expected \"(\" but saw \"{}\"", seen));
    };
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in inner.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((inner[..offset].trim(), &inner[offset + 1..]));
                }
            }
            _ => {}
        }
    }
    Err("unclosed paren in expression".to_string())
}

/// Splits a call's argument list on top-level commas.
fn split_args(argument: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;
    for (offset, ch) in argument.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(argument[start..offset].trim());
                start = offset + 1;
            }
            _ => {}
        }
    }
    args.push(argument[start..].trim());
    args
}

fn coerce(kind: ArgKind, argument: &str) -> Result<Arg, String> {
    match kind {
        ArgKind::Str => {
            let inner = argument
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .filter(|_| argument.len() >= 2)
                .ok_or_else(|| format!("{} is not a string", argument))?;
            Ok(Arg::Str(inner.replace("\\\"", "\"")))
        }
        ArgKind::Bool => match argument {
            "true" => Ok(Arg::Bool(true)),
            "false" => Ok(Arg::Bool(false)),
            _ => Err(format!("{} is not a boolean", argument)),
        },
        ArgKind::Int => argument
            .parse::<u32>()
            .map(Arg::Int)
            .map_err(|_| format!("{} is not an integer", argument)),
        ArgKind::Selector => parse(argument).map(Arg::Selector),
    }
}

fn apply(query: UiQuery, method: &str, argument: &str) -> Result<UiQuery, String> {
    let kind =
        method_arg_kind(method).ok_or_else(|| format!("UiSelector has no {} method", method))?;
    let arg = coerce(kind, argument)?;
    let criterion = match (method, arg) {
        (_, Arg::Selector(child)) => return Ok(query.with_child(child)),
        ("text", Arg::Str(s)) => Criterion::Text(s),
        ("textStartsWith", Arg::Str(s)) => Criterion::TextStartsWith(s),
        ("textContains", Arg::Str(s)) => Criterion::TextContains(s),
        ("textMatches", Arg::Str(s)) => Criterion::TextMatches(s),
        ("className", Arg::Str(s)) => Criterion::ClassName(s),
        ("classNameMatches", Arg::Str(s)) => Criterion::ClassNameMatches(s),
        ("description", Arg::Str(s)) => Criterion::Description(s),
        ("descriptionStartsWith", Arg::Str(s)) => Criterion::DescriptionStartsWith(s),
        ("descriptionContains", Arg::Str(s)) => Criterion::DescriptionContains(s),
        ("descriptionMatches", Arg::Str(s)) => Criterion::DescriptionMatches(s),
        ("resourceId", Arg::Str(s)) => Criterion::ResourceId(s),
        ("resourceIdMatches", Arg::Str(s)) => Criterion::ResourceIdMatches(s),
        ("packageName", Arg::Str(s)) => Criterion::PackageName(s),
        ("packageNameMatches", Arg::Str(s)) => Criterion::PackageNameMatches(s),
        ("index", Arg::Int(n)) => Criterion::Index(n),
        ("instance", Arg::Int(n)) => Criterion::Instance(n),
        ("enabled", Arg::Bool(b)) => Criterion::Enabled(b),
        ("focused", Arg::Bool(b)) => Criterion::Focused(b),
        ("focusable", Arg::Bool(b)) => Criterion::Focusable(b),
        ("scrollable", Arg::Bool(b)) => Criterion::Scrollable(b),
        ("clickable", Arg::Bool(b)) => Criterion::Clickable(b),
        ("checked", Arg::Bool(b)) => Criterion::Checked(b),
        ("checkable", Arg::Bool(b)) => Criterion::Checkable(b),
        ("selected", Arg::Bool(b)) => Criterion::Selected(b),
        ("longClickable", Arg::Bool(b)) => Criterion::LongClickable(b),
        _ => {
            return Err(format!(
                "Could not apply argument {} to UiSelector method {}",
                argument, method
            ))
        }
    };
    Ok(query.with(criterion))
}

const SCROLLABLE_PREFIXES: [&str; 2] = ["new UiScrollable", "UiScrollable"];

/// Whether `input` builds a `UiScrollable` rather than a plain `UiSelector`.
pub fn is_ui_scrollable(input: &str) -> bool {
    let trimmed = input.trim_start();
    SCROLLABLE_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// Scroll direction of a [`ScrollableSelector`] container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrientation {
    #[default]
    Vertical,
    Horizontal,
}

/// An element looked up inside a scrollable container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollableSelector {
    /// Container query with the wanted element as its child query.
    pub target: UiQuery,
    /// Scroll the element into view before looking it up.
    pub scroll: bool,
    pub orientation: ListOrientation,
    pub max_search_swipes: Option<u32>,
}

/// Parses a `UiScrollable` chain. The chain must end with a call that yields
/// an element (`getChildByText`, `getChildByDescription`,
/// `getChildByInstance`, `scrollIntoView`, `scrollTextIntoView`); list
/// setters may precede it.
pub fn parse_ui_scrollable(input: &str) -> Result<ScrollableSelector, SelectorError> {
    let selector = parse_scrollable(input).map_err(|msg| {
        SelectorError::InvalidSelector(format!("Could not parse UiScrollable argument: {}", msg))
    })?;
    selector.target.validate()?;
    Ok(selector)
}

fn parse_scrollable(input: &str) -> Result<ScrollableSelector, String> {
    let trimmed = input.trim();
    let rest = SCROLLABLE_PREFIXES
        .iter()
        .find_map(|p| trimmed.strip_prefix(p))
        .ok_or_else(|| format!("expected a UiScrollable, saw {}", trimmed))?;
    let (container, rest) = consume_parens(rest.trim_start())?;
    if container.is_empty() {
        return Err("UiScrollable constructor expects an argument".to_string());
    }
    let container = parse(container)?;

    let mut orientation = ListOrientation::default();
    let mut max_search_swipes = None;
    let mut found: Option<(UiQuery, bool)> = None;
    let mut rest = rest.trim_start();
    while !rest.is_empty() {
        rest = consume_period(rest)?;
        let paren = rest
            .find('(')
            .ok_or_else(|| format!("Expected \"(\" after \"{}\"", rest))?;
        let method = rest[..paren].trim();
        let (argument, remaining) = consume_parens(&rest[paren..])?;
        rest = remaining.trim_start();

        if found.is_some() {
            return Err(format!(
                "Cannot call UiScrollable method \"{}\" on a UiObject instance",
                method
            ));
        }
        let args = if argument.is_empty() {
            Vec::new()
        } else {
            split_args(argument)
        };
        match (method, args.as_slice()) {
            ("setAsHorizontalList", []) => orientation = ListOrientation::Horizontal,
            ("setAsVerticalList", []) => orientation = ListOrientation::Vertical,
            ("setMaxSearchSwipes", [n]) => {
                max_search_swipes = Some(
                    n.parse::<u32>()
                        .map_err(|_| format!("{} is not an integer", n))?,
                );
            }
            ("setSwipeDeadZonePercentage", [p]) => {
                p.parse::<f64>()
                    .map_err(|_| format!("{} is not a number", p))?;
            }
            ("getChildByText", [child, text]) | ("getChildByText", [child, text, _]) => {
                let item = parse(child)?.with(Criterion::Text(string_arg(text)?));
                found = Some((item, scroll_flag(&args)?));
            }
            ("getChildByDescription", [child, desc])
            | ("getChildByDescription", [child, desc, _]) => {
                let item = parse(child)?.with(Criterion::Description(string_arg(desc)?));
                found = Some((item, scroll_flag(&args)?));
            }
            ("getChildByInstance", [child, n]) => {
                let n = n
                    .parse::<u32>()
                    .map_err(|_| format!("{} is not an integer", n))?;
                found = Some((parse(child)?.with(Criterion::Instance(n)), false));
            }
            ("scrollIntoView", [child]) => found = Some((parse(child)?, true)),
            ("scrollTextIntoView", [text]) => {
                found = Some((UiQuery::text(string_arg(text)?), true));
            }
            _ => {
                return Err(format!(
                    "UiScrollable has no \"{}\" method that takes {} arguments",
                    method,
                    args.len()
                ))
            }
        }
    }

    let (item, scroll) = found.ok_or_else(|| {
        "Last method called on a UiScrollable object must return a UiObject object".to_string()
    })?;
    Ok(ScrollableSelector {
        target: container.with_child(item),
        scroll,
        orientation,
        max_search_swipes,
    })
}

fn string_arg(argument: &str) -> Result<String, String> {
    match coerce(ArgKind::Str, argument)? {
        Arg::Str(s) => Ok(s),
        _ => Err(format!("{} is not a string", argument)),
    }
}

/// The optional third `allowScrollSearch` argument; scrolling is the default.
fn scroll_flag(args: &[&str]) -> Result<bool, String> {
    match args.get(2) {
        Some(flag) => match coerce(ArgKind::Bool, flag)? {
            Arg::Bool(b) => Ok(b),
            _ => Err(format!("{} is not a boolean", flag)),
        },
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(input: &str) -> String {
        match parse_ui_selector(input) {
            Err(SelectorError::InvalidSelector(msg)) => msg,
            other => panic!("expected invalid selector, got {:?}", other),
        }
    }

    #[test]
    fn test_parses_builder_chain() {
        let query = parse_ui_selector(
            r#"new UiSelector().className("android.widget.TextView").clickable(true).instance(2)"#,
        )
        .unwrap();
        assert_eq!(
            query.criteria,
            vec![
                Criterion::ClassName("android.widget.TextView".into()),
                Criterion::Clickable(true),
                Criterion::Instance(2),
            ]
        );
    }

    #[test]
    fn test_prefix_forms() {
        let expected = UiQuery::text("OK");
        assert_eq!(parse_ui_selector(r#"UiSelector().text("OK")"#).unwrap(), expected);
        assert_eq!(parse_ui_selector(r#".text("OK")"#).unwrap(), expected);
        assert_eq!(parse_ui_selector(r#"  text("OK")  "#).unwrap(), expected);
    }

    #[test]
    fn test_nested_child_selector() {
        let query = parse_ui_selector(
            r#"new UiSelector().className("android.widget.ListView").childSelector(new UiSelector().textContains("(beta)"))"#,
        )
        .unwrap();
        let child = query.child.as_deref().unwrap();
        assert_eq!(child.criteria, vec![Criterion::TextContains("(beta)".into())]);
    }

    #[test]
    fn test_unclosed_paren() {
        assert!(parse_err(r#"new UiSelector().text("OK""#).contains("unclosed paren"));
    }

    #[test]
    fn test_unknown_method() {
        assert!(parse_err(r#"new UiSelector().frobnicate("x")"#).contains("has no frobnicate method"));
    }

    #[test]
    fn test_argument_type_errors() {
        assert!(parse_err("new UiSelector().text(OK)").contains("is not a string"));
        assert!(parse_err(r#"new UiSelector().clickable("yes")"#).contains("is not a boolean"));
        assert!(parse_err("new UiSelector().index(-1)").contains("is not an integer"));
        assert!(parse_err("new UiSelector().text()").contains("expects an argument"));
    }

    #[test]
    fn test_missing_period_between_calls() {
        assert!(parse_err(r#"new UiSelector().text("a")clickable(true)"#).contains("Expected \".\""));
    }

    #[test]
    fn test_bad_regex_is_invalid_selector() {
        assert!(matches!(
            parse_ui_selector(r#"new UiSelector().textMatches("[")"#),
            Err(SelectorError::InvalidSelector(_))
        ));
    }
    fn scrollable_err(input: &str) -> String {
        match parse_ui_scrollable(input) {
            Err(SelectorError::InvalidSelector(msg)) => msg,
            other => panic!("expected invalid selector, got {:?}", other),
        }
    }

    #[test]
    fn test_scrollable_get_child_by_text() {
        let input = r#"new UiScrollable(new UiSelector().scrollable(true)).setAsVerticalList().getChildByText(new UiSelector().className("android.widget.TextView"), "Item 40")"#;
        assert!(is_ui_scrollable(input));
        let selector = parse_ui_scrollable(input).unwrap();
        assert!(selector.scroll);
        assert_eq!(
            selector.target,
            UiQuery::new().with(Criterion::Scrollable(true)).with_child(
                UiQuery::class_name("android.widget.TextView")
                    .with(Criterion::Text("Item 40".into()))
            )
        );
    }

    #[test]
    fn test_scrollable_setters_and_instance() {
        let selector = parse_ui_scrollable(
            r#"UiScrollable(new UiSelector().resourceId("list")).setAsHorizontalList().setMaxSearchSwipes(5).getChildByInstance(new UiSelector().clickable(true), 2)"#,
        )
        .unwrap();
        assert!(!selector.scroll);
        assert_eq!(selector.orientation, ListOrientation::Horizontal);
        assert_eq!(selector.max_search_swipes, Some(5));
        let child = selector.target.child.as_deref().unwrap();
        assert_eq!(child.instance(), Some(2));
    }

    #[test]
    fn test_scrollable_description_without_scrolling() {
        let selector = parse_ui_scrollable(
            r#"new UiScrollable(new UiSelector().scrollable(true)).getChildByDescription(new UiSelector(), "a, b", false)"#,
        )
        .unwrap();
        assert!(!selector.scroll);
        let child = selector.target.child.as_deref().unwrap();
        assert_eq!(child.criteria, vec![Criterion::Description("a, b".into())]);
    }

    #[test]
    fn test_scrollable_scroll_into_view() {
        let selector = parse_ui_scrollable(
            r#"new UiScrollable(new UiSelector().scrollable(true)).scrollIntoView(new UiSelector().text("Item 40"))"#,
        )
        .unwrap();
        assert!(selector.scroll);
        assert_eq!(selector.target.child.as_deref(), Some(&UiQuery::text("Item 40")));
    }

    #[test]
    fn test_scrollable_errors() {
        assert!(scrollable_err(r#"new UiScrollable(new UiSelector().scrollable(true))"#)
            .contains("must return a UiObject"));
        assert!(scrollable_err(
            r#"new UiScrollable(new UiSelector()).scrollTextIntoView("a").setAsHorizontalList()"#
        )
        .contains("on a UiObject instance"));
        assert!(scrollable_err(r#"new UiScrollable(new UiSelector()).flingToEnd(3)"#)
            .contains("has no \"flingToEnd\" method"));
        assert!(scrollable_err("new UiScrollable()").contains("expects an argument"));
        assert!(scrollable_err(r#"new UiScrollable(new UiSelector().text("a")"#)
            .contains("unclosed paren"));
    }
}
