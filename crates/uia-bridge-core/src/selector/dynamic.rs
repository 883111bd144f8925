//! `dynamic` selectors: lists of `[methodCode, argument]` pairs.
//!
//! ```text
//! ["all", [[3, "sign"]], [[4, "android.widget.EditText"]]]
//! ```

use serde_json::Value;

use super::query::Criterion;
use super::query::UiQuery;
use super::SelectorError;

/// Codes at or above this value name post-processing steps, not criteria.
pub const FINALIZER_THRESHOLD: i64 = 100;

/// How the candidate queries of a dynamic selector are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicMode {
    /// First element matched by the first matching query.
    First,
    /// Every element matched by any query, de-duplicated.
    All,
    /// Scroll each candidate into view before looking it up.
    Scroll,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicSelector {
    pub mode: DynamicMode,
    pub queries: Vec<UiQuery>,
}

pub fn parse_dynamic(selector: &Value) -> Result<DynamicSelector, SelectorError> {
    let items = selector
        .as_array()
        .ok_or_else(|| invalid("dynamic selector must be an array"))?;

    let (mode, rest) = match items.first().and_then(Value::as_str) {
        Some(option) => {
            let mode = match option.to_lowercase().as_str() {
                "all" => DynamicMode::All,
                "scroll" => DynamicMode::Scroll,
                other => return Err(invalid(&format!("unknown dynamic option '{}'", other))),
            };
            (mode, &items[1..])
        }
        None => (DynamicMode::First, &items[..]),
    };

    let queries = rest
        .iter()
        .map(parse_pair_list)
        .collect::<Result<Vec<_>, _>>()?;
    if queries.is_empty() {
        return Err(invalid("dynamic selector has no method pairs"));
    }
    Ok(DynamicSelector { mode, queries })
}

fn parse_pair_list(value: &Value) -> Result<UiQuery, SelectorError> {
    let pairs = value
        .as_array()
        .ok_or_else(|| invalid(&format!("expected a list of method pairs, got {}", value)))?;
    let mut query = UiQuery::new();
    for pair in pairs {
        let parts = pair
            .as_array()
            .ok_or_else(|| invalid(&format!("expected a [method, argument] pair, got {}", pair)))?;
        let code = parts
            .first()
            .and_then(Value::as_i64)
            .ok_or_else(|| invalid(&format!("pair {} has no integer method code", pair)))?;
        if code >= FINALIZER_THRESHOLD {
            return Err(invalid(&format!("finalizer method {} is not supported", code)));
        }
        let argument = parts
            .get(1)
            .ok_or_else(|| invalid(&format!("method {} is missing its argument", code)))?;
        query = query.with(criterion_for(code, argument)?);
    }
    query.validate()?;
    Ok(query)
}

fn criterion_for(code: i64, argument: &Value) -> Result<Criterion, SelectorError> {
    let criterion = match code {
        1 => Criterion::Text(string_arg(code, argument)?),
        2 => Criterion::TextStartsWith(string_arg(code, argument)?),
        3 => Criterion::TextContains(string_arg(code, argument)?),
        4 => Criterion::ClassName(string_arg(code, argument)?),
        5 => Criterion::Description(string_arg(code, argument)?),
        6 => Criterion::DescriptionStartsWith(string_arg(code, argument)?),
        7 => Criterion::DescriptionContains(string_arg(code, argument)?),
        8 => Criterion::Index(int_arg(code, argument)?),
        9 => Criterion::Instance(int_arg(code, argument)?),
        10 => Criterion::Enabled(bool_arg(code, argument)?),
        11 => Criterion::Focused(bool_arg(code, argument)?),
        12 => Criterion::Focusable(bool_arg(code, argument)?),
        13 => Criterion::Scrollable(bool_arg(code, argument)?),
        14 => Criterion::Clickable(bool_arg(code, argument)?),
        15 => Criterion::Checked(bool_arg(code, argument)?),
        16 => Criterion::Selected(bool_arg(code, argument)?),
        18 => Criterion::PackageName(string_arg(code, argument)?),
        24 => Criterion::LongClickable(bool_arg(code, argument)?),
        25 => Criterion::TextMatches(string_arg(code, argument)?),
        26 => Criterion::ClassNameMatches(string_arg(code, argument)?),
        27 => Criterion::DescriptionMatches(string_arg(code, argument)?),
        28 => Criterion::PackageNameMatches(string_arg(code, argument)?),
        29 => Criterion::ResourceId(string_arg(code, argument)?),
        30 => Criterion::Checkable(bool_arg(code, argument)?),
        31 => Criterion::ResourceIdMatches(string_arg(code, argument)?),
        _ => return Err(invalid(&format!("unknown dynamic method code {}", code))),
    };
    Ok(criterion)
}

fn string_arg(code: i64, value: &Value) -> Result<String, SelectorError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(&format!("method {} expects a string, got {}", code, value)))
}

fn int_arg(code: i64, value: &Value) -> Result<u32, SelectorError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(&format!("method {} expects an integer, got {}", code, value)))
}

fn bool_arg(code: i64, value: &Value) -> Result<bool, SelectorError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(&format!("method {} expects a boolean, got {}", code, value)))
}

fn invalid(msg: &str) -> SelectorError {
    SelectorError::InvalidSelector(msg.to_string())
}
