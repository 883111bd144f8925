use serde_json::Value;
use tracing::debug;
use uia_bridge_core::selector::plan_find;
use uia_bridge_core::selector::resolve_strategy;
use uia_bridge_core::selector::DynamicMode;
use uia_bridge_core::selector::DynamicSelector;
use uia_bridge_core::selector::ScrollableSelector;
use uia_bridge_core::FindPlan;
use uia_bridge_core::Platform;
use uia_bridge_core::PlatformError;
use uia_bridge_core::UiQuery;
use uia_bridge_protocol::Command;
use uia_bridge_protocol::CommandError;
use uia_bridge_protocol::CommandResult;

use super::common::handler_span;
use crate::session::BridgeSession;

const NOT_FOUND: &str = "No element found";

enum Found<E> {
    One(Option<E>),
    Many(Vec<E>),
}

/// Lookup context shared by the search helpers.
struct Search<'a, P: Platform> {
    platform: &'a P,
    context: Option<&'a P::Element>,
}

impl<P: Platform> Search<'_, P> {
    /// A failing platform call while searching beneath a registered context
    /// means the context itself is gone.
    fn fail(&self, err: PlatformError) -> CommandError {
        let err = CommandError::from(err);
        if self.context.is_some() {
            err.into_stale()
        } else {
            err
        }
    }

    fn first(&self, query: &UiQuery) -> Result<Option<P::Element>, CommandError> {
        self.platform
            .find_element(query, self.context)
            .map_err(|e| self.fail(e))
    }

    fn all(&self, query: &UiQuery) -> Result<Vec<P::Element>, CommandError> {
        self.platform
            .find_elements(query, self.context)
            .map_err(|e| self.fail(e))
    }

    /// Every match of every query, without duplicates.
    fn union(&self, queries: &[UiQuery]) -> Result<Found<P::Element>, CommandError> {
        let mut elements = Vec::new();
        for query in queries {
            for element in self.all(query)? {
                if !elements.contains(&element) {
                    elements.push(element);
                }
            }
        }
        Ok(Found::Many(elements))
    }

    /// Matches of the first query that matches anything.
    fn candidates(&self, queries: &[UiQuery], multiple: bool) -> Result<Found<P::Element>, CommandError> {
        if multiple {
            for query in queries {
                let elements = self.all(query)?;
                if !elements.is_empty() {
                    return Ok(Found::Many(elements));
                }
            }
            return Ok(Found::Many(Vec::new()));
        }
        for query in queries {
            if let Some(element) = self.first(query)? {
                return Ok(Found::One(Some(element)));
            }
        }
        Ok(Found::One(None))
    }

    fn dynamic(&self, selector: &DynamicSelector, multiple: bool) -> Result<Found<P::Element>, CommandError> {
        match selector.mode {
            DynamicMode::All => self.union(&selector.queries),
            DynamicMode::First => self.candidates(&selector.queries, multiple),
            DynamicMode::Scroll => {
                for query in &selector.queries {
                    let visible = self
                        .platform
                        .scroll_into_view(query)
                        .map_err(CommandError::from)?;
                    if !visible {
                        debug!(%query, "could not scroll into view; trying next selector");
                        continue;
                    }
                    if let Some(element) = self.first(query)? {
                        return Ok(Found::One(Some(element)));
                    }
                }
                Ok(Found::One(None))
            }
        }
    }

    fn scrollable(&self, selector: &ScrollableSelector, multiple: bool) -> Result<Found<P::Element>, CommandError> {
        if selector.scroll {
            let visible = self
                .platform
                .scroll_into_view(&selector.target)
                .map_err(CommandError::from)?;
            if !visible {
                debug!(query = %selector.target, "could not scroll into view");
            }
        }
        self.candidates(std::slice::from_ref(&selector.target), multiple)
    }
}

/// `find`: resolves a selector and registers the matching elements.
pub fn handle_find<P: Platform>(
    session: &BridgeSession<P>,
    command: &Command,
) -> Result<Value, CommandError> {
    let _span = handler_span(command, "find").entered();

    let strategy = resolve_strategy(command.require_str("strategy")?)?;
    let selector = command.require("selector")?;
    let multiple = command.param_bool("multiple", false)?;
    let context = match command.param_str("context").filter(|id| !id.is_empty()) {
        Some(id) => Some(session.registry().get(id)?),
        None => None,
    };

    let plan = plan_find(strategy, selector, session.class_map())?;
    let search = Search {
        platform: session.platform(),
        context: context.as_ref(),
    };
    let found = match &plan {
        FindPlan::Candidates(queries) => {
            for query in queries {
                query.validate()?;
            }
            debug!(%strategy, candidates = queries.len(), multiple, "finding elements");
            search.candidates(queries, multiple)?
        }
        FindPlan::Dynamic(dynamic) => {
            for query in &dynamic.queries {
                query.validate()?;
            }
            debug!(mode = ?dynamic.mode, candidates = dynamic.queries.len(), "finding dynamic");
            search.dynamic(dynamic, multiple)?
        }
        FindPlan::Scrollable(scrollable) => {
            debug!(
                query = %scrollable.target,
                scroll = scrollable.scroll,
                orientation = ?scrollable.orientation,
                max_search_swipes = ?scrollable.max_search_swipes,
                "finding in scrollable"
            );
            search.scrollable(scrollable, multiple)?
        }
    };

    let registry = session.registry();
    match found {
        Found::One(Some(element)) => Ok(CommandResult::element_ref(&registry.put(element))),
        Found::One(None) => Err(CommandError::NoSuchElement(NOT_FOUND.to_string())),
        Found::Many(elements) => Ok(Value::Array(
            elements
                .into_iter()
                .map(|element| CommandResult::element_ref(&registry.put(element)))
                .collect(),
        )),
    }
}
