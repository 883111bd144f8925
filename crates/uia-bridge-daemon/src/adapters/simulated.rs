//! In-memory device driven by a JSON fixture.
//!
//! The fixture describes the display, the initial rotation and a window
//! hierarchy:
//!
//! ```json
//! {
//!   "display": {"width": 1080, "height": 1920},
//!   "rotation": 0,
//!   "root": {
//!     "class": "android.widget.FrameLayout",
//!     "bounds": {"left": 0, "top": 0, "right": 1080, "bottom": 1920},
//!     "children": [
//!       {"class": "android.widget.Button", "text": "Login", "clickable": true}
//!     ]
//!   }
//! }
//! ```
//!
//! Every action is recorded as a [`DeviceEvent`] so callers can inspect what
//! the bridge asked the device to do.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use uia_bridge_common::mutex_lock_or_recover;
use uia_bridge_core::platform::keycode;
use uia_bridge_core::ElementInfo;
use uia_bridge_core::GestureVector;
use uia_bridge_core::PinchGesture;
use uia_bridge_core::Platform;
use uia_bridge_core::PlatformError;
use uia_bridge_core::Point;
use uia_bridge_core::Rect;
use uia_bridge_core::RotateDirection;
use uia_bridge_core::Rotation;
use uia_bridge_core::Size;
use uia_bridge_core::UiQuery;

use crate::error::DaemonError;

const SAMPLE_FIXTURE: &str = include_str!("sample_device.json");

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFixture {
    #[serde(default = "default_display")]
    pub display: Size,
    #[serde(default)]
    pub rotation: u32,
    /// Rotation reads that still report the old value after a request.
    #[serde(default)]
    pub rotation_lag: u32,
    /// Rotation requests are accepted but never applied.
    #[serde(default)]
    pub rotation_locked: bool,
    pub root: NodeFixture,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFixture {
    #[serde(rename = "class", default = "default_class")]
    pub class_name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "desc")]
    pub content_description: String,
    #[serde(default)]
    pub resource_id: String,
    #[serde(default)]
    pub package: String,
    #[serde(default)]
    pub bounds: Rect,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "yes")]
    pub displayed: bool,
    #[serde(default)]
    pub checkable: bool,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub focusable: bool,
    #[serde(default)]
    pub long_clickable: bool,
    #[serde(default)]
    pub scrollable: bool,
    #[serde(default)]
    pub selected: bool,
    /// Hidden until a scroll brings it into view.
    #[serde(default)]
    pub offscreen: bool,
    /// `clear_text` leaves the text alone; only delete keys remove it.
    #[serde(default)]
    pub resists_clear: bool,
    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

fn default_display() -> Size {
    Size::new(1080, 1920)
}

fn default_class() -> String {
    "android.view.View".to_string()
}

fn yes() -> bool {
    true
}

/// What the bridge asked the device to do.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Click(Point),
    LongClick(Point),
    SetText { element: usize, text: String },
    Swipe(GestureVector),
    Drag(GestureVector),
    Pinch { element: usize, gesture: PinchGesture },
    Key { keycode: i32, meta_state: i32 },
    Back,
    Rotate(RotateDirection),
    ScrollIntoView(String),
    WaitForIdle(Duration),
}

/// Handle to a node of the simulated hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimElement(usize);

impl SimElement {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node {
    info: ElementInfo,
    children: Vec<usize>,
    removed: bool,
    offscreen: bool,
    resists_clear: bool,
}

#[derive(Debug)]
struct DeviceState {
    nodes: Vec<Node>,
    display: Size,
    rotation: Rotation,
    pending_rotation: Option<(Rotation, u32)>,
    rotation_lag: u32,
    rotation_locked: bool,
    focused: Option<usize>,
    events: Vec<DeviceEvent>,
}

pub struct SimulatedDevice {
    state: Mutex<DeviceState>,
}

impl SimulatedDevice {
    pub fn from_fixture(fixture: DeviceFixture) -> Result<Self, DaemonError> {
        let rotation = Rotation::from_degrees(fixture.rotation).map_err(|e| DaemonError::Fixture {
            path: "<fixture>".to_string(),
            reason: e.to_string(),
        })?;
        let mut nodes = Vec::new();
        flatten(&fixture.root, 0, &mut nodes);
        Ok(Self {
            state: Mutex::new(DeviceState {
                nodes,
                display: fixture.display,
                rotation,
                pending_rotation: None,
                rotation_lag: fixture.rotation_lag,
                rotation_locked: fixture.rotation_locked,
                focused: None,
                events: Vec::new(),
            }),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DaemonError> {
        let fixture: DeviceFixture = serde_json::from_str(json).map_err(|e| DaemonError::Fixture {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        Self::from_fixture(fixture)
    }

    pub fn load(path: &Path) -> Result<Self, DaemonError> {
        let fixture_error = |reason: String| DaemonError::Fixture {
            path: path.display().to_string(),
            reason,
        };
        let json = fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
        let fixture: DeviceFixture =
            serde_json::from_str(&json).map_err(|e| fixture_error(e.to_string()))?;
        Self::from_fixture(fixture).map_err(|e| match e {
            DaemonError::Fixture { reason, .. } => fixture_error(reason),
            other => other,
        })
    }

    /// A login screen with a scrollable list, used when no fixture is given.
    pub fn sample() -> Result<Self, DaemonError> {
        Self::from_json(SAMPLE_FIXTURE)
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        mutex_lock_or_recover(&self.state).events.clone()
    }

    /// Detaches `element` and its subtree, as if the app removed it.
    pub fn remove(&self, element: &SimElement) {
        let mut state = mutex_lock_or_recover(&self.state);
        for index in preorder(&state.nodes, element.0, true) {
            state.nodes[index].removed = true;
        }
    }

    fn live<'a>(state: &'a DeviceState, element: &SimElement) -> Result<&'a Node, PlatformError> {
        match state.nodes.get(element.0) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(PlatformError::ElementNotFound(format!(
                "node {} is no longer in the hierarchy",
                element.0
            ))),
        }
    }

    fn live_mut<'a>(
        state: &'a mut DeviceState,
        element: &SimElement,
    ) -> Result<&'a mut Node, PlatformError> {
        match state.nodes.get_mut(element.0) {
            Some(node) if !node.removed => Ok(node),
            _ => Err(PlatformError::ElementNotFound(format!(
                "node {} is no longer in the hierarchy",
                element.0
            ))),
        }
    }

    fn record(&self, event: DeviceEvent) {
        debug!(?event, "simulated device event");
        mutex_lock_or_recover(&self.state).events.push(event);
    }

    fn center_of(&self, element: &SimElement) -> Result<Point, PlatformError> {
        let state = mutex_lock_or_recover(&self.state);
        Ok(Self::live(&state, element)?.info.bounds.center())
    }
}

fn flatten(fixture: &NodeFixture, index: u32, nodes: &mut Vec<Node>) -> usize {
    let id = nodes.len();
    nodes.push(Node {
        info: ElementInfo {
            text: fixture.text.clone(),
            content_description: fixture.content_description.clone(),
            class_name: fixture.class_name.clone(),
            resource_id: fixture.resource_id.clone(),
            package: fixture.package.clone(),
            bounds: fixture.bounds,
            index,
            enabled: fixture.enabled,
            checkable: fixture.checkable,
            checked: fixture.checked,
            clickable: fixture.clickable,
            focusable: fixture.focusable,
            focused: false,
            long_clickable: fixture.long_clickable,
            scrollable: fixture.scrollable,
            selected: fixture.selected,
            displayed: fixture.displayed,
        },
        children: Vec::new(),
        removed: false,
        offscreen: fixture.offscreen,
        resists_clear: fixture.resists_clear,
    });
    let children: Vec<usize> = fixture
        .children
        .iter()
        .enumerate()
        .map(|(i, child)| flatten(child, i as u32, nodes))
        .collect();
    nodes[id].children = children;
    id
}

/// Node indices beneath `start` in document order.
fn preorder(nodes: &[Node], start: usize, include_start: bool) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack = vec![start];
    while let Some(index) = stack.pop() {
        if index != start || include_start {
            out.push(index);
        }
        if let Some(node) = nodes.get(index) {
            stack.extend(node.children.iter().rev());
        }
    }
    out
}

/// Evaluates `query` over the nodes in `candidates`.
fn search(
    nodes: &[Node],
    query: &UiQuery,
    candidates: Vec<usize>,
    include_offscreen: bool,
) -> Vec<usize> {
    // Patterns were validated by the caller; an uncompilable one matches nothing.
    let Ok(matcher) = query.matcher() else {
        return Vec::new();
    };
    let mut hits: Vec<usize> = candidates
        .into_iter()
        .filter(|&i| {
            let node = &nodes[i];
            !node.removed && (include_offscreen || !node.offscreen) && matcher.matches(&node.info)
        })
        .collect();
    if let Some(instance) = query.instance() {
        hits = hits.get(instance as usize).copied().into_iter().collect();
    }
    let Some(child) = &query.child else {
        return hits;
    };
    let mut results = Vec::new();
    for hit in hits {
        for found in search(nodes, child, preorder(nodes, hit, false), include_offscreen) {
            if !results.contains(&found) {
                results.push(found);
            }
        }
    }
    results
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn dump_node(nodes: &[Node], index: usize, out: &mut String) {
    let node = &nodes[index];
    if node.removed || node.offscreen {
        return;
    }
    let info = &node.info;
    let _ = write!(
        out,
        "<node index=\"{}\" text=\"{}\" resource-id=\"{}\" class=\"{}\" package=\"{}\" \
         content-desc=\"{}\" checkable=\"{}\" checked=\"{}\" clickable=\"{}\" enabled=\"{}\" \
         focusable=\"{}\" focused=\"{}\" scrollable=\"{}\" long-clickable=\"{}\" \
         selected=\"{}\" bounds=\"{}\"",
        info.index,
        escape_xml(&info.text),
        escape_xml(&info.resource_id),
        escape_xml(&info.class_name),
        escape_xml(&info.package),
        escape_xml(&info.content_description),
        info.checkable,
        info.checked,
        info.clickable,
        info.enabled,
        info.focusable,
        info.focused,
        info.scrollable,
        info.long_clickable,
        info.selected,
        info.bounds.to_short_string(),
    );
    if node.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for &child in &node.children {
        dump_node(nodes, child, out);
    }
    out.push_str("</node>");
}

fn rotate(current: Rotation, direction: RotateDirection) -> Rotation {
    let degrees = match direction {
        RotateDirection::Left => (current.degrees() + 90) % 360,
        RotateDirection::Right => (current.degrees() + 270) % 360,
        RotateDirection::Natural => 0,
    };
    Rotation::from_degrees(degrees).unwrap_or(Rotation::Deg0)
}

impl Platform for SimulatedDevice {
    type Element = SimElement;

    fn find_elements(
        &self,
        query: &UiQuery,
        context: Option<&SimElement>,
    ) -> Result<Vec<SimElement>, PlatformError> {
        let state = mutex_lock_or_recover(&self.state);
        let candidates = match context {
            Some(context) => {
                Self::live(&state, context)?;
                preorder(&state.nodes, context.0, false)
            }
            None => preorder(&state.nodes, 0, true),
        };
        let hits = search(&state.nodes, query, candidates, false);
        debug!(%query, found = hits.len(), "simulated find");
        Ok(hits.into_iter().map(SimElement).collect())
    }

    fn scroll_into_view(&self, query: &UiQuery) -> Result<bool, PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        let all = preorder(&state.nodes, 0, true);
        let Some(&target) = search(&state.nodes, query, all, true).first() else {
            return Ok(false);
        };
        if state.nodes[target].offscreen {
            let can_scroll = state
                .nodes
                .iter()
                .any(|n| !n.removed && n.info.scrollable);
            if !can_scroll {
                return Ok(false);
            }
            state.nodes[target].offscreen = false;
        }
        state.events.push(DeviceEvent::ScrollIntoView(query.to_string()));
        Ok(true)
    }

    fn element_info(&self, element: &SimElement) -> Result<ElementInfo, PlatformError> {
        let state = mutex_lock_or_recover(&self.state);
        Ok(Self::live(&state, element)?.info.clone())
    }

    fn set_text(
        &self,
        element: &SimElement,
        text: &str,
        unicode_keyboard: bool,
    ) -> Result<bool, PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        let node = Self::live_mut(&mut state, element)?;
        if !unicode_keyboard && !text.is_ascii() {
            debug!("non-ASCII text rejected without the unicode keyboard");
            return Ok(false);
        }
        node.info.text = text.to_string();
        state.focused = Some(element.0);
        state.events.push(DeviceEvent::SetText {
            element: element.0,
            text: text.to_string(),
        });
        Ok(true)
    }

    fn clear_text(&self, element: &SimElement) -> Result<(), PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        let node = Self::live_mut(&mut state, element)?;
        if !node.resists_clear {
            node.info.text.clear();
        }
        Ok(())
    }

    fn click(&self, element: &SimElement) -> Result<bool, PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        let node = Self::live(&state, element)?;
        let (center, enabled) = (node.info.bounds.center(), node.info.enabled);
        if let Some(previous) = state.focused.replace(element.0) {
            state.nodes[previous].info.focused = false;
        }
        state.nodes[element.0].info.focused = true;
        state.events.push(DeviceEvent::Click(center));
        Ok(enabled)
    }

    fn long_click(&self, element: &SimElement) -> Result<bool, PlatformError> {
        let center = self.center_of(element)?;
        self.record(DeviceEvent::LongClick(center));
        Ok(true)
    }

    fn click_at(&self, point: Point) -> Result<bool, PlatformError> {
        self.record(DeviceEvent::Click(point));
        Ok(true)
    }

    fn swipe(&self, gesture: &GestureVector) -> Result<bool, PlatformError> {
        self.record(DeviceEvent::Swipe(*gesture));
        Ok(true)
    }

    fn drag(&self, gesture: &GestureVector) -> Result<bool, PlatformError> {
        self.record(DeviceEvent::Drag(*gesture));
        Ok(true)
    }

    fn drag_to_point(
        &self,
        element: &SimElement,
        destination: Point,
        steps: u32,
    ) -> Result<bool, PlatformError> {
        let start = self.center_of(element)?;
        self.record(DeviceEvent::Drag(GestureVector {
            start,
            end: destination,
            steps,
        }));
        Ok(true)
    }

    fn drag_to_element(
        &self,
        element: &SimElement,
        destination: &SimElement,
        steps: u32,
    ) -> Result<bool, PlatformError> {
        let end = self.center_of(destination)?;
        self.drag_to_point(element, end, steps)
    }

    fn pinch(&self, element: &SimElement, pinch: &PinchGesture) -> Result<bool, PlatformError> {
        {
            let state = mutex_lock_or_recover(&self.state);
            Self::live(&state, element)?;
        }
        self.record(DeviceEvent::Pinch {
            element: element.0,
            gesture: *pinch,
        });
        Ok(true)
    }

    fn rotation(&self) -> Result<Rotation, PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        if let Some((target, remaining)) = state.pending_rotation {
            if remaining == 0 {
                state.rotation = target;
                state.pending_rotation = None;
            } else {
                state.pending_rotation = Some((target, remaining - 1));
            }
        }
        Ok(state.rotation)
    }

    fn set_rotation(&self, direction: RotateDirection) -> Result<(), PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        state.events.push(DeviceEvent::Rotate(direction));
        if state.rotation_locked {
            return Ok(());
        }
        let target = rotate(state.rotation, direction);
        if state.rotation_lag == 0 {
            state.rotation = target;
        } else {
            state.pending_rotation = Some((target, state.rotation_lag));
        }
        Ok(())
    }

    fn press_key(&self, code: i32, meta_state: i32) -> Result<bool, PlatformError> {
        let mut state = mutex_lock_or_recover(&self.state);
        if code == keycode::DEL {
            if let Some(focused) = state.focused {
                state.nodes[focused].info.text.pop();
            }
        }
        state.events.push(DeviceEvent::Key {
            keycode: code,
            meta_state,
        });
        Ok(true)
    }

    fn press_back(&self) -> Result<bool, PlatformError> {
        self.record(DeviceEvent::Back);
        Ok(true)
    }

    fn display_size(&self) -> Result<Size, PlatformError> {
        let state = mutex_lock_or_recover(&self.state);
        let display = state.display;
        Ok(match state.rotation {
            Rotation::Deg0 | Rotation::Deg180 => display,
            Rotation::Deg90 | Rotation::Deg270 => Size::new(display.height, display.width),
        })
    }

    fn wait_for_idle(&self, timeout: Duration) -> Result<(), PlatformError> {
        self.record(DeviceEvent::WaitForIdle(timeout));
        Ok(())
    }

    fn dump_hierarchy(&self) -> Result<String, PlatformError> {
        let state = mutex_lock_or_recover(&self.state);
        let mut out = String::from("<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>");
        let _ = write!(out, "<hierarchy rotation=\"{}\">", state.rotation.degrees() / 90);
        if !state.nodes.is_empty() {
            dump_node(&state.nodes, 0, &mut out);
        }
        out.push_str("</hierarchy>");
        Ok(out)
    }
}
