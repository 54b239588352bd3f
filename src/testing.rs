//! In-memory host used by unit tests: a control tree, a window and displays.

use std::collections::BTreeMap;

use crate::geometry::{Dpi, Rect, Size, WindowState};
use crate::properties::{AccessError, ElementIdentity, PropertyNode, PropertyValue};
use crate::screen::{DisplayEnvironment, HostWindow};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeControl {
    pub type_tag: String,
    pub identity: ElementIdentity,
    pub values: BTreeMap<String, PropertyValue>,
    pub self_value: Option<PropertyValue>,
    pub nodes: BTreeMap<String, FakeControl>,
    pub items: BTreeMap<String, Vec<FakeControl>>,
    pub children: Vec<FakeControl>,
    pub read_only: Vec<String>,
}

impl FakeControl {
    pub fn new(type_tag: &str) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            identity: ElementIdentity::default(),
            values: BTreeMap::new(),
            self_value: None,
            nodes: BTreeMap::new(),
            items: BTreeMap::new(),
            children: Vec::new(),
            read_only: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: ElementIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_value(mut self, property: &str, value: PropertyValue) -> Self {
        self.values.insert(property.to_string(), value);
        self
    }

    pub fn with_node(mut self, property: &str, node: FakeControl) -> Self {
        self.nodes.insert(property.to_string(), node);
        self
    }

    pub fn with_items(mut self, property: &str, items: Vec<FakeControl>) -> Self {
        self.items.insert(property.to_string(), items);
        self
    }

    pub fn with_child(mut self, child: FakeControl) -> Self {
        self.children.push(child);
        self
    }

    pub fn rejecting(mut self, property: &str) -> Self {
        self.read_only.push(property.to_string());
        self
    }
}

impl PropertyNode for FakeControl {
    fn type_tag(&self) -> &str {
        &self.type_tag
    }

    fn identity(&self) -> ElementIdentity {
        self.identity.clone()
    }

    fn value(&self, property: &str) -> Option<PropertyValue> {
        self.values.get(property).cloned()
    }

    fn set_value(&mut self, property: &str, value: PropertyValue) -> Result<(), AccessError> {
        if self.read_only.iter().any(|name| name == property) {
            return Err(AccessError::Rejected("read-only".to_string()));
        }
        match self.values.get_mut(property) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(AccessError::UnknownProperty),
        }
    }

    fn self_value(&self) -> Option<PropertyValue> {
        self.self_value.clone()
    }

    fn set_self_value(&mut self, value: PropertyValue) -> Result<(), AccessError> {
        match &mut self.self_value {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(AccessError::UnknownProperty),
        }
    }

    fn node(&self, property: &str) -> Option<&dyn PropertyNode> {
        self.nodes.get(property).map(|node| node as &dyn PropertyNode)
    }

    fn node_mut(&mut self, property: &str) -> Option<&mut dyn PropertyNode> {
        self.nodes
            .get_mut(property)
            .map(|node| node as &mut dyn PropertyNode)
    }

    fn items(&self, property: &str) -> Option<Vec<&dyn PropertyNode>> {
        self.items.get(property).map(|items| {
            items
                .iter()
                .map(|item| item as &dyn PropertyNode)
                .collect()
        })
    }

    fn items_mut(&mut self, property: &str) -> Option<Vec<&mut dyn PropertyNode>> {
        self.items.get_mut(property).map(|items| {
            items
                .iter_mut()
                .map(|item| item as &mut dyn PropertyNode)
                .collect()
        })
    }

    fn children(&self) -> Vec<&dyn PropertyNode> {
        self.children
            .iter()
            .map(|child| child as &dyn PropertyNode)
            .collect()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn PropertyNode> {
        self.children
            .iter_mut()
            .map(|child| child as &mut dyn PropertyNode)
            .collect()
    }
}

/// Window that behaves like a toolkit window: bounds respect the minimum
/// size and restore bounds follow bounds while the state is normal.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeWindow {
    pub root: FakeControl,
    pub bounds: Rect,
    pub restore_bounds: Rect,
    pub state: WindowState,
    pub minimum: Size,
    pub frozen: bool,
    pub suspended: bool,
    pub suspend_calls: Vec<bool>,
}

impl FakeWindow {
    pub fn new(name: &str, bounds: Rect) -> Self {
        Self {
            root: FakeControl::new("Window").with_identity(ElementIdentity::named(name)),
            bounds,
            restore_bounds: bounds,
            state: WindowState::Normal,
            minimum: Size::default(),
            frozen: false,
            suspended: false,
            suspend_calls: Vec::new(),
        }
    }

    pub fn with_minimum(mut self, minimum: Size) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn with_child(mut self, child: FakeControl) -> Self {
        self.root.children.push(child);
        self
    }

    pub fn with_identity(mut self, identity: ElementIdentity) -> Self {
        self.root.identity = identity;
        self
    }

    /// Ignores every geometry change, like a window pinned by its host.
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }
}

impl PropertyNode for FakeWindow {
    fn type_tag(&self) -> &str {
        self.root.type_tag()
    }

    fn identity(&self) -> ElementIdentity {
        self.root.identity()
    }

    fn children(&self) -> Vec<&dyn PropertyNode> {
        self.root.children()
    }

    fn children_mut(&mut self) -> Vec<&mut dyn PropertyNode> {
        self.root.children_mut()
    }
}

impl HostWindow for FakeWindow {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        if self.frozen {
            return;
        }
        self.bounds = Rect {
            width: bounds.width.max(self.minimum.width),
            height: bounds.height.max(self.minimum.height),
            ..bounds
        };
        if self.state == WindowState::Normal {
            self.restore_bounds = self.bounds;
        }
    }

    fn restore_bounds(&self) -> Rect {
        self.restore_bounds
    }

    fn set_restore_bounds(&mut self, bounds: Rect) {
        self.restore_bounds = bounds;
        if self.state == WindowState::Normal {
            self.bounds = bounds;
        }
    }

    fn window_state(&self) -> WindowState {
        self.state
    }

    fn set_window_state(&mut self, state: WindowState) {
        if state == WindowState::Normal && self.state != WindowState::Normal {
            self.bounds = self.restore_bounds;
        }
        self.state = state;
    }

    fn minimum_size(&self) -> Size {
        self.minimum
    }

    fn set_notifications_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
        self.suspend_calls.push(suspended);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeDisplays {
    pub dpi: Dpi,
    pub areas: Vec<Rect>,
    pub caption: i32,
}

impl FakeDisplays {
    pub fn single() -> Self {
        Self {
            dpi: Dpi::new(96.0, 96.0),
            areas: vec![Rect::new(0, 0, 1920, 1040)],
            caption: 30,
        }
    }

    pub fn dual() -> Self {
        Self {
            areas: vec![Rect::new(0, 0, 1920, 1040), Rect::new(1920, 0, 1280, 984)],
            ..Self::single()
        }
    }
}

impl DisplayEnvironment for FakeDisplays {
    fn dpi(&self) -> Dpi {
        self.dpi
    }

    fn work_areas(&self) -> Vec<Rect> {
        self.areas.clone()
    }

    fn caption_height(&self) -> i32 {
        self.caption
    }
}
