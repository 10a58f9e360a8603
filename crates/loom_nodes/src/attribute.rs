// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node attributes: the pin rows links attach to.

use crate::backend::NodeGraphBackend;
use crate::bridge::BackendIdentity;
use crate::context::EditorContext;
use crate::id::{BackendId, ItemId};
use crate::item::{Item, ItemState};
use serde::{Deserialize, Serialize};

/// Attribute direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Input pin on the left edge
    Input,
    /// Output pin on the right edge
    Output,
    /// No pin
    Static,
}

impl AttributeKind {
    /// Whether a link may run between attributes of these kinds
    pub fn can_link_to(self, other: AttributeKind) -> bool {
        matches!(
            (self, other),
            (Self::Input, Self::Output) | (Self::Output, Self::Input)
        )
    }
}

/// Pin shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinShape {
    /// Outlined circle
    Circle,
    /// Filled circle
    #[default]
    CircleFilled,
    /// Outlined triangle
    Triangle,
    /// Filled triangle
    TriangleFilled,
    /// Outlined square
    Quad,
    /// Filled square
    QuadFilled,
}

impl PinShape {
    /// Whether the shape is drawn filled
    pub fn is_filled(self) -> bool {
        matches!(self, Self::CircleFilled | Self::TriangleFilled | Self::QuadFilled)
    }
}

/// A pin row inside a node
#[derive(Debug)]
pub struct NodeAttribute {
    id: ItemId,
    backend_id: BackendId,
    /// Direction
    pub kind: AttributeKind,
    /// Pin shape
    pub shape: PinShape,
    /// Label drawn as the first line of the row
    pub label: String,
    /// Whether the attribute is drawn
    pub show: bool,
    widgets: Vec<Item>,
    state: ItemState,
}

impl NodeAttribute {
    /// Create an attribute
    pub fn new(label: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            id: ItemId::new(),
            backend_id: BackendId::next(),
            kind,
            shape: PinShape::default(),
            label: label.into(),
            show: true,
            widgets: Vec::new(),
            state: ItemState::default(),
        }
    }

    /// Create an input attribute
    pub fn input(label: impl Into<String>) -> Self {
        Self::new(label, AttributeKind::Input)
    }

    /// Create an output attribute
    pub fn output(label: impl Into<String>) -> Self {
        Self::new(label, AttributeKind::Output)
    }

    /// Set the pin shape
    pub fn with_shape(mut self, shape: PinShape) -> Self {
        self.shape = shape;
        self
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Interaction state
    pub fn state(&self) -> &ItemState {
        &self.state
    }

    pub(crate) fn widget_slot(&self) -> &Vec<Item> {
        &self.widgets
    }

    pub(crate) fn widget_slot_mut(&mut self) -> &mut Vec<Item> {
        &mut self.widgets
    }

    /// Draw the row inside the node open in `ctx`
    pub fn draw(&mut self, backend: &mut dyn NodeGraphBackend, ctx: &mut EditorContext) {
        self.state.begin_frame();
        if !self.show {
            return;
        }
        backend.begin_attribute(ctx, self.backend_id, self.kind, self.shape);
        if !self.label.is_empty() {
            backend.text(ctx, &self.label);
        }
        for widget in &self.widgets {
            if let Item::Text(text) = widget {
                text.draw(backend, ctx);
            }
        }
        backend.end_attribute(ctx);
        self.state.visible = true;
    }
}

impl BackendIdentity for NodeAttribute {
    fn item_id(&self) -> ItemId {
        self.id
    }

    fn backend_id(&self) -> BackendId {
        self.backend_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_opposite_pins_link() {
        assert!(AttributeKind::Output.can_link_to(AttributeKind::Input));
        assert!(AttributeKind::Input.can_link_to(AttributeKind::Output));
        assert!(!AttributeKind::Input.can_link_to(AttributeKind::Input));
        assert!(!AttributeKind::Static.can_link_to(AttributeKind::Output));
    }

    #[test]
    fn test_attributes_get_distinct_backend_ids() {
        let a = NodeAttribute::input("a");
        let b = NodeAttribute::output("b");
        assert_ne!(a.backend_id(), b.backend_id());
        assert_eq!(a.shape, PinShape::CircleFilled);
    }
}
