// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node items.

use crate::attribute::NodeAttribute;
use crate::backend::NodeGraphBackend;
use crate::bridge::BackendIdentity;
use crate::context::EditorContext;
use crate::id::{BackendId, ItemId};
use crate::item::{Item, ItemState};

/// A node inside a node editor
#[derive(Debug)]
pub struct Node {
    id: ItemId,
    backend_id: BackendId,
    /// Title bar text
    pub label: String,
    /// Whether the node is drawn
    pub show: bool,
    /// Explicit width, zero for automatic
    pub width: i32,
    /// Whether the user may drag the node
    pub draggable: bool,
    pending_position: Option<[f32; 2]>,
    position: [f32; 2],
    attributes: Vec<Item>,
    state: ItemState,
}

impl Node {
    /// Create a node with a fresh backend id
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            backend_id: BackendId::next(),
            label: label.into(),
            show: true,
            width: 0,
            draggable: true,
            pending_position: None,
            position: [0.0, 0.0],
            attributes: Vec::new(),
            state: ItemState::default(),
        }
    }

    /// Set the initial position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.set_position([x, y]);
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, attribute: NodeAttribute) -> Self {
        self.push_attribute(attribute);
        self
    }

    /// Add an attribute
    pub fn push_attribute(&mut self, attribute: NodeAttribute) {
        self.attributes.push(Item::NodeAttribute(attribute));
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Move the node; pushed into the backend on the next frame
    pub fn set_position(&mut self, position: [f32; 2]) {
        self.pending_position = Some(position);
        self.position = position;
    }

    /// Grid-space position as last reported by the backend
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Attribute children
    pub fn attributes(&self) -> &[Item] {
        &self.attributes
    }

    /// Interaction state
    pub fn state(&self) -> &ItemState {
        &self.state
    }

    /// Mutable interaction state
    pub fn state_mut(&mut self) -> &mut ItemState {
        &mut self.state
    }

    pub(crate) fn attribute_slot(&self) -> &Vec<Item> {
        &self.attributes
    }

    pub(crate) fn attribute_slot_mut(&mut self) -> &mut Vec<Item> {
        &mut self.attributes
    }

    /// Visibility gate, resets per-frame state
    pub fn pre_draw(&mut self) -> bool {
        self.state.begin_frame();
        self.show
    }

    /// Declare the node and its attributes
    pub fn draw(&mut self, backend: &mut dyn NodeGraphBackend, ctx: &mut EditorContext) {
        backend.begin_node(ctx, self.backend_id, self.draggable);
        if let Some(position) = self.pending_position.take() {
            ctx.set_node_grid_position(self.backend_id, position);
        }
        backend.node_title(ctx, &self.label);
        for attribute in &mut self.attributes {
            if let Item::NodeAttribute(attribute) = attribute {
                attribute.draw(backend, ctx);
            }
        }
        backend.end_node(ctx);
    }

    /// Runs after every draw
    pub fn post_draw(&mut self) {
        self.state.visible = self.show;
    }

    /// Pull geometry from the backend.
    pub fn pull_geometry(&mut self, ctx: &EditorContext) {
        self.position = ctx.node_grid_position(self.backend_id);
        self.state.set_hovered(ctx.is_node_hovered(self.backend_id));
        self.state.set_rect(
            ctx.node_screen_position(self.backend_id),
            ctx.node_dimensions(self.backend_id),
        );
    }
}

impl BackendIdentity for Node {
    fn item_id(&self) -> ItemId {
        self.id
    }

    fn backend_id(&self) -> BackendId {
        self.backend_id
    }
}
