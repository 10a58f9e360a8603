// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link items connecting two attributes.

use crate::backend::NodeGraphBackend;
use crate::bridge::BackendIdentity;
use crate::context::EditorContext;
use crate::id::{BackendId, ItemId};
use crate::item::ItemState;

/// A link between two attributes of the same editor
#[derive(Debug)]
pub struct NodeLink {
    id: ItemId,
    backend_id: BackendId,
    /// Source attribute
    pub source: ItemId,
    /// Destination attribute
    pub target: ItemId,
    /// Whether the link is drawn
    pub show: bool,
    endpoints: Option<(BackendId, BackendId)>,
    state: ItemState,
}

impl NodeLink {
    /// Create a link between two attributes. Backend endpoints are bound when
    /// the link is attached to an editor.
    pub fn new(source: ItemId, target: ItemId) -> Self {
        Self {
            id: ItemId::new(),
            backend_id: BackendId::next(),
            source,
            target,
            show: true,
            endpoints: None,
            state: ItemState::default(),
        }
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Backend ids of the attached attributes
    pub fn endpoints(&self) -> Option<(BackendId, BackendId)> {
        self.endpoints
    }

    /// Bind the backend ids of the endpoints
    pub(crate) fn bind(&mut self, start: BackendId, end: BackendId) {
        self.endpoints = Some((start, end));
    }

    /// Interaction state
    pub fn state(&self) -> &ItemState {
        &self.state
    }

    /// Declare the link
    pub fn draw(&mut self, backend: &mut dyn NodeGraphBackend, ctx: &mut EditorContext) {
        self.state.begin_frame();
        if !self.show {
            return;
        }
        if let Some((start, end)) = self.endpoints {
            backend.link(ctx, self.backend_id, start, end);
            self.state.visible = true;
        }
    }

    /// Post-frame hook: pull the hover flag from the backend
    pub fn custom_action(&mut self, ctx: &EditorContext) {
        self.state.set_hovered(ctx.is_link_hovered(self.backend_id));
    }
}

impl BackendIdentity for NodeLink {
    fn item_id(&self) -> ItemId {
        self.id
    }

    fn backend_id(&self) -> BackendId {
        self.backend_id
    }
}
