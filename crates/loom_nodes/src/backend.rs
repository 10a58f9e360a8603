// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interface of the immediate-mode node graph backend.
//!
//! A backend is driven once per frame by each node editor. Every call that
//! touches node graph state receives the editor's [`EditorContext`]
//! explicitly, so several editors can share one backend without a global
//! "current context". The default method bodies only record declarations in
//! the context; a concrete backend layers rendering and input handling on
//! top, typically in [`NodeGraphBackend::end_node_editor`], where it writes
//! selection, created/destroyed links, hover and node dimensions back into
//! the context.

use crate::attribute::{AttributeKind, PinShape};
use crate::config::WindowFlags;
use crate::context::EditorContext;
use crate::id::BackendId;

/// Screen rectangle of a child region, menu bar included
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChildRegion {
    /// Top-left corner
    pub min: [f32; 2],
    /// Size actually used
    pub size: [f32; 2],
}

/// Immediate-mode node graph backend
pub trait NodeGraphBackend {
    /// Open a bounded child region of `size` (zero components fill the
    /// available space). Returns the rectangle actually used.
    fn begin_child(&mut self, label: &str, size: [f32; 2], flags: WindowFlags) -> ChildRegion;

    /// Close the child region
    fn end_child(&mut self);

    /// Open the menu bar of the current child region. Returns false when the
    /// region has no menu bar.
    fn begin_menu_bar(&mut self) -> bool {
        false
    }

    /// Draw a menu bar entry. Returns true when it was clicked.
    fn menu_entry(&mut self, _label: &str) -> bool {
        false
    }

    /// Close the menu bar
    fn end_menu_bar(&mut self) {}

    /// Width override for the next node
    fn set_next_item_width(&mut self, ctx: &mut EditorContext, width: f32) {
        ctx.set_next_node_width(width);
    }

    /// Open the node editor bracket
    fn begin_node_editor(&mut self, ctx: &mut EditorContext) {
        ctx.begin_frame();
    }

    /// Close the node editor bracket
    fn end_node_editor(&mut self, ctx: &mut EditorContext) {
        ctx.end_frame();
    }

    /// Open a node
    fn begin_node(&mut self, ctx: &mut EditorContext, id: BackendId, draggable: bool) {
        ctx.declare_node(id, draggable);
    }

    /// Title of the open node
    fn node_title(&mut self, ctx: &mut EditorContext, title: &str) {
        ctx.declare_title(title);
    }

    /// Close the open node
    fn end_node(&mut self, ctx: &mut EditorContext) {
        ctx.close_node();
    }

    /// Open an attribute inside the open node
    fn begin_attribute(
        &mut self,
        ctx: &mut EditorContext,
        id: BackendId,
        kind: AttributeKind,
        shape: PinShape,
    ) {
        ctx.declare_attribute(id, kind, shape);
    }

    /// Close the open attribute
    fn end_attribute(&mut self, ctx: &mut EditorContext) {
        ctx.close_attribute();
    }

    /// Text line inside the open attribute
    fn text(&mut self, ctx: &mut EditorContext, text: &str) {
        ctx.declare_text(text);
    }

    /// Declare a link between two attributes
    fn link(&mut self, ctx: &mut EditorContext, id: BackendId, start: BackendId, end: BackendId) {
        ctx.declare_link(id, start, end);
    }
}
