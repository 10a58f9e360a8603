// SPDX-License-Identifier: MIT OR Apache-2.0
//! Backend-side editor context.
//!
//! An [`EditorContext`] is the id-based state a node graph backend keeps for
//! one editor: node origins and dimensions, selection, the link created or
//! destroyed during the last frame, and what was declared between the last
//! begin/end bracket. It is owned by exactly one node editor and is passed
//! explicitly to every backend call; there is no "current" context.

use crate::attribute::{AttributeKind, PinShape};
use crate::error::StateError;
use crate::id::BackendId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Persistent per-node state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    /// Origin in grid space
    pub origin: [f32; 2],
    /// Size computed during the last frame
    pub dimensions: [f32; 2],
}

/// Attribute declared during the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredAttribute {
    /// Backend id
    pub id: BackendId,
    /// Pin direction
    pub kind: AttributeKind,
    /// Pin shape
    pub shape: PinShape,
    /// Text lines drawn inside the attribute row
    pub lines: Vec<String>,
}

/// Node declared during the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredNode {
    /// Backend id
    pub id: BackendId,
    /// Title bar text
    pub title: Option<String>,
    /// Explicit width
    pub width: Option<f32>,
    /// Whether the user may drag the node
    pub draggable: bool,
    /// Attributes in declaration order
    pub attributes: Vec<DeclaredAttribute>,
}

/// Link declared during the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredLink {
    /// Backend id
    pub id: BackendId,
    /// Start attribute
    pub start: BackendId,
    /// End attribute
    pub end: BackendId,
}

/// Ongoing pointer interaction, kept across frames
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    /// Nothing in progress
    #[default]
    Idle,
    /// Panning the canvas
    Panning,
    /// Dragging the selected nodes
    DraggingNodes,
    /// Dragging a new link out of an attribute
    CreatingLink {
        /// Attribute the drag started from
        from: BackendId,
        /// Current pointer position (screen space)
        pointer: [f32; 2],
    },
    /// Rubber-band selection
    BoxSelect {
        /// Start position (screen space)
        start: [f32; 2],
        /// Current position (screen space)
        current: [f32; 2],
    },
}

#[derive(Debug, Default)]
struct Frame {
    in_editor: bool,
    nodes: Vec<DeclaredNode>,
    links: Vec<DeclaredLink>,
    node_open: bool,
    attribute_open: bool,
    next_width: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedState {
    panning: [f32; 2],
    nodes: Vec<(BackendId, [f32; 2])>,
}

/// Id-based node graph state of one editor
#[derive(Debug, Default)]
pub struct EditorContext {
    nodes: IndexMap<BackendId, NodeState>,
    depth_order: Vec<BackendId>,
    selected_nodes: Vec<BackendId>,
    selected_links: Vec<BackendId>,
    link_created: Option<(BackendId, BackendId)>,
    link_destroyed: Option<BackendId>,
    hovered_node: Option<BackendId>,
    hovered_link: Option<BackendId>,
    editor_hovered: bool,
    panning: [f32; 2],
    canvas_origin: [f32; 2],
    /// Pointer interaction in progress
    pub interaction: Interaction,
    frame: Frame,
}

impl EditorContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Frame bracket
    // ---------------------------------------------------------------------

    /// Open the begin/end bracket, discarding last frame's declarations and
    /// one-frame events
    pub fn begin_frame(&mut self) {
        debug_assert!(!self.frame.in_editor, "begin_frame called twice");
        self.frame = Frame {
            in_editor: true,
            ..Frame::default()
        };
        self.link_created = None;
        self.link_destroyed = None;
        self.hovered_node = None;
        self.hovered_link = None;
        self.editor_hovered = false;
    }

    /// Close the bracket. Selection entries that were not declared this frame
    /// are dropped.
    pub fn end_frame(&mut self) {
        debug_assert!(self.frame.in_editor, "end_frame without begin_frame");
        self.frame.in_editor = false;

        let declared_nodes = &self.frame.nodes;
        self.selected_nodes
            .retain(|id| declared_nodes.iter().any(|node| node.id == *id));
        let declared_links = &self.frame.links;
        self.selected_links
            .retain(|id| declared_links.iter().any(|link| link.id == *id));
    }

    /// Whether a begin/end bracket is open
    pub fn is_in_frame(&self) -> bool {
        self.frame.in_editor
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    /// Width applied to the next declared node
    pub fn set_next_node_width(&mut self, width: f32) {
        self.frame.next_width = Some(width);
    }

    /// Declare a node and make it the open node
    pub fn declare_node(&mut self, id: BackendId, draggable: bool) {
        debug_assert!(self.frame.in_editor && !self.frame.node_open);
        self.nodes.entry(id).or_default();
        if !self.depth_order.contains(&id) {
            self.depth_order.push(id);
        }
        let width = self.frame.next_width.take();
        self.frame.nodes.push(DeclaredNode {
            id,
            title: None,
            width,
            draggable,
            attributes: Vec::new(),
        });
        self.frame.node_open = true;
    }

    /// Set the title of the open node
    pub fn declare_title(&mut self, title: &str) {
        if let Some(node) = self.open_node_mut() {
            node.title = Some(title.to_owned());
        }
    }

    /// Close the open node
    pub fn close_node(&mut self) {
        self.frame.node_open = false;
    }

    /// Declare an attribute inside the open node
    pub fn declare_attribute(&mut self, id: BackendId, kind: AttributeKind, shape: PinShape) {
        if let Some(node) = self.open_node_mut() {
            node.attributes.push(DeclaredAttribute {
                id,
                kind,
                shape,
                lines: Vec::new(),
            });
            self.frame.attribute_open = true;
        }
    }

    /// Close the open attribute
    pub fn close_attribute(&mut self) {
        self.frame.attribute_open = false;
    }

    /// Add a line of text to the open attribute
    pub fn declare_text(&mut self, line: &str) {
        if !self.frame.attribute_open {
            return;
        }
        if let Some(attr) = self
            .open_node_mut()
            .and_then(|node| node.attributes.last_mut())
        {
            attr.lines.push(line.to_owned());
        }
    }

    /// Declare a link between two attributes
    pub fn declare_link(&mut self, id: BackendId, start: BackendId, end: BackendId) {
        debug_assert!(self.frame.in_editor);
        self.frame.links.push(DeclaredLink { id, start, end });
    }

    /// Nodes declared this frame
    pub fn declared_nodes(&self) -> &[DeclaredNode] {
        &self.frame.nodes
    }

    /// Links declared this frame
    pub fn declared_links(&self) -> &[DeclaredLink] {
        &self.frame.links
    }

    /// The node owning a declared attribute, with the attribute
    pub fn declared_attribute(&self, id: BackendId) -> Option<(&DeclaredNode, &DeclaredAttribute)> {
        self.frame.nodes.iter().find_map(|node| {
            node.attributes
                .iter()
                .find(|attr| attr.id == id)
                .map(|attr| (node, attr))
        })
    }

    fn open_node_mut(&mut self) -> Option<&mut DeclaredNode> {
        if self.frame.node_open {
            self.frame.nodes.last_mut()
        } else {
            None
        }
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    /// Number of selected nodes
    pub fn num_selected_nodes(&self) -> usize {
        self.selected_nodes.len()
    }

    /// Copy the selected node ids into `out`, in backend order
    pub fn selected_nodes_into(&self, out: &mut Vec<BackendId>) {
        out.clear();
        out.extend_from_slice(&self.selected_nodes);
    }

    /// Number of selected links
    pub fn num_selected_links(&self) -> usize {
        self.selected_links.len()
    }

    /// Copy the selected link ids into `out`, in backend order
    pub fn selected_links_into(&self, out: &mut Vec<BackendId>) {
        out.clear();
        out.extend_from_slice(&self.selected_links);
    }

    /// Whether a node is selected
    pub fn is_node_selected(&self, id: BackendId) -> bool {
        self.selected_nodes.contains(&id)
    }

    /// Whether a link is selected
    pub fn is_link_selected(&self, id: BackendId) -> bool {
        self.selected_links.contains(&id)
    }

    /// Add a node to the selection
    pub fn select_node(&mut self, id: BackendId) {
        if !self.selected_nodes.contains(&id) {
            self.selected_nodes.push(id);
        }
    }

    /// Remove a node from the selection
    pub fn deselect_node(&mut self, id: BackendId) {
        self.selected_nodes.retain(|selected| *selected != id);
    }

    /// Add a link to the selection
    pub fn select_link(&mut self, id: BackendId) {
        if !self.selected_links.contains(&id) {
            self.selected_links.push(id);
        }
    }

    /// Clear the node selection
    pub fn clear_node_selection(&mut self) {
        self.selected_nodes.clear();
    }

    /// Clear the link selection
    pub fn clear_link_selection(&mut self) {
        self.selected_links.clear();
    }

    // ---------------------------------------------------------------------
    // One-frame link events
    // ---------------------------------------------------------------------

    /// Record that the user connected `start` to `end` this frame
    pub fn emit_link_created(&mut self, start: BackendId, end: BackendId) {
        self.link_created = Some((start, end));
    }

    /// Record that the user detached link `id` this frame
    pub fn emit_link_destroyed(&mut self, id: BackendId) {
        self.link_destroyed = Some(id);
        self.selected_links.retain(|selected| *selected != id);
    }

    /// Attributes of a link created during the last frame (start, end)
    pub fn link_created(&self) -> Option<(BackendId, BackendId)> {
        self.link_created
    }

    /// Link detached during the last frame
    pub fn link_destroyed(&self) -> Option<BackendId> {
        self.link_destroyed
    }

    // ---------------------------------------------------------------------
    // Hover
    // ---------------------------------------------------------------------

    /// Set whether the editor canvas is hovered
    pub fn set_editor_hovered(&mut self, hovered: bool) {
        self.editor_hovered = hovered;
    }

    /// Whether the editor canvas was hovered during the last frame
    pub fn is_editor_hovered(&self) -> bool {
        self.editor_hovered
    }

    /// Set the hovered node
    pub fn set_hovered_node(&mut self, id: Option<BackendId>) {
        self.hovered_node = id;
    }

    /// Whether node `id` was hovered during the last frame
    pub fn is_node_hovered(&self, id: BackendId) -> bool {
        self.hovered_node == Some(id)
    }

    /// Set the hovered link
    pub fn set_hovered_link(&mut self, id: Option<BackendId>) {
        self.hovered_link = id;
    }

    /// Whether link `id` was hovered during the last frame
    pub fn is_link_hovered(&self, id: BackendId) -> bool {
        self.hovered_link == Some(id)
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    /// Persistent state of a node
    pub fn node(&self, id: BackendId) -> Option<&NodeState> {
        self.nodes.get(&id)
    }

    /// Size of a node, zero for unknown nodes
    pub fn node_dimensions(&self, id: BackendId) -> [f32; 2] {
        self.nodes.get(&id).map_or([0.0, 0.0], |node| node.dimensions)
    }

    /// Record the size of a node
    pub fn set_node_dimensions(&mut self, id: BackendId, dimensions: [f32; 2]) {
        self.nodes.entry(id).or_default().dimensions = dimensions;
    }

    /// Origin of a node in grid space
    pub fn node_grid_position(&self, id: BackendId) -> [f32; 2] {
        self.nodes.get(&id).map_or([0.0, 0.0], |node| node.origin)
    }

    /// Move a node in grid space
    pub fn set_node_grid_position(&mut self, id: BackendId, position: [f32; 2]) {
        self.nodes.entry(id).or_default().origin = position;
    }

    /// Origin of a node in screen space
    pub fn node_screen_position(&self, id: BackendId) -> [f32; 2] {
        let origin = self.node_grid_position(id);
        [
            self.canvas_origin[0] + self.panning[0] + origin[0],
            self.canvas_origin[1] + self.panning[1] + origin[1],
        ]
    }

    /// Screen-space top-left corner of the canvas
    pub fn set_canvas_origin(&mut self, origin: [f32; 2]) {
        self.canvas_origin = origin;
    }

    /// Screen-space top-left corner of the canvas
    pub fn canvas_origin(&self) -> [f32; 2] {
        self.canvas_origin
    }

    /// Canvas panning
    pub fn panning(&self) -> [f32; 2] {
        self.panning
    }

    /// Set the canvas panning
    pub fn reset_panning(&mut self, panning: [f32; 2]) {
        self.panning = panning;
    }

    /// Node ids from bottom to top
    pub fn depth_order(&self) -> &[BackendId] {
        &self.depth_order
    }

    /// Drop everything kept for a node that left the editor
    pub fn forget_node(&mut self, id: BackendId) {
        self.nodes.shift_remove(&id);
        self.depth_order.retain(|node| *node != id);
        self.selected_nodes.retain(|node| *node != id);
        if self.hovered_node == Some(id) {
            self.hovered_node = None;
        }
    }

    /// Move a node to the top of the depth order
    pub fn bring_to_front(&mut self, id: BackendId) {
        self.depth_order.retain(|node| *node != id);
        self.depth_order.push(id);
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Serialize node origins and panning to RON
    pub fn save_state(&self) -> Result<String, StateError> {
        let state = SavedState {
            panning: self.panning,
            nodes: self
                .nodes
                .iter()
                .map(|(id, node)| (*id, node.origin))
                .collect(),
        };
        Ok(ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::default())?)
    }

    /// Restore node origins and panning saved by [`EditorContext::save_state`]
    pub fn load_state(&mut self, data: &str) -> Result<(), StateError> {
        let state: SavedState = ron::from_str(data)?;
        self.panning = state.panning;
        for (id, origin) in state.nodes {
            self.set_node_grid_position(id, origin);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_build_node_tree() {
        let mut ctx = EditorContext::new();
        let (node, input) = (BackendId(1), BackendId(2));

        ctx.begin_frame();
        ctx.set_next_node_width(240.0);
        ctx.declare_node(node, true);
        ctx.declare_title("Add");
        ctx.declare_attribute(input, AttributeKind::Input, PinShape::CircleFilled);
        ctx.declare_text("a");
        ctx.close_attribute();
        ctx.declare_text("ignored outside attribute");
        ctx.close_node();
        ctx.end_frame();

        let declared = &ctx.declared_nodes()[0];
        assert_eq!(declared.title.as_deref(), Some("Add"));
        assert_eq!(declared.width, Some(240.0));
        assert_eq!(declared.attributes[0].lines, vec!["a".to_string()]);
        assert_eq!(ctx.declared_attribute(input).map(|(n, _)| n.id), Some(node));
        assert_eq!(ctx.depth_order(), &[node]);
    }

    #[test]
    fn test_end_frame_prunes_undeclared_selection() {
        let mut ctx = EditorContext::new();
        ctx.begin_frame();
        ctx.declare_node(BackendId(5), true);
        ctx.close_node();
        ctx.select_node(BackendId(5));
        ctx.select_node(BackendId(9));
        ctx.select_link(BackendId(11));
        ctx.end_frame();

        let mut out = Vec::new();
        ctx.selected_nodes_into(&mut out);
        assert_eq!(out, vec![BackendId(5)]);
        assert_eq!(ctx.num_selected_links(), 0);
    }

    #[test]
    fn test_events_last_one_frame() {
        let mut ctx = EditorContext::new();
        ctx.begin_frame();
        ctx.emit_link_created(BackendId(1), BackendId(2));
        ctx.emit_link_destroyed(BackendId(3));
        ctx.set_editor_hovered(true);
        ctx.end_frame();

        assert_eq!(ctx.link_created(), Some((BackendId(1), BackendId(2))));
        assert_eq!(ctx.link_destroyed(), Some(BackendId(3)));
        assert!(ctx.is_editor_hovered());

        ctx.begin_frame();
        ctx.end_frame();
        assert_eq!(ctx.link_created(), None);
        assert_eq!(ctx.link_destroyed(), None);
        assert!(!ctx.is_editor_hovered());
    }

    #[test]
    fn test_screen_position_includes_canvas_and_panning() {
        let mut ctx = EditorContext::new();
        ctx.set_canvas_origin([100.0, 50.0]);
        ctx.reset_panning([10.0, -5.0]);
        ctx.set_node_grid_position(BackendId(1), [20.0, 30.0]);
        assert_eq!(ctx.node_screen_position(BackendId(1)), [130.0, 75.0]);
    }

    #[test]
    fn test_state_round_trip() {
        let mut ctx = EditorContext::new();
        ctx.reset_panning([4.0, 2.0]);
        ctx.set_node_grid_position(BackendId(3), [12.0, 34.0]);
        let saved = ctx.save_state().unwrap();

        let mut restored = EditorContext::new();
        restored.load_state(&saved).unwrap();
        assert_eq!(restored.panning(), [4.0, 2.0]);
        assert_eq!(restored.node_grid_position(BackendId(3)), [12.0, 34.0]);
    }

    #[test]
    fn test_forget_node_drops_state() {
        let mut ctx = EditorContext::new();
        let (kept, gone) = (BackendId(1), BackendId(2));
        ctx.begin_frame();
        for id in [kept, gone] {
            ctx.declare_node(id, true);
            ctx.close_node();
            ctx.select_node(id);
        }
        ctx.end_frame();
        ctx.set_node_grid_position(gone, [5.0, 5.0]);

        ctx.forget_node(gone);
        assert!(ctx.node(gone).is_none());
        assert_eq!(ctx.depth_order(), &[kept]);
        assert!(!ctx.is_node_selected(gone));
        assert!(ctx.is_node_selected(kept));

        let mut only_kept = EditorContext::new();
        only_kept.set_node_grid_position(kept, [0.0, 0.0]);
        assert_eq!(ctx.save_state().unwrap(), only_kept.save_state().unwrap());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut ctx = EditorContext::new();
        assert!(ctx.load_state("not ron at all {").is_err());
    }
}
