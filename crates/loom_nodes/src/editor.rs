// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node editor: the retained container that reconciles its children with the
//! backend every frame.
//!
//! One call to [`NodeEditor::draw`] runs these steps in order:
//!
//! 1. menu bar inside the bounded child region
//! 2. open the backend bracket, apply pending clear-selection requests
//! 3. declare links
//! 4. declare visible nodes
//! 5. close the bracket, run link post-processing
//! 6. pull node geometry
//! 7. pull node and link selection
//! 8. dispatch a created link to `callback`
//! 9. dispatch a detached link to `delink_callback`
//! 10. pull editor hover

use crate::backend::NodeGraphBackend;
use crate::bridge::{self, BackendIdentity};
use crate::callback::{replace_callback, AppData, CallbackHandle, CallbackRegistry};
use crate::config::{EditorConfigUpdate, NodeEditorConfig};
use crate::context::EditorContext;
use crate::error::ItemError;
use crate::id::{BackendId, ItemId};
use crate::item::{self, Item, ItemKind, ItemState, KindList};
use serde_json::Value;

const LINK_SLOT: usize = 0;
const NODE_SLOT: usize = 1;
const HANDLER_SLOT: usize = 2;

/// Retained node editor
#[derive(Debug)]
pub struct NodeEditor {
    id: ItemId,
    config: NodeEditorConfig,
    callback: Option<CallbackHandle>,
    delink_callback: Option<CallbackHandle>,
    user_data: Option<Value>,
    context: EditorContext,
    slots: [Vec<Item>; 3],
    selected_nodes: Vec<BackendId>,
    selected_links: Vec<BackendId>,
    clear_links_requested: bool,
    clear_nodes_requested: bool,
    state: ItemState,
}

impl NodeEditor {
    /// Create an editor with its own backend context
    pub fn new() -> Self {
        let id = ItemId::new();
        Self {
            id,
            config: NodeEditorConfig {
                label: format!("NodeEditor###{id}"),
                ..NodeEditorConfig::default()
            },
            callback: None,
            delink_callback: None,
            user_data: None,
            context: EditorContext::new(),
            slots: Default::default(),
            selected_nodes: Vec::new(),
            selected_links: Vec::new(),
            clear_links_requested: false,
            clear_nodes_requested: false,
            state: ItemState::default(),
        }
    }

    /// Create an editor and apply `update`
    pub fn with_config(update: EditorConfigUpdate) -> Self {
        let mut editor = Self::new();
        editor.configure(update);
        editor
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Current settings
    pub fn config(&self) -> &NodeEditorConfig {
        &self.config
    }

    /// Callback receiving created links
    pub fn callback(&self) -> Option<&CallbackHandle> {
        self.callback.as_ref()
    }

    /// Callback receiving detached links
    pub fn delink_callback(&self) -> Option<&CallbackHandle> {
        self.delink_callback.as_ref()
    }

    /// User data passed to callbacks
    pub fn user_data(&self) -> Option<&Value> {
        self.user_data.as_ref()
    }

    /// Apply a configuration update. Stored callbacks are replaced before the
    /// previous handle is released.
    pub fn configure(&mut self, update: EditorConfigUpdate) {
        update.apply_to(&mut self.config);
        if let Some(callback) = update.callback {
            replace_callback(&mut self.callback, callback);
        }
        if let Some(callback) = update.delink_callback {
            replace_callback(&mut self.delink_callback, callback);
        }
        if let Some(user_data) = update.user_data {
            self.user_data = user_data;
        }
    }

    /// Backend context owned by this editor
    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    /// Mutable backend context, for restoring saved state
    pub fn context_mut(&mut self) -> &mut EditorContext {
        &mut self.context
    }

    /// Interaction state
    pub fn state(&self) -> &ItemState {
        &self.state
    }

    /// Link children
    pub fn links(&self) -> &[Item] {
        &self.slots[LINK_SLOT]
    }

    /// Node and menu bar children
    pub fn nodes(&self) -> &[Item] {
        &self.slots[NODE_SLOT]
    }

    /// Event handler children
    pub fn handlers(&self) -> &[Item] {
        &self.slots[HANDLER_SLOT]
    }

    pub(crate) fn slots(&self) -> &[Vec<Item>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Vec<Item>] {
        &mut self.slots
    }

    /// Validate and attach a direct child.
    ///
    /// Links are bound to the backend ids of their endpoint attributes, which
    /// must belong to nodes already attached to this editor.
    pub fn attach_child(&mut self, child: Item, command: &'static str) -> Result<(), ItemError> {
        let kind = child.kind();
        if !ItemKind::NodeEditor.accepts(kind) {
            tracing::error!(
                target: "loom_nodes::registry",
                "Node editor children must be nodes, links, a menu bar or handlers (got {kind})"
            );
            return Err(ItemError::IncompatibleChild {
                command,
                parent: self.id,
                parent_kind: ItemKind::NodeEditor,
                child: kind,
                accepted: KindList(ItemKind::NodeEditor.accepted_children().to_vec()),
            });
        }

        let child = match child {
            Item::MenuBar(_) if self.nodes().iter().any(|c| c.kind() == ItemKind::MenuBar) => {
                return Err(ItemError::DuplicateChild {
                    command,
                    parent: self.id,
                    child: kind,
                });
            }
            Item::NodeLink(mut link) => {
                let nodes = self.nodes();
                let start = bridge::attribute_backend_id(nodes, link.source).ok_or(
                    ItemError::UnresolvedEndpoint {
                        command,
                        editor: self.id,
                        endpoint: link.source,
                    },
                )?;
                let end = bridge::attribute_backend_id(nodes, link.target).ok_or(
                    ItemError::UnresolvedEndpoint {
                        command,
                        editor: self.id,
                        endpoint: link.target,
                    },
                )?;
                link.bind(start, end);
                Item::NodeLink(link)
            }
            other => other,
        };

        self.slots[kind.slot()].push(child);
        Ok(())
    }

    /// Detach a descendant. A removed node takes its backend state with it,
    /// and links left with an endpoint outside the editor are detached too.
    pub(crate) fn remove_descendant(&mut self, id: ItemId) -> Option<Item> {
        let removed = item::remove_from_slots(&mut self.slots, id)?;
        if let Item::Node(node) = &removed {
            self.context.forget_node(node.backend_id());
        }
        if matches!(removed.kind(), ItemKind::Node | ItemKind::NodeAttribute) {
            self.drop_dangling_links();
        }
        Some(removed)
    }

    fn drop_dangling_links(&mut self) {
        let [links, nodes, _] = &mut self.slots;
        let nodes: &[Item] = nodes;
        links.retain(|child| {
            let Item::NodeLink(link) = child else {
                return true;
            };
            let attached = bridge::attribute_backend_id(nodes, link.source).is_some()
                && bridge::attribute_backend_id(nodes, link.target).is_some();
            if !attached {
                tracing::debug!("Detaching link {} with a removed endpoint", link.id());
            }
            attached
        });
    }

    /// Backend ids of the nodes selected at the end of the last frame
    pub fn selected_node_ids(&self) -> &[BackendId] {
        &self.selected_nodes
    }

    /// Backend ids of the links selected at the end of the last frame
    pub fn selected_link_ids(&self) -> &[BackendId] {
        &self.selected_links
    }

    /// Identifiers of selected nodes that are still attached
    pub fn selected_nodes(&self) -> Vec<ItemId> {
        self.selected_nodes
            .iter()
            .filter_map(|id| bridge::resolve_node(self.nodes(), *id))
            .collect()
    }

    /// Endpoint attributes (source, destination) of selected links that are
    /// still attached
    pub fn selected_links(&self) -> Vec<(ItemId, ItemId)> {
        self.selected_links
            .iter()
            .filter_map(|id| {
                self.links().iter().find_map(|child| match child {
                    Item::NodeLink(link) if link.backend_id() == *id => {
                        Some((link.source, link.target))
                    }
                    _ => None,
                })
            })
            .collect()
    }

    /// Clear the link selection on the next frame
    pub fn request_clear_links(&mut self) {
        self.clear_links_requested = true;
    }

    /// Clear the node selection on the next frame
    pub fn request_clear_nodes(&mut self) {
        self.clear_nodes_requested = true;
    }

    /// Visibility gate, resets per-frame state
    pub fn pre_draw(&mut self) -> bool {
        self.state.begin_frame();
        self.config.show
    }

    /// Run one reconciliation frame
    pub fn draw(&mut self, backend: &mut dyn NodeGraphBackend, callbacks: &CallbackRegistry) {
        let size = [self.config.width as f32, self.config.height as f32];
        let region = backend.begin_child(&self.config.label, size, self.config.window_flags);

        let [links, nodes, _] = &mut self.slots;
        let ctx = &mut self.context;

        for item in nodes.iter() {
            if let Item::MenuBar(bar) = item {
                if bar.pre_draw() {
                    bar.draw(backend, callbacks);
                }
            }
        }

        backend.begin_node_editor(ctx);
        if std::mem::take(&mut self.clear_links_requested) {
            ctx.clear_link_selection();
        }
        if std::mem::take(&mut self.clear_nodes_requested) {
            ctx.clear_node_selection();
        }

        for item in links.iter_mut() {
            if let Item::NodeLink(link) = item {
                link.draw(backend, ctx);
            }
        }

        for item in nodes.iter_mut() {
            let Item::Node(node) = item else {
                continue;
            };
            if !node.pre_draw() {
                continue;
            }
            if node.width != 0 {
                backend.set_next_item_width(ctx, node.width as f32);
            }
            node.draw(backend, ctx);
            node.post_draw();
        }

        backend.end_node_editor(ctx);

        for item in links.iter_mut() {
            if let Item::NodeLink(link) = item {
                link.custom_action(ctx);
            }
        }

        for item in nodes.iter_mut() {
            if let Item::Node(node) = item {
                node.pull_geometry(ctx);
            }
        }

        ctx.selected_nodes_into(&mut self.selected_nodes);
        ctx.selected_links_into(&mut self.selected_links);

        if let Some((start, end)) = ctx.link_created() {
            match (
                bridge::resolve_attribute(nodes, start),
                bridge::resolve_attribute(nodes, end),
            ) {
                (Some(source), Some(target)) => {
                    tracing::debug!("Link created: {source} -> {target}");
                    if let Some(callback) = &self.callback {
                        callbacks.add_callback(
                            callback,
                            self.id,
                            AppData::Link(source, target),
                            self.user_data.clone(),
                        );
                    }
                }
                _ => tracing::debug!("Created link {start} -> {end} has a detached endpoint"),
            }
        }

        if let Some(destroyed) = ctx.link_destroyed() {
            match bridge::resolve_link(links, destroyed) {
                Some(link) => {
                    tracing::debug!("Link destroyed: {link}");
                    if let Some(callback) = &self.delink_callback {
                        callbacks.add_callback(
                            callback,
                            self.id,
                            AppData::Delink(link),
                            self.user_data.clone(),
                        );
                    }
                }
                None => tracing::debug!("Destroyed link {destroyed} is no longer attached"),
            }
        }

        self.state.set_hovered(ctx.is_editor_hovered());
        self.state.set_rect(region.min, region.size);
        self.state.visible = true;

        backend.end_child();
    }

    /// Evaluate event handlers against this frame's state
    pub fn post_draw(&self, callbacks: &CallbackRegistry) {
        for item in self.handlers() {
            if let Item::Handler(handler) = item {
                handler.evaluate(self.id, &self.state, callbacks);
            }
        }
    }
}

impl Default for NodeEditor {
    fn default() -> Self {
        Self::new()
    }
}
