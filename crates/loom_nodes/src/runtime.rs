// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide runtime shared by the render thread and callback threads.
//!
//! The item registry sits behind a single mutex. The render frame holds it
//! for the whole reconciliation pass; host commands take it for the duration
//! of one call, or callers hold the guard from [`Runtime::lock`] themselves
//! to batch several reads. Errors never cross the host boundary as `Err`:
//! they are reported to the [`ErrorReporter`] and a neutral value is
//! returned.

use crate::api;
use crate::backend::NodeGraphBackend;
use crate::callback::CallbackRegistry;
use crate::config::EditorConfigUpdate;
use crate::error::{ErrorReporter, ReportedError};
use crate::id::ItemId;
use crate::item::Item;
use crate::registry::ItemRegistry;
use parking_lot::{Mutex, MutexGuard};

/// Shared state of a node editor host
#[derive(Debug, Default)]
pub struct Runtime {
    registry: Mutex<ItemRegistry>,
    callbacks: CallbackRegistry,
    errors: ErrorReporter,
}

impl Runtime {
    /// Create an empty runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the registry lock (manual lock control)
    pub fn lock(&self) -> MutexGuard<'_, ItemRegistry> {
        self.registry.lock()
    }

    /// Callback queue
    pub fn callbacks(&self) -> &CallbackRegistry {
        &self.callbacks
    }

    /// Error channel
    pub fn errors(&self) -> &ErrorReporter {
        &self.errors
    }

    /// Take every error reported so far
    pub fn drain_errors(&self) -> Vec<ReportedError> {
        self.errors.drain()
    }

    /// Draw one frame of every top-level editor under the registry lock
    pub fn render_frame(&self, backend: &mut dyn NodeGraphBackend) {
        let mut registry = self.registry.lock();
        registry.render_frame(backend, &self.callbacks);
    }

    /// Run queued callbacks. Must not be called while holding [`Runtime::lock`]
    /// if callbacks issue host commands.
    pub fn run_callbacks(&self) -> usize {
        self.callbacks.run_callbacks()
    }

    /// Attach an item; `None` when rejected
    pub fn add_item(&self, parent: Option<ItemId>, item: Item) -> Option<ItemId> {
        let result = self.registry.lock().add_item(parent, item);
        self.errors.check(result)
    }

    /// Detach an item; false when it does not exist
    pub fn delete_item(&self, id: ItemId) -> bool {
        let result = self.registry.lock().delete_item(id);
        self.errors.check(result).is_some()
    }

    /// Apply a configuration update to a node editor
    pub fn configure_node_editor(&self, editor: ItemId, update: EditorConfigUpdate) -> bool {
        let mut registry = self.registry.lock();
        let result = registry
            .node_editor_mut(editor, "configure_item")
            .map(|editor| editor.configure(update));
        self.errors.check(result).is_some()
    }

    /// Selected nodes of `editor`, empty on error
    pub fn get_selected_nodes(&self, editor: ItemId) -> Vec<ItemId> {
        let result = api::get_selected_nodes(&self.registry.lock(), editor);
        self.errors.check(result).unwrap_or_default()
    }

    /// Selected links of `editor` as endpoint identifier strings, empty on error
    pub fn get_selected_links(&self, editor: ItemId) -> Vec<(String, String)> {
        let result = api::get_selected_links(&self.registry.lock(), editor);
        self.errors
            .check(result)
            .unwrap_or_default()
            .into_iter()
            .map(|(source, target)| (source.to_string(), target.to_string()))
            .collect()
    }

    /// Request clearing the link selection of `editor`
    pub fn clear_selected_links(&self, editor: ItemId) {
        let result = api::clear_selected_links(&mut self.registry.lock(), editor);
        self.errors.check(result);
    }

    /// Request clearing the node selection of `editor`
    pub fn clear_selected_nodes(&self, editor: ItemId) {
        let result = api::clear_selected_nodes(&mut self.registry.lock(), editor);
        self.errors.check(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::NodeAttribute;
    use crate::bridge::BackendIdentity;
    use crate::callback::{AppData, CallbackHandle};
    use crate::editor::NodeEditor;
    use crate::error::ErrorCode;
    use crate::link::NodeLink;
    use crate::node::Node;
    use crate::testing::ScriptedBackend;
    use crate::text::Text;
    use std::sync::Arc;

    #[test]
    fn test_errors_are_reported_with_neutral_results() {
        let runtime = Runtime::new();
        let editor = runtime.add_item(None, Item::NodeEditor(NodeEditor::new())).unwrap();
        let node = runtime.add_item(Some(editor), Item::Node(Node::new("A"))).unwrap();

        assert!(runtime.get_selected_nodes(node).is_empty());
        assert!(runtime.get_selected_links(ItemId::new()).is_empty());
        assert!(runtime.add_item(Some(editor), Item::Text(Text::new("x"))).is_none());
        assert!(!runtime.delete_item(ItemId::new()));

        let codes: Vec<_> = runtime.drain_errors().into_iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::IncompatibleType,
                ErrorCode::ItemNotFound,
                ErrorCode::IncompatibleChild,
                ErrorCode::ItemNotFound,
            ]
        );
        assert!(runtime.drain_errors().is_empty());
    }

    #[test]
    fn test_callback_can_query_runtime() {
        let runtime = Arc::new(Runtime::new());
        let editor = runtime.add_item(None, Item::NodeEditor(NodeEditor::new())).unwrap();

        let out = NodeAttribute::output("out");
        let input = NodeAttribute::input("in");
        let (out_ids, in_ids) = ((out.id(), out.backend_id()), (input.id(), input.backend_id()));
        runtime.add_item(Some(editor), Item::Node(Node::new("A").with_attribute(out)));
        runtime.add_item(Some(editor), Item::Node(Node::new("B").with_attribute(input)));

        // Creating the requested link from inside the callback needs the lock
        let weak = Arc::downgrade(&runtime);
        let callback = CallbackHandle::new(move |args| {
            let (Some(runtime), AppData::Link(source, target)) = (weak.upgrade(), &args.app_data)
            else {
                return;
            };
            runtime.add_item(Some(args.sender), Item::NodeLink(NodeLink::new(*source, *target)));
        });
        assert!(runtime.configure_node_editor(
            editor,
            EditorConfigUpdate::default().callback(Some(callback))
        ));

        let mut backend = ScriptedBackend {
            create_link: Some((out_ids.1, in_ids.1)),
            ..Default::default()
        };
        runtime.render_frame(&mut backend);
        assert_eq!(runtime.run_callbacks(), 1);

        let registry = runtime.lock();
        let editor = registry.node_editor(editor, "test").unwrap();
        assert_eq!(editor.links().len(), 1);
        match &editor.links()[0] {
            Item::NodeLink(link) => assert_eq!((link.source, link.target), (out_ids.0, in_ids.0)),
            other => panic!("unexpected {}", other.kind()),
        }
    }

    #[test]
    fn test_selected_links_are_strings() {
        let runtime = Runtime::new();
        let editor = runtime.add_item(None, Item::NodeEditor(NodeEditor::new())).unwrap();
        let out = NodeAttribute::output("out");
        let input = NodeAttribute::input("in");
        let (source, target) = (out.id(), input.id());
        runtime.add_item(Some(editor), Item::Node(Node::new("A").with_attribute(out)));
        runtime.add_item(Some(editor), Item::Node(Node::new("B").with_attribute(input)));
        let link = NodeLink::new(source, target);
        let link_backend = link.backend_id();
        runtime.add_item(Some(editor), Item::NodeLink(link));

        let mut backend = ScriptedBackend {
            select_links: Some(vec![link_backend]),
            ..Default::default()
        };
        runtime.render_frame(&mut backend);

        assert_eq!(
            runtime.get_selected_links(editor),
            vec![(source.to_string(), target.to_string())]
        );
        runtime.clear_selected_links(editor);
        runtime.render_frame(&mut backend);
        assert!(runtime.get_selected_links(editor).is_empty());
        assert!(runtime.drain_errors().is_empty());
    }
}
