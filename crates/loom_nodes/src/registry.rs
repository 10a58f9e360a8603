// SPDX-License-Identifier: MIT OR Apache-2.0
//! Item registry: owns the retained tree and resolves identifiers.

use crate::backend::NodeGraphBackend;
use crate::callback::CallbackRegistry;
use crate::editor::NodeEditor;
use crate::error::ItemError;
use crate::id::ItemId;
use crate::item::{Item, ItemKind, KindList};

/// Registry of retained items
#[derive(Debug, Default)]
pub struct ItemRegistry {
    roots: Vec<Item>,
}

impl ItemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level items
    pub fn roots(&self) -> &[Item] {
        &self.roots
    }

    /// Attach `item` below `parent`, or as a root. Children are validated
    /// against the parent's accepted kinds before anything is attached.
    pub fn add_item(&mut self, parent: Option<ItemId>, item: Item) -> Result<ItemId, ItemError> {
        const COMMAND: &str = "add_item";
        let id = item.id();

        let Some(parent_id) = parent else {
            self.roots.push(item);
            return Ok(id);
        };

        let parent = self
            .get_item_mut(parent_id)
            .ok_or(ItemError::ItemNotFound {
                command: COMMAND,
                id: parent_id,
            })?;

        match parent {
            Item::NodeEditor(editor) => editor.attach_child(item, COMMAND)?,
            other => {
                let (parent_kind, child) = (other.kind(), item.kind());
                if !parent_kind.accepts(child) {
                    tracing::error!(
                        target: "loom_nodes::registry",
                        "{parent_kind} cannot hold {child}"
                    );
                    return Err(ItemError::IncompatibleChild {
                        command: COMMAND,
                        parent: parent_id,
                        parent_kind,
                        child,
                        accepted: KindList(parent_kind.accepted_children().to_vec()),
                    });
                }
                other.children_mut()[child.slot()].push(item);
            }
        }

        tracing::debug!("Added item {id} to {parent_id}");
        Ok(id)
    }

    /// Detach and return an item with all of its children
    pub fn delete_item(&mut self, id: ItemId) -> Result<Item, ItemError> {
        if let Some(index) = self.roots.iter().position(|root| root.id() == id) {
            return Ok(self.roots.remove(index));
        }
        self.roots
            .iter_mut()
            .find_map(|root| root.remove_descendant(id))
            .ok_or(ItemError::ItemNotFound {
                command: "delete_item",
                id,
            })
    }

    /// Find an item anywhere in the tree
    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.roots.iter().find_map(|root| root.find(id))
    }

    /// Mutable variant of [`ItemRegistry::get_item`]
    pub fn get_item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.roots.iter_mut().find_map(|root| root.find_mut(id))
    }

    /// Resolve a node editor, reporting missing items and wrong kinds
    pub fn node_editor(&self, id: ItemId, command: &'static str) -> Result<&NodeEditor, ItemError> {
        match self.get_item(id) {
            Some(Item::NodeEditor(editor)) => Ok(editor),
            Some(other) => Err(incompatible(command, id, other.kind())),
            None => Err(ItemError::ItemNotFound { command, id }),
        }
    }

    /// Mutable variant of [`ItemRegistry::node_editor`]
    pub fn node_editor_mut(
        &mut self,
        id: ItemId,
        command: &'static str,
    ) -> Result<&mut NodeEditor, ItemError> {
        match self.get_item_mut(id) {
            Some(Item::NodeEditor(editor)) => Ok(editor),
            Some(other) => Err(incompatible(command, id, other.kind())),
            None => Err(ItemError::ItemNotFound { command, id }),
        }
    }

    /// Draw every top-level node editor
    pub fn render_frame(&mut self, backend: &mut dyn NodeGraphBackend, callbacks: &CallbackRegistry) {
        for root in &mut self.roots {
            if let Item::NodeEditor(editor) = root {
                if editor.pre_draw() {
                    editor.draw(backend, callbacks);
                    editor.post_draw(callbacks);
                }
            }
        }
    }
}

fn incompatible(command: &'static str, id: ItemId, found: ItemKind) -> ItemError {
    ItemError::IncompatibleType {
        command,
        id,
        found,
        expected: KindList(vec![ItemKind::NodeEditor]),
    }
}
