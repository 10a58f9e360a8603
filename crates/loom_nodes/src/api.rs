// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection and clear-request commands addressed by editor identifier.
//!
//! These are the `Result`-returning forms. [`crate::Runtime`] wraps them for
//! hosts that expect errors on a side channel and a neutral return value.

use crate::error::ItemError;
use crate::id::ItemId;
use crate::registry::ItemRegistry;

/// Identifiers of the selected, still attached nodes of `editor`
pub fn get_selected_nodes(registry: &ItemRegistry, editor: ItemId) -> Result<Vec<ItemId>, ItemError> {
    Ok(registry.node_editor(editor, "get_selected_nodes")?.selected_nodes())
}

/// Endpoint attribute pairs of the selected links of `editor`
pub fn get_selected_links(
    registry: &ItemRegistry,
    editor: ItemId,
) -> Result<Vec<(ItemId, ItemId)>, ItemError> {
    Ok(registry.node_editor(editor, "get_selected_links")?.selected_links())
}

/// Clear the link selection of `editor` on its next frame
pub fn clear_selected_links(registry: &mut ItemRegistry, editor: ItemId) -> Result<(), ItemError> {
    registry
        .node_editor_mut(editor, "clear_selected_links")?
        .request_clear_links();
    Ok(())
}

/// Clear the node selection of `editor` on its next frame
pub fn clear_selected_nodes(registry: &mut ItemRegistry, editor: ItemId) -> Result<(), ItemError> {
    registry
        .node_editor_mut(editor, "clear_selected_nodes")?
        .request_clear_nodes();
    Ok(())
}
