// SPDX-License-Identifier: MIT OR Apache-2.0
//! Identity bridge between retained items and backend ids.
//!
//! Resolution is always local to a slice of candidate children. A miss is not
//! an error: the backend can report an id for an item that was detached from
//! the retained tree earlier in the same frame.

use crate::id::{BackendId, ItemId};
use crate::item::Item;

/// Items that are known to the node graph backend under a small integer id
pub trait BackendIdentity {
    /// Externally-visible identifier
    fn item_id(&self) -> ItemId;

    /// Backend id used to correlate backend events with this item
    fn backend_id(&self) -> BackendId;
}

/// Find the node among `children` that owns `id`.
pub fn resolve_node(children: &[Item], id: BackendId) -> Option<ItemId> {
    children.iter().find_map(|child| match child {
        Item::Node(node) if node.backend_id() == id => Some(node.item_id()),
        _ => None,
    })
}

/// Find the link among `children` that owns `id`.
pub fn resolve_link(children: &[Item], id: BackendId) -> Option<ItemId> {
    children.iter().find_map(|child| match child {
        Item::NodeLink(link) if link.backend_id() == id => Some(link.item_id()),
        _ => None,
    })
}

/// Find the attribute owning `id` by scanning the attributes of every node in
/// `children`.
pub fn resolve_attribute(children: &[Item], id: BackendId) -> Option<ItemId> {
    children
        .iter()
        .filter_map(|child| match child {
            Item::Node(node) => Some(node),
            _ => None,
        })
        .flat_map(|node| node.attributes())
        .find_map(|attribute| match attribute {
            Item::NodeAttribute(attr) if attr.backend_id() == id => Some(attr.item_id()),
            _ => None,
        })
}

/// Reverse lookup: the backend id of the attribute with external id `id`.
pub fn attribute_backend_id(children: &[Item], id: ItemId) -> Option<BackendId> {
    children
        .iter()
        .filter_map(|child| match child {
            Item::Node(node) => Some(node),
            _ => None,
        })
        .flat_map(|node| node.attributes())
        .find_map(|attribute| match attribute {
            Item::NodeAttribute(attr) if attr.item_id() == id => Some(attr.backend_id()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeKind, NodeAttribute};
    use crate::menubar::MenuBar;
    use crate::node::Node;

    fn node_with(attrs: Vec<NodeAttribute>) -> Node {
        let mut node = Node::new("Node");
        for attr in attrs {
            node.push_attribute(attr);
        }
        node
    }

    #[test]
    fn test_resolve_node_skips_other_kinds() {
        let node = Node::new("A");
        let (node_id, backend) = (node.item_id(), node.backend_id());
        let children = vec![Item::MenuBar(MenuBar::new()), Item::Node(node)];

        assert_eq!(resolve_node(&children, backend), Some(node_id));
        assert_eq!(resolve_node(&children, BackendId(-1)), None);
    }

    #[test]
    fn test_resolve_attribute_scans_every_node() {
        let input = NodeAttribute::new("in", AttributeKind::Input);
        let output = NodeAttribute::new("out", AttributeKind::Output);
        let (in_id, in_backend) = (input.item_id(), input.backend_id());
        let (out_id, out_backend) = (output.item_id(), output.backend_id());

        let children = vec![
            Item::Node(node_with(vec![output])),
            Item::Node(node_with(vec![input])),
        ];

        assert_eq!(resolve_attribute(&children, in_backend), Some(in_id));
        assert_eq!(resolve_attribute(&children, out_backend), Some(out_id));
        assert_eq!(attribute_backend_id(&children, in_id), Some(in_backend));
        assert_eq!(resolve_attribute(&children, BackendId(-7)), None);
    }
}
