// SPDX-License-Identifier: MIT OR Apache-2.0
//! Retained item tree.
//!
//! Every retained object is an [`Item`] variant. Containers keep their
//! children in ordered slots; the slot an item lands in is decided by its
//! [`ItemKind`]:
//!
//! | slot | node editor          | node        | node attribute |
//! |------|----------------------|-------------|----------------|
//! | 0    | node links           | attributes  | widgets        |
//! | 1    | nodes, one menu bar  |             |                |
//! | 2    | event handlers       |             |                |

use crate::attribute::NodeAttribute;
use crate::editor::NodeEditor;
use crate::handler::{EventHandler, HandlerKind};
use crate::id::ItemId;
use crate::link::NodeLink;
use crate::menubar::MenuBar;
use crate::node::Node;
use crate::text::Text;
use std::fmt;

/// Kind tag of a retained item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Node editor canvas
    NodeEditor,
    /// Node inside an editor
    Node,
    /// Attribute (pin row) inside a node
    NodeAttribute,
    /// Link between two attributes
    NodeLink,
    /// Menu bar of an editor
    MenuBar,
    /// Plain text widget
    Text,
    /// Event handler
    Handler(HandlerKind),
}

const NODE_EDITOR_CHILDREN: &[ItemKind] = &[
    ItemKind::Node,
    ItemKind::NodeLink,
    ItemKind::MenuBar,
    ItemKind::Handler(HandlerKind::Activated),
    ItemKind::Handler(HandlerKind::Active),
    ItemKind::Handler(HandlerKind::Clicked),
    ItemKind::Handler(HandlerKind::DeactivatedAfterEdit),
    ItemKind::Handler(HandlerKind::Deactivated),
    ItemKind::Handler(HandlerKind::Edited),
    ItemKind::Handler(HandlerKind::Focus),
    ItemKind::Handler(HandlerKind::Hover),
    ItemKind::Handler(HandlerKind::Resize),
    ItemKind::Handler(HandlerKind::ToggledOpen),
    ItemKind::Handler(HandlerKind::Visible),
];

impl ItemKind {
    /// Kinds this kind accepts as children
    pub fn accepted_children(self) -> &'static [ItemKind] {
        match self {
            Self::NodeEditor => NODE_EDITOR_CHILDREN,
            Self::Node => &[ItemKind::NodeAttribute],
            Self::NodeAttribute => &[ItemKind::Text],
            Self::NodeLink | Self::MenuBar | Self::Text | Self::Handler(_) => &[],
        }
    }

    /// Check if `child` may be attached below an item of this kind
    pub fn accepts(self, child: ItemKind) -> bool {
        self.accepted_children().contains(&child)
    }

    /// Child slot an item of this kind occupies inside its parent
    pub fn slot(self) -> usize {
        match self {
            Self::Node | Self::MenuBar => 1,
            Self::Handler(_) => 2,
            Self::NodeLink | Self::NodeAttribute | Self::Text | Self::NodeEditor => 0,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeEditor => f.write_str("NodeEditor"),
            Self::Node => f.write_str("Node"),
            Self::NodeAttribute => f.write_str("NodeAttribute"),
            Self::NodeLink => f.write_str("NodeLink"),
            Self::MenuBar => f.write_str("MenuBar"),
            Self::Text => f.write_str("Text"),
            Self::Handler(kind) => write!(f, "{kind}Handler"),
        }
    }
}

/// Comma separated list of kinds, used in error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindList(pub Vec<ItemKind>);

impl fmt::Display for KindList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

/// Interaction and geometry state of an item, refreshed every frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ItemState {
    /// Hovered by the mouse
    pub hovered: bool,
    /// Held active
    pub active: bool,
    /// Has keyboard focus
    pub focused: bool,
    /// Clicked this frame
    pub clicked: bool,
    /// Value edited this frame
    pub edited: bool,
    /// Became active this frame
    pub activated: bool,
    /// Stopped being active this frame
    pub deactivated: bool,
    /// Stopped being active after an edit this frame
    pub deactivated_after_edit: bool,
    /// Tree node toggled this frame
    pub toggled_open: bool,
    /// Drawn this frame
    pub visible: bool,
    /// Top-left corner in screen space
    pub rect_min: [f32; 2],
    /// Bottom-right corner in screen space
    pub rect_max: [f32; 2],
    /// Rectangle size
    pub rect_size: [f32; 2],
    prev_rect_size: [f32; 2],
}

impl ItemState {
    /// Reset per-frame flags before the item is drawn
    pub fn begin_frame(&mut self) {
        self.prev_rect_size = self.rect_size;
        self.visible = false;
        self.clicked = false;
        self.edited = false;
        self.activated = false;
        self.deactivated = false;
        self.deactivated_after_edit = false;
        self.toggled_open = false;
    }

    /// Set the hover flag
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
    }

    /// Set the rectangle from its top-left corner and size
    pub fn set_rect(&mut self, min: [f32; 2], size: [f32; 2]) {
        self.rect_min = min;
        self.rect_size = size;
        self.rect_max = [min[0] + size[0], min[1] + size[1]];
    }

    /// Whether the rectangle size changed since the previous frame
    pub fn resized(&self) -> bool {
        self.rect_size != self.prev_rect_size
    }

    /// Whether a handler of `kind` should fire for this state
    pub fn triggers(&self, kind: HandlerKind) -> bool {
        match kind {
            HandlerKind::Activated => self.activated,
            HandlerKind::Active => self.active,
            HandlerKind::Clicked => self.clicked,
            HandlerKind::DeactivatedAfterEdit => self.deactivated_after_edit,
            HandlerKind::Deactivated => self.deactivated,
            HandlerKind::Edited => self.edited,
            HandlerKind::Focus => self.focused,
            HandlerKind::Hover => self.hovered,
            HandlerKind::Resize => self.resized(),
            HandlerKind::ToggledOpen => self.toggled_open,
            HandlerKind::Visible => self.visible,
        }
    }
}

/// A retained item
#[derive(Debug)]
pub enum Item {
    /// Node editor
    NodeEditor(NodeEditor),
    /// Node
    Node(Node),
    /// Node attribute
    NodeAttribute(NodeAttribute),
    /// Node link
    NodeLink(NodeLink),
    /// Menu bar
    MenuBar(MenuBar),
    /// Text widget
    Text(Text),
    /// Event handler
    Handler(EventHandler),
}

impl Item {
    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        match self {
            Self::NodeEditor(item) => item.id(),
            Self::Node(item) => item.id(),
            Self::NodeAttribute(item) => item.id(),
            Self::NodeLink(item) => item.id(),
            Self::MenuBar(item) => item.id(),
            Self::Text(item) => item.id(),
            Self::Handler(item) => item.id(),
        }
    }

    /// Kind tag
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::NodeEditor(_) => ItemKind::NodeEditor,
            Self::Node(_) => ItemKind::Node,
            Self::NodeAttribute(_) => ItemKind::NodeAttribute,
            Self::NodeLink(_) => ItemKind::NodeLink,
            Self::MenuBar(_) => ItemKind::MenuBar,
            Self::Text(_) => ItemKind::Text,
            Self::Handler(handler) => ItemKind::Handler(handler.kind()),
        }
    }

    /// Child slots, empty for leaf items
    pub fn children(&self) -> &[Vec<Item>] {
        match self {
            Self::NodeEditor(editor) => editor.slots(),
            Self::Node(node) => std::slice::from_ref(node.attribute_slot()),
            Self::NodeAttribute(attr) => std::slice::from_ref(attr.widget_slot()),
            Self::NodeLink(_) | Self::MenuBar(_) | Self::Text(_) | Self::Handler(_) => &[],
        }
    }

    /// Mutable child slots
    pub fn children_mut(&mut self) -> &mut [Vec<Item>] {
        match self {
            Self::NodeEditor(editor) => editor.slots_mut(),
            Self::Node(node) => std::slice::from_mut(node.attribute_slot_mut()),
            Self::NodeAttribute(attr) => std::slice::from_mut(attr.widget_slot_mut()),
            Self::NodeLink(_) | Self::MenuBar(_) | Self::Text(_) | Self::Handler(_) => &mut [],
        }
    }

    /// Interaction state
    pub fn state(&self) -> Option<&ItemState> {
        match self {
            Self::NodeEditor(item) => Some(item.state()),
            Self::Node(item) => Some(item.state()),
            Self::NodeAttribute(item) => Some(item.state()),
            Self::NodeLink(item) => Some(item.state()),
            Self::MenuBar(_) | Self::Text(_) | Self::Handler(_) => None,
        }
    }

    /// Find this item or one of its descendants by id
    pub fn find(&self, id: ItemId) -> Option<&Item> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().flatten().find_map(|child| child.find(id))
    }

    /// Mutable variant of [`Item::find`]
    pub fn find_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        if self.id() == id {
            return Some(self);
        }
        self.children_mut()
            .iter_mut()
            .flatten()
            .find_map(|child| child.find_mut(id))
    }

    /// Detach the descendant with the given id
    pub fn remove_descendant(&mut self, id: ItemId) -> Option<Item> {
        match self {
            Self::NodeEditor(editor) => editor.remove_descendant(id),
            other => remove_from_slots(other.children_mut(), id),
        }
    }
}

/// Detach the item with the given id from `slots` or anywhere below them
pub(crate) fn remove_from_slots(slots: &mut [Vec<Item>], id: ItemId) -> Option<Item> {
    for slot in slots {
        if let Some(index) = slot.iter().position(|child| child.id() == id) {
            return Some(slot.remove(index));
        }
        if let Some(removed) = slot.iter_mut().find_map(|child| child.remove_descendant(id)) {
            return Some(removed);
        }
    }
    None
}
