// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain text widget, the only content an attribute row carries.

use crate::backend::NodeGraphBackend;
use crate::context::EditorContext;
use crate::id::ItemId;

/// A line of text
#[derive(Debug, Clone)]
pub struct Text {
    id: ItemId,
    /// Displayed value
    pub value: String,
    /// Whether the text is drawn
    pub show: bool,
}

impl Text {
    /// Create a text widget
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            value: value.into(),
            show: true,
        }
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Draw into the attribute currently open in `ctx`
    pub fn draw(&self, backend: &mut dyn NodeGraphBackend, ctx: &mut EditorContext) {
        if self.show {
            backend.text(ctx, &self.value);
        }
    }
}
