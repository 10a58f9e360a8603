// SPDX-License-Identifier: MIT OR Apache-2.0
//! Menu bar drawn above the editor canvas.

use crate::backend::NodeGraphBackend;
use crate::callback::{AppData, CallbackHandle, CallbackRegistry};
use crate::id::ItemId;

/// A clickable menu bar entry
#[derive(Debug, Clone)]
pub struct MenuEntry {
    /// Label
    pub label: String,
    /// Submitted when the entry is clicked
    pub callback: Option<CallbackHandle>,
}

/// Menu bar with a row of entries
#[derive(Debug)]
pub struct MenuBar {
    id: ItemId,
    /// Whether the bar is drawn
    pub show: bool,
    entries: Vec<MenuEntry>,
}

impl MenuBar {
    /// Create an empty menu bar
    pub fn new() -> Self {
        Self {
            id: ItemId::new(),
            show: true,
            entries: Vec::new(),
        }
    }

    /// Add an entry
    pub fn with_entry(mut self, label: impl Into<String>, callback: Option<CallbackHandle>) -> Self {
        self.entries.push(MenuEntry {
            label: label.into(),
            callback,
        });
        self
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Entries in display order
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Visibility gate
    pub fn pre_draw(&self) -> bool {
        self.show
    }

    /// Draw the bar, submitting callbacks of clicked entries
    pub fn draw(&self, backend: &mut dyn NodeGraphBackend, callbacks: &CallbackRegistry) {
        if !backend.begin_menu_bar() {
            return;
        }
        for entry in &self.entries {
            if backend.menu_entry(&entry.label) {
                tracing::debug!("Menu entry clicked: {}", entry.label);
                if let Some(callback) = &entry.callback {
                    callbacks.add_callback(callback, self.id, AppData::Menu(entry.label.clone()), None);
                }
            }
        }
        backend.end_menu_bar();
    }
}

impl Default for MenuBar {
    fn default() -> Self {
        Self::new()
    }
}
