// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event handlers attached to a node editor.

use crate::callback::{AppData, CallbackHandle, CallbackRegistry};
use crate::id::ItemId;
use crate::item::ItemState;
use serde_json::Value;
use std::fmt;

/// Condition an event handler watches for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Item became active
    Activated,
    /// Item is active
    Active,
    /// Item was clicked
    Clicked,
    /// Item stopped being active after an edit
    DeactivatedAfterEdit,
    /// Item stopped being active
    Deactivated,
    /// Item value was edited
    Edited,
    /// Item has focus
    Focus,
    /// Item is hovered
    Hover,
    /// Item changed size
    Resize,
    /// Item was toggled open
    ToggledOpen,
    /// Item is visible
    Visible,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Activated => "Activated",
            Self::Active => "Active",
            Self::Clicked => "Clicked",
            Self::DeactivatedAfterEdit => "DeactivatedAfterEdit",
            Self::Deactivated => "Deactivated",
            Self::Edited => "Edited",
            Self::Focus => "Focus",
            Self::Hover => "Hover",
            Self::Resize => "Resize",
            Self::ToggledOpen => "ToggledOpen",
            Self::Visible => "Visible",
        };
        f.write_str(name)
    }
}

/// Submits its callback whenever the watched item's state matches its kind
#[derive(Debug)]
pub struct EventHandler {
    id: ItemId,
    kind: HandlerKind,
    /// Whether the handler is evaluated
    pub show: bool,
    callback: Option<CallbackHandle>,
    /// User data passed to the callback
    pub user_data: Option<Value>,
}

impl EventHandler {
    /// Create a handler without a callback
    pub fn new(kind: HandlerKind) -> Self {
        Self {
            id: ItemId::new(),
            kind,
            show: true,
            callback: None,
            user_data: None,
        }
    }

    /// Set the callback
    pub fn with_callback(mut self, callback: CallbackHandle) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Externally-visible identifier
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Watched condition
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Submit the callback if `state` of item `watched` triggers this handler
    pub fn evaluate(&self, watched: ItemId, state: &ItemState, callbacks: &CallbackRegistry) -> bool {
        if !self.show || !state.triggers(self.kind) {
            return false;
        }
        if let Some(callback) = &self.callback {
            callbacks.add_callback(callback, self.id, AppData::Item(watched), self.user_data.clone());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_handler_fires_only_when_hovered() {
        let callbacks = CallbackRegistry::new();
        let handler = EventHandler::new(HandlerKind::Hover).with_callback(CallbackHandle::new(|_| {}));
        let mut state = ItemState::default();

        assert!(!handler.evaluate(ItemId::new(), &state, &callbacks));
        state.set_hovered(true);
        assert!(handler.evaluate(ItemId::new(), &state, &callbacks));
        assert_eq!(callbacks.run_callbacks(), 1);
    }

    #[test]
    fn test_hidden_handler_is_skipped() {
        let callbacks = CallbackRegistry::new();
        let mut handler = EventHandler::new(HandlerKind::Visible);
        handler.show = false;
        let mut state = ItemState::default();
        state.visible = true;

        assert!(!handler.evaluate(ItemId::new(), &state, &callbacks));
    }
}
