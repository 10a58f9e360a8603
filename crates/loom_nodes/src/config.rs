// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node editor configuration.

use crate::callback::CallbackHandle;
use crate::error::StateError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Window chrome flags of the editor's child region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowFlags(u32);

impl WindowFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Reserve a menu bar at the top of the region
    pub const MENU_BAR: Self = Self(1 << 10);

    /// Whether every bit of `flag` is set
    pub fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Set or clear `flag`
    pub fn set(&mut self, flag: Self, on: bool) {
        if on {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }

    /// Raw bits
    pub fn bits(self) -> u32 {
        self.0
    }
}

/// Persistable node editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeEditorConfig {
    /// Label of the child region
    pub label: String,
    /// Width, zero fills the available space
    pub width: i32,
    /// Height, zero fills the available space
    pub height: i32,
    /// Whether the editor is drawn
    pub show: bool,
    /// Chrome flags
    pub window_flags: WindowFlags,
}

impl Default for NodeEditorConfig {
    fn default() -> Self {
        Self {
            label: "NodeEditor".to_string(),
            width: 0,
            height: 0,
            show: true,
            window_flags: WindowFlags::NONE,
        }
    }
}

impl NodeEditorConfig {
    /// Whether the menu bar flag is set
    pub fn menubar(&self) -> bool {
        self.window_flags.contains(WindowFlags::MENU_BAR)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, StateError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON
    pub fn from_ron(s: &str) -> Result<Self, StateError> {
        Ok(ron::from_str(s)?)
    }
}

/// Keyword-style configuration update. Only fields that are `Some` are
/// applied; `Some(None)` clears an optional setting.
#[derive(Debug, Clone, Default)]
pub struct EditorConfigUpdate {
    /// New label
    pub label: Option<String>,
    /// New width
    pub width: Option<i32>,
    /// New height
    pub height: Option<i32>,
    /// New visibility
    pub show: Option<bool>,
    /// Toggle the menu bar flag
    pub menubar: Option<bool>,
    /// Callback receiving created links
    pub callback: Option<Option<CallbackHandle>>,
    /// Callback receiving detached links
    pub delink_callback: Option<Option<CallbackHandle>>,
    /// User data passed to both callbacks
    pub user_data: Option<Option<Value>>,
}

impl EditorConfigUpdate {
    /// Set the menu bar flag
    pub fn menubar(mut self, on: bool) -> Self {
        self.menubar = Some(on);
        self
    }

    /// Set the size
    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the link callback
    pub fn callback(mut self, callback: Option<CallbackHandle>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Set the delink callback
    pub fn delink_callback(mut self, callback: Option<CallbackHandle>) -> Self {
        self.delink_callback = Some(callback);
        self
    }

    /// Set the user data
    pub fn user_data(mut self, user_data: Option<Value>) -> Self {
        self.user_data = Some(user_data);
        self
    }

    /// Apply the plain settings to `config`
    pub(crate) fn apply_to(&self, config: &mut NodeEditorConfig) {
        if let Some(label) = &self.label {
            config.label.clone_from(label);
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(show) = self.show {
            config.show = show;
        }
        if let Some(menubar) = self.menubar {
            config.window_flags.set(WindowFlags::MENU_BAR, menubar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menubar_toggles_flag_bit() {
        let mut config = NodeEditorConfig::default();
        assert!(!config.menubar());

        EditorConfigUpdate::default().menubar(true).apply_to(&mut config);
        assert!(config.menubar());
        assert_eq!(config.window_flags.bits(), WindowFlags::MENU_BAR.bits());

        EditorConfigUpdate::default().menubar(false).apply_to(&mut config);
        assert!(!config.menubar());
    }

    #[test]
    fn test_absent_fields_are_left_alone() {
        let mut config = NodeEditorConfig {
            width: 300,
            ..Default::default()
        };
        EditorConfigUpdate {
            height: Some(200),
            ..Default::default()
        }
        .apply_to(&mut config);
        assert_eq!(config.width, 300);
        assert_eq!(config.height, 200);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = NodeEditorConfig::default();
        config.window_flags.set(WindowFlags::MENU_BAR, true);
        let ron = config.to_ron().unwrap();
        let loaded = NodeEditorConfig::from_ron(&ron).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(NodeEditorConfig::from_ron("(width: 50)").unwrap().width, 50);
    }
}
