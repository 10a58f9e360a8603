// SPDX-License-Identifier: MIT OR Apache-2.0
//! Retained node editor items over an immediate-mode node graph backend.
//!
//! This crate keeps a persistent item tree (node editors, nodes, node
//! attributes, links, menu bars, text and event handlers) and reconciles it
//! once per frame with a backend that only knows small integer ids.
//!
//! ## Architecture
//!
//! - [`NodeEditor`] owns its [`EditorContext`] and drives a
//!   [`NodeGraphBackend`] through the begin/end bracket each frame
//! - Backend ids are mapped back to stable [`ItemId`]s by the identity bridge
//! - Callbacks are queued on a [`CallbackRegistry`] and run after the frame
//! - [`Runtime`] puts the [`ItemRegistry`] behind one process-wide lock and
//!   exposes the selection commands to hosts
//! - [`EguiNodeBackend`] renders and handles input with egui

pub mod api;
pub mod attribute;
pub mod backend;
pub mod bridge;
pub mod callback;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod handler;
pub mod id;
pub mod item;
pub mod link;
pub mod menubar;
pub mod node;
pub mod registry;
pub mod runtime;
pub mod text;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use attribute::{AttributeKind, NodeAttribute, PinShape};
pub use backend::{ChildRegion, NodeGraphBackend};
pub use bridge::BackendIdentity;
pub use callback::{AppData, CallbackArgs, CallbackHandle, CallbackRegistry};
pub use config::{EditorConfigUpdate, NodeEditorConfig, WindowFlags};
pub use context::EditorContext;
pub use editor::NodeEditor;
pub use error::{ErrorCode, ErrorReporter, ItemError, ReportedError, StateError};
pub use handler::{EventHandler, HandlerKind};
pub use id::{BackendId, ItemId};
pub use item::{Item, ItemKind, ItemState};
pub use link::NodeLink;
pub use menubar::{MenuBar, MenuEntry};
pub use node::Node;
pub use registry::ItemRegistry;
pub use runtime::Runtime;
pub use text::Text;
pub use ui::EguiNodeBackend;
