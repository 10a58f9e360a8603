// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless session: drives a node editor through egui with synthetic input.

use egui::{Event, Modifiers, PointerButton, Pos2, RawInput, Rect, Vec2};
use loom_nodes::{
    AppData, CallbackHandle, EditorConfigUpdate, EguiNodeBackend, EventHandler, HandlerKind, Item,
    ItemId, MenuBar, Node, NodeAttribute, NodeEditor, NodeLink, Runtime, Text,
};
use serde_json::json;
use std::sync::{Arc, Weak};

const SCREEN_SIZE: Vec2 = Vec2::new(1024.0, 768.0);
const HEADER_HEIGHT: f32 = 24.0;
const ROW_CENTER: f32 = 4.0 + 9.0;

/// Items created for the session
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    /// The node editor
    pub editor: ItemId,
    /// Node with an output attribute
    pub source: ItemId,
    /// Node with an input attribute
    pub sink: ItemId,
}

/// A runtime and an egui context advanced one frame at a time
pub struct Session {
    runtime: Arc<Runtime>,
    egui: egui::Context,
    frame: u64,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            runtime: Arc::new(Runtime::new()),
            egui: egui::Context::default(),
            frame: 0,
        }
    }

    /// Shared runtime
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Build an editor with two connectable nodes, a menu bar and a hover
    /// handler. Link callbacks add and remove link items.
    pub fn build_scene(&self) -> Option<Scene> {
        let runtime = &self.runtime;
        let editor = runtime.add_item(
            None,
            Item::NodeEditor(NodeEditor::with_config(
                EditorConfigUpdate::default()
                    .menubar(true)
                    .callback(Some(link_callback(Arc::downgrade(runtime))))
                    .delink_callback(Some(delink_callback(Arc::downgrade(runtime))))
                    .user_data(Some(json!({ "graph": "demo" }))),
            )),
        )?;

        let weak = Arc::downgrade(runtime);
        let clear = CallbackHandle::new(move |args| {
            if let Some(runtime) = weak.upgrade() {
                tracing::info!("Menu {:?}: clearing selection", args.app_data);
                runtime.clear_selected_nodes(editor);
                runtime.clear_selected_links(editor);
            }
        });
        runtime.add_item(
            Some(editor),
            Item::MenuBar(MenuBar::new().with_entry("Clear", Some(clear))),
        )?;

        let source = runtime.add_item(
            Some(editor),
            Item::Node(Node::new("Source").with_position(40.0, 60.0)),
        )?;
        let out = runtime.add_item(Some(source), Item::NodeAttribute(NodeAttribute::output("value")))?;
        runtime.add_item(Some(out), Item::Text(Text::new("1.0")))?;

        let sink = runtime.add_item(
            Some(editor),
            Item::Node(Node::new("Sink").with_position(420.0, 220.0)),
        )?;
        runtime.add_item(Some(sink), Item::NodeAttribute(NodeAttribute::input("in")))?;

        let hover = EventHandler::new(HandlerKind::Hover).with_callback(CallbackHandle::new(|args| {
            tracing::trace!("Editor hovered: {:?}", args.app_data);
        }));
        runtime.add_item(Some(editor), Item::Handler(hover))?;

        Some(Scene { editor, source, sink })
    }

    /// Advance one frame with `events`, then run queued callbacks
    pub fn step(&mut self, events: Vec<Event>, modifiers: Modifiers) -> usize {
        let input = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, SCREEN_SIZE)),
            time: Some(self.frame as f64 / 60.0),
            modifiers,
            events,
            ..Default::default()
        };
        self.frame += 1;

        let runtime = &self.runtime;
        let _ = self.egui.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                let mut backend = EguiNodeBackend::new(ui);
                runtime.render_frame(&mut backend);
            });
        });
        self.runtime.run_callbacks()
    }

    /// Press and release the primary button at `pos`
    pub fn click(&mut self, pos: Pos2, modifiers: Modifiers) -> usize {
        self.step(vec![Event::PointerMoved(pos), button(pos, true, modifiers)], modifiers);
        self.step(vec![button(pos, false, modifiers)], modifiers)
    }

    /// Drag with the primary button from `from` to `to`
    pub fn drag(&mut self, from: Pos2, to: Pos2) -> usize {
        let none = Modifiers::NONE;
        let mut ran = self.step(vec![Event::PointerMoved(from), button(from, true, none)], none);
        ran += self.step(vec![Event::PointerMoved(from.lerp(to, 0.5))], none);
        ran += self.step(vec![Event::PointerMoved(to)], none);
        ran += self.step(vec![button(to, false, none)], none);
        ran + self.step(Vec::new(), none)
    }

    /// Screen rectangle of a node as pulled after the last frame
    pub fn node_rect(&self, node: ItemId) -> Option<Rect> {
        let registry = self.runtime.lock();
        match registry.get_item(node)? {
            Item::Node(node) => {
                let state = node.state();
                Some(Rect::from_min_max(
                    Pos2::new(state.rect_min[0], state.rect_min[1]),
                    Pos2::new(state.rect_max[0], state.rect_max[1]),
                ))
            }
            _ => None,
        }
    }

    /// Screen position of the first pin on the left or right edge of a node
    pub fn pin_position(&self, node: ItemId, right: bool) -> Option<Pos2> {
        let rect = self.node_rect(node)?;
        let x = if right { rect.right() } else { rect.left() };
        Some(Pos2::new(x, rect.top() + HEADER_HEIGHT + ROW_CENTER))
    }

    /// Top-left corner of the editor canvas
    pub fn canvas_origin(&self, editor: ItemId) -> Option<Pos2> {
        let registry = self.runtime.lock();
        let editor = registry.node_editor(editor, "canvas_origin").ok()?;
        let [x, y] = editor.context().canvas_origin();
        Some(Pos2::new(x, y))
    }

    /// Saved backend state of an editor as RON
    pub fn save_editor_state(&self, editor: ItemId) -> Option<String> {
        let registry = self.runtime.lock();
        let editor = registry.node_editor(editor, "save_editor_state").ok()?;
        match editor.context().save_state() {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::error!("Failed to save editor state: {e}");
                None
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn button(pos: Pos2, pressed: bool, modifiers: Modifiers) -> Event {
    Event::PointerButton {
        pos,
        button: PointerButton::Primary,
        pressed,
        modifiers,
    }
}

/// Adds a link item for every link the user creates
fn link_callback(runtime: Weak<Runtime>) -> CallbackHandle {
    CallbackHandle::new(move |args| {
        let (Some(runtime), AppData::Link(source, target)) = (runtime.upgrade(), &args.app_data)
        else {
            return;
        };
        if let Some(link) = runtime.add_item(Some(args.sender), Item::NodeLink(NodeLink::new(*source, *target))) {
            tracing::info!("Linked {source} -> {target} as {link} ({:?})", args.user_data);
        }
    })
}

/// Deletes the link item the user detached
fn delink_callback(runtime: Weak<Runtime>) -> CallbackHandle {
    CallbackHandle::new(move |args| {
        let (Some(runtime), AppData::Delink(link)) = (runtime.upgrade(), &args.app_data) else {
            return;
        };
        if runtime.delete_item(*link) {
            tracing::info!("Removed link {link}");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_lays_out_nodes() {
        let mut session = Session::new();
        let scene = session.build_scene().unwrap();
        session.step(Vec::new(), Modifiers::NONE);

        let origin = session.canvas_origin(scene.editor).unwrap();
        let source = session.node_rect(scene.source).unwrap();
        assert_eq!(source.min, origin + Vec2::new(40.0, 60.0));
        assert!(source.width() > 0.0);
        assert!(session.runtime().drain_errors().is_empty());
        assert!(session.save_editor_state(scene.editor).unwrap().contains("panning"));
    }
}
