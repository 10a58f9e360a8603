// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scripted backend for unit tests.

use crate::backend::{ChildRegion, NodeGraphBackend};
use crate::callback::{CallbackArgs, CallbackHandle};
use crate::config::WindowFlags;
use crate::context::EditorContext;
use crate::id::BackendId;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records calls and injects interaction results when the bracket closes.
/// Scripted selections and link events apply to one frame only.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    pub calls: Vec<String>,
    pub select_nodes: Option<Vec<BackendId>>,
    pub select_links: Option<Vec<BackendId>>,
    pub create_link: Option<(BackendId, BackendId)>,
    pub destroy_link: Option<BackendId>,
    pub hovered: bool,
    pub hovered_link: Option<BackendId>,
    pub menu_clicks: Vec<String>,
    pub flags: WindowFlags,
}

impl NodeGraphBackend for ScriptedBackend {
    fn begin_child(&mut self, _label: &str, size: [f32; 2], flags: WindowFlags) -> ChildRegion {
        self.calls.push("begin_child".to_string());
        self.flags = flags;
        ChildRegion {
            min: [0.0, 0.0],
            size: [
                if size[0] > 0.0 { size[0] } else { 800.0 },
                if size[1] > 0.0 { size[1] } else { 600.0 },
            ],
        }
    }

    fn end_child(&mut self) {
        self.calls.push("end_child".to_string());
    }

    fn begin_menu_bar(&mut self) -> bool {
        self.calls.push("begin_menu_bar".to_string());
        self.flags.contains(WindowFlags::MENU_BAR)
    }

    fn menu_entry(&mut self, label: &str) -> bool {
        self.menu_clicks.iter().any(|clicked| clicked == label)
    }

    fn begin_node_editor(&mut self, ctx: &mut EditorContext) {
        self.calls.push("begin_node_editor".to_string());
        ctx.begin_frame();
    }

    fn end_node_editor(&mut self, ctx: &mut EditorContext) {
        self.calls.push("end_node_editor".to_string());

        if let Some(ids) = self.select_nodes.take() {
            ctx.clear_node_selection();
            for id in ids {
                ctx.select_node(id);
            }
        }
        if let Some(ids) = self.select_links.take() {
            ctx.clear_link_selection();
            for id in ids {
                ctx.select_link(id);
            }
        }
        if let Some((start, end)) = self.create_link.take() {
            ctx.emit_link_created(start, end);
        }
        if let Some(id) = self.destroy_link.take() {
            ctx.emit_link_destroyed(id);
        }
        ctx.set_editor_hovered(self.hovered);
        ctx.set_hovered_link(self.hovered_link);

        let sizes: Vec<_> = ctx
            .declared_nodes()
            .iter()
            .map(|node| {
                let width = node.width.unwrap_or(100.0);
                let height = 40.0 + 20.0 * node.attributes.len() as f32;
                (node.id, [width, height])
            })
            .collect();
        for (id, size) in sizes {
            ctx.set_node_dimensions(id, size);
        }

        ctx.end_frame();
    }

    fn begin_node(&mut self, ctx: &mut EditorContext, id: BackendId, draggable: bool) {
        self.calls.push(format!("node {}", id.value()));
        ctx.declare_node(id, draggable);
    }

    fn link(&mut self, ctx: &mut EditorContext, id: BackendId, start: BackendId, end: BackendId) {
        self.calls.push(format!("link {}", id.value()));
        ctx.declare_link(id, start, end);
    }
}

/// Callback that stores every invocation
pub(crate) fn recorder() -> (CallbackHandle, Arc<Mutex<Vec<CallbackArgs>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback = CallbackHandle::new(move |args| sink.lock().push(args.clone()));
    (callback, seen)
}
