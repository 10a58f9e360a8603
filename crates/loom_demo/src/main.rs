// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loom node editor demo.
//!
//! Runs a headless egui session against the `loom_nodes` runtime:
//! - builds an editor with two nodes and a menu bar
//! - drags a link between their pins and selects a node
//! - detaches the link with Ctrl+click
//! - shows how rejected commands are reported
//!
//! Logging goes through `tracing`; set `RUST_LOG` to change the filter.

mod diagnostics;
mod session;

use diagnostics::DiagnosticsBridge;
use egui::Modifiers;
use loom_nodes::{Item, Text};
use session::Session;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let (bridge_layer, diagnostics_rx) = DiagnosticsBridge::new();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("loom_nodes=debug,loom_demo=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(bridge_layer)
        .init();

    tracing::info!("Starting loom demo v{}", env!("CARGO_PKG_VERSION"));

    let mut session = Session::new();
    let Some(scene) = session.build_scene() else {
        tracing::error!("Failed to build the demo scene");
        std::process::exit(1);
    };
    session.step(Vec::new(), Modifiers::NONE);

    // Drag from the output pin of Source to the input pin of Sink
    let (Some(from), Some(to)) = (
        session.pin_position(scene.source, true),
        session.pin_position(scene.sink, false),
    ) else {
        tracing::error!("Nodes were not laid out");
        std::process::exit(1);
    };
    let ran = session.drag(from, to);
    tracing::info!("Link drag ran {ran} callbacks");

    if let Some(title) = session.node_rect(scene.source).map(|rect| rect.center_top() + egui::vec2(0.0, 8.0)) {
        session.click(title, Modifiers::NONE);
    }
    let runtime = session.runtime().clone();
    tracing::info!("Selected nodes: {:?}", runtime.get_selected_nodes(scene.editor));

    // Ctrl+click the middle of the link to detach it
    session.click(from.lerp(to, 0.5), Modifiers::CTRL);
    session.step(Vec::new(), Modifiers::NONE);
    tracing::info!("Selected links: {:?}", runtime.get_selected_links(scene.editor));

    if let Some(origin) = session.canvas_origin(scene.editor) {
        session.click(origin + egui::vec2(12.0, -10.0), Modifiers::NONE);
        session.step(Vec::new(), Modifiers::NONE);
    }
    tracing::info!("Selected nodes after clear: {:?}", runtime.get_selected_nodes(scene.editor));

    // Rejected commands report errors and return neutral values
    runtime.add_item(Some(scene.editor), Item::Text(Text::new("stray")));
    let neutral = runtime.get_selected_nodes(scene.source);
    tracing::info!("Selection of a node id: {neutral:?}");
    for error in runtime.drain_errors() {
        tracing::warn!("Reported {:?}: {}", error.code, error.message);
    }

    if let Some(state) = session.save_editor_state(scene.editor) {
        tracing::info!("Editor state:\n{state}");
    }

    let events: Vec<_> = diagnostics_rx.try_iter().collect();
    let errors = events
        .iter()
        .filter(|event| event.level == tracing::Level::ERROR)
        .count();
    let registry: Vec<_> = diagnostics::registry_diagnostics(&events).collect();
    tracing::info!(
        "Captured {} events, {errors} errors, {} registry diagnostics",
        events.len(),
        registry.len()
    );
    for diagnostic in registry {
        tracing::info!("  [{}] {}", diagnostic.level, diagnostic.message);
    }
}
