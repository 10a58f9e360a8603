// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diagnostics channel fed by the tracing subscriber.

use std::sync::mpsc;

/// A tracing event captured by the [`DiagnosticsBridge`] layer.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The event level.
    pub level: tracing::Level,
    /// The formatted message.
    pub message: String,
    /// Target (module path or explicit target).
    pub target: String,
}

/// A `tracing_subscriber::Layer` that forwards events over an `mpsc` channel
/// so the session can summarize them.
pub struct DiagnosticsBridge {
    sender: mpsc::Sender<Diagnostic>,
}

impl DiagnosticsBridge {
    /// Create a new bridge and return `(layer, receiver)`.
    pub fn new() -> (Self, mpsc::Receiver<Diagnostic>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl<S> tracing_subscriber::Layer<S> for DiagnosticsBridge
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let _ = self.sender.send(Diagnostic {
            level: *meta.level(),
            message: visitor.message,
            target: meta.target().to_string(),
        });
    }
}

/// Visitor that extracts the `message` field from a tracing event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else if self.message.is_empty() {
            self.message = format!("{} = {value:?}", field.name());
        } else {
            self.message
                .push_str(&format!(", {} = {value:?}", field.name()));
        }
    }
}

/// Events that reached the diagnostic target of the item registry
pub fn registry_diagnostics(events: &[Diagnostic]) -> impl Iterator<Item = &Diagnostic> {
    events
        .iter()
        .filter(|event| event.target == "loom_nodes::registry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_bridge_forwards_events() {
        let (bridge, receiver) = DiagnosticsBridge::new();
        let subscriber = tracing_subscriber::registry().with(bridge);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "loom_nodes::registry", "rejected {}", "Text");
            tracing::info!(count = 3, "frame done");
        });

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, tracing::Level::WARN);
        assert_eq!(events[0].message, "rejected Text");
        assert!(events[1].message.starts_with("frame done"));
        assert_eq!(registry_diagnostics(&events).count(), 1);
    }
}
