//! Single-writer notifier: composes notification records and hands them
//! to a publisher collaborator.

use serde_json::{json, Value};
use tracing::warn;

use crate::document::Document;

/// Collaborator seam for the stream publisher used only to emit
/// notifications.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, payload: Value);
}

/// Records every publish in order; used by tests in place of a real
/// stream transport.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: std::sync::Mutex<Vec<Value>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Value> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationPublisher for RecordingPublisher {
    fn publish(&self, payload: Value) {
        self.events.lock().expect("notifier mutex poisoned").push(payload);
    }
}

/// A no-op publisher, e.g. for daemon configurations that don't wire a
/// transport.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl NotificationPublisher for NullPublisher {
    fn publish(&self, _payload: Value) {}
}

/// Builds and fires a `CREATED` notification. Best-effort: publisher
/// errors never propagate back to the request reply. `publish` here
/// can't fail, so this just logs on a future panic-free best-effort
/// basis for symmetry with the contract.
pub fn notify_created(publisher: &dyn NotificationPublisher, portfolio: &str, new_doc: &Document) {
    publisher.publish(json!({
        "action": "CREATED",
        "portfolio": portfolio,
        "old_data": Value::Null,
        "new_data": new_doc.to_public_json(),
    }));
}

pub fn notify_deleted(publisher: &dyn NotificationPublisher, portfolio: &str, old_doc: &Document) {
    publisher.publish(json!({
        "action": "DELETED",
        "portfolio": portfolio,
        "old_data": old_doc.to_public_json(),
        "new_data": Value::Null,
    }));
}

/// Builds and fires an `UPDATED` notification, computing
/// `non_secret_changed`/`secret_changed` from the before/after bodies.
pub fn notify_updated(
    publisher: &dyn NotificationPublisher,
    portfolio: &str,
    old_doc: &Document,
    new_doc: &Document,
) {
    let non_secret_changed = !old_doc.body.non_secret_equals(&new_doc.body)
        || old_doc.header.tags != new_doc.header.tags
        || old_doc.header.usages != new_doc.header.usages
        || old_doc.header.name != new_doc.header.name;
    let secret_changed = !old_doc.body.secret_equals(&new_doc.body);

    publisher.publish(json!({
        "action": "UPDATED",
        "portfolio": portfolio,
        "old_data": old_doc.to_public_json(),
        "new_data": new_doc.to_public_json(),
        "non_secret_changed": non_secret_changed,
        "secret_changed": secret_changed,
    }));
}

/// Logs a publisher failure without propagating it — publication is
/// best-effort. `NotificationPublisher::publish` currently can't fail;
/// this helper exists so a fallible transport can be wired in later
/// without touching call sites.
pub fn log_publish_failure(portfolio: &str, error: &str) {
    warn!(portfolio, error, "notification publish failed");
}
