//! Change notifications.
//!
//! Services announce every mutation through a [`Notifier`]. Delivery is best
//! effort: a notification that nobody receives never fails the mutation.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Kind of change being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Event {
    #[serde(rename = "product.created")]
    ProductCreated,
    #[serde(rename = "product.updated")]
    ProductUpdated,
    #[serde(rename = "product.deleted")]
    ProductDeleted,
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.updated")]
    OrderUpdated,
    #[serde(rename = "order.deleted")]
    OrderDeleted,
}

impl Event {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductCreated => "product.created",
            Self::ProductUpdated => "product.updated",
            Self::ProductDeleted => "product.deleted",
            Self::OrderCreated => "order.created",
            Self::OrderUpdated => "order.updated",
            Self::OrderDeleted => "order.deleted",
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivered notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub event: Event,
    pub payload: Value,
}

/// Sink for change notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event, payload: Value);
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: Event, _payload: Value) {}
}

/// Fans notifications out to any number of in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Slow subscribers lag once more than `capacity` notifications are pending.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));

        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: Event, payload: Value) {
        match self.sender.send(Notification { event, payload }) {
            Ok(receivers) => debug!(%event, receivers, "notification sent"),
            Err(_) => debug!(%event, "notification dropped, no subscribers"),
        }
    }
}

/// Serialize `record` and hand it to `notifier`.
pub(crate) fn publish<T: Serialize>(notifier: &dyn Notifier, event: Event, record: &T) {
    match serde_json::to_value(record) {
        Ok(payload) => notifier.notify(event, payload),
        Err(error) => warn!(%event, %error, "failed to encode notification payload"),
    }
}
