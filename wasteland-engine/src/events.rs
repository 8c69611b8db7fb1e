//! Notifications published by world mutations and the dispatcher that fans
//! them out to presentation-side subscribers.
//!
//! Publishing is fire-and-forget: mutators push onto the state's outbox and
//! never observe what subscribers do with it.

use serde::{Deserialize, Serialize};

use crate::state::WorldState;

/// Mechanical kind of a published notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Location,
    WeatherChange,
    Caps,
    Inventory,
    Reputation,
    TimelineEvent,
    AnomalyEvent,
    QuestUpdate,
    BossDefeated,
    Encounter,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::WeatherChange => "weather_change",
            Self::Caps => "caps",
            Self::Inventory => "inventory",
            Self::Reputation => "reputation",
            Self::TimelineEvent => "timeline_event",
            Self::AnomalyEvent => "anomaly_event",
            Self::QuestUpdate => "quest_update",
            Self::BossDefeated => "boss_defeated",
            Self::Encounter => "encounter",
        }
    }
}

/// Generic `{kind, payload}` notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Notification {
    #[must_use]
    pub const fn new(kind: NotificationKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }
}

/// Game-level event queued on the world state for the host loop to consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    /// Monotonic sequence number assigned when the event was queued.
    pub seq: u64,
    pub kind: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

/// Receiver of published notifications.
pub trait Subscriber {
    fn notify(&mut self, notification: &Notification);
}

impl<F> Subscriber for F
where
    F: FnMut(&Notification),
{
    fn notify(&mut self, notification: &Notification) {
        self(notification);
    }
}

/// Fans notifications drained from a [`WorldState`] out to every subscriber.
#[derive(Default)]
pub struct Dispatcher {
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver one notification to every subscriber.
    pub fn publish(&mut self, notification: &Notification) {
        log::trace!("publishing {}", notification.kind.as_str());
        for subscriber in &mut self.subscribers {
            subscriber.notify(notification);
        }
    }

    /// Drain the state's outbox, returning how many notifications were delivered.
    pub fn flush(&mut self, state: &mut WorldState) -> usize {
        let pending = state.take_notifications();
        let count = pending.len();
        for notification in &pending {
            self.publish(notification);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn flush_drains_outbox_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe(move |n: &Notification| sink.borrow_mut().push(n.kind));

        let mut state = WorldState::default();
        state.add_caps(25);
        state.add_inventory_item("medkit");
        assert_eq!(dispatcher.flush(&mut state), 2);
        assert_eq!(
            *seen.borrow(),
            vec![NotificationKind::Caps, NotificationKind::Inventory]
        );
        assert_eq!(dispatcher.flush(&mut state), 0);
    }

    #[test]
    fn flushing_without_subscribers_still_empties_outbox() {
        let mut dispatcher = Dispatcher::new();
        let mut state = WorldState::default();
        state.add_caps(5);
        assert_eq!(dispatcher.flush(&mut state), 1);
        assert!(state.pending_notifications().is_empty());
    }

    #[test]
    fn kinds_serialize_snake_case() {
        let json = serde_json::to_string(&NotificationKind::WeatherChange).unwrap();
        assert_eq!(json, "\"weather_change\"");
        assert_eq!(NotificationKind::BossDefeated.as_str(), "boss_defeated");
    }
}
