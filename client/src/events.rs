//! Event dispatch for presentation-side systems
//!
//! The bus is an ordinary value: whoever owns the client constructs it,
//! subscribes listeners and hands it over. Dropping the owner drops every
//! subscription with it, so nothing outlives the client it belongs to and
//! nothing is shared process-wide.

use shared::ShipClass;
use std::collections::HashMap;

/// Things the reconciler announces as snapshots come and go
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The server acknowledged us and assigned this id
    Joined { player_id: String },
    /// A ship we had no representation for appeared in a snapshot
    RemoteShipSpawned {
        player_id: String,
        ship_class: ShipClass,
    },
    /// A ship we were tracking vanished from the latest snapshot
    RemoteShipDespawned { player_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    Joined,
    RemoteShipSpawned,
    RemoteShipDespawned,
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::Joined { .. } => GameEventKind::Joined,
            GameEvent::RemoteShipSpawned { .. } => GameEventKind::RemoteShipSpawned,
            GameEvent::RemoteShipDespawned { .. } => GameEventKind::RemoteShipDespawned,
        }
    }
}

type Listener = Box<dyn FnMut(&GameEvent) + Send>;

/// Listener registry keyed by event kind
pub struct EventBus {
    listeners: HashMap<GameEventKind, Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Registers a listener for one event kind. Listeners cannot be
    /// removed individually; they live as long as the bus does.
    pub fn subscribe<F>(&mut self, kind: GameEventKind, listener: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(listener));
    }

    /// Calls every listener subscribed to the event's kind, in
    /// subscription order. Publishing with no listeners is a no-op.
    pub fn publish(&mut self, event: &GameEvent) {
        if let Some(listeners) = self.listeners.get_mut(&event.kind()) {
            for listener in listeners.iter_mut() {
                listener(event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_publish_reaches_matching_kind_only() {
        let mut bus = EventBus::new();
        let joins = Arc::new(AtomicUsize::new(0));
        let spawns = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&joins);
        bus.subscribe(GameEventKind::Joined, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&spawns);
        bus.subscribe(GameEventKind::RemoteShipSpawned, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&GameEvent::Joined {
            player_id: "AB12CD".to_string(),
        });
        bus.publish(&GameEvent::Joined {
            player_id: "AB12CD".to_string(),
        });

        assert_eq!(joins.load(Ordering::SeqCst), 2);
        assert_eq!(spawns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listeners_receive_event_payload() {
        let mut bus = EventBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        bus.subscribe(GameEventKind::RemoteShipDespawned, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let event = GameEvent::RemoteShipDespawned {
            player_id: "FF00AA".to_string(),
        };
        bus.publish(&event);

        assert_eq!(received.lock().unwrap().as_slice(), &[event]);
    }

    #[test]
    fn test_multiple_listeners_run_in_subscription_order() {
        let mut bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            bus.subscribe(GameEventKind::Joined, move |_| {
                sink.lock().unwrap().push(tag);
            });
        }

        bus.publish(&GameEvent::Joined {
            player_id: "AB12CD".to_string(),
        });

        assert_eq!(order.lock().unwrap().as_slice(), &["first", "second", "third"]);
    }

    #[test]
    fn test_publish_without_listeners_is_a_no_op() {
        let mut bus = EventBus::new();
        bus.publish(&GameEvent::Joined {
            player_id: "AB12CD".to_string(),
        });
    }
}
