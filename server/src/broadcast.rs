//! Snapshot assembly and per-recipient fan-out

use log::warn;
use shared::protocol::{timestamp_ms, GameStateData, NetworkMessage, ShipSnapshot, WirePosition};
use tokio_tungstenite::tungstenite::Message;

use crate::session::SessionRegistry;

/// Builds the world as one recipient should see it this tick.
///
/// Every live ship is included, the recipient's own among them. The
/// `isEnemy` flag is relative: false exactly for the ship whose id matches
/// the recipient. The server clock is sampled at build time, so two
/// recipients in the same tick may see timestamps a few microseconds
/// apart.
pub fn build_snapshot(registry: &SessionRegistry, recipient_id: &str) -> GameStateData {
    let ships = registry
        .sessions()
        .map(|session| ShipSnapshot {
            player_id: session.id.clone(),
            position: WirePosition::from_vector2(&session.ship.position),
            rotation: session.ship.rotation,
            ship_class: session.ship.ship_class,
            is_enemy: session.id != recipient_id,
            active_weapons: session.ship.active_weapons.clone(),
            abilities_unlocked: session.ship.abilities_unlocked.clone(),
        })
        .collect();

    GameStateData {
        ships,
        server_time: timestamp_ms(),
    }
}

/// Queues the current tick's snapshot on every live session.
///
/// Each recipient gets its own encoding of the state. A recipient whose
/// outbound queue is full or whose writer task already went away is
/// skipped with a log line; one bad connection never stalls the tick or
/// the other recipients.
pub fn broadcast_all(registry: &SessionRegistry) {
    for recipient in registry.sessions() {
        let state = build_snapshot(registry, &recipient.id);
        let json = match NetworkMessage::game_state(&state).and_then(|msg| msg.encode()) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode snapshot for {}: {}", recipient.id, e);
                continue;
            }
        };

        if let Err(e) = recipient.sender.try_send(Message::Text(json)) {
            warn!("Dropping snapshot for {}: {}", recipient.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::{MessageType, PlayerInputData};
    use shared::{ShipClass, TICK_DT};
    use tokio::sync::mpsc;

    fn drive(registry: &mut SessionRegistry, id: &str, vertical: f32, ticks: u32) {
        registry.set_input(
            id,
            PlayerInputData {
                horizontal: 0.0,
                vertical,
                timestamp: 0,
            },
        );
        for _ in 0..ticks {
            registry.integrate_all(TICK_DT);
        }
    }

    #[test]
    fn test_snapshot_is_recipient_relative() {
        let mut registry = SessionRegistry::new();
        let (tx1, _rx1) = mpsc::channel(8);
        let (tx2, _rx2) = mpsc::channel(8);
        let alpha = registry.join(tx1);
        let beta = registry.join(tx2);

        let for_alpha = build_snapshot(&registry, &alpha);
        assert_eq!(for_alpha.ships.len(), 2);
        for ship in &for_alpha.ships {
            assert_eq!(ship.is_enemy, ship.player_id != alpha);
        }

        let for_beta = build_snapshot(&registry, &beta);
        for ship in &for_beta.ships {
            assert_eq!(ship.is_enemy, ship.player_id != beta);
        }
    }

    #[test]
    fn test_snapshot_mirrors_ship_state() {
        let mut registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        let id = registry.join(tx);

        drive(&mut registry, &id, 1.0, 30);

        let state = build_snapshot(&registry, &id);
        let entry = &state.ships[0];
        let ship = &registry.get(&id).unwrap().ship;

        assert_eq!(entry.player_id, id);
        assert_eq!(entry.position.to_vector2(), ship.position);
        assert_eq!(entry.rotation, ship.rotation);
        assert_eq!(entry.ship_class, ShipClass::Small);
        assert!(entry.active_weapons.is_empty());
        assert_eq!(entry.abilities_unlocked, vec![false, false, false]);
        assert!(state.server_time > 0);
    }

    #[test]
    fn test_broadcast_queues_one_frame_per_recipient() {
        let mut registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let alpha = registry.join(tx1);
        let _beta = registry.join(tx2);

        broadcast_all(&registry);

        let frame = rx1.try_recv().unwrap();
        let raw = match frame {
            Message::Text(raw) => raw,
            other => panic!("expected a text frame, got {:?}", other),
        };
        let msg = NetworkMessage::decode(&raw).unwrap();
        assert_eq!(msg.message_type, MessageType::GameState);
        assert!(msg.player_id.is_none());

        let state = msg.game_state_payload().unwrap();
        assert_eq!(state.ships.len(), 2);
        let own = state.ships.iter().find(|s| s.player_id == alpha).unwrap();
        assert!(!own.is_enemy);

        assert!(rx2.try_recv().is_ok());
        assert!(rx1.try_recv().is_err(), "exactly one frame per tick");
    }

    #[test]
    fn test_broadcast_survives_dead_recipient() {
        let mut registry = SessionRegistry::new();
        let (tx1, rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let _gone = registry.join(tx1);
        let alive = registry.join(tx2);

        // Writer task is gone; its channel rejects all sends
        drop(rx1);

        broadcast_all(&registry);

        let frame = rx2.try_recv().unwrap();
        let raw = match frame {
            Message::Text(raw) => raw,
            other => panic!("expected a text frame, got {:?}", other),
        };
        let state = NetworkMessage::decode(&raw)
            .unwrap()
            .game_state_payload()
            .unwrap();
        assert!(state.ships.iter().any(|s| s.player_id == alive));
    }

    #[test]
    fn test_broadcast_skips_full_queue_without_stalling() {
        let mut registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::channel(1);
        let (tx2, mut rx2) = mpsc::channel(8);
        let _stuck = registry.join(tx1);
        let _fine = registry.join(tx2);

        // First tick fills the capacity-one queue, second must drop
        broadcast_all(&registry);
        broadcast_all(&registry);

        // Capacity one: the second frame was dropped, not queued
        assert!(rx1.try_recv().is_ok());
        assert!(rx1.try_recv().is_err());

        // The healthy recipient got both ticks
        assert!(rx2.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }
}
