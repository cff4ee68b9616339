//! Client view of the world: authoritative snapshots in, smooth poses out

use log::{debug, warn};
use shared::physics::Vector2;
use shared::protocol::GameStateData;
use shared::ShipClass;
use std::collections::{HashMap, HashSet};

use crate::events::{EventBus, GameEvent};

/// Fraction-per-second rate at which remote ships close the gap to
/// their latest snapshot pose
pub const REMOTE_LERP_RATE: f32 = 10.0;

/// Where the session stands with the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected but not yet acknowledged; snapshots are ignored
    Unjoined,
    /// Acknowledged under this server-assigned id
    Joined(String),
}

/// The locally controlled ship. Snapshots overwrite it outright so the
/// pose on screen is exactly the server's.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalShip {
    pub position: Vector2,
    pub rotation: f32,
    pub ship_class: ShipClass,
    pub active_weapons: Vec<String>,
    pub abilities_unlocked: Vec<bool>,
}

/// Another player's ship, eased toward its snapshot target instead of
/// teleporting on every server frame
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteShip {
    pub position: Vector2,
    pub rotation: f32,
    pub ship_class: ShipClass,
    pub active_weapons: Vec<String>,
    pub abilities_unlocked: Vec<bool>,
    target_position: Vector2,
    target_rotation: f32,
}

impl RemoteShip {
    fn advance(&mut self, dt: f32) {
        let t = (REMOTE_LERP_RATE * dt).clamp(0.0, 1.0);
        self.position.x += (self.target_position.x - self.position.x) * t;
        self.position.y += (self.target_position.y - self.position.y) * t;
        let delta = shortest_arc(self.rotation, self.target_rotation);
        self.rotation = (self.rotation + delta * t).rem_euclid(360.0);
    }
}

/// Degrees from `from` to `to` along the shorter way around, in [-180, 180)
fn shortest_arc(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    if delta >= 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Reconciles server snapshots into presentable state
pub struct ClientWorld {
    phase: SessionPhase,
    local: Option<LocalShip>,
    remotes: HashMap<String, RemoteShip>,
}

impl ClientWorld {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Unjoined,
            local: None,
            remotes: HashMap::new(),
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_joined(&self) -> bool {
        matches!(self.phase, SessionPhase::Joined(_))
    }

    /// Our server-assigned id once the join ack has arrived
    pub fn local_id(&self) -> Option<&str> {
        match &self.phase {
            SessionPhase::Joined(id) => Some(id),
            SessionPhase::Unjoined => None,
        }
    }

    pub fn local(&self) -> Option<&LocalShip> {
        self.local.as_ref()
    }

    pub fn remotes(&self) -> &HashMap<String, RemoteShip> {
        &self.remotes
    }

    /// Handles the join acknowledgement. A second ack for an already
    /// joined session is logged and ignored.
    pub fn on_player_joined(&mut self, player_id: String, events: &mut EventBus) {
        if let SessionPhase::Joined(current) = &self.phase {
            warn!(
                "Ignoring join ack for {} (already joined as {})",
                player_id, current
            );
            return;
        }
        self.phase = SessionPhase::Joined(player_id.clone());
        events.publish(&GameEvent::Joined { player_id });
    }

    /// Folds one snapshot into the world: the local ship is hard-set,
    /// remote targets are updated, unseen remotes spawn and missing
    /// ones despawn with an event each. Snapshots that arrive before
    /// the join ack are dropped because there is no id to reconcile
    /// against yet.
    pub fn apply_snapshot(&mut self, state: &GameStateData, events: &mut EventBus) {
        let local_id = match &self.phase {
            SessionPhase::Joined(id) => id.clone(),
            SessionPhase::Unjoined => {
                debug!("Ignoring snapshot that arrived before the join ack");
                return;
            }
        };

        let mut seen: HashSet<&str> = HashSet::new();

        for entry in &state.ships {
            if entry.player_id == local_id {
                self.local = Some(LocalShip {
                    position: entry.position.to_vector2(),
                    rotation: entry.rotation,
                    ship_class: entry.ship_class,
                    active_weapons: entry.active_weapons.clone(),
                    abilities_unlocked: entry.abilities_unlocked.clone(),
                });
                continue;
            }

            seen.insert(entry.player_id.as_str());

            match self.remotes.get_mut(&entry.player_id) {
                Some(remote) => {
                    remote.target_position = entry.position.to_vector2();
                    remote.target_rotation = entry.rotation;
                    remote.ship_class = entry.ship_class;
                    remote.active_weapons = entry.active_weapons.clone();
                    remote.abilities_unlocked = entry.abilities_unlocked.clone();
                }
                None => {
                    // First sight: spawn directly at the snapshot pose
                    let position = entry.position.to_vector2();
                    self.remotes.insert(
                        entry.player_id.clone(),
                        RemoteShip {
                            position,
                            rotation: entry.rotation,
                            ship_class: entry.ship_class,
                            active_weapons: entry.active_weapons.clone(),
                            abilities_unlocked: entry.abilities_unlocked.clone(),
                            target_position: position,
                            target_rotation: entry.rotation,
                        },
                    );
                    events.publish(&GameEvent::RemoteShipSpawned {
                        player_id: entry.player_id.clone(),
                        ship_class: entry.ship_class,
                    });
                }
            }
        }

        let departed: Vec<String> = self
            .remotes
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        for player_id in departed {
            self.remotes.remove(&player_id);
            events.publish(&GameEvent::RemoteShipDespawned { player_id });
        }
    }

    /// Eases every remote ship toward its target. The local ship is
    /// untouched; only snapshots move it.
    pub fn advance(&mut self, dt: f32) {
        for remote in self.remotes.values_mut() {
            remote.advance(dt);
        }
    }
}

impl Default for ClientWorld {
    fn default() -> Self {
        Self::new()
    }
}
