//! Session tracking and authoritative ship state for the game server
//!
//! This module owns the server side of every connected player, including:
//! - Session lifecycle (join, leave) and id assignment
//! - The latest input command per session, defaulting to a zero command
//! - Per-tick integration of every ship under its stored input
//!
//! The registry is only ever touched from the server's event loop task, so
//! it needs no locking. Connection tasks reach it indirectly through the
//! event channel in the network layer.

use log::info;
use rand::Rng;
use shared::physics::integrate;
use shared::protocol::PlayerInputData;
use shared::ShipState;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Length of a session id on the wire.
pub const SESSION_ID_LEN: usize = 6;

/// Alphabet session ids are drawn from (uppercase hex).
pub const SESSION_ID_ALPHABET: &[u8] = b"ABCDEF0123456789";

/// One connected player and everything the server knows about them
///
/// Each session couples:
/// - The id handed to the client in its join acknowledgement
/// - The outbound frame channel of the connection's writer task
/// - The authoritative ship state advanced by the tick loop
/// - The most recent input command, overwritten on every arrival
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier assigned by the registry
    pub id: String,
    /// Queue into this connection's writer task
    pub sender: mpsc::Sender<Message>,
    /// Authoritative ship state for this player
    pub ship: ShipState,
    /// Latest input command; a zero command until the first one arrives
    pub last_input: PlayerInputData,
}

impl Session {
    /// Creates a session with a freshly spawned ship and a zero input
    /// command, so a player who never sends input simply drifts nowhere.
    pub fn new(id: String, sender: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            sender,
            ship: ShipState::new(),
            last_input: PlayerInputData::default(),
        }
    }
}

/// Owns every live session and every id ever handed out
///
/// The registry enforces the two id guarantees the protocol relies on:
/// no two live sessions share an id, and an id is never reassigned to a
/// later session even after its original owner left. Ship simulation is
/// driven through [`SessionRegistry::integrate_all`] once per tick.
pub struct SessionRegistry {
    /// Live sessions indexed by their id
    sessions: HashMap<String, Session>,
    /// Every id ever issued, including ids of departed sessions
    issued_ids: HashSet<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            issued_ids: HashSet::new(),
        }
    }

    /// Draws a random id and retries until it has never been issued
    /// before. Six uppercase-hex characters give 16.7M combinations, so
    /// retries stay rare at any plausible player count.
    fn generate_id(&mut self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..SESSION_ID_LEN)
                .map(|_| {
                    let idx = rng.gen_range(0..SESSION_ID_ALPHABET.len());
                    SESSION_ID_ALPHABET[idx] as char
                })
                .collect();

            if self.issued_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Registers a new session and returns its assigned id
    ///
    /// The ship spawns with the default loadout at the origin. The caller
    /// is expected to queue the join acknowledgement on the session's
    /// sender before the next tick broadcasts state.
    pub fn join(&mut self, sender: mpsc::Sender<Message>) -> String {
        let id = self.generate_id();
        info!("Player {} joined", id);
        self.sessions.insert(id.clone(), Session::new(id.clone(), sender));
        id
    }

    /// Removes a session
    ///
    /// Dropping the session also drops its outbound sender, which lets the
    /// connection's writer task wind down. Returns true if the session was
    /// found and removed, false if it was already gone.
    pub fn leave(&mut self, session_id: &str) -> bool {
        if let Some(session) = self.sessions.remove(session_id) {
            info!("Player {} left", session.id);
            true
        } else {
            false
        }
    }

    /// Stores the latest input command for a session
    ///
    /// Unconditionally overwrites whatever command was stored before;
    /// only the newest command matters to the next tick. Returns false
    /// if no session with that id is live, in which case the command is
    /// simply dropped.
    pub fn set_input(&mut self, session_id: &str, input: PlayerInputData) -> bool {
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.last_input = input;
            true
        } else {
            false
        }
    }

    /// Advances every ship by one timestep under its stored command
    ///
    /// Called exactly once per tick by the scheduler. Sessions that have
    /// never sent input integrate under the zero command, which leaves a
    /// freshly spawned ship exactly where it is.
    pub fn integrate_all(&mut self, dt: f32) {
        for session in self.sessions.values_mut() {
            integrate(&mut session.ship, &session.last_input, dt);
        }
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Iterates over all live sessions, for snapshot building
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Returns the number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session is live
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Returns true if this id was ever handed out, live or not
    pub fn was_issued(&self, session_id: &str) -> bool {
        self.issued_ids.contains(session_id)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
