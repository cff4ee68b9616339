//! Wire protocol shared by server and client.
//!
//! Every frame on the socket is a UTF-8 JSON envelope with three fields:
//! a `type` tag, an optional `playerId` and an optional `data` string. The
//! `data` field is itself JSON, encoded a second time, so payload schemas
//! can evolve without touching the envelope. Payload structs here mirror
//! the wire names exactly (camelCase).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::physics::Vector2;
use crate::ship::ShipClass;

/// The closed set of envelope type tags. Decoding fails outright on a tag
/// outside this set instead of falling through a string compare.
///
/// Only `PlayerJoined`, `PlayerInput` and `GameState` carry behavior today;
/// the remaining tags are reserved extension points that both sides accept
/// and ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    PlayerJoined,
    PlayerInput,
    GameState,
    ShipUpgrade,
    WeaponUpgrade,
    AbilityUse,
    PlayerLeft,
    Error,
}

/// Reasons a frame or payload is rejected. Malformed traffic is logged and
/// dropped by the caller; nothing here tears down a connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unparsable envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
    #[error("{kind:?} message missing playerId")]
    MissingPlayerId { kind: MessageType },
    #[error("{kind:?} message missing data payload")]
    MissingPayload { kind: MessageType },
    #[error("{kind:?} payload did not parse: {source}")]
    MalformedPayload {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },
    #[error("message encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// The envelope around every frame. `data` holds a double-encoded JSON
/// payload whose schema depends on `message_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(rename = "playerId", default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl NetworkMessage {
    /// The join acknowledgement carrying the newly assigned session id.
    pub fn player_joined(player_id: &str) -> Self {
        NetworkMessage {
            message_type: MessageType::PlayerJoined,
            player_id: Some(player_id.to_string()),
            data: None,
        }
    }

    /// An input command frame sent from a client.
    pub fn player_input(player_id: &str, input: &PlayerInputData) -> Result<Self, ProtocolError> {
        Ok(NetworkMessage {
            message_type: MessageType::PlayerInput,
            player_id: Some(player_id.to_string()),
            data: Some(serde_json::to_string(input).map_err(ProtocolError::Encode)?),
        })
    }

    /// A snapshot frame. Carries no `playerId`; the recipient is implied by
    /// the connection it is sent over.
    pub fn game_state(state: &GameStateData) -> Result<Self, ProtocolError> {
        Ok(NetworkMessage {
            message_type: MessageType::GameState,
            player_id: None,
            data: Some(serde_json::to_string(state).map_err(ProtocolError::Encode)?),
        })
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(ProtocolError::MalformedEnvelope)
    }

    /// The sender id, required for routing. An absent or empty `playerId`
    /// counts as missing.
    pub fn required_player_id(&self) -> Result<&str, ProtocolError> {
        self.player_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ProtocolError::MissingPlayerId {
                kind: self.message_type,
            })
    }

    fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let raw = self.data.as_deref().ok_or(ProtocolError::MissingPayload {
            kind: self.message_type,
        })?;
        serde_json::from_str(raw).map_err(|source| ProtocolError::MalformedPayload {
            kind: self.message_type,
            source,
        })
    }

    pub fn input_payload(&self) -> Result<PlayerInputData, ProtocolError> {
        self.payload()
    }

    pub fn game_state_payload(&self) -> Result<GameStateData, ProtocolError> {
        self.payload()
    }
}

/// A position as it travels on the wire. Conversion to and from the
/// simulation vector type is always spelled out through these two
/// functions, never implicit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WirePosition {
    pub x: f32,
    pub y: f32,
}

impl WirePosition {
    pub fn to_vector2(&self) -> Vector2 {
        Vector2 {
            x: self.x,
            y: self.y,
        }
    }

    pub fn from_vector2(v: &Vector2) -> WirePosition {
        WirePosition { x: v.x, y: v.y }
    }
}

/// `PlayerInput` payload: raw axis values in [-1, 1] plus the sender's
/// clock in milliseconds since the Unix epoch. The timestamp is advisory;
/// the server never gates on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInputData {
    pub horizontal: f32,
    pub vertical: f32,
    pub timestamp: u64,
}

/// One ship as seen by one recipient. `is_enemy` is relative to whoever
/// the snapshot is built for, so the same tick serializes differently per
/// connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipSnapshot {
    pub player_id: String,
    pub position: WirePosition,
    pub rotation: f32,
    pub ship_class: ShipClass,
    pub is_enemy: bool,
    pub active_weapons: Vec<String>,
    pub abilities_unlocked: Vec<bool>,
}

/// `GameState` payload: every live ship plus the server clock at build
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateData {
    pub ships: Vec<ShipSnapshot>,
    pub server_time: u64,
}

/// Milliseconds since the Unix epoch.
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
