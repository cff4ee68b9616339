use serde::{Deserialize, Serialize};

use crate::physics::Vector2;
use crate::ABILITY_SLOTS;

///Hull class of a ship. Serializes to its name on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipClass {
    Small,
    Medium,
    Large,
}

///Handling profile of a hull class. All speeds are world units per second,
///rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipStats {
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub reverse_max_speed: f32,
    pub turn_acceleration: f32,
    pub mass: f32,
}

const SMALL_STATS: ShipStats = ShipStats {
    max_speed: 5.0,
    acceleration: 0.1,
    deceleration: 0.05,
    reverse_max_speed: 2.0,
    turn_acceleration: 0.8,
    mass: 1.0,
};

const MEDIUM_STATS: ShipStats = ShipStats {
    max_speed: 4.0,
    acceleration: 0.08,
    deceleration: 0.03,
    reverse_max_speed: 1.5,
    turn_acceleration: 0.6,
    mass: 1.5,
};

const LARGE_STATS: ShipStats = ShipStats {
    max_speed: 3.0,
    acceleration: 0.05,
    deceleration: 0.02,
    reverse_max_speed: 1.0,
    turn_acceleration: 0.4,
    mass: 2.0,
};

impl ShipClass {
    ///Returns the handling profile for this hull class.
    pub fn stats(&self) -> &'static ShipStats {
        match self {
            ShipClass::Small => &SMALL_STATS,
            ShipClass::Medium => &MEDIUM_STATS,
            ShipClass::Large => &LARGE_STATS,
        }
    }
}

///Authoritative state of one ship. Position and velocity live in world
///units, rotation in degrees within [0, 360).
#[derive(Debug, Clone)]
pub struct ShipState {
    pub position: Vector2,
    pub rotation: f32,
    pub velocity: Vector2,
    pub acceleration: Vector2,
    pub ship_class: ShipClass,
    pub active_weapons: Vec<String>,
    pub abilities_unlocked: Vec<bool>,
}

impl ShipState {
    ///A freshly spawned ship: Small hull at the origin, facing rotation 0,
    ///no weapons, all ability slots locked.
    pub fn new() -> Self {
        ShipState {
            position: Vector2::default(),
            rotation: 0.0,
            velocity: Vector2::default(),
            acceleration: Vector2::default(),
            ship_class: ShipClass::Small,
            active_weapons: Vec::new(),
            abilities_unlocked: vec![false; ABILITY_SLOTS],
        }
    }
}

impl Default for ShipState {
    fn default() -> Self {
        Self::new()
    }
}
