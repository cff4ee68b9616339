pub mod physics;
pub mod protocol;
pub mod ship;

pub use physics::{integrate, Vector2};
pub use ship::{ShipClass, ShipState, ShipStats};

pub const TICK_RATE: u32 = 60;
pub const TICK_DT: f32 = 1.0 / 60.0;
pub const ABILITY_SLOTS: usize = 3;
