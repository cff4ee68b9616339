use crate::protocol::PlayerInputData;
use crate::ship::ShipState;

///Represents a vector in 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    ///Value along the x-axis.
    /// Positive direction is to the right.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is up; ships thrust toward negative y.
    pub y: f32,
}

impl Vector2 {
    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2 { x: 0.0, y: 0.0 }
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

///Advances one ship by one fixed timestep under the given input command.
///
///Horizontal input turns the hull (positive turns clockwise, so rotation
///decreases), vertical input thrusts along the current heading where
///forward is negative y. With no vertical input the stored acceleration
///decays geometrically and a mass-scaled drag bleeds off velocity. Speed
///is clamped against the forward or reverse limit depending on the sign
///of the vertical input. Deterministic: the same state, input and dt
///always produce the same result.
pub fn integrate(ship: &mut ShipState, input: &PlayerInputData, dt: f32) {
    let stats = ship.ship_class.stats();

    if input.horizontal != 0.0 {
        let effective_turn = stats.turn_acceleration / stats.mass;
        ship.rotation = (ship.rotation - input.horizontal * effective_turn * dt).rem_euclid(360.0);
    }

    let rotation_rad = ship.rotation.to_radians();

    if input.vertical != 0.0 {
        let base_accel = stats.acceleration / stats.mass;
        // Forward is negative y
        ship.acceleration = Vector2 {
            x: rotation_rad.sin() * base_accel * -input.vertical,
            y: rotation_rad.cos() * base_accel * -input.vertical,
        };
    } else {
        ship.acceleration = ship.acceleration.scale(1.0 - stats.deceleration);
    }

    ship.velocity = ship.velocity.add(&ship.acceleration.scale(dt));

    // Mass-based drag only applies while coasting
    if input.vertical == 0.0 {
        let drag = stats.deceleration / stats.mass;
        ship.velocity = ship.velocity.scale(1.0 - drag * dt);
    }

    let speed = ship.velocity.magnitude();
    let speed_limit = if input.vertical >= 0.0 {
        stats.max_speed
    } else {
        stats.reverse_max_speed
    };
    if speed > speed_limit {
        ship.velocity = ship.velocity.scale(speed_limit / speed);
    }

    ship.position = ship.position.add(&ship.velocity.scale(dt));
}
