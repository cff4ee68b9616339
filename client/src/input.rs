//! Input sampling with change detection on the release edge

use shared::protocol::{timestamp_ms, PlayerInputData};

/// Decides which sampled axis states become wire commands
///
/// While either axis is nonzero every sample goes out, because the
/// server applies the latest command on every tick and a stream of
/// identical commands is what keeps thrust alive on its side. When
/// both axes return to zero exactly one zero command is sent so the
/// server knows to start coasting, and steady rest sends nothing.
pub struct InputSampler {
    last_horizontal: f32,
    last_vertical: f32,
}

impl InputSampler {
    pub fn new() -> Self {
        Self {
            last_horizontal: 0.0,
            last_vertical: 0.0,
        }
    }

    /// Clamps both axes to [-1, 1] and returns the command to send,
    /// if this sample warrants one.
    pub fn sample(&mut self, horizontal: f32, vertical: f32) -> Option<PlayerInputData> {
        let horizontal = horizontal.clamp(-1.0, 1.0);
        let vertical = vertical.clamp(-1.0, 1.0);

        let active = horizontal != 0.0 || vertical != 0.0;
        let released = !active && (self.last_horizontal != 0.0 || self.last_vertical != 0.0);

        self.last_horizontal = horizontal;
        self.last_vertical = vertical;

        if active || released {
            Some(PlayerInputData {
                horizontal,
                vertical,
                timestamp: timestamp_ms(),
            })
        } else {
            None
        }
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_idle_sampler_sends_nothing() {
        let mut sampler = InputSampler::new();
        assert!(sampler.sample(0.0, 0.0).is_none());
        assert!(sampler.sample(0.0, 0.0).is_none());
    }

    #[test]
    fn test_active_axes_send_every_sample() {
        let mut sampler = InputSampler::new();
        for _ in 0..5 {
            let input = sampler.sample(0.5, 1.0).unwrap();
            assert_approx_eq!(input.horizontal, 0.5);
            assert_approx_eq!(input.vertical, 1.0);
        }
    }

    #[test]
    fn test_release_sends_exactly_one_zero_command() {
        let mut sampler = InputSampler::new();
        assert!(sampler.sample(0.0, 1.0).is_some());

        let release = sampler.sample(0.0, 0.0).unwrap();
        assert_approx_eq!(release.horizontal, 0.0);
        assert_approx_eq!(release.vertical, 0.0);

        assert!(sampler.sample(0.0, 0.0).is_none());
    }

    #[test]
    fn test_axes_are_clamped_to_unit_range() {
        let mut sampler = InputSampler::new();
        let input = sampler.sample(3.5, -7.0).unwrap();
        assert_approx_eq!(input.horizontal, 1.0);
        assert_approx_eq!(input.vertical, -1.0);
    }

    #[test]
    fn test_commands_carry_a_wall_clock_timestamp() {
        let mut sampler = InputSampler::new();
        let input = sampler.sample(0.0, 1.0).unwrap();
        assert!(input.timestamp > 0);
    }
}
