//! Court Geometry and Gameplay Tuning
//!
//! All gameplay constants in one place. Distances are in court units
//! (the court is 8x8); times are in seconds.

use crate::core::vec2::Vec2;

/// Size of the playing field.
pub const COURT: Vec2 = Vec2::new(8.0, 8.0);

/// Player footprint (square side length).
pub const PLAYER_SIZE: f32 = 3.0 / 90.0;

/// Ball footprint (square side length).
pub const BALL_SIZE: f32 = 2.0 / 90.0;

/// Center of the red team's zone (and red spawn point).
pub const RED_ZONE_POSITION: Vec2 = Vec2::new(6.0, 6.75);

/// Center of the blue team's zone (and blue spawn point).
pub const BLUE_ZONE_POSITION: Vec2 = Vec2::new(2.0, 1.25);

/// Full-health zone dimensions; the collidable footprint scales with health.
pub const ZONE_DIMENSIONS: Vec2 = Vec2::new(1.75, 1.0);

/// Base movement speed, units per second.
pub const PLAYER_SPEED: f32 = 1.5;

/// Movement speed multiplier while carrying the ball.
pub const CARRY_SPEED_FACTOR: f32 = 0.8;

/// Scales the carrier's last movement into a carry offset.
pub const CARRY_OFFSET_FACTOR: f32 = 8.0;

/// Smoothing weight of the newly computed carry offset.
pub const OFFSET_SMOOTH_NEW: f32 = 0.4;

/// Smoothing weight of the previous carry offset. Sums to 1 with the above,
/// so the offset converges without a positional pop when direction changes.
pub const OFFSET_SMOOTH_OLD: f32 = 0.6;

/// Stun applied to a carrier whose ball is intercepted, seconds.
pub const STUN_DURATION: f32 = 1.5;

/// Zone health lost per second of ball contact.
pub const ZONE_DEPLETION_RATE: f32 = 0.05;

/// Pause between a zone reaching zero health and the round resetting.
pub const ROUND_COOLDOWN: f32 = 3.0;

/// Cap on the seconds of pass charge that contribute to shot power.
pub const MAX_PASS_CHARGE: f32 = 1.0;

/// Shot speed for an (effectively) uncharged release.
pub const MIN_LAUNCH_POWER: f32 = 1.0;

/// Shot speed gained per second of (capped) charge.
pub const LAUNCH_FACTOR: f32 = 3.0;

/// Velocity multiplier applied each free-flight integration step.
pub const BALL_FRICTION: f32 = 0.98;

/// Below this speed the ball stops outright instead of creeping forever.
pub const BALL_MIN_SPEED: f32 = 0.01;

/// Grace period after shooting during which the shooter cannot re-acquire.
pub const SHOOT_GHOSTING_TIME: f32 = 1.0;

/// Multiplier turning the raw footprints into the collision/clip extent
/// used for ball clamping and ball acquisition.
pub const FOOTPRINT_SCALE: f32 = 3.5;

/// Input vectors at or below this magnitude produce no movement
/// (opposed keys cancel into the dead zone).
pub const MOVE_DEAD_ZONE: f32 = 0.5;

/// Directions shorter than this are treated as degenerate when shooting.
pub const DIRECTION_EPSILON: f32 = 1e-9;

/// Clamp a position into the court, inset by `half_extent` on each axis.
#[inline]
pub fn clamp_to_court(position: Vec2, half_extent: f32) -> Vec2 {
    position.clamp_axes(
        Vec2::new(half_extent, half_extent),
        Vec2::new(COURT.x - half_extent, COURT.y - half_extent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_smoothing_weights_sum_to_one() {
        assert_eq!(OFFSET_SMOOTH_NEW + OFFSET_SMOOTH_OLD, 1.0);
    }

    #[test]
    fn test_clamp_to_court() {
        let half = PLAYER_SIZE / 2.0;

        let inside = Vec2::new(4.0, 4.0);
        assert_eq!(clamp_to_court(inside, half), inside);

        let low = clamp_to_court(Vec2::new(-1.0, 0.0), half);
        assert_eq!(low.x, half);
        assert_eq!(low.y, half);

        let high = clamp_to_court(Vec2::new(9.0, 8.0), half);
        assert_eq!(high.x, COURT.x - half);
        assert_eq!(high.y, COURT.y - half);
    }

    #[test]
    fn test_spawn_points_inside_court() {
        let half = PLAYER_SIZE / 2.0;
        assert_eq!(clamp_to_court(RED_ZONE_POSITION, half), RED_ZONE_POSITION);
        assert_eq!(clamp_to_court(BLUE_ZONE_POSITION, half), BLUE_ZONE_POSITION);
    }
}
