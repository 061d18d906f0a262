//! Player Input
//!
//! Held-key flags as last reported by a client, and the movement axis the
//! engine derives from them. Flags persist between ticks until the next
//! input message overwrites them.

use crate::core::vec2::Vec2;
use crate::game::court::MOVE_DEAD_ZONE;

/// Raw held-key state for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    /// Move left key held
    pub left: bool,
    /// Move right key held
    pub right: bool,
    /// Move down key held
    pub down: bool,
    /// Move up key held
    pub up: bool,
    /// Pass/shoot key held
    pub space: bool,
}

impl InputState {
    /// Input with no keys held.
    pub const fn idle() -> Self {
        Self {
            left: false,
            right: false,
            down: false,
            up: false,
            space: false,
        }
    }

    /// Unit movement direction, or ZERO inside the dead zone.
    ///
    /// Each axis contributes -1, 0, or +1; opposed keys cancel, and the
    /// resulting vector is normalized so diagonals are not faster.
    pub fn move_direction(&self) -> Vec2 {
        let mut v = Vec2::ZERO;
        if self.left {
            v.x -= 1.0;
        }
        if self.right {
            v.x += 1.0;
        }
        if self.down {
            v.y -= 1.0;
        }
        if self.up {
            v.y += 1.0;
        }

        if v.length() > MOVE_DEAD_ZONE {
            v.normalize_or_zero()
        } else {
            Vec2::ZERO
        }
    }

    /// Whether any movement key resolves to motion.
    #[inline]
    pub fn has_movement(&self) -> bool {
        self.move_direction() != Vec2::ZERO
    }
}
