//! Game State Definitions
//!
//! All authoritative state for one round of Zoneball. The engine owns every
//! player, the ball, and both zones exclusively; the network layer only ever
//! sees this state between ticks. Uses BTreeMap so player iteration order is
//! stable and ties resolve deterministically.

use std::collections::BTreeMap;

use crate::core::vec2::Vec2;
use crate::game::court::{BLUE_ZONE_POSITION, COURT, RED_ZONE_POSITION};
use crate::game::input::InputState;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier.
///
/// Allocated from a monotonic counter at connect time, never reused within a
/// process run. Implements Ord for deterministic BTreeMap ordering and for
/// ball-acquisition tie-breaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

// =============================================================================
// TEAM
// =============================================================================

/// Which zone a player defends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Team {
    /// Blue team, defending the lower-left zone.
    #[default]
    Blue = 0,
    /// Red team, defending the upper-right zone.
    Red = 1,
}

impl Team {
    /// Spawn point for this team (the center of its own zone).
    #[inline]
    pub fn spawn_position(self) -> Vec2 {
        match self {
            Team::Blue => BLUE_ZONE_POSITION,
            Team::Red => RED_ZONE_POSITION,
        }
    }

    /// Wire encoding of the team byte.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decode a wire team byte; nonzero means red.
    #[inline]
    pub fn from_byte(byte: u8) -> Self {
        if byte != 0 {
            Team::Red
        } else {
            Team::Blue
        }
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single connected player.
#[derive(Clone, Debug)]
pub struct PlayerState {
    /// Current position, always inside the court inset by half the footprint.
    pub position: Vec2,

    /// Displacement applied on the most recent tick. Orients the ball-carry
    /// offset and serves as a shot-direction fallback.
    pub last_move: Vec2,

    /// Team, fixed at connect time.
    pub team: Team,

    /// Seconds of stun remaining; immobile and cannot acquire while > 0.
    pub stunned_remaining: f32,

    /// True only for the tick in which a stun began; consumed when that
    /// player's next snapshot is sent.
    pub just_stunned: bool,

    /// Whether this player currently carries the ball. Mirrors
    /// `Ball::carrier`; the engine keeps the two in lockstep.
    pub has_ball: bool,

    /// Seconds space has been held while carrying.
    pub pass_charge: f32,

    /// Grace period after shooting during which this player cannot
    /// re-acquire the ball.
    pub shoot_ghosting_remaining: f32,

    /// Most recent raw input flags received from this connection.
    pub input: InputState,
}

impl PlayerState {
    /// Create a freshly connected player at its team spawn.
    pub fn new(team: Team) -> Self {
        Self {
            position: team.spawn_position(),
            last_move: Vec2::ZERO,
            team,
            stunned_remaining: 0.0,
            just_stunned: false,
            has_ball: false,
            pass_charge: 0.0,
            shoot_ghosting_remaining: 0.0,
            input: InputState::idle(),
        }
    }

    /// Whether the player is currently stunned.
    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stunned_remaining > 0.0
    }

    /// Clear per-round transient fields and return to the team spawn.
    /// Input flags persist; held keys stay held across a round reset.
    fn reset_for_round(&mut self) {
        self.position = self.team.spawn_position();
        self.last_move = Vec2::ZERO;
        self.stunned_remaining = 0.0;
        self.just_stunned = false;
        self.has_ball = false;
        self.pass_charge = 0.0;
        self.shoot_ghosting_remaining = 0.0;
    }
}

// =============================================================================
// BALL
// =============================================================================

/// The singleton ball.
#[derive(Clone, Debug)]
pub struct Ball {
    /// Current position.
    pub position: Vec2,

    /// Free-flight velocity; meaningful only while uncarried.
    pub velocity: Vec2,

    /// Current carrier, as a roster key. Never a reference: removing a
    /// player can never leave this dangling, only stale, and the engine
    /// clears it on disconnect.
    pub carrier: Option<PlayerId>,

    /// Smoothed carry offset from the previous tick.
    pub last_offset: Vec2,

    /// Displacement the ball made on the most recent carried tick.
    pub last_move: Vec2,
}

impl Ball {
    /// Ball centered in the court, at rest, uncarried.
    fn centered() -> Self {
        Self {
            position: COURT * 0.5,
            velocity: Vec2::ZERO,
            carrier: None,
            last_offset: Vec2::ZERO,
            last_move: Vec2::ZERO,
        }
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete authoritative state of the arena.
#[derive(Clone, Debug)]
pub struct GameState {
    /// All connected players, iterated in PlayerId order.
    pub players: BTreeMap<PlayerId, PlayerState>,

    /// The ball.
    pub ball: Ball,

    /// Red zone health in [0, 1]; scales the zone's collidable footprint.
    pub red_zone_health: f32,

    /// Blue zone health in [0, 1].
    pub blue_zone_health: f32,

    /// Seconds until the round resets. Zero means the round is active;
    /// while positive no physics runs except this countdown.
    pub cooldown: f32,

    /// Next PlayerId to hand out.
    next_player_id: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Create the initial round layout with an empty roster.
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            ball: Ball::centered(),
            red_zone_health: 1.0,
            blue_zone_health: 1.0,
            cooldown: 0.0,
            next_player_id: 0,
        }
    }

    /// Reset everything but the roster to the initial round layout.
    ///
    /// Ball recentered and stopped, zones back to full health, every
    /// player's transient state cleared and position back at its spawn.
    pub fn reset_round(&mut self) {
        self.ball = Ball::centered();
        self.red_zone_health = 1.0;
        self.blue_zone_health = 1.0;
        self.cooldown = 0.0;

        for player in self.players.values_mut() {
            player.reset_for_round();
        }
    }

    /// Add a player on connection-open, assigning it to the smaller team.
    /// Ties favor blue.
    pub fn connect(&mut self) -> PlayerId {
        let reds = self
            .players
            .values()
            .filter(|p| p.team == Team::Red)
            .count();
        let blues = self.players.len() - reds;

        let team = if reds < blues { Team::Red } else { Team::Blue };

        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players.insert(id, PlayerState::new(team));
        id
    }

    /// Remove a player on connection-close.
    ///
    /// If it carried the ball, the ball is dropped in place with zero
    /// velocity. Unknown ids are ignored (close can race a violation kick).
    pub fn disconnect(&mut self, id: PlayerId) {
        if self.players.remove(&id).is_none() {
            return;
        }
        if self.ball.carrier == Some(id) {
            self.ball.carrier = None;
            self.ball.velocity = Vec2::ZERO;
        }
    }

    /// Overwrite a player's held-key flags with freshly received input.
    pub fn apply_input(&mut self, id: PlayerId, input: InputState) {
        if let Some(player) = self.players.get_mut(&id) {
            player.input = input;
        }
    }

    /// The current carrier's state, if any.
    pub fn carrier(&self) -> Option<&PlayerState> {
        self.ball.carrier.and_then(|id| self.players.get(&id))
    }

    /// Whether the round is waiting out its end-of-round cooldown.
    #[inline]
    pub fn round_over(&self) -> bool {
        self.cooldown > 0.0
    }

    /// Players on a given team.
    pub fn team_size(&self, team: Team) -> usize {
        self.players.values().filter(|p| p.team == team).count()
    }

    /// Carrier/has_ball agreement, checked from tests and debug assertions.
    pub fn carrier_consistent(&self) -> bool {
        let flagged = self.players.values().filter(|p| p.has_ball).count();
        match self.ball.carrier {
            Some(id) => {
                flagged == 1 && self.players.get(&id).map(|p| p.has_ball) == Some(true)
            }
            None => flagged == 0,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
