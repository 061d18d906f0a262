//! Protocol Messages
//!
//! Fixed-layout binary wire format between server and client. All multi-byte
//! integers and IEEE-754 floats are big-endian. Each direction has exactly
//! one message shape, distinguished by a leading tag byte; an unknown tag is
//! a protocol violation that kills the connection.
//!
//! ```text
//! input (client -> server), 6 bytes:
//!   tag 'b' | left | right | down | up | space        (nonzero = pressed)
//!
//! snapshot (server -> client), 20 + 10n bytes:
//!   tag 'm' | player count u16 | recipient just-stunned u8 |
//!   red health f32 | blue health f32 | ball x f32 | ball y f32 |
//!   per player: x f32 | y f32 | team u8 | stunned u8
//! ```
//!
//! Everything after the recipient's just-stunned byte is identical for every
//! client, so the server encodes that tail once per tick and stitches a
//! fresh 4-byte prefix on per recipient.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::core::vec2::Vec2;
use crate::game::input::InputState;
use crate::game::state::{GameState, Team};

// =============================================================================
// LAYOUT CONSTANTS
// =============================================================================

/// Tag byte of a client input message.
pub const INPUT_TAG: u8 = b'b';

/// Tag byte of a server snapshot message.
pub const SNAPSHOT_TAG: u8 = b'm';

/// Total size of an input message.
pub const INPUT_MESSAGE_LEN: usize = 6;

/// Snapshot tag byte plus the player count field.
pub const SNAPSHOT_HEADER_LEN: usize = 3;

/// Recipient stun byte, both zone healths, and the ball position.
pub const SNAPSHOT_FIXED_BODY_LEN: usize = 17;

/// Bytes per player entry in a snapshot.
pub const SNAPSHOT_PER_PLAYER_LEN: usize = 10;

/// Total size of a snapshot carrying `player_count` players.
#[inline]
pub const fn snapshot_len(player_count: usize) -> usize {
    SNAPSHOT_HEADER_LEN + SNAPSHOT_FIXED_BODY_LEN + player_count * SNAPSHOT_PER_PLAYER_LEN
}

// =============================================================================
// ERRORS
// =============================================================================

/// A malformed frame. Fatal to the connection it arrived on; the rest of the
/// server keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Leading byte did not match any known message tag.
    #[error("unexpected message tag {0:#04x}")]
    UnexpectedTag(u8),

    /// Frame shorter than its declared layout requires.
    #[error("frame truncated: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes the layout requires.
        needed: usize,
        /// Bytes actually handed over.
        got: usize,
    },
}

// =============================================================================
// INPUT MESSAGE
// =============================================================================

/// Decode a complete 6-byte input frame.
///
/// Pressed-state bytes are compared as nonzero, not as strict booleans;
/// clients historically send key repeat counts here.
pub fn decode_input(frame: &[u8]) -> Result<InputState, ProtocolError> {
    if frame.len() < INPUT_MESSAGE_LEN {
        return Err(ProtocolError::Truncated {
            needed: INPUT_MESSAGE_LEN,
            got: frame.len(),
        });
    }
    if frame[0] != INPUT_TAG {
        return Err(ProtocolError::UnexpectedTag(frame[0]));
    }
    Ok(InputState {
        left: frame[1] != 0,
        right: frame[2] != 0,
        down: frame[3] != 0,
        up: frame[4] != 0,
        space: frame[5] != 0,
    })
}

/// Encode an input frame (the client half of the contract; the server only
/// uses this in tests).
pub fn encode_input(input: &InputState) -> [u8; INPUT_MESSAGE_LEN] {
    [
        INPUT_TAG,
        input.left as u8,
        input.right as u8,
        input.down as u8,
        input.up as u8,
        input.space as u8,
    ]
}

// =============================================================================
// SNAPSHOT MESSAGE
// =============================================================================

/// One player's entry in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotPlayer {
    /// Player position.
    pub position: Vec2,
    /// Player team.
    pub team: Team,
    /// Whether the player is currently stunned.
    pub stunned: bool,
}

/// A decoded snapshot, as the receiving peer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Whether the recipient itself was stunned this tick.
    pub just_stunned: bool,
    /// Red zone health.
    pub red_zone_health: f32,
    /// Blue zone health.
    pub blue_zone_health: f32,
    /// Ball position.
    pub ball_position: Vec2,
    /// All players, in the server's stable roster order.
    pub players: Vec<SnapshotPlayer>,
}

/// Per-tick snapshot encoder.
///
/// Encodes the shared tail once from the authoritative state; each
/// recipient's frame is then the 3-byte header plus its own stun byte plus
/// that tail, copied verbatim.
pub struct SnapshotEncoder {
    player_count: u16,
    shared_tail: Bytes,
}

impl SnapshotEncoder {
    /// Encode the shared portion of this tick's snapshot.
    pub fn from_state(state: &GameState) -> Self {
        let player_count = state.players.len() as u16;

        let mut tail = BytesMut::with_capacity(
            SNAPSHOT_FIXED_BODY_LEN - 1 + state.players.len() * SNAPSHOT_PER_PLAYER_LEN,
        );
        tail.put_f32(state.red_zone_health);
        tail.put_f32(state.blue_zone_health);
        tail.put_f32(state.ball.position.x);
        tail.put_f32(state.ball.position.y);

        for player in state.players.values() {
            tail.put_f32(player.position.x);
            tail.put_f32(player.position.y);
            tail.put_u8(player.team.as_byte());
            tail.put_u8(player.is_stunned() as u8);
        }

        Self {
            player_count,
            shared_tail: tail.freeze(),
        }
    }

    /// Build the complete frame for one recipient.
    pub fn frame_for(&self, just_stunned: bool) -> Bytes {
        let mut frame = BytesMut::with_capacity(4 + self.shared_tail.len());
        frame.put_u8(SNAPSHOT_TAG);
        frame.put_u16(self.player_count);
        frame.put_u8(just_stunned as u8);
        frame.extend_from_slice(&self.shared_tail);
        frame.freeze()
    }

    /// Number of players this snapshot carries.
    pub fn player_count(&self) -> u16 {
        self.player_count
    }
}

/// Decode a complete snapshot frame, header included.
///
/// The caller (the framer) has already sized the frame from the declared
/// player count; the length checks here are the backstop for hand-fed input.
pub fn decode_snapshot(frame: &[u8]) -> Result<Snapshot, ProtocolError> {
    if frame.len() < SNAPSHOT_HEADER_LEN {
        return Err(ProtocolError::Truncated {
            needed: SNAPSHOT_HEADER_LEN,
            got: frame.len(),
        });
    }
    if frame[0] != SNAPSHOT_TAG {
        return Err(ProtocolError::UnexpectedTag(frame[0]));
    }

    let mut buf = &frame[1..];
    let player_count = buf.get_u16() as usize;

    let needed = snapshot_len(player_count);
    if frame.len() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            got: frame.len(),
        });
    }

    let just_stunned = buf.get_u8() != 0;
    let red_zone_health = buf.get_f32();
    let blue_zone_health = buf.get_f32();
    let ball_position = Vec2::new(buf.get_f32(), buf.get_f32());

    let mut players = Vec::with_capacity(player_count);
    for _ in 0..player_count {
        let position = Vec2::new(buf.get_f32(), buf.get_f32());
        let team = Team::from_byte(buf.get_u8());
        let stunned = buf.get_u8() != 0;
        players.push(SnapshotPlayer {
            position,
            team,
            stunned,
        });
    }

    Ok(Snapshot {
        just_stunned,
        red_zone_health,
        blue_zone_health,
        ball_position,
        players,
    })
}

// =============================================================================
// TESTS
// =============================================================================
