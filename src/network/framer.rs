//! Message Framing
//!
//! Per-connection byte queues. TCP reads carry no message boundaries: a
//! frame may arrive split across any number of reads, or several frames may
//! arrive in one. The framers here accumulate bytes and hand out complete
//! messages only, leaving partial tails buffered for the next poll.

use bytes::{Buf, BytesMut};

use crate::game::input::InputState;
use crate::network::protocol::{
    decode_input, decode_snapshot, snapshot_len, ProtocolError, Snapshot, INPUT_MESSAGE_LEN,
    SNAPSHOT_HEADER_LEN,
};

// =============================================================================
// SERVER SIDE: INPUT FRAMES
// =============================================================================

/// Accumulates a client's byte stream and extracts 6-byte input messages.
#[derive(Debug, Default)]
pub struct InputFramer {
    buf: BytesMut,
}

impl InputFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly received bytes to the queue.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete input message, if one is buffered.
    ///
    /// `Ok(None)` means "not enough bytes yet, try after the next read".
    /// A decode error is a protocol violation; the connection is done and
    /// the residual buffer contents are meaningless.
    pub fn next_input(&mut self) -> Result<Option<InputState>, ProtocolError> {
        if self.buf.len() < INPUT_MESSAGE_LEN {
            return Ok(None);
        }
        let input = decode_input(&self.buf[..INPUT_MESSAGE_LEN])?;
        self.buf.advance(INPUT_MESSAGE_LEN);
        Ok(Some(input))
    }

    /// Bytes currently waiting in the queue.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

// =============================================================================
// CLIENT SIDE: SNAPSHOT FRAMES
// =============================================================================

/// Accumulates the server's byte stream and extracts snapshot messages.
///
/// Snapshots are variable-length: the required size is recomputed from the
/// declared player count (`3 + 17 + count * 10`) before anything is consumed,
/// so a "count arrived, body still in flight" state simply waits.
#[derive(Debug, Default)]
pub struct SnapshotFramer {
    buf: BytesMut,
}

impl SnapshotFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly received bytes to the queue.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete snapshot, if one is buffered.
    pub fn next_snapshot(&mut self) -> Result<Option<Snapshot>, ProtocolError> {
        if self.buf.len() < SNAPSHOT_HEADER_LEN {
            return Ok(None);
        }
        // Tag is validated before the length so garbage can't stall the
        // stream by declaring an enormous count.
        if self.buf[0] != crate::network::protocol::SNAPSHOT_TAG {
            return Err(ProtocolError::UnexpectedTag(self.buf[0]));
        }

        let player_count = u16::from_be_bytes([self.buf[1], self.buf[2]]) as usize;
        let needed = snapshot_len(player_count);
        if self.buf.len() < needed {
            return Ok(None);
        }

        let snapshot = decode_snapshot(&self.buf[..needed])?;
        self.buf.advance(needed);
        Ok(Some(snapshot))
    }

    /// Bytes currently waiting in the queue.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
