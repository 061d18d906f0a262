//! Network Layer
//!
//! TCP server and the binary wire format for real-time play.
//! This layer is **non-deterministic** - all game logic runs through `game/`.

pub mod framer;
pub mod protocol;
pub mod server;

pub use framer::{InputFramer, SnapshotFramer};
pub use protocol::{
    decode_input, decode_snapshot, encode_input, ProtocolError, Snapshot, SnapshotEncoder,
    SnapshotPlayer,
};
pub use server::{GameServer, ServerConfig, ServerError, ShutdownHandle, DEFAULT_PORT};
