//! # Zoneball Game Server
//!
//! Authoritative simulation and TCP protocol for Zoneball, a two-team arena
//! game: carry the ball into the enemy zone to shrink it, defend your own.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ZONEBALL SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Math primitives                           │
//! │  └── vec2.rs     - 2D float vector                           │
//! │                                                              │
//! │  game/           - Game logic (authoritative)                │
//! │  ├── court.rs    - Court geometry and tuning constants       │
//! │  ├── input.rs    - Held-key flags and movement axes          │
//! │  ├── state.rs    - Players, ball, zones, round cooldown      │
//! │  └── tick.rs     - Per-tick simulation step                  │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── protocol.rs - Binary message encode/decode              │
//! │  ├── framer.rs   - Per-connection stream framing             │
//! │  └── server.rs   - TCP server and simulation loop            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Model
//!
//! Clients only ever send held-key flags; every gameplay outcome is decided
//! here and published through snapshots. The `game/` modules never touch the
//! network, and the server loop owns the one mutable [`game::GameState`], so
//! there is no cross-task state to guard.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::vec2::Vec2;
pub use game::input::InputState;
pub use game::state::{Ball, GameState, PlayerId, PlayerState, Team};
pub use network::server::{GameServer, ServerConfig, DEFAULT_PORT};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
