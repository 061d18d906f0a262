//! Game Logic Module
//!
//! All simulation code. Owns the authoritative state and never touches the
//! network; the server feeds it inputs and elapsed time, nothing else.
//!
//! ## Module Structure
//!
//! - `court`: court geometry and gameplay tuning constants
//! - `input`: per-player held-key flags
//! - `state`: players, ball, zones, round cooldown
//! - `tick`: the per-tick state transition

pub mod court;
pub mod input;
pub mod state;
pub mod tick;

// Re-export key types
pub use input::InputState;
pub use state::{Ball, GameState, PlayerId, PlayerState, Team};
pub use tick::tick;
