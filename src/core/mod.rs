//! Core primitives shared by the simulation and the wire codec.

pub mod vec2;

pub use vec2::Vec2;
