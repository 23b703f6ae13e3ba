//! Core types: math re-exports, Camera, drag rotation.

pub use glam::{Mat4, Vec2, Vec3, vec3};

pub mod camera;
pub mod orbit;
