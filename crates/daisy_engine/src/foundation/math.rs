//! Math types for 3D rendering
//!
//! Thin aliases over nalgebra so the rest of the engine reads in graphics
//! vocabulary.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Full turn in radians, used to wrap accumulating rotation angles.
pub const TAU: f32 = 2.0 * std::f32::consts::PI;
