//! Game objects and their transforms

use std::rc::Rc;

use crate::foundation::math::{Mat4, Vec3, TAU};
use crate::render::vulkan::Model;

/// Unique identifier for a game object
pub type GameObjectId = u64;

/// Euler-angle transform: translation, per-axis scale, and Tait-Bryan
/// rotation angles in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub translation: Vec3,
    /// Per-axis scale factors
    pub scale: Vec3,
    /// Rotation angles in radians, applied in Y, X, Z order
    pub rotation: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Vec3::zeros(),
        }
    }
}

impl Transform {
    /// Compose the model matrix `translate * Ry * Rx * Rz * scale`.
    ///
    /// Closed form of the Tait-Bryan YXZ product with the scale folded into
    /// the rotation columns, avoiding four intermediate matrix multiplies
    /// per object per frame.
    pub fn mat4(&self) -> Mat4 {
        let c3 = self.rotation.z.cos();
        let s3 = self.rotation.z.sin();
        let c2 = self.rotation.x.cos();
        let s2 = self.rotation.x.sin();
        let c1 = self.rotation.y.cos();
        let s1 = self.rotation.y.sin();

        let sx = self.scale.x;
        let sy = self.scale.y;
        let sz = self.scale.z;

        Mat4::new(
            sx * (c1 * c3 + s1 * s2 * s3),
            sy * (c3 * s1 * s2 - c1 * s3),
            sz * (c2 * s1),
            self.translation.x,
            sx * (c2 * s3),
            sy * (c2 * c3),
            sz * (-s2),
            self.translation.y,
            sx * (c1 * s2 * s3 - c3 * s1),
            sy * (c1 * c3 * s2 + s1 * s3),
            sz * (c1 * c2),
            self.translation.z,
            0.0,
            0.0,
            0.0,
            1.0,
        )
    }
}

/// Per-frame rotation increments for the illustrative spin
const SPIN_Y_PER_FRAME: f32 = 0.01;
const SPIN_X_PER_FRAME: f32 = 0.005;

/// Advance the illustrative spin animation by one frame, keeping the
/// accumulated angles wrapped so they never grow without bound.
pub fn advance_animation(transform: &mut Transform) {
    transform.rotation.y = (transform.rotation.y + SPIN_Y_PER_FRAME) % TAU;
    transform.rotation.x = (transform.rotation.x + SPIN_X_PER_FRAME) % TAU;
}

/// A renderable entity: identity, optional shared mesh, color, transform
pub struct GameObject {
    /// Stable identity assigned by the world
    pub id: GameObjectId,
    /// Mesh to draw; `None` renders nothing but still animates
    pub model: Option<Rc<Model>>,
    /// Object color pushed to the shaders
    pub color: Vec3,
    /// World-space transform
    pub transform: Transform,
}

/// Owns game-object identity allocation.
///
/// Ids are unique for the lifetime of the world and never reused.
#[derive(Default)]
pub struct GameObjectWorld {
    next_id: GameObjectId,
}

impl GameObjectWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new game object with a fresh id and default state.
    pub fn spawn(&mut self) -> GameObject {
        let id = self.next_id;
        self.next_id += 1;

        GameObject {
            id,
            model: None,
            color: Vec3::zeros(),
            transform: Transform::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    fn reference_matrix(transform: &Transform) -> Mat4 {
        let translation = Mat4::new_translation(&transform.translation);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), transform.rotation.y)
            .to_homogeneous();
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), transform.rotation.x)
            .to_homogeneous();
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), transform.rotation.z)
            .to_homogeneous();
        let scale = Mat4::new_nonuniform_scaling(&transform.scale);
        translation * ry * rx * rz * scale
    }

    #[test]
    fn default_transform_is_identity() {
        let transform = Transform::default();
        assert_relative_eq!(transform.mat4(), Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let transform = Transform {
            translation: Vec3::new(1.0, -2.0, 3.5),
            ..Default::default()
        };
        let m = transform.mat4();
        assert_relative_eq!(m[(0, 3)], 1.0);
        assert_relative_eq!(m[(1, 3)], -2.0);
        assert_relative_eq!(m[(2, 3)], 3.5);
        assert_relative_eq!(m[(3, 3)], 1.0);
    }

    #[test]
    fn closed_form_matches_matrix_product() {
        let transform = Transform {
            translation: Vec3::new(0.3, -1.2, 2.0),
            scale: Vec3::new(0.5, 2.0, 1.5),
            rotation: Vec3::new(0.7, -0.4, 1.9),
        };
        assert_relative_eq!(
            transform.mat4(),
            reference_matrix(&transform),
            epsilon = 1e-5
        );
    }

    #[test]
    fn animation_advances_and_wraps() {
        let mut transform = Transform {
            rotation: Vec3::new(TAU - 0.001, TAU - 0.001, 0.0),
            ..Default::default()
        };
        advance_animation(&mut transform);

        assert!(transform.rotation.y < TAU);
        assert!(transform.rotation.x < TAU);
        assert_relative_eq!(transform.rotation.y, 0.009, epsilon = 1e-5);
        assert_relative_eq!(transform.rotation.x, 0.004, epsilon = 1e-5);
        // Z never animates
        assert_relative_eq!(transform.rotation.z, 0.0);
    }

    #[test]
    fn world_assigns_unique_ids() {
        let mut world = GameObjectWorld::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 1);
        assert_eq!(c.id, 2);
    }

    #[test]
    fn spawned_objects_start_bare() {
        let mut world = GameObjectWorld::new();
        let object = world.spawn();
        assert!(object.model.is_none());
        assert_eq!(object.transform, Transform::default());
    }
}
