//! Face frames: the fixed transform between a face's local patch space and
//! world space, and the cube-to-sphere projection used by LOD and meshing.
//!
//! Face-local coordinates put the face plane at `z = radius` around the
//! planet centre, with `x` and `y` spanning `[-radius, radius]`. Patch
//! meshes are stored relative to the face centre on the cube surface (the
//! local origin of [`FaceFrame::local_to_world`]), so a vertex at local
//! `(x, y, 0)` lies on the cube face itself.

use glam::{DMat4, DVec2, DVec3};

use crate::CubeFace;

/// Immutable placement of one cube face on a planet of a given radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceFrame {
    face: CubeFace,
    radius: f64,
    local_to_world: DMat4,
}

impl FaceFrame {
    /// Build the frame for `face` on a planet of `radius`.
    #[must_use]
    pub fn new(face: CubeFace, radius: f64) -> Self {
        let local_to_world = DMat4::from_cols(
            face.tangent().extend(0.0),
            face.bitangent().extend(0.0),
            face.normal().extend(0.0),
            (face.normal() * radius).extend(1.0),
        );
        Self {
            face,
            radius,
            local_to_world,
        }
    }

    /// All six frames for a planet, in [`CubeFace::ALL`] order.
    #[must_use]
    pub fn all(radius: f64) -> [FaceFrame; 6] {
        CubeFace::ALL.map(|face| FaceFrame::new(face, radius))
    }

    /// The face this frame places.
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Planet radius the frame was built for.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Affine transform from patch-local space to world space.
    #[must_use]
    pub fn local_to_world(&self) -> DMat4 {
        self.local_to_world
    }

    /// Unit direction from the planet centre through face-local point `p`,
    /// expressed in face-local axes.
    #[inline]
    #[must_use]
    pub fn local_direction(&self, p: DVec2) -> DVec3 {
        DVec3::new(p.x, p.y, self.radius).normalize()
    }

    /// Transform a patch-local point to world space.
    #[inline]
    #[must_use]
    pub fn to_world(&self, p: DVec3) -> DVec3 {
        self.local_to_world.transform_point3(p)
    }

    /// Rotate a face-local direction into world space.
    #[inline]
    #[must_use]
    pub fn to_world_direction(&self, v: DVec3) -> DVec3 {
        self.local_to_world.transform_vector3(v)
    }

    /// World-space point on the sphere surface above face-local point `p`.
    #[must_use]
    pub fn project_to_sphere(&self, p: DVec2) -> DVec3 {
        self.to_world_direction(self.local_direction(p)) * self.radius
    }

    /// World-space point on the cube surface at face-local point `p`.
    #[must_use]
    pub fn cube_point(&self, p: DVec2) -> DVec3 {
        self.to_world(p.extend(0.0))
    }
}
