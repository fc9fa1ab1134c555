//! The six faces of a cubesphere and their orthonormal bases.

use glam::{DMat3, DVec3};

/// The six faces of the cube that is inflated into the planet sphere.
///
/// Each variant corresponds to the face whose outward normal points along
/// the named axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// +X face
    PosX = 0,
    /// −X face
    NegX = 1,
    /// +Y face
    PosY = 2,
    /// −Y face
    NegY = 3,
    /// +Z face
    PosZ = 4,
    /// −Z face
    NegZ = 5,
}

impl CubeFace {
    /// All six faces in index order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Stable index of this face in `0..6`.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Face for an index in `0..6`, `None` otherwise.
    #[must_use]
    pub fn from_index(index: usize) -> Option<CubeFace> {
        Self::ALL.get(index).copied()
    }

    /// The face on the other side of the planet.
    #[must_use]
    pub fn opposite(self) -> CubeFace {
        match self {
            CubeFace::PosX => CubeFace::NegX,
            CubeFace::NegX => CubeFace::PosX,
            CubeFace::PosY => CubeFace::NegY,
            CubeFace::NegY => CubeFace::PosY,
            CubeFace::PosZ => CubeFace::NegZ,
            CubeFace::NegZ => CubeFace::PosZ,
        }
    }

    /// Outward unit normal. This is the face-local `+Z` axis.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::X,
            CubeFace::NegX => DVec3::NEG_X,
            CubeFace::PosY => DVec3::Y,
            CubeFace::NegY => DVec3::NEG_Y,
            CubeFace::PosZ => DVec3::Z,
            CubeFace::NegZ => DVec3::NEG_Z,
        }
    }

    /// World direction of the face-local `+X` axis.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::NEG_Z,
            CubeFace::NegX => DVec3::Z,
            CubeFace::PosY => DVec3::X,
            CubeFace::NegY => DVec3::X,
            CubeFace::PosZ => DVec3::X,
            CubeFace::NegZ => DVec3::NEG_X,
        }
    }

    /// World direction of the face-local `+Y` axis.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        match self {
            CubeFace::PosX => DVec3::Y,
            CubeFace::NegX => DVec3::Y,
            CubeFace::PosY => DVec3::NEG_Z,
            CubeFace::NegY => DVec3::Z,
            CubeFace::PosZ => DVec3::Y,
            CubeFace::NegZ => DVec3::Y,
        }
    }

    /// Rotation taking face-local axes to world axes.
    ///
    /// Columns are `[tangent, bitangent, normal]`, a right-handed basis.
    #[must_use]
    pub fn basis(self) -> DMat3 {
        DMat3::from_cols(self.tangent(), self.bitangent(), self.normal())
    }

    /// The face whose normal is most aligned with `direction`.
    ///
    /// Ties on cube edges resolve to the lower face index.
    #[must_use]
    pub fn dominant(direction: DVec3) -> CubeFace {
        let mut best = CubeFace::PosX;
        let mut best_dot = f64::NEG_INFINITY;
        for face in Self::ALL {
            let d = face.normal().dot(direction);
            if d > best_dot {
                best = face;
                best_dot = d;
            }
        }
        best
    }
}
