//! Cube-sphere geometry: the six cube faces and the frames that place
//! face-local terrain patches onto the planet sphere.

mod cube_face;
mod face_frame;

pub use cube_face::CubeFace;
pub use face_frame::FaceFrame;
