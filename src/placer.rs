pub mod mesh;
pub mod points;

use nalgebra::Vector3;

/// Only the finest level is ever turned into geometry. Coarser levels are
/// decoded and discarded; they exist in the slab format for consumers outside
/// this crate.
pub const RENDERED_LEVEL: u32 = 0;

/// Shared sink for decoded voxel samples. The decoders push every solid voxel
/// through this interface; the caller picks which synthesizer consumes the
/// stream via [`GeometryKind`].
///
/// `sides` is a 6-bit face-visibility mask, low to high: -x, +x, -z, +z,
/// +y, -y.
pub trait CubePlacer {
    fn set_level(&mut self, level: u32);

    fn set_centroid(&mut self, centroid: Vector3<f32>);

    fn place(&mut self, position: Vector3<i32>, color: Vector3<f32>, sides: u8);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GeometryKind {
    Mesh,
    Points,
}
