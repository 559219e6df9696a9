pub mod assemble;

use crate::error::Error;
use crate::palette::{Palette, PALETTE_LEN};
use crate::placer::CubePlacer;
use nalgebra::{Matrix4, Vector3};

/// Sentinel group id meaning "the scene root".
pub const NO_GROUP: u32 = u32::MAX;

/// A dense-grid scene as materialized by the external container decoder:
/// flat per-voxel color-index grids plus a group/instance hierarchy. This
/// crate never parses the container's raw bytes.
pub struct VoxScene {
    pub models: Vec<VoxModel>,
    pub palette: [[u8; 4]; PALETTE_LEN],
    pub groups: Vec<VoxGroup>,
    pub instances: Vec<VoxInstance>,
}

pub struct VoxModel {
    pub size: Vector3<u32>,
    /// Color indexes, x-major, then y, then z; 0 is "no voxel".
    pub voxels: Vec<u8>,
}

pub struct VoxGroup {
    pub parent: u32,
    /// Basis vectors in rows, translation in the last row.
    pub transform: Matrix4<f64>,
    pub hidden: bool,
    pub name: Option<String>,
}

pub struct VoxInstance {
    pub group: u32,
    pub model: u32,
    pub transform: Matrix4<f64>,
    pub hidden: bool,
    pub name: Option<String>,
}

/// Walks a dense grid and pushes every solid voxel with all six faces
/// visible; the dense format carries no occlusion information.
pub fn place_model(
    model: &VoxModel,
    palette: &Palette,
    placer: &mut impl CubePlacer,
) -> Result<(), Error> {
    let cells = model.size.x as u64 * model.size.y as u64 * model.size.z as u64;
    if model.voxels.len() as u64 != cells {
        return Err(Error::ModelGrid {
            expected: cells,
            actual: model.voxels.len(),
        });
    }
    let mut grid = model.voxels.iter();
    for z in 0..model.size.z as i32 {
        for y in 0..model.size.y as i32 {
            for x in 0..model.size.x as i32 {
                let Some(&index) = grid.next() else { return Ok(()) };
                if index != 0 {
                    placer.place(Vector3::new(x, y, z), palette.color(index), 0x3f);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
use crate::placer::points::PointCubePlacer;

#[test]
fn empty_indexes_are_skipped() {
    let model = VoxModel {
        size: Vector3::new(2, 1, 1),
        voxels: vec![0, 5],
    };
    let mut entries = [[0; 4]; PALETTE_LEN];
    entries[5] = [255, 0, 51, 255];
    let palette = Palette::from_rgba(&entries);
    let mut placer = PointCubePlacer::new();
    place_model(&model, &palette, &mut placer).unwrap();
    let buffer = placer.into_buffer();
    assert_eq!(buffer.positions, [Vector3::new(1., 0., 0.)]);
    assert_eq!(buffer.colors, [Vector3::new(1., 0., 51. / 255.)]);
}

#[test]
fn grid_walk_is_x_major() {
    let model = VoxModel {
        size: Vector3::new(2, 2, 2),
        voxels: vec![0, 0, 0, 1, 0, 0, 1, 0],
    };
    let palette = Palette::from_rgba(&[[0; 4]; PALETTE_LEN]);
    let mut placer = PointCubePlacer::new();
    place_model(&model, &palette, &mut placer).unwrap();
    let buffer = placer.into_buffer();
    assert_eq!(buffer.positions, [Vector3::new(1., 1., 0.), Vector3::new(0., 1., 1.)]);
}

#[test]
fn mismatched_grid_fails_without_output() {
    let model = VoxModel {
        size: Vector3::new(2, 2, 2),
        voxels: vec![1; 7],
    };
    let palette = Palette::from_rgba(&[[0; 4]; PALETTE_LEN]);
    let mut placer = PointCubePlacer::new();
    let error = place_model(&model, &palette, &mut placer);
    assert!(matches!(error, Err(Error::ModelGrid { expected: 8, actual: 7 })));
    assert!(placer.into_buffer().positions.is_empty());
}
