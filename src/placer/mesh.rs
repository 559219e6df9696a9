use crate::error::Error;
use crate::placer::{CubePlacer, RENDERED_LEVEL};
use crate::scene::{Layer, NodeKind, NodePath};
use nalgebra::Vector3;

/// Face-culled cube mesh. Every quad carries its own color and normal, so
/// vertices are never shared between faces; each placed cube contributes 8
/// fresh points whether or not all of them end up referenced.
pub struct MeshBuffer {
    pub points: Vec<Vector3<f32>>,
    pub face_vertex_indices: Vec<u32>,
    pub face_vertex_counts: Vec<u32>,
    pub colors: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
}

// Corner i of the cube takes the positive half-extent on axis a iff bit a of
// i is set. The quads below wind outward with respect to their normal.
const SIDE_INDICES: [[u32; 4]; 6] = [
    [0, 4, 6, 2], // left
    [5, 1, 3, 7], // right
    [1, 0, 2, 3], // back
    [4, 5, 7, 6], // front
    [6, 7, 3, 2], // top
    [0, 1, 5, 4], // bottom
];

const SIDE_NORMALS: [Vector3<f32>; 6] = [
    Vector3::new(-1., 0., 0.),
    Vector3::new(1., 0., 0.),
    Vector3::new(0., 0., -1.),
    Vector3::new(0., 0., 1.),
    Vector3::new(0., 1., 0.),
    Vector3::new(0., -1., 0.),
];

pub struct MeshCubePlacer {
    buffer: MeshBuffer,
    level: u32,
    centroid: Vector3<f32>,
}

impl MeshCubePlacer {
    pub fn new() -> MeshCubePlacer {
        MeshCubePlacer {
            buffer: MeshBuffer {
                points: Vec::new(),
                face_vertex_indices: Vec::new(),
                face_vertex_counts: Vec::new(),
                colors: Vec::new(),
                normals: Vec::new(),
            },
            level: RENDERED_LEVEL,
            centroid: Vector3::zeros(),
        }
    }

    pub fn into_buffer(self) -> MeshBuffer {
        self.buffer
    }

    pub fn write_node(self, layer: &mut Layer, path: NodePath) -> Result<(), Error> {
        layer.create_node(path, NodeKind::Mesh(self.buffer))?;
        Ok(())
    }
}

impl Default for MeshCubePlacer {
    fn default() -> MeshCubePlacer {
        MeshCubePlacer::new()
    }
}

impl CubePlacer for MeshCubePlacer {
    fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    fn set_centroid(&mut self, centroid: Vector3<f32>) {
        self.centroid = centroid;
    }

    fn place(&mut self, position: Vector3<i32>, color: Vector3<f32>, sides: u8) {
        if self.level != RENDERED_LEVEL {
            return;
        }
        let center = position.cast::<f32>() - self.centroid;
        let low = center.add_scalar(-0.5);
        let high = center.add_scalar(0.5);
        let base = self.buffer.points.len() as u32;
        for corner in 0..8 {
            self.buffer.points.push(Vector3::new(
                if corner & 1 != 0 { high.x } else { low.x },
                if corner & 2 != 0 { high.y } else { low.y },
                if corner & 4 != 0 { high.z } else { low.z },
            ));
        }
        for side in 0..6 {
            if sides & (1 << side) == 0 {
                continue;
            }
            for index in SIDE_INDICES[side] {
                self.buffer.face_vertex_indices.push(base + index);
            }
            self.buffer.face_vertex_counts.push(4);
            self.buffer.colors.push(color);
            self.buffer.normals.push(SIDE_NORMALS[side]);
        }
    }
}

#[test]
fn full_mask_places_a_whole_cube() {
    let mut placer = MeshCubePlacer::new();
    placer.place(Vector3::new(0, 0, 0), Vector3::new(1., 0.5, 0.), 0x3f);
    let buffer = placer.into_buffer();
    assert_eq!(buffer.points.len(), 8);
    assert_eq!(buffer.face_vertex_counts, [4; 6]);
    assert_eq!(buffer.face_vertex_indices.len(), 24);
    assert_eq!(buffer.colors, [Vector3::new(1., 0.5, 0.); 6]);
    for expected in SIDE_NORMALS {
        assert_eq!(buffer.normals.iter().filter(|&&normal| normal == expected).count(), 1);
    }
}

#[test]
fn quads_wind_outward() {
    let mut placer = MeshCubePlacer::new();
    placer.place(Vector3::new(0, 0, 0), Vector3::zeros(), 0x3f);
    let buffer = placer.into_buffer();
    for (quad, normal) in buffer.face_vertex_indices.chunks_exact(4).zip(&buffer.normals) {
        let a = buffer.points[quad[0] as usize];
        let b = buffer.points[quad[1] as usize];
        let c = buffer.points[quad[2] as usize];
        let winding = (b - a).cross(&(c - a));
        assert_eq!(winding.normalize(), *normal);
    }
}

#[test]
fn mask_bits_select_faces() {
    let mut placer = MeshCubePlacer::new();
    placer.place(Vector3::new(0, 0, 0), Vector3::zeros(), 0b010001);
    let buffer = placer.into_buffer();
    assert_eq!(buffer.points.len(), 8);
    assert_eq!(buffer.face_vertex_counts.len(), 2);
    assert_eq!(buffer.normals, [Vector3::new(-1., 0., 0.), Vector3::new(0., 1., 0.)]);
}

#[test]
fn nonzero_levels_are_discarded() {
    let mut placer = MeshCubePlacer::new();
    placer.set_level(1);
    placer.place(Vector3::new(0, 0, 0), Vector3::zeros(), 0x3f);
    placer.set_level(0);
    placer.place(Vector3::new(1, 0, 0), Vector3::zeros(), 0x3f);
    let buffer = placer.into_buffer();
    assert_eq!(buffer.points.len(), 8);
    assert_eq!(buffer.points[0], Vector3::new(0.5, -0.5, -0.5));
}

#[test]
fn centroid_offsets_the_cube() {
    let mut placer = MeshCubePlacer::new();
    placer.set_centroid(Vector3::new(1.5, 0., -2.));
    placer.place(Vector3::new(2, 0, 0), Vector3::zeros(), 0x3f);
    let buffer = placer.into_buffer();
    assert_eq!(buffer.points[0], Vector3::new(0., -0.5, 1.5));
    assert_eq!(buffer.points[7], Vector3::new(1., 0.5, 2.5));
}
