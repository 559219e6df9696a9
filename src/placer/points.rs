use crate::error::Error;
use crate::placer::{CubePlacer, RENDERED_LEVEL};
use crate::scene::{Layer, NodeKind, NodePath};
use nalgebra::Vector3;

/// Point-instanced cubes: one position, color and prototype index per voxel.
/// There is a single prototype (the unit cube), so every prototype index is 0.
pub struct PointBuffer {
    pub positions: Vec<Vector3<f32>>,
    pub colors: Vec<Vector3<f32>>,
    pub proto_indices: Vec<u32>,
}

pub struct PointCubePlacer {
    buffer: PointBuffer,
    level: u32,
    centroid: Vector3<f32>,
}

impl PointCubePlacer {
    pub fn new() -> PointCubePlacer {
        PointCubePlacer {
            buffer: PointBuffer {
                positions: Vec::new(),
                colors: Vec::new(),
                proto_indices: Vec::new(),
            },
            level: RENDERED_LEVEL,
            centroid: Vector3::zeros(),
        }
    }

    pub fn into_buffer(self) -> PointBuffer {
        self.buffer
    }

    /// Writes the instancer node together with its single unit-cube prototype.
    pub fn write_node(self, layer: &mut Layer, path: NodePath) -> Result<(), Error> {
        let prototypes_path = path.append("Prototypes");
        let cube_path = prototypes_path.append("cube");
        layer.create_node(
            path,
            NodeKind::PointInstancer {
                buffer: self.buffer,
                prototypes: vec![cube_path.clone()],
            },
        )?;
        layer.create_node(prototypes_path, NodeKind::Scope)?;
        layer.create_node(cube_path, NodeKind::Cube { size: 1. })?;
        Ok(())
    }
}

impl Default for PointCubePlacer {
    fn default() -> PointCubePlacer {
        PointCubePlacer::new()
    }
}

impl CubePlacer for PointCubePlacer {
    fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    fn set_centroid(&mut self, centroid: Vector3<f32>) {
        self.centroid = centroid;
    }

    fn place(&mut self, position: Vector3<i32>, color: Vector3<f32>, _sides: u8) {
        if self.level != RENDERED_LEVEL {
            return;
        }
        self.buffer.positions.push(position.cast::<f32>() - self.centroid);
        self.buffer.colors.push(color);
        self.buffer.proto_indices.push(0);
    }
}

#[test]
fn buffers_stay_parallel() {
    let mut placer = PointCubePlacer::new();
    placer.set_centroid(Vector3::new(0.5, 0.5, 0.5));
    placer.place(Vector3::new(0, 0, 0), Vector3::new(1., 0., 0.), 0x3f);
    placer.place(Vector3::new(0, 1, 0), Vector3::new(0., 1., 0.), 0);
    let buffer = placer.into_buffer();
    assert_eq!(buffer.positions.len(), buffer.colors.len());
    assert_eq!(buffer.positions.len(), buffer.proto_indices.len());
    assert!(buffer.proto_indices.iter().all(|&proto| proto == 0));
    assert_eq!(buffer.positions[1], Vector3::new(-0.5, 0.5, -0.5));
}

#[test]
fn nonzero_levels_are_discarded() {
    let mut placer = PointCubePlacer::new();
    placer.set_level(3);
    placer.place(Vector3::new(0, 0, 0), Vector3::zeros(), 0x3f);
    assert!(placer.into_buffer().positions.is_empty());
}

#[test]
fn node_includes_the_cube_prototype() {
    let mut placer = PointCubePlacer::new();
    placer.place(Vector3::new(0, 0, 0), Vector3::zeros(), 0x3f);
    let mut layer = Layer::new();
    placer.write_node(&mut layer, NodePath::new("/points")).unwrap();
    let node = layer.node(&NodePath::new("/points")).unwrap();
    let NodeKind::PointInstancer { buffer, prototypes } = &node.kind else {
        panic!("expected a point instancer");
    };
    assert_eq!(buffer.positions.len(), 1);
    assert_eq!(prototypes, &[NodePath::new("/points/Prototypes/cube")]);
    let cube = layer.node(&NodePath::new("/points/Prototypes/cube")).unwrap();
    assert!(matches!(cube.kind, NodeKind::Cube { size } if size == 1.));
}
