use crate::error::Error;
use crate::placer::mesh::MeshCubePlacer;
use crate::placer::points::PointCubePlacer;
use crate::placer::GeometryKind;
use crate::scene::{Layer, NodePath, UpAxis};
use crate::vox::VoxScene;

pub mod error;
pub mod kvx;
pub mod palette;
pub mod placer;
pub mod scene;
pub mod vox;

/// Converts a slab-format byte buffer into a read-only layer holding one
/// geometry node, with the synthesizer variant picked by the caller.
pub fn kvx_to_layer(contents: &[u8], geometry: GeometryKind) -> Result<Layer, Error> {
    let mut layer = Layer::new();
    match geometry {
        GeometryKind::Mesh => {
            let mut placer = MeshCubePlacer::new();
            kvx::decode(contents, &mut placer)?;
            placer.write_node(&mut layer, NodePath::new("/mesh"))?;
            layer.default_node = Some("mesh".to_owned());
        }
        GeometryKind::Points => {
            let mut placer = PointCubePlacer::new();
            kvx::decode(contents, &mut placer)?;
            placer.write_node(&mut layer, NodePath::new("/points"))?;
            layer.default_node = Some("points".to_owned());
        }
    }
    layer.editable = false;
    Ok(layer)
}

/// Converts a pre-decoded dense-grid scene into a read-only, Z-up layer.
pub fn vox_to_layer(scene: &VoxScene) -> Result<Layer, Error> {
    let mut layer = Layer::new();
    vox::assemble::assemble(scene, &mut layer)?;
    layer.up_axis = Some(UpAxis::Z);
    layer.editable = false;
    Ok(layer)
}

#[cfg(test)]
use crate::palette::{KVX_PALETTE_BYTES, PALETTE_LEN};

#[test]
fn kvx_layers_are_read_only_with_a_default_node() {
    let layer = kvx_to_layer(&[0; KVX_PALETTE_BYTES], GeometryKind::Mesh).unwrap();
    assert!(!layer.editable);
    assert!(layer.up_axis.is_none());
    assert_eq!(layer.default_node.as_deref(), Some("mesh"));
    let node = layer.node(&NodePath::new("/mesh")).unwrap();
    assert!(matches!(node.kind, scene::NodeKind::Mesh(_)));
}

#[test]
fn point_layers_default_to_the_instancer() {
    let layer = kvx_to_layer(&[0; KVX_PALETTE_BYTES], GeometryKind::Points).unwrap();
    assert_eq!(layer.default_node.as_deref(), Some("points"));
    assert!(layer.node(&NodePath::new("/points/Prototypes/cube")).is_some());
}

#[test]
fn vox_layers_declare_z_up() {
    let scene = VoxScene {
        models: Vec::new(),
        palette: [[0; 4]; PALETTE_LEN],
        groups: Vec::new(),
        instances: Vec::new(),
    };
    let layer = vox_to_layer(&scene).unwrap();
    assert_eq!(layer.up_axis, Some(UpAxis::Z));
    assert!(!layer.editable);
}
