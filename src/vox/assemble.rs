use crate::error::Error;
use crate::palette::Palette;
use crate::placer::mesh::MeshCubePlacer;
use crate::scene::{Layer, NodeKind, NodePath};
use crate::vox::{place_model, VoxScene, NO_GROUP};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Builds the node tree for a dense-grid scene: every model once under
/// /models, then instances and their group hierarchy, then any groups left
/// unreferenced so empty branches survive.
pub fn assemble(scene: &VoxScene, layer: &mut Layer) -> Result<(), Error> {
    let palette = Palette::from_rgba(&scene.palette);
    let models = NodePath::new("/models");
    layer.create_node(models.clone(), NodeKind::Scope)?;
    // Models are written unconditionally, unreferenced and duplicate ones
    // included; instances share them by reference, never by copy.
    for (index, model) in scene.models.iter().enumerate() {
        let mut placer = MeshCubePlacer::new();
        place_model(model, &palette, &mut placer)?;
        placer.write_node(layer, models.append(&format!("m{index}")))?;
    }

    let mut groups = GroupPaths {
        scene,
        paths: HashMap::new(),
        resolving: HashSet::new(),
    };
    for (index, instance) in scene.instances.iter().enumerate() {
        let parent = groups.resolve(instance.group, layer)?;
        let path = parent.append(&format!("inst{index}"));
        let node = layer.create_node(path.clone(), NodeKind::Xform)?;
        node.transform = Some(instance.transform);
        node.hidden = instance.hidden;
        node.display_name = instance.name.clone();
        let model = models.append(&format!("m{}", instance.model));
        layer.create_node(path.append("model"), NodeKind::Reference(model))?;
    }

    for group in 0..scene.groups.len() as u32 {
        groups.resolve(group, layer)?;
    }

    debug!(
        "dense scene assembled, \x1B[1mmodels\x1B[0m: {}, \x1B[1mnodes\x1B[0m: {}",
        scene.models.len(),
        layer.len()
    );
    Ok(())
}

struct GroupPaths<'a> {
    scene: &'a VoxScene,
    paths: HashMap<u32, NodePath>,
    resolving: HashSet<u32>,
}

impl GroupPaths<'_> {
    /// Resolves a group to its node path, creating the node (and its whole
    /// parent chain) on first use. At most one node exists per group id, no
    /// matter how many instances and child groups refer to it.
    fn resolve(&mut self, group: u32, layer: &mut Layer) -> Result<NodePath, Error> {
        if group == NO_GROUP {
            return Ok(NodePath::root());
        }
        if let Some(path) = self.paths.get(&group) {
            return Ok(path.clone());
        }
        // A group seen again while its parent chain is still being resolved
        // can only mean the chain loops back on itself.
        if !self.resolving.insert(group) {
            return Err(Error::GroupCycle { group });
        }
        let Some(record) = self.scene.groups.get(group as usize) else {
            return Err(Error::UnknownGroup { group });
        };
        let parent = self.resolve(record.parent, layer)?;
        let path = parent.append(&format!("group{group}"));
        let node = layer.create_node(path.clone(), NodeKind::Xform)?;
        node.transform = Some(record.transform);
        node.hidden = record.hidden;
        node.display_name = record.name.clone();
        self.resolving.remove(&group);
        self.paths.insert(group, path.clone());
        Ok(path)
    }
}

#[cfg(test)]
use crate::palette::PALETTE_LEN;
#[cfg(test)]
use crate::vox::{VoxGroup, VoxInstance, VoxModel};
#[cfg(test)]
use nalgebra::{Matrix4, Vector3};

#[cfg(test)]
fn group(parent: u32) -> VoxGroup {
    VoxGroup {
        parent,
        transform: Matrix4::identity(),
        hidden: false,
        name: None,
    }
}

#[cfg(test)]
fn instance(group: u32, model: u32) -> VoxInstance {
    VoxInstance {
        group,
        model,
        transform: Matrix4::identity(),
        hidden: false,
        name: None,
    }
}

#[cfg(test)]
fn scene_with(groups: Vec<VoxGroup>, instances: Vec<VoxInstance>) -> VoxScene {
    VoxScene {
        models: vec![VoxModel {
            size: Vector3::new(1, 1, 1),
            voxels: vec![1],
        }],
        palette: [[0; 4]; PALETTE_LEN],
        groups,
        instances,
    }
}

#[test]
fn instances_share_one_model_node() {
    let scene = scene_with(
        vec![group(NO_GROUP), group(0)],
        vec![instance(1, 0), instance(NO_GROUP, 0)],
    );
    let mut layer = Layer::new();
    assemble(&scene, &mut layer).unwrap();

    let model_nodes = layer
        .paths()
        .filter(|path| path.as_str().starts_with("/models/"))
        .count();
    assert_eq!(model_nodes, 1);
    assert!(layer.node(&NodePath::new("/group0")).is_some());
    assert!(layer.node(&NodePath::new("/group0/group1")).is_some());

    let expected = NodePath::new("/models/m0");
    for path in ["/group0/group1/inst0/model", "/inst1/model"] {
        let node = layer.node(&NodePath::new(path)).unwrap();
        assert!(matches!(&node.kind, NodeKind::Reference(target) if *target == expected));
    }
}

#[test]
fn models_are_written_even_without_instances() {
    let scene = scene_with(Vec::new(), Vec::new());
    let mut layer = Layer::new();
    assemble(&scene, &mut layer).unwrap();
    let model = layer.node(&NodePath::new("/models/m0")).unwrap();
    assert!(matches!(model.kind, NodeKind::Mesh(_)));
}

#[test]
fn empty_groups_keep_their_branch() {
    let scene = scene_with(vec![group(NO_GROUP), group(0), group(1)], Vec::new());
    let mut layer = Layer::new();
    assemble(&scene, &mut layer).unwrap();
    assert!(layer.node(&NodePath::new("/group0/group1/group2")).is_some());
}

#[test]
fn hidden_and_names_come_from_the_source() {
    let mut named = group(NO_GROUP);
    named.hidden = true;
    named.name = Some("torso".to_owned());
    let scene = scene_with(vec![named], Vec::new());
    let mut layer = Layer::new();
    assemble(&scene, &mut layer).unwrap();
    let node = layer.node(&NodePath::new("/group0")).unwrap();
    assert!(node.hidden);
    assert_eq!(node.display_name.as_deref(), Some("torso"));
    assert_eq!(node.transform, Some(Matrix4::identity()));
}

#[test]
fn parent_cycles_fail() {
    let scene = scene_with(vec![group(1), group(0)], Vec::new());
    let mut layer = Layer::new();
    let error = assemble(&scene, &mut layer);
    assert!(matches!(error, Err(Error::GroupCycle { .. })));
}

#[test]
fn out_of_range_groups_fail() {
    let scene = scene_with(Vec::new(), vec![instance(7, 0)]);
    let mut layer = Layer::new();
    let error = assemble(&scene, &mut layer);
    assert!(matches!(error, Err(Error::UnknownGroup { group: 7 })));
}
