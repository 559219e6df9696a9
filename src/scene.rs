use crate::error::Error;
use crate::placer::mesh::MeshBuffer;
use crate::placer::points::PointBuffer;
use nalgebra::Matrix4;
use std::collections::HashMap;
use std::fmt;

/// Slash-separated node address, with "/" being the layer root.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> NodePath {
        NodePath("/".to_owned())
    }

    pub fn new(path: &str) -> NodePath {
        assert!(path.starts_with('/'));
        assert!(path == "/" || !path.ends_with('/'));
        NodePath(path.to_owned())
    }

    pub fn append(&self, name: &str) -> NodePath {
        assert!(!name.is_empty() && !name.contains('/'));
        if self.is_root() {
            NodePath(format!("/{name}"))
        } else {
            NodePath(format!("{}/{name}", self.0))
        }
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(NodePath::root()),
            Some(separator) => Some(NodePath(self.0[..separator].to_owned())),
            None => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.0[self.0.rfind('/').map_or(0, |separator| separator + 1)..]
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub enum NodeKind {
    Xform,
    Scope,
    Mesh(MeshBuffer),
    PointInstancer {
        buffer: PointBuffer,
        prototypes: Vec<NodePath>,
    },
    Cube {
        size: f64,
    },
    Reference(NodePath),
}

pub struct Node {
    pub kind: NodeKind,
    pub transform: Option<Matrix4<f64>>,
    pub hidden: bool,
    pub display_name: Option<String>,
    pub children: Vec<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpAxis {
    Y,
    Z,
}

/// In-memory scene-graph container the conversions write into. The host
/// serializes it through whatever scene-description runtime it embeds.
pub struct Layer {
    nodes: HashMap<NodePath, Node>,
    root_children: Vec<String>,
    pub up_axis: Option<UpAxis>,
    pub default_node: Option<String>,
    pub editable: bool,
}

impl Layer {
    pub fn new() -> Layer {
        Layer {
            nodes: HashMap::new(),
            root_children: Vec::new(),
            up_axis: None,
            default_node: None,
            editable: true,
        }
    }

    /// Creates a node under an already-existing parent and returns it for
    /// attribute attachment. The root exists implicitly and cannot be created.
    pub fn create_node(&mut self, path: NodePath, kind: NodeKind) -> Result<&mut Node, Error> {
        let Some(parent) = path.parent() else {
            return Err(Error::DuplicateNode { path });
        };
        if self.nodes.contains_key(&path) {
            return Err(Error::DuplicateNode { path });
        }
        let name = path.name().to_owned();
        if parent.is_root() {
            self.root_children.push(name);
        } else {
            match self.nodes.get_mut(&parent) {
                Some(node) => node.children.push(name),
                None => return Err(Error::MissingParent { path }),
            }
        }
        let node = Node {
            kind,
            transform: None,
            hidden: false,
            display_name: None,
            children: Vec::new(),
        };
        Ok(self.nodes.entry(path).or_insert(node))
    }

    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        self.nodes.get(path)
    }

    pub fn root_children(&self) -> &[String] {
        &self.root_children
    }

    pub fn paths(&self) -> impl Iterator<Item = &NodePath> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for Layer {
    fn default() -> Layer {
        Layer::new()
    }
}

#[test]
fn path_append_and_parent_round_trip() {
    let path = NodePath::root().append("models").append("m0");
    assert_eq!(path.as_str(), "/models/m0");
    assert_eq!(path.name(), "m0");
    let parent = path.parent().unwrap();
    assert_eq!(parent, NodePath::new("/models"));
    assert_eq!(parent.parent().unwrap(), NodePath::root());
    assert!(NodePath::root().parent().is_none());
}

#[test]
fn nodes_require_an_existing_parent() {
    let mut layer = Layer::new();
    let orphan = layer.create_node(NodePath::new("/a/b"), NodeKind::Xform);
    assert!(matches!(orphan, Err(Error::MissingParent { .. })));
    layer.create_node(NodePath::new("/a"), NodeKind::Xform).unwrap();
    layer.create_node(NodePath::new("/a/b"), NodeKind::Xform).unwrap();
    let duplicate = layer.create_node(NodePath::new("/a/b"), NodeKind::Xform);
    assert!(matches!(duplicate, Err(Error::DuplicateNode { .. })));
}

#[test]
fn child_order_follows_creation_order() {
    let mut layer = Layer::new();
    layer.create_node(NodePath::new("/a"), NodeKind::Xform).unwrap();
    layer.create_node(NodePath::new("/a/z"), NodeKind::Xform).unwrap();
    layer.create_node(NodePath::new("/a/b"), NodeKind::Xform).unwrap();
    layer.create_node(NodePath::new("/c"), NodeKind::Xform).unwrap();
    assert_eq!(layer.node(&NodePath::new("/a")).unwrap().children, ["z", "b"]);
    assert_eq!(layer.root_children(), ["a", "c"]);
}
