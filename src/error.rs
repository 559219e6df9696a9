use crate::scene::NodePath;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{size} byte file too small for a palette")]
    FileTooSmall { size: usize },
    #[error("level {level} record smaller than its own header, {record} < {header}")]
    LevelHeader { level: u32, record: u32, header: u64 },
    #[error("model grid holds {actual} voxel entries for {expected} cells")]
    ModelGrid { expected: u64, actual: usize },
    #[error("group {group} is part of a parent cycle")]
    GroupCycle { group: u32 },
    #[error("reference to group {group} outside the group table")]
    UnknownGroup { group: u32 },
    #[error("node {path} created before its parent")]
    MissingParent { path: NodePath },
    #[error("node {path} created twice")]
    DuplicateNode { path: NodePath },
}
