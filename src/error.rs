//! 错误类型

use thiserror::Error;

/// 骨骼系统错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkeletonError {
    #[error("Joint description mismatch: {offsets} offsets vs {parents} parents")]
    LengthMismatch { offsets: usize, parents: usize },

    #[error("Skeleton has no root bone")]
    NoRoot,

    #[error("Skeleton has multiple root bones: {0:?}")]
    MultipleRoots(Vec<usize>),

    #[error("Bone {bone} has out-of-range parent index {parent}")]
    ParentOutOfRange { bone: usize, parent: i32 },

    #[error("Bones {0:?} are not reachable from the root (cyclic parent references)")]
    CyclicHierarchy(Vec<usize>),

    #[error("Bone hierarchy depth {depth} exceeds limit {max}")]
    TooDeep { depth: usize, max: usize },

    #[error("Unknown bone id {0}")]
    UnknownBone(usize),

    #[error("Rotation axis is degenerate (zero length or not finite)")]
    DegenerateAxis,

    #[error("Weight for vertex {vertex} references unknown bone {bone}")]
    WeightBoneOutOfRange { vertex: u32, bone: usize },

    #[error("Weight references vertex {vertex} but mesh has {count} vertices")]
    WeightVertexOutOfRange { vertex: u32, count: usize },

    #[error("Weights of vertex {vertex} sum to {sum}, expected 1.0")]
    WeightSum { vertex: u32, sum: f32 },

    #[error("Face {face} references vertex {index} but mesh has {count} vertices")]
    FaceOutOfRange { face: usize, index: u32, count: usize },
}
