//! 骨骼系统
//!
//! 核心设计思想：
//! - Bone: 单个骨骼节点，持有局部平移/旋转/长度与缓存的世界变换
//! - Skeleton: 以 id 为下标的骨骼数组，负责层级构建、拾取与姿态命令
//! - LocalFrame: 由偏移向量构建骨骼局部正交基

mod bone;
mod bone_set;
mod frame;
mod pose;

pub use bone::Bone;
pub use bone_set::Skeleton;
pub use frame::{auxiliary_axis, orthonormal_basis, LocalFrame};
pub use pose::PoseCommand;

use glam::{UVec2, Vec3, Vec4};

// ============================================================================
// 公共类型定义
// ============================================================================

/// 关节描述（加载器输入）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joint {
    /// 相对父骨骼末端的偏移（世界方向）
    pub offset: Vec3,
    /// 父骨骼索引 (-1 表示根骨骼)
    pub parent: i32,
}

impl Joint {
    pub fn new(offset: Vec3, parent: i32) -> Self {
        Self { offset, parent }
    }

    /// 根关节
    pub fn root(offset: Vec3) -> Self {
        Self { offset, parent: -1 }
    }
}

/// 骨骼调试线框（线段列表）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoneGeometry {
    /// 每根骨骼两个顶点：origin, endpoint
    pub vertices: Vec<Vec4>,
    /// 顶点索引对
    pub lines: Vec<UVec2>,
}
