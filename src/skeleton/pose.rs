//! 姿态命令
//!
//! 交互/动画对骨骼的修改统一表示为命令，由 Skeleton::apply 执行并刷新子树。

use glam::Vec3;

use super::bone::Bone;
use crate::Result;

/// 姿态命令
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoseCommand {
    /// 绕骨骼自身切向滚转
    Roll { bone: usize, radians: f32 },
    /// 绕父相对空间中的轴旋转（弯曲/摆动）
    Rotate { bone: usize, radians: f32, axis: Vec3 },
}

impl PoseCommand {
    /// 目标骨骼 id
    #[inline]
    pub fn bone(&self) -> usize {
        match *self {
            Self::Roll { bone, .. } | Self::Rotate { bone, .. } => bone,
        }
    }

    /// 修改目标骨骼的局部旋转（不刷新世界变换）
    pub(crate) fn apply_to(&self, bone: &mut Bone) -> Result<()> {
        match *self {
            Self::Roll { radians, .. } => {
                bone.roll(radians);
                Ok(())
            }
            Self::Rotate { radians, axis, .. } => bone.rotate(radians, axis),
        }
    }
}
