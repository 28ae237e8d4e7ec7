//! 骨骼集合
//!
//! 从扁平的 offsets/parents 数组构建骨骼树：
//! 1. 建立 parent -> children 邻接表
//! 2. 校验唯一根骨骼
//! 3. 从根广度优先构建，保证父骨骼先于子骨骼
//!
//! 骨骼按输入 id 存放（不是构建顺序）。

use std::collections::VecDeque;

use glam::{UVec2, Vec3};

use super::bone::Bone;
use super::pose::PoseCommand;
use super::{BoneGeometry, Joint};
use crate::config::{get_config, SkeletonConfig};
use crate::skinning::{VertexWeight, WeightTable};
use crate::{Result, SkeletonError};

/// 骨骼集合
#[derive(Clone, Debug)]
pub struct Skeleton {
    /// 骨骼数组（下标即 id）
    bones: Vec<Bone>,
    /// 根骨骼 id
    root: usize,
    /// 子骨骼缓存
    children: Vec<Vec<usize>>,
    /// 广度优先顺序（父先于子）
    order: Vec<usize>,
    /// 顶点权重表
    weights: WeightTable,
}

impl Skeleton {
    /// 使用全局配置构建
    pub fn new(joints: &[Joint], weights: Vec<VertexWeight>) -> Result<Self> {
        Self::with_config(joints, weights, &get_config())
    }

    /// 从平行数组构建（parents 中 -1 表示根）
    pub fn from_arrays(offsets: &[Vec3], parents: &[i32], weights: Vec<VertexWeight>) -> Result<Self> {
        if offsets.len() != parents.len() {
            return Err(SkeletonError::LengthMismatch {
                offsets: offsets.len(),
                parents: parents.len(),
            });
        }
        let joints: Vec<Joint> = offsets
            .iter()
            .zip(parents)
            .map(|(&offset, &parent)| Joint::new(offset, parent))
            .collect();
        Self::new(&joints, weights)
    }

    /// 使用指定配置构建
    pub fn with_config(
        joints: &[Joint],
        weights: Vec<VertexWeight>,
        config: &SkeletonConfig,
    ) -> Result<Self> {
        let count = joints.len();

        // 邻接表
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut roots = Vec::new();
        for (id, joint) in joints.iter().enumerate() {
            match joint.parent {
                -1 => roots.push(id),
                p if p >= 0 && (p as usize) < count => children[p as usize].push(id),
                p => return Err(SkeletonError::ParentOutOfRange { bone: id, parent: p }),
            }
        }

        let root = match roots.len() {
            0 => return Err(SkeletonError::NoRoot),
            1 => roots[0],
            _ => return Err(SkeletonError::MultipleRoots(roots)),
        };

        // 广度优先构建
        let mut slots: Vec<Option<Bone>> = vec![None; count];
        let mut order = Vec::with_capacity(count);
        let mut max_depth = 0;
        let mut queue = VecDeque::from([(root, 1usize)]);

        while let Some((id, depth)) = queue.pop_front() {
            if depth > config.max_depth {
                return Err(SkeletonError::TooDeep {
                    depth,
                    max: config.max_depth,
                });
            }
            max_depth = max_depth.max(depth);

            let parent = match joints[id].parent {
                -1 => None,
                p => slots[p as usize].as_ref(),
            };
            let bone = Bone::new(id, joints[id].offset, parent);

            if config.debug_log {
                log::debug!(
                    "骨骼 {}: 父 {:?}, 长度 {:.4}, 切向 {}, 末端 {}",
                    id,
                    bone.parent_id(),
                    bone.length(),
                    bone.tangent().truncate(),
                    bone.endpoint().truncate()
                );
            }

            slots[id] = Some(bone);
            order.push(id);
            queue.extend(children[id].iter().map(|&c| (c, depth + 1)));
        }

        // 从根不可达的骨骼只可能处在父引用环中
        let unreachable: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(id, _)| id)
            .collect();
        if !unreachable.is_empty() {
            return Err(SkeletonError::CyclicHierarchy(unreachable));
        }

        let bones: Vec<Bone> = slots.into_iter().flatten().collect();
        let weights = WeightTable::new(weights, count, config.weight_policy, config.weight_tolerance)?;

        log::info!(
            "骨骼构建完成: {} 骨骼, 根骨骼 {}, 最大深度 {}, {} 条顶点权重",
            bones.len(),
            root,
            max_depth,
            weights.len()
        );

        Ok(Self {
            bones,
            root,
            children,
            order,
            weights,
        })
    }

    // ========================================
    // 查询
    // ========================================

    /// 骨骼数量
    #[inline]
    pub fn size(&self) -> usize {
        self.bones.len()
    }

    /// 根骨骼 id
    #[inline]
    pub fn root(&self) -> usize {
        self.root
    }

    #[inline]
    pub fn root_bone(&self) -> &Bone {
        &self.bones[self.root]
    }

    #[inline]
    pub fn bone(&self, id: usize) -> Option<&Bone> {
        self.bones.get(id)
    }

    /// 按 id 查找骨骼，未知 id 返回 UnknownBone
    pub fn id_to_bone(&self, id: usize) -> Result<&Bone> {
        self.bones.get(id).ok_or(SkeletonError::UnknownBone(id))
    }

    #[inline]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// 子骨骼 id 列表
    pub fn children(&self, id: usize) -> Result<&[usize]> {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .ok_or(SkeletonError::UnknownBone(id))
    }

    #[inline]
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    // ========================================
    // 拾取
    // ========================================

    /// 射线拾取最近的骨骼
    ///
    /// 距离相同时 id 较小者优先。
    pub fn get_bone_by_intersection(&self, position: Vec3, direction: Vec3, radius: f32) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for bone in &self.bones {
            let Some(distance) = bone.intersects(position, direction, radius) else {
                continue;
            };
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((bone.id(), distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// 使用配置的拾取半径
    pub fn pick(&self, position: Vec3, direction: Vec3) -> Option<usize> {
        self.get_bone_by_intersection(position, direction, get_config().pick_radius)
    }

    // ========================================
    // 调试几何
    // ========================================

    /// 当前姿态的骨骼线框（每次调用重新生成）
    pub fn create_bone_geometry(&self) -> BoneGeometry {
        let mut geometry = BoneGeometry {
            vertices: Vec::with_capacity(self.bones.len() * 2),
            lines: Vec::with_capacity(self.bones.len()),
        };
        for (id, bone) in self.bones.iter().enumerate() {
            let base = (id * 2) as u32;
            geometry.vertices.push(bone.origin());
            geometry.vertices.push(bone.endpoint());
            geometry.lines.push(UVec2::new(base, base + 1));
        }
        geometry
    }

    // ========================================
    // 姿态
    // ========================================

    /// 执行姿态命令并刷新该骨骼子树的世界变换
    pub fn apply(&mut self, command: PoseCommand) -> Result<()> {
        let id = command.bone();
        let bone = self.bones.get_mut(id).ok_or(SkeletonError::UnknownBone(id))?;
        command.apply_to(bone)?;
        self.update_subtree(id);
        Ok(())
    }

    pub fn roll(&mut self, bone: usize, radians: f32) -> Result<()> {
        self.apply(PoseCommand::Roll { bone, radians })
    }

    pub fn rotate(&mut self, bone: usize, radians: f32, axis: Vec3) -> Result<()> {
        self.apply(PoseCommand::Rotate { bone, radians, axis })
    }

    /// 恢复绑定姿态
    pub fn reset_pose(&mut self) {
        for i in 0..self.order.len() {
            let id = self.order[i];
            self.bones[id].reset_rotation();
            self.update_bone(id);
        }
    }

    /// 自顶向下刷新子树（显式栈，不递归）
    fn update_subtree(&mut self, id: usize) {
        let mut stack = vec![id];
        while let Some(idx) = stack.pop() {
            self.update_bone(idx);
            stack.extend(self.children[idx].iter().copied());
        }
    }

    fn update_bone(&mut self, id: usize) {
        let parent = self.bones[id]
            .parent_id()
            .map(|p| (self.bones[p].local_to_world, self.bones[p].rotation_to_world));
        self.bones[id].update_world(parent);
    }
}
