//! 骨骼节点
//!
//! 每根骨骼持有局部平移 T、局部旋转 R（正交基）和长度 L。
//! 变换计算：transform = parent.transform * T * R
//!
//! 世界变换在骨骼上缓存，由 Skeleton 自顶向下刷新，读取时不再递归。

use glam::{DQuat, DVec3, Mat4, Vec3, Vec4};

use super::frame::LocalFrame;
use crate::{Result, SkeletonError};

/// 骨骼节点
#[derive(Clone, Debug)]
pub struct Bone {
    // ========================================
    // 静态数据（初始化后不变）
    // ========================================

    /// 骨骼 id（与输入数组下标一致）
    pub(crate) id: usize,

    /// 父骨骼 id（None 表示根骨骼）
    pub(crate) parent: Option<usize>,

    /// 骨骼长度（构建时偏移向量的模）
    pub(crate) length: f32,

    /// 局部平移（父骨骼局部空间）
    pub(crate) local_translation: Mat4,

    /// 绑定姿态的局部旋转（用于重置）
    pub(crate) bind_rotation: Mat4,

    /// 绑定姿态世界变换
    pub(crate) bind_transform: Mat4,

    /// 逆绑定矩阵（用于蒙皮）
    pub(crate) inverse_bind: Mat4,

    // ========================================
    // 动态数据（姿态命令修改）
    // ========================================

    /// 局部旋转（列 0/1/2 = tangent/normal/binormal）
    pub(crate) local_rotation: Mat4,

    /// 父骨骼到世界的变换（缓存）
    pub(crate) parent_to_world: Mat4,

    /// 全局变换（缓存）
    pub(crate) local_to_world: Mat4,

    /// 全局旋转（缓存，仅 R 项的合成）
    pub(crate) rotation_to_world: Mat4,
}

impl Bone {
    /// 创建骨骼（父骨骼必须已构建）
    pub fn new(id: usize, offset: Vec3, parent: Option<&Bone>) -> Self {
        let frame = LocalFrame::build(offset, parent);

        let mut bone = Self {
            id,
            parent: parent.map(|p| p.id),
            length: frame.length,
            local_translation: frame.translation,
            bind_rotation: frame.rotation,
            bind_transform: Mat4::IDENTITY,
            inverse_bind: Mat4::IDENTITY,
            local_rotation: frame.rotation,
            parent_to_world: Mat4::IDENTITY,
            local_to_world: Mat4::IDENTITY,
            rotation_to_world: Mat4::IDENTITY,
        };

        bone.update_world(parent.map(|p| (p.local_to_world, p.rotation_to_world)));
        bone.bind_transform = bone.local_to_world;
        bone.inverse_bind = bone.local_to_world.inverse();
        bone
    }

    // ========================================
    // 访问器
    // ========================================

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn parent_id(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn local_translation(&self) -> Mat4 {
        self.local_translation
    }

    #[inline]
    pub fn local_rotation(&self) -> Mat4 {
        self.local_rotation
    }

    /// 绑定姿态世界变换
    #[inline]
    pub fn bind_transform(&self) -> Mat4 {
        self.bind_transform
    }

    /// 逆绑定矩阵
    #[inline]
    pub fn inverse_bind_matrix(&self) -> Mat4 {
        self.inverse_bind
    }

    // ========================================
    // 世界空间查询
    // ========================================

    /// 全局变换 = parent.transform * T * R
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.local_to_world
    }

    /// 全局旋转（只合成 R，不含平移）
    #[inline]
    pub fn rotation(&self) -> Mat4 {
        self.rotation_to_world
    }

    /// 世界空间切向（骨骼方向）
    #[inline]
    pub fn tangent(&self) -> Vec4 {
        self.rotation_to_world.col(0)
    }

    #[inline]
    pub fn normal(&self) -> Vec4 {
        self.rotation_to_world.col(1)
    }

    #[inline]
    pub fn binormal(&self) -> Vec4 {
        self.rotation_to_world.col(2)
    }

    /// 世界空间枢轴
    #[inline]
    pub fn origin(&self) -> Vec4 {
        let pivot = self.local_translation * Vec4::W;
        match self.parent {
            Some(_) => self.parent_to_world * pivot,
            None => pivot,
        }
    }

    /// 世界空间末端，始终位于局部 +X 轴上距离 L 处
    #[inline]
    pub fn endpoint(&self) -> Vec4 {
        self.local_to_world * Vec4::new(self.length, 0.0, 0.0, 1.0)
    }

    /// 蒙皮矩阵 = transform * inverse_bind
    ///
    /// 处于绑定姿态时直接返回单位矩阵，保证静止时顶点不变。
    #[inline]
    pub fn skinning_matrix(&self) -> Mat4 {
        if self.is_at_bind_pose() {
            Mat4::IDENTITY
        } else {
            self.local_to_world * self.inverse_bind
        }
    }

    /// 全局变换是否与绑定姿态逐位相同
    #[inline]
    pub fn is_at_bind_pose(&self) -> bool {
        self.local_to_world == self.bind_transform
    }

    // ========================================
    // 射线相交
    // ========================================

    /// 射线与骨骼圆柱求交
    ///
    /// 骨骼视为沿局部 X 轴、从 0 到 L 的有限圆柱。
    /// 命中时返回沿射线的最近距离（以 direction 为单位）。
    /// 侧面无合格解时再检查两端端面（平行或近平行射线）。
    pub fn intersects(&self, position: Vec3, direction: Vec3, radius: f32) -> Option<f32> {
        let p = self.local_to_world.inverse().transform_point3(position);
        // 正交矩阵的逆即转置
        let d = self.rotation_to_world.transpose().transform_vector3(direction);

        self.intersects_side(p, d, radius)
            .or_else(|| self.intersects_cap(p, d, radius))
    }

    /// 侧面求交：a·t² + b·t + c = 0（局部 YZ 平面）
    fn intersects_side(&self, p: Vec3, d: Vec3, radius: f32) -> Option<f32> {
        let a = d.y * d.y + d.z * d.z;
        if a == 0.0 {
            return None;
        }
        let b = 2.0 * (p.y * d.y + p.z * d.z);
        let c = p.y * p.y + p.z * p.z - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t0 = (-b - sqrt_disc) / (2.0 * a);
        let t1 = (-b + sqrt_disc) / (2.0 * a);

        let accept = |t: f32| {
            let x = p.x + t * d.x;
            t >= 0.0 && (0.0..=self.length).contains(&x)
        };

        match (accept(t0), accept(t1)) {
            (true, true) => Some(t0.min(t1)),
            (true, false) => Some(t0),
            (false, true) => Some(t1),
            (false, false) => None,
        }
    }

    /// 端面求交：x = 0 与 x = L 两个圆盘
    fn intersects_cap(&self, p: Vec3, d: Vec3, radius: f32) -> Option<f32> {
        if d.x == 0.0 {
            return None;
        }
        [(0.0 - p.x) / d.x, (self.length - p.x) / d.x]
            .into_iter()
            .filter(|&t| {
                let y = p.y + t * d.y;
                let z = p.z + t * d.z;
                t >= 0.0 && y * y + z * z <= radius * radius
            })
            .reduce(f32::min)
    }

    // ========================================
    // 变换更新
    // ========================================

    /// 刷新缓存的世界变换
    ///
    /// `parent` 为父骨骼的 (transform, rotation)，根骨骼传 None。
    pub(crate) fn update_world(&mut self, parent: Option<(Mat4, Mat4)>) {
        match parent {
            Some((parent_transform, parent_rotation)) => {
                self.parent_to_world = parent_transform;
                self.local_to_world = parent_transform * self.local_translation * self.local_rotation;
                self.rotation_to_world = parent_rotation * self.local_rotation;
            }
            None => {
                self.parent_to_world = Mat4::IDENTITY;
                self.local_to_world = self.local_translation * self.local_rotation;
                self.rotation_to_world = self.local_rotation;
            }
        }
    }

    /// 绕自身切向滚转 normal/binormal（右手定则）
    ///
    /// 调用后需刷新该骨骼及其子树的世界变换。
    pub(crate) fn roll(&mut self, radians: f32) {
        let (t, n) = self.basis_f64();
        let q = DQuat::from_axis_angle(t.normalize(), radians as f64);
        self.store_basis(t, q * n);
    }

    /// 绕父相对空间中的任意轴旋转整个局部坐标系
    ///
    /// 调用后需刷新该骨骼及其子树的世界变换。
    pub(crate) fn rotate(&mut self, radians: f32, axis: Vec3) -> Result<()> {
        let axis = axis
            .as_dvec3()
            .try_normalize()
            .ok_or(SkeletonError::DegenerateAxis)?;
        let (t, n) = self.basis_f64();
        let q = DQuat::from_axis_angle(axis, radians as f64);
        self.store_basis(q * t, q * n);
        Ok(())
    }

    /// 恢复绑定姿态的局部旋转
    pub(crate) fn reset_rotation(&mut self) {
        self.local_rotation = self.bind_rotation;
    }

    fn basis_f64(&self) -> (DVec3, DVec3) {
        (
            self.local_rotation.col(0).truncate().as_dvec3(),
            self.local_rotation.col(1).truncate().as_dvec3(),
        )
    }

    /// 双精度下重新正交归一化后写回，b 取 t × n
    fn store_basis(&mut self, t: DVec3, n: DVec3) {
        let t = t.normalize();
        let n = (n - t * n.dot(t)).normalize();
        let b = t.cross(n);

        self.local_rotation = Mat4::from_cols(
            t.as_vec3().extend(0.0),
            n.as_vec3().extend(0.0),
            b.as_vec3().extend(0.0),
            Vec4::W,
        );
    }
}
