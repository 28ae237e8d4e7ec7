//! 网格聚合
//!
//! 持有加载器交付的绑定姿态数据与骨骼，负责逐帧重算蒙皮顶点。
//! 文件解析不在本模块内，加载器把解析结果填入 ModelData。

use glam::{UVec3, Vec2, Vec3, Vec4};

use crate::config::{get_config, SkeletonConfig};
use crate::skeleton::{BoneGeometry, Joint, Skeleton};
use crate::skinning::{SkinningEvaluator, VertexWeight};
use crate::{Result, SkeletonError};

/// 加载器交付的模型数据
#[derive(Clone, Debug, Default)]
pub struct ModelData {
    pub vertices: Vec<Vec4>,
    pub faces: Vec<UVec3>,
    /// 可为空，为空时由面法线计算
    pub vertex_normals: Vec<Vec4>,
    pub uv_coordinates: Vec<Vec2>,
    pub joints: Vec<Joint>,
    pub weights: Vec<VertexWeight>,
}

/// 轴对齐包围盒
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    /// 未计算前包含整个空间
    fn default() -> Self {
        Self {
            min: Vec3::splat(-f32::MAX),
            max: Vec3::splat(f32::MAX),
        }
    }
}

/// 蒙皮网格
#[derive(Debug)]
pub struct Mesh {
    /// 绑定姿态顶点
    pub vertices: Vec<Vec4>,
    /// 蒙皮后顶点（每次 update_animation 整体重算）
    pub animated_vertices: Vec<Vec4>,
    pub faces: Vec<UVec3>,
    pub vertex_normals: Vec<Vec4>,
    pub face_normals: Vec<Vec4>,
    pub uv_coordinates: Vec<Vec2>,
    pub bounds: BoundingBox,
    pub skeleton: Skeleton,

    evaluator: SkinningEvaluator,
}

impl Mesh {
    /// 使用全局配置构建
    pub fn new(data: ModelData) -> Result<Self> {
        Self::with_config(data, &get_config())
    }

    pub fn with_config(data: ModelData, config: &SkeletonConfig) -> Result<Self> {
        let count = data.vertices.len();
        for (face, indices) in data.faces.iter().enumerate() {
            if let Some(&index) = indices.to_array().iter().find(|&&i| i as usize >= count) {
                return Err(SkeletonError::FaceOutOfRange { face, index, count });
            }
        }

        let skeleton = Skeleton::with_config(&data.joints, data.weights, config)?;
        skeleton.weights().check_vertex_count(count)?;

        let mut mesh = Self {
            animated_vertices: data.vertices.clone(),
            vertices: data.vertices,
            faces: data.faces,
            vertex_normals: data.vertex_normals,
            face_normals: Vec::new(),
            uv_coordinates: data.uv_coordinates,
            bounds: BoundingBox::default(),
            skeleton,
            evaluator: SkinningEvaluator::new(),
        };
        mesh.compute_bounds();
        mesh.compute_normals();

        log::info!(
            "网格构建完成: {} 顶点, {} 面, {} 骨骼",
            mesh.vertices.len(),
            mesh.faces.len(),
            mesh.bone_count()
        );

        Ok(mesh)
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.skeleton.size()
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        0.5 * (self.bounds.min + self.bounds.max)
    }

    /// 按当前骨骼姿态重算 animated_vertices
    pub fn update_animation(&mut self) -> Result<()> {
        self.evaluator
            .evaluate(&self.skeleton, &self.vertices, &mut self.animated_vertices)
    }

    /// 当前姿态的骨骼线框
    pub fn bone_geometry(&self) -> BoneGeometry {
        self.skeleton.create_bone_geometry()
    }

    fn compute_bounds(&mut self) {
        self.bounds.min = Vec3::splat(f32::MAX);
        self.bounds.max = Vec3::splat(-f32::MAX);
        for v in &self.vertices {
            self.bounds.min = self.bounds.min.min(v.truncate());
            self.bounds.max = self.bounds.max.max(v.truncate());
        }
    }

    /// 面法线；加载器未提供顶点法线时按面积加权平均
    fn compute_normals(&mut self) {
        let vertices = &self.vertices;
        let face_cross = |f: &UVec3| {
            let p0 = vertices[f.x as usize].truncate();
            let p1 = vertices[f.y as usize].truncate();
            let p2 = vertices[f.z as usize].truncate();
            (p1 - p0).cross(p2 - p0)
        };

        self.face_normals = self
            .faces
            .iter()
            .map(|f| face_cross(f).normalize_or_zero().extend(0.0))
            .collect();

        if self.vertex_normals.len() == self.vertices.len() {
            return;
        }

        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for f in &self.faces {
            let n = face_cross(f);
            for i in f.to_array() {
                accum[i as usize] += n;
            }
        }
        self.vertex_normals = accum
            .into_iter()
            .map(|n| n.normalize_or_zero().extend(0.0))
            .collect();
    }
}
