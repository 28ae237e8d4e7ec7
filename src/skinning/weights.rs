//! 顶点权重表
//!
//! 加载器交付的是 (vertex, bone, weight) 稀疏三元组。
//! 入库时按 WeightPolicy 处理权重和偏离 1.0 的顶点：
//! - Normalize: 按比例缩放；权重和为 0 的顶点丢弃全部条目（视为不受骨骼影响）
//! - Reject: 返回 WeightSum 错误

use std::collections::BTreeMap;

use crate::config::WeightPolicy;
use crate::{Result, SkeletonError};

/// 单条顶点权重
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexWeight {
    /// 顶点索引
    pub vertex: u32,
    /// 骨骼 id
    pub bone: usize,
    /// 权重
    pub weight: f32,
}

impl VertexWeight {
    pub fn new(vertex: u32, bone: usize, weight: f32) -> Self {
        Self { vertex, bone, weight }
    }
}

/// 顶点权重表（保持输入顺序）
#[derive(Clone, Debug, Default)]
pub struct WeightTable {
    entries: Vec<VertexWeight>,
}

impl WeightTable {
    /// 校验并入库
    pub fn new(
        mut entries: Vec<VertexWeight>,
        bone_count: usize,
        policy: WeightPolicy,
        tolerance: f32,
    ) -> Result<Self> {
        let mut sums: BTreeMap<u32, f32> = BTreeMap::new();
        for w in &entries {
            if w.bone >= bone_count {
                return Err(SkeletonError::WeightBoneOutOfRange {
                    vertex: w.vertex,
                    bone: w.bone,
                });
            }
            *sums.entry(w.vertex).or_insert(0.0) += w.weight;
        }

        let mut scales: BTreeMap<u32, f32> = BTreeMap::new();
        for (&vertex, &sum) in &sums {
            if (sum - 1.0).abs() <= tolerance {
                continue;
            }
            match policy {
                WeightPolicy::Reject => {
                    return Err(SkeletonError::WeightSum { vertex, sum });
                }
                WeightPolicy::Normalize => {
                    scales.insert(vertex, sum);
                }
            }
        }

        if !scales.is_empty() {
            let dropped = scales.values().filter(|s| s.abs() <= f32::EPSILON).count();
            log::warn!(
                "顶点权重归一化: {} 个顶点权重和偏离 1.0，其中 {} 个权重和为 0 已丢弃",
                scales.len(),
                dropped
            );

            entries.retain(|w| match scales.get(&w.vertex) {
                Some(sum) => sum.abs() > f32::EPSILON,
                None => true,
            });
            for w in &mut entries {
                if let Some(sum) = scales.get(&w.vertex) {
                    w.weight /= sum;
                }
            }
        }

        Ok(Self { entries })
    }

    #[inline]
    pub fn entries(&self) -> &[VertexWeight] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最大顶点索引
    pub fn max_vertex(&self) -> Option<u32> {
        self.entries.iter().map(|w| w.vertex).max()
    }

    /// 检查所有顶点索引都在网格范围内
    pub fn check_vertex_count(&self, count: usize) -> Result<()> {
        match self.entries.iter().find(|w| w.vertex as usize >= count) {
            Some(w) => Err(SkeletonError::WeightVertexOutOfRange {
                vertex: w.vertex,
                count,
            }),
            None => Ok(()),
        }
    }
}
