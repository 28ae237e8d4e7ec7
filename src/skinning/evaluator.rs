//! 线性混合蒙皮
//!
//! animated(v) = Σ w · (bone.transform · inverse(bone.bind_transform)) · v_bind
//!
//! 每次调用完整重算，不做增量修补。
//! 权重和在容差内偏离 1 时，结果按权重和（即累加后的 w）归一化。
//! 只受绑定姿态骨骼影响的顶点原样输出，保证静止时逐位等于绑定顶点。

use glam::{Mat4, Vec4};

use super::weights::VertexWeight;
use crate::skeleton::Skeleton;
use crate::{Result, SkeletonError};

/// 蒙皮求值器
///
/// 只持有可复用的缓冲区，不跨帧保留对骨骼的引用。
#[derive(Debug, Default)]
pub struct SkinningEvaluator {
    /// 每骨骼蒙皮矩阵（None = 处于绑定姿态）
    skin_matrices: Vec<Option<Mat4>>,
    /// 需要混合的顶点标记
    blended: Vec<bool>,
}

impl SkinningEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算蒙皮顶点
    ///
    /// `output` 被整体覆盖，长度与 `bind_vertices` 相同。
    pub fn evaluate(
        &mut self,
        skeleton: &Skeleton,
        bind_vertices: &[Vec4],
        output: &mut Vec<Vec4>,
    ) -> Result<()> {
        let weights = skeleton.weights();
        weights.check_vertex_count(bind_vertices.len())?;

        self.skin_matrices.clear();
        self.skin_matrices.extend(skeleton.bones().iter().map(|bone| {
            if bone.is_at_bind_pose() {
                None
            } else {
                Some(bone.skinning_matrix())
            }
        }));

        // 标记受已变形骨骼影响的顶点
        self.blended.clear();
        self.blended.resize(bind_vertices.len(), false);
        for w in weights.entries() {
            if self.bone_matrix(w)?.is_some() {
                self.blended[w.vertex as usize] = true;
            }
        }

        output.clear();
        output.extend_from_slice(bind_vertices);
        for (v, blended) in output.iter_mut().zip(&self.blended) {
            if *blended {
                *v = Vec4::ZERO;
            }
        }

        for w in weights.entries() {
            let vertex = w.vertex as usize;
            if !self.blended[vertex] {
                continue;
            }
            let bind = bind_vertices[vertex];
            let moved = match self.bone_matrix(w)? {
                Some(m) => m * bind,
                None => bind,
            };
            output[vertex] += moved * w.weight;
        }

        // 累加后 w = Σ weight，齐次除法得到加权平均
        for (v, blended) in output.iter_mut().zip(&self.blended) {
            let w = v.w;
            if *blended && w != 0.0 {
                *v /= w;
            }
        }

        Ok(())
    }

    fn bone_matrix(&self, w: &VertexWeight) -> Result<Option<Mat4>> {
        self.skin_matrices
            .get(w.bone)
            .copied()
            .ok_or(SkeletonError::UnknownBone(w.bone))
    }
}

/// 单次求值的便捷函数
pub fn skin_vertices(skeleton: &Skeleton, bind_vertices: &[Vec4]) -> Result<Vec<Vec4>> {
    let mut output = Vec::with_capacity(bind_vertices.len());
    SkinningEvaluator::new().evaluate(skeleton, bind_vertices, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SkeletonConfig;
    use crate::skeleton::Joint;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn arm(weights: Vec<VertexWeight>) -> Skeleton {
        // 沿 +X 的两节手臂：[0,1] 和 [1,2]
        let joints = [Joint::root(Vec3::X), Joint::new(Vec3::X, 0)];
        Skeleton::with_config(&joints, weights, &SkeletonConfig::default()).unwrap()
    }

    fn bind_vertices() -> Vec<Vec4> {
        vec![
            Vec4::new(0.5, 0.1, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.2, 1.0),
            Vec4::new(1.5, -0.1, 0.0, 1.0),
            Vec4::new(9.0, 9.0, 9.0, 1.0),
        ]
    }

    fn weights() -> Vec<VertexWeight> {
        vec![
            VertexWeight::new(0, 0, 1.0),
            VertexWeight::new(1, 0, 0.5),
            VertexWeight::new(1, 1, 0.5),
            VertexWeight::new(2, 1, 1.0),
        ]
    }

    #[test]
    fn test_bind_pose_is_identity() {
        let skeleton = arm(weights());
        let bind = bind_vertices();
        let animated = skin_vertices(&skeleton, &bind).unwrap();
        assert_eq!(animated, bind);
    }

    #[test]
    fn test_rigid_child_rotation() {
        let mut skeleton = arm(weights());
        // 肘部绕世界 Z 轴（子骨骼父相对空间中的对应轴）弯曲 90°
        let axis = skeleton
            .id_to_bone(0)
            .unwrap()
            .rotation()
            .transpose()
            .transform_vector3(Vec3::Z);
        skeleton.rotate(1, FRAC_PI_2, axis).unwrap();

        let bind = bind_vertices();
        let animated = skin_vertices(&skeleton, &bind).unwrap();

        // 只受 bone 0 影响的顶点不动
        assert_eq!(animated[0], bind[0]);
        // 无权重顶点原样输出
        assert_eq!(animated[3], bind[3]);
        // (1.5, -0.1) 绕 (1, 0) 转 90° -> (1.1, 0.5)
        assert!(animated[2].abs_diff_eq(Vec4::new(1.1, 0.5, 0.0, 1.0), 1e-5));
        // 关节处顶点：半个静止 + 半个旋转
        // (1, 0, 0.2) 绕 (1,0) 转 90° 仍为 (1, 0, 0.2)
        assert!(animated[1].abs_diff_eq(bind[1], 1e-5));
    }

    #[test]
    fn test_blend_is_weighted_average() {
        let mut skeleton = arm(vec![
            VertexWeight::new(0, 0, 0.25),
            VertexWeight::new(0, 1, 0.75),
        ]);
        let axis = skeleton
            .id_to_bone(0)
            .unwrap()
            .rotation()
            .transpose()
            .transform_vector3(Vec3::Z);
        skeleton.rotate(1, FRAC_PI_2, axis).unwrap();

        let bind = vec![Vec4::new(2.0, 0.0, 0.0, 1.0)];
        let animated = skin_vertices(&skeleton, &bind).unwrap();
        // bone 0: (2,0,0)；bone 1: (1,1,0)
        let expected = Vec4::new(2.0, 0.0, 0.0, 1.0) * 0.25 + Vec4::new(1.0, 1.0, 0.0, 1.0) * 0.75;
        assert!(animated[0].abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_blend_with_weight_sum_within_tolerance() {
        // 0.4995 + 0.5 在默认容差 1e-3 内，入库时不重新缩放
        let mut skeleton = arm(vec![
            VertexWeight::new(0, 0, 0.4995),
            VertexWeight::new(0, 1, 0.5),
        ]);
        let axis = skeleton
            .id_to_bone(0)
            .unwrap()
            .rotation()
            .transpose()
            .transform_vector3(Vec3::Z);
        skeleton.rotate(1, FRAC_PI_2, axis).unwrap();

        let bind = vec![Vec4::new(2.0, 0.0, 0.0, 1.0)];
        let animated = skin_vertices(&skeleton, &bind).unwrap();
        let sum = 0.9995;
        let expected = (Vec4::new(2.0, 0.0, 0.0, 1.0) * 0.4995
            + Vec4::new(1.0, 1.0, 0.0, 1.0) * 0.5)
            / sum;
        assert_eq!(animated[0].w, 1.0);
        assert!(animated[0].abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_root_motion_moves_everything() {
        let mut skeleton = arm(weights());
        skeleton.rotate(0, FRAC_PI_2, Vec3::Z).unwrap();
        let bind = bind_vertices();
        let animated = skin_vertices(&skeleton, &bind).unwrap();

        // 整条手臂绕原点转 90°：(x, y) -> (-y, x)
        for i in 0..3 {
            let b = bind[i];
            let expected = Vec4::new(-b.y, b.x, b.z, 1.0);
            assert!(animated[i].abs_diff_eq(expected, 1e-5), "{i}: {}", animated[i]);
        }
    }

    #[test]
    fn test_reused_evaluator_recomputes_fully() {
        let mut skeleton = arm(weights());
        let bind = bind_vertices();
        let mut evaluator = SkinningEvaluator::new();
        let mut output = Vec::new();

        skeleton.roll(1, 0.8).unwrap();
        evaluator.evaluate(&skeleton, &bind, &mut output).unwrap();
        assert_ne!(output[2], bind[2]);

        skeleton.reset_pose();
        evaluator.evaluate(&skeleton, &bind, &mut output).unwrap();
        assert_eq!(output, bind);
    }

    #[test]
    fn test_vertex_out_of_range() {
        let skeleton = arm(vec![VertexWeight::new(10, 0, 1.0)]);
        let err = skin_vertices(&skeleton, &bind_vertices()).unwrap_err();
        assert_eq!(err, SkeletonError::WeightVertexOutOfRange { vertex: 10, count: 4 });
    }
}
