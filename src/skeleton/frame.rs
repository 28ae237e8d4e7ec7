//! 骨骼局部坐标系构建
//!
//! 输入：骨骼偏移向量（相对父骨骼末端，世界方向）与父骨骼。
//! 输出：局部平移 T、正交基旋转 R（列为 t/n/b）以及骨骼长度。
//!
//! 仅凭方向向量无法确定骨骼绕自身轴的滚转，这里用“分量最小的世界轴”
//! 作为辅助轴，为每根骨骼给出确定且稳定的初始滚转。

use glam::{Mat4, Vec3, Vec4};

use super::bone::Bone;

/// 局部坐标系构建结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalFrame {
    /// 局部平移（父骨骼局部空间）
    pub translation: Mat4,
    /// 局部旋转（列 0/1/2 = tangent/normal/binormal）
    pub rotation: Mat4,
    /// 骨骼长度
    pub length: f32,
}

impl LocalFrame {
    /// 根据偏移和父骨骼构建局部坐标系
    ///
    /// 父骨骼必须已构建完毕（其 endpoint / transform 可用）。
    pub fn build(offset: Vec3, parent: Option<&Bone>) -> Self {
        let (origin_world, parent_transform) = match parent {
            Some(p) => (p.endpoint(), p.transform()),
            None => (Vec4::new(0.0, 0.0, 0.0, 1.0), Mat4::IDENTITY),
        };

        // 枢轴落在父骨骼末端，与父骨骼累计旋转无关
        let origin_local = parent_transform.inverse() * origin_world;
        let translation = Mat4::from_translation(origin_local.truncate());

        let length = offset.length();

        // 偏移在骨骼自身（旋转前）空间中的方向；零长度骨骼沿局部 +X
        let tangent = if length > f32::EPSILON {
            let tip_world = origin_world.truncate() + offset;
            (parent_transform * translation)
                .inverse()
                .transform_point3(tip_world)
                .try_normalize()
                .unwrap_or(Vec3::X)
        } else {
            Vec3::X
        };

        let rotation = orthonormal_basis(tangent);

        Self { translation, rotation, length }
    }
}

/// 选取与 t 最不平行的世界轴
///
/// 取 |分量| 最小的轴；完全相等时按 X、Y、Z 的顺序优先。
pub fn auxiliary_axis(t: Vec3) -> Vec3 {
    let a = t.abs();
    if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    }
}

/// 由切向量构建右手正交基 {t, n, b}
pub fn orthonormal_basis(tangent: Vec3) -> Mat4 {
    let v = auxiliary_axis(tangent);
    let n = tangent.cross(v).normalize();
    let b = tangent.cross(n).normalize();

    Mat4::from_cols(
        tangent.extend(0.0),
        n.extend(0.0),
        b.extend(0.0),
        Vec4::W,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(r: Mat4) {
        let t = r.col(0).truncate();
        let n = r.col(1).truncate();
        let b = r.col(2).truncate();
        assert!((t.length() - 1.0).abs() < 1e-5);
        assert!((n.length() - 1.0).abs() < 1e-5);
        assert!((b.length() - 1.0).abs() < 1e-5);
        assert!(t.dot(n).abs() < 1e-5);
        assert!(t.dot(b).abs() < 1e-5);
        assert!(n.dot(b).abs() < 1e-5);
        // 右手系：t × n = b
        assert!(t.cross(n).abs_diff_eq(b, 1e-5));
        assert_eq!(r.row(3), Vec4::W);
    }

    #[test]
    fn test_auxiliary_axis_tie_break() {
        assert_eq!(auxiliary_axis(Vec3::new(0.0, 1.0, 0.0)), Vec3::X);
        assert_eq!(auxiliary_axis(Vec3::new(1.0, 0.0, 0.0)), Vec3::Y);
        assert_eq!(auxiliary_axis(Vec3::new(0.0, 0.0, 1.0)), Vec3::X);
        assert_eq!(auxiliary_axis(Vec3::new(0.9, 0.4, 0.1)), Vec3::Z);
        assert_eq!(auxiliary_axis(Vec3::new(-0.2, 0.1, -0.97)), Vec3::Y);
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let dirs = [
            Vec3::X,
            Vec3::Y,
            Vec3::Z,
            Vec3::new(1.0, 1.0, 1.0).normalize(),
            Vec3::new(-0.3, 0.9, 0.1).normalize(),
            Vec3::new(0.001, -1.0, 0.0005).normalize(),
        ];
        for d in dirs {
            let r = orthonormal_basis(d);
            assert_orthonormal(r);
            assert!(r.col(0).truncate().abs_diff_eq(d, 1e-6));
        }
    }

    #[test]
    fn test_root_frame() {
        let frame = LocalFrame::build(Vec3::new(0.0, 3.0, 4.0), None);
        assert_eq!(frame.translation, Mat4::IDENTITY);
        assert!((frame.length - 5.0).abs() < 1e-6);
        assert!(frame.rotation.col(0).truncate().abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), 1e-6));
        assert_orthonormal(frame.rotation);
    }

    #[test]
    fn test_zero_offset_defaults_to_x() {
        let frame = LocalFrame::build(Vec3::ZERO, None);
        assert_eq!(frame.length, 0.0);
        assert_eq!(frame.rotation.col(0).truncate(), Vec3::X);
        assert_orthonormal(frame.rotation);
    }
}
