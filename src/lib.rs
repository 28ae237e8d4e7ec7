//! MMD 骨骼运动学引擎
//!
//! - skeleton: 骨骼局部坐标系构建、世界变换合成、射线拾取、姿态命令
//! - skinning: 顶点权重表与线性混合蒙皮
//! - mesh: 加载器交付的模型数据聚合（绑定顶点、面、法线、骨骼）

pub mod config;
pub mod error;
pub mod mesh;
pub mod skeleton;
pub mod skinning;

pub use config::{get_config, reset_config, set_config, SkeletonConfig, WeightPolicy};
pub use error::SkeletonError;
pub use mesh::{BoundingBox, Mesh, ModelData};
pub use skeleton::{Bone, BoneGeometry, Joint, PoseCommand, Skeleton};
pub use skinning::{SkinningEvaluator, VertexWeight, WeightTable};

/// 结果类型
pub type Result<T> = std::result::Result<T, SkeletonError>;
