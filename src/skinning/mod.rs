//! 蒙皮系统
//!
//! - WeightTable: 顶点权重入库与校验
//! - SkinningEvaluator: 线性混合蒙皮

mod evaluator;
mod weights;

pub use evaluator::{skin_vertices, SkinningEvaluator};
pub use weights::{VertexWeight, WeightTable};
