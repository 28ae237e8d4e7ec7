//! 骨骼系统配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 顶点权重和偏离 1.0 时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightPolicy {
    /// 按比例缩放使权重和为 1.0
    #[default]
    Normalize,
    /// 直接报错
    Reject,
}

/// 骨骼配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct SkeletonConfig {
    // ========== 拾取 ==========
    /// 骨骼拾取圆柱半径，默认 0.25
    pub pick_radius: f32,

    // ========== 权重 ==========
    /// 权重和异常处理策略，默认 Normalize
    pub weight_policy: WeightPolicy,
    /// 权重和容差，默认 1e-3
    pub weight_tolerance: f32,

    // ========== 层级 ==========
    /// 最大骨骼链深度，默认 512
    pub max_depth: usize,

    // ========== 调试 ==========
    /// 是否输出每根骨骼的坐标系，默认 false
    pub debug_log: bool,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            // ====== 拾取 ======
            // 与调试线框中骨骼圆柱的粗细一致
            pick_radius: 0.25,

            // ====== 权重 ======
            // PMD 的权重是 0~100 整数换算而来，和通常有少量误差
            weight_policy: WeightPolicy::Normalize,
            weight_tolerance: 1.0e-3,

            // ====== 层级 ======
            // 常见模型不超过 50 层
            max_depth: 512,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

/// 全局配置实例
static SKELETON_CONFIG: Lazy<RwLock<SkeletonConfig>> = Lazy::new(|| {
    RwLock::new(SkeletonConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> SkeletonConfig {
    SKELETON_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: SkeletonConfig) {
    *SKELETON_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *SKELETON_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = SkeletonConfig::default();
}
