//! 节点分类

/// 分辨率
pub const CATEGORY_RESOLUTION: &str = "J1mB091/Resolution";
/// 视频帧序列
pub const CATEGORY_VIDEO: &str = "J1mB091/Video";
/// 实用工具
pub const CATEGORY_UTILITY: &str = "J1mB091/Utility";
/// XY 图表
pub const CATEGORY_XY_PLOT: &str = "J1mB091/XY Plot";
