//! 类型定义
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

pub const NODE_INT: &str = "INT";
pub const NODE_STRING: &str = "STRING";
pub const NODE_BOOLEAN: &str = "BOOLEAN";
pub const NODE_FLOAT: &str = "FLOAT";
pub const NODE_IMAGE: &str = "IMAGE";
pub const NODE_MODEL: &str = "MODEL";
pub const NODE_CONDITIONING: &str = "CONDITIONING";
pub const NODE_LATENT: &str = "LATENT";
pub const NODE_VAE: &str = "VAE";
/// XY 图表配置, 由上游的 XY 输入节点提供
pub const NODE_ADV_XYPLOT: &str = "ADV_XYPLOT";

/// 隐藏输入: 工作流提示词
pub const NODE_HIDDEN_PROMPT: &str = "PROMPT";
/// 隐藏输入: 工作流附加信息
pub const NODE_HIDDEN_EXTRA_PNGINFO: &str = "EXTRA_PNGINFO";
/// 隐藏输入: 节点 ID
pub const NODE_HIDDEN_UNIQUE_ID: &str = "UNIQUE_ID";

pub const NODE_INT_MAX: u64 = 0xffffffffffffffffu64;
