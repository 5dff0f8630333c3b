//! 工具
pub mod image;
