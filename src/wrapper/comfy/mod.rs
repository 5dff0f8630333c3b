//! comfy 包装
//!
//! 依赖:
//! - python: folder_paths, comfy.cli_args, comfy.sample, comfy.samplers, latent_preview
pub mod cli_args;
pub mod folder_paths;
pub mod sample;
