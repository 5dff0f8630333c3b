//! 文件夹路径
//!
//! 对应 ComfyUI/folder_paths.py

use std::path::PathBuf;

use pyo3::{types::PyAnyMethods, PyResult, Python};

/// 获取 ComfyUI 输出目录
pub fn get_output_directory(py: Python<'_>) -> PyResult<PathBuf> {
    let output_directory: String = py
        .import("folder_paths")?
        .getattr("get_output_directory")?
        .call0()?
        .extract()?;
    Ok(PathBuf::from(output_directory))
}
