//! 命令行参数
//!
//! 对应 ComfyUI/comfy/cli_args.py

use pyo3::{types::PyAnyMethods, PyResult, Python};

/// 是否通过 --disable-metadata 禁止写入元数据
pub fn disable_metadata(py: Python<'_>) -> PyResult<bool> {
    py.import("comfy.cli_args")?
        .getattr("args")?
        .getattr("disable_metadata")?
        .extract()
}
