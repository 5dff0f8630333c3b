#[cfg(feature = "mkl")]
extern crate intel_mkl_src;

#[cfg(feature = "accelerate")]
extern crate accelerate_src;

use pyo3::{
    pymodule,
    types::{PyDict, PyDictMethods, PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

pub mod core;
pub mod error;
pub mod resolution;
pub mod utils;
pub mod video;
pub mod wrapper;
pub mod xy_plot;

use crate::core::node::NodeRegister;

/// 所有节点
fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let mut nodes = Vec::new();
    nodes.extend(resolution::node_register(py)?);
    nodes.extend(video::node_register(py)?);
    nodes.extend(utils::node_register(py)?);
    nodes.extend(xy_plot::node_register(py)?);
    Ok(nodes)
}

/// A Python module implemented in Rust.
#[pymodule]
#[pyo3(name = "comfyui_j1mb091")] // 需要与包名保持一致
fn py_init(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    let _ = tracing_subscriber::fmt()
        .with_ansi(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init();

    m.add_submodule(&resolution::submodule(py)?)?;
    m.add_submodule(&video::submodule(py)?)?;
    m.add_submodule(&utils::submodule(py)?)?;
    m.add_submodule(&xy_plot::submodule(py)?)?;

    // 注册 ComfyUI NODE_CLASS_MAPPINGS/NODE_DISPLAY_NAME_MAPPINGS
    let node_mapping = PyDict::new(py);
    let name_mapping = PyDict::new(py);
    for NodeRegister(name, class, display_name) in node_register(py)? {
        node_mapping.set_item(name, class)?;
        name_mapping.set_item(name, display_name)?;
    }

    m.add("NODE_CLASS_MAPPINGS", node_mapping)?;
    m.add("NODE_DISPLAY_NAME_MAPPINGS", name_mapping)?;
    Ok(())
}
