//! 视频帧序列
use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod sequence;

mod extract_last_frame;
pub use extract_last_frame::ExtractLastFrame;

mod image_batch_combiner;
pub use image_batch_combiner::ImageBatchCombiner;

/// 视频模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "video")?;
    submodule.add_class::<ExtractLastFrame>()?;
    submodule.add_class::<ImageBatchCombiner>()?;
    Ok(submodule)
}

/// Video node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "ExtractLastFrame",
            py.get_type::<ExtractLastFrame>(),
            "J1mB091's Extract Last Frame 📸",
        ),
        NodeRegister(
            "ImageBatchCombiner",
            py.get_type::<ImageBatchCombiner>(),
            "J1mB091's Image Batch Combiner 🔗",
        ),
    ];
    Ok(nodes)
}
