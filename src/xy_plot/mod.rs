//! XY 图表
use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod grid;
pub mod plot_values;

mod ksampler_xy_plot;
pub use ksampler_xy_plot::KSamplerXYPlot;

/// XY 图表模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "xy_plot")?;
    submodule.add_class::<KSamplerXYPlot>()?;
    Ok(submodule)
}

/// XY plot node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "KSamplerXYPlot",
        py.get_type::<KSamplerXYPlot>(),
        "J1mB091's KSampler XY Plot 📊",
    )];
    Ok(nodes)
}
