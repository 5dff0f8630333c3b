//! 实用工具
use pyo3::{
    types::{PyModule, PyModuleMethods},
    Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

pub mod image_saver;
pub use image_saver::{ImageSaver, SavedImage, TextChunk};

pub mod save_counter;

mod seed_generator;
pub use seed_generator::SeedGenerator;

mod save_image_with_seed;
pub use save_image_with_seed::SaveImageWithSeed;

/// 工具模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "utils")?;
    submodule.add_class::<SeedGenerator>()?;
    submodule.add_class::<SaveImageWithSeed>()?;
    Ok(submodule)
}

/// Utils node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "SeedGenerator",
            py.get_type::<SeedGenerator>(),
            "J1mB091's Seed Generator 🎲",
        ),
        NodeRegister(
            "SaveImageWithSeed",
            py.get_type::<SaveImageWithSeed>(),
            "J1mB091's Save Image With Seed 💾",
        ),
    ];
    Ok(nodes)
}
