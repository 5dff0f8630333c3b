//! 随机种子

use pyo3::{
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_UTILITY,
        node_base::{InputSpec, InputType},
    },
    wrapper::comfyui::types::{NODE_INT, NODE_INT_MAX},
};

/// 种子生成器
///
/// 前端的 control_after_generate 负责更新种子, 节点本身原样输出
#[pyclass(subclass)]
pub struct SeedGenerator {}

#[pymethods]
impl SeedGenerator {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "INPUT_IS_LIST")]
    fn input_is_list() -> bool {
        false
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_INT,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("seed",)
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_TOOLTIPS")]
    fn output_tooltips() -> (&'static str,) {
        ("Seed value, connect it to samplers and the image saver",)
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool,) {
        (false,)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_UTILITY;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Output a seed value that can be shared between samplers and the image saver."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            InputSpec::new()
                .with_required(
                    "seed",
                    InputType::int()
                        .default(0u64)
                        .min(0u64)
                        .max(NODE_INT_MAX)
                        .tooltip("Seed value"),
                )
                .build(py)
        })
    }

    #[pyo3(name = "execute")]
    fn execute(&mut self, seed: u64) -> PyResult<(u64,)> {
        Ok((seed,))
    }
}
