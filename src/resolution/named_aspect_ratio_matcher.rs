//! 命名宽高比匹配节点

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyErr, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_RESOLUTION,
        node_base::{InputSpec, InputType},
    },
    error::Error,
    resolution::RatioMatcher,
    wrapper::comfyui::{types::NODE_STRING, PromptServer},
};

/// 命名宽高比匹配
#[pyclass(subclass)]
pub struct NamedAspectRatioMatcher {}

impl PromptServer for NamedAspectRatioMatcher {}

#[pymethods]
impl NamedAspectRatioMatcher {
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
    fn return_types() -> (&'static str, &'static str, &'static str) {
        (NODE_STRING, NODE_STRING, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str) {
        ("closest_named_ratio", "ratio", "label")
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_TOOLTIPS")]
    fn output_tooltips() -> (&'static str, &'static str, &'static str) {
        (
            "Closest named ratio, e.g. '16:9 (Panorama)'",
            "Canonical ratio of the matched entry",
            "Human-friendly label of the matched entry",
        )
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool, bool, bool) {
        (false, false, false)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_RESOLUTION;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Match an aspect ratio string against a table of named ratios."
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
                    "input_ratio",
                    InputType::string()
                        .default("16:9")
                        .tooltip("Aspect ratio as 'width:height', e.g. 16:9 or 1920:1080"),
                )
                .build(py)
        })
    }

    #[pyo3(name = "execute")]
    fn execute(&mut self, py: Python, input_ratio: &str) -> PyResult<(String, String, String)> {
        let results = self.match_named_ratio(input_ratio);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("NamedAspectRatioMatcher error, {e}");
                if let Err(e) =
                    self.send_error(py, "NamedAspectRatioMatcher".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl NamedAspectRatioMatcher {
    fn match_named_ratio(&self, input_ratio: &str) -> Result<(String, String, String), Error> {
        let result = RatioMatcher::builtin()?.match_ratio(input_ratio)?;
        Ok((result.to_string(), result.ratio, result.label))
    }
}
