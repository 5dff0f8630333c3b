//! 图像宽高比节点

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_RESOLUTION,
        node_base::{InputSpec, InputType},
    },
    error::Error,
    resolution::{AspectRatio, ImageSize},
    wrapper::{
        comfyui::{types::NODE_STRING, PromptServer},
        torch::tensor::tensor_shape,
    },
};

/// 从图像计算最简宽高比
#[pyclass(subclass)]
pub struct AspectRatioFromImage {}

impl PromptServer for AspectRatioFromImage {}

#[pymethods]
impl AspectRatioFromImage {
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
        (NODE_STRING,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("aspect_ratio",)
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool,) {
        (false,)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_RESOLUTION;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Reduced aspect ratio 'w:h' of the input image."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            InputSpec::new()
                .with_required("image", InputType::image().tooltip("Input image"))
                .build(py)
        })
    }

    #[pyo3(name = "execute")]
    fn execute<'py>(&mut self, py: Python<'py>, image: Bound<'py, PyAny>) -> PyResult<(String,)> {
        let results = self.aspect_ratio(&image);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("AspectRatioFromImage error, {e}");
                if let Err(e) =
                    self.send_error(py, "AspectRatioFromImage".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl AspectRatioFromImage {
    fn aspect_ratio(&self, image: &Bound<'_, PyAny>) -> Result<(String,), Error> {
        let size = ImageSize::from_shape(&tensor_shape(image)?)?;
        let ratio = AspectRatio::from_dimensions(size.width, size.height)?;
        Ok((ratio.to_string(),))
    }
}
