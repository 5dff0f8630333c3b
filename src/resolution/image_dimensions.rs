//! 图像尺寸节点

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
    resolution::ImageSize,
    wrapper::{
        comfyui::{types::NODE_INT, PromptServer},
        torch::tensor::tensor_shape,
    },
};

/// 图像尺寸
#[pyclass(subclass)]
pub struct ImageDimensions {}

impl PromptServer for ImageDimensions {}

#[pymethods]
impl ImageDimensions {
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
        (NODE_INT, NODE_INT, NODE_INT)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str) {
        ("width", "height", "batch_size")
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
        "Width, height and batch size of the input image."
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
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        image: Bound<'py, PyAny>,
    ) -> PyResult<(usize, usize, usize)> {
        let results = self.dimensions(&image);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("ImageDimensions error, {e}");
                if let Err(e) = self.send_error(py, "ImageDimensions".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl ImageDimensions {
    fn dimensions(&self, image: &Bound<'_, PyAny>) -> Result<(usize, usize, usize), Error> {
        let size = ImageSize::from_shape(&tensor_shape(image)?)?;
        Ok((size.width, size.height, size.batch))
    }
}
