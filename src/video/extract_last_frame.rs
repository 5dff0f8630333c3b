//! 提取最后一帧节点

use candle_core::Device;
use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_VIDEO,
        node_base::{InputSpec, InputType},
    },
    error::Error,
    video::sequence::extract_last_frame,
    wrapper::{
        comfyui::{types::NODE_IMAGE, PromptServer},
        torch::tensor::TensorWrapper,
    },
};

/// 提取最后一帧
#[pyclass(subclass)]
pub struct ExtractLastFrame {
    device: Device,
}

impl PromptServer for ExtractLastFrame {}

#[pymethods]
impl ExtractLastFrame {
    #[new]
    fn new() -> Self {
        Self {
            device: Device::Cpu,
        }
    }

    #[classattr]
    #[pyo3(name = "INPUT_IS_LIST")]
    fn input_is_list() -> bool {
        false
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str,) {
        (NODE_IMAGE,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("last_frame",)
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool,) {
        (false,)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_VIDEO;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Extract the last frame of an image batch as a batch of one."
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
                    "images",
                    InputType::image().tooltip("Image batch, e.g. video frames"),
                )
                .build(py)
        })
    }

    #[pyo3(name = "execute")]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        images: Bound<'py, PyAny>,
    ) -> PyResult<(Bound<'py, PyAny>,)> {
        let results = self.extract(py, &images);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("ExtractLastFrame error, {e}");
                if let Err(e) = self.send_error(py, "ExtractLastFrame".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl ExtractLastFrame {
    fn extract<'py>(
        &self,
        py: Python<'py>,
        images: &Bound<'py, PyAny>,
    ) -> Result<(Bound<'py, PyAny>,), Error> {
        let images = TensorWrapper::<f32>::new(images, &self.device)?.into_tensor();
        let frame = extract_last_frame(&images)?;

        let py_frame = TensorWrapper::<f32>::from_tensor(frame).to_py_tensor(py)?;
        Ok((py_frame,))
    }
}
