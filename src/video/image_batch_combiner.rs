//! 图像批次合并节点

use candle_core::Device;
use log::{error, info};
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
    video::sequence::combine_batches,
    wrapper::{
        comfyui::{types::NODE_IMAGE, PromptServer},
        torch::tensor::TensorWrapper,
    },
};

/// 图像批次合并
#[pyclass(subclass)]
pub struct ImageBatchCombiner {
    device: Device,
}

impl PromptServer for ImageBatchCombiner {}

#[pymethods]
impl ImageBatchCombiner {
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
        ("combined_images",)
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
        "Join two frame batches, dropping the last frame of the first batch since it repeats the first frame of the second."
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
                    "first_images",
                    InputType::image().tooltip("First batch of frames"),
                )
                .with_required(
                    "last_images",
                    InputType::image().tooltip("Second batch of frames"),
                )
                .with_required(
                    "ignore_first_images",
                    InputType::bool()
                        .default(false)
                        .label_on("ignore")
                        .label_off("combine")
                        .tooltip("Return only the second batch"),
                )
                .build(py)
        })
    }

    #[pyo3(name = "execute")]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        first_images: Bound<'py, PyAny>,
        last_images: Bound<'py, PyAny>,
        ignore_first_images: bool,
    ) -> PyResult<(Bound<'py, PyAny>,)> {
        let results = self.combine(py, &first_images, &last_images, ignore_first_images);

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("ImageBatchCombiner error, {e}");
                if let Err(e) =
                    self.send_error(py, "ImageBatchCombiner".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl ImageBatchCombiner {
    fn combine<'py>(
        &self,
        py: Python<'py>,
        first_images: &Bound<'py, PyAny>,
        last_images: &Bound<'py, PyAny>,
        ignore_first_images: bool,
    ) -> Result<(Bound<'py, PyAny>,), Error> {
        // 忽略第一段时直接透传, 避免复制
        if ignore_first_images {
            return Ok((last_images.clone(),));
        }

        let first = TensorWrapper::<f32>::new(first_images, &self.device)?.into_tensor();
        let last = TensorWrapper::<f32>::new(last_images, &self.device)?.into_tensor();

        let combined = combine_batches(&first, &last, ignore_first_images)?;
        info!(
            "combined {} + {} frames into {}",
            first.dim(0)?,
            last.dim(0)?,
            combined.dim(0)?
        );

        let py_combined = TensorWrapper::<f32>::from_tensor(combined).to_py_tensor(py)?;
        Ok((py_combined,))
    }
}
