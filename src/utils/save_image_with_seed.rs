//! 保存图像, 文件名附带种子

use candle_core::Device;
use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyTuple, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};
use serde::Serialize;

use crate::{
    core::{
        category::CATEGORY_UTILITY,
        node_base::{InputSpec, InputType},
        utils::image::tensor_to_images,
    },
    error::Error,
    utils::image_saver::{ImageSaver, SavedImage},
    wrapper::{
        comfy::{cli_args::disable_metadata, folder_paths::get_output_directory},
        comfyui::{
            node_input::WorkflowMetadata,
            types::{NODE_HIDDEN_EXTRA_PNGINFO, NODE_HIDDEN_PROMPT, NODE_INT_MAX},
            PromptServer,
        },
        torch::tensor::TensorWrapper,
    },
};

#[derive(Serialize)]
struct UiImages<'a> {
    images: &'a [SavedImage],
}

#[derive(Serialize)]
struct NodeOutput<'a> {
    ui: UiImages<'a>,
}

/// 保存图像
#[pyclass(subclass)]
pub struct SaveImageWithSeed {
    device: Device,
}

impl PromptServer for SaveImageWithSeed {}

#[pymethods]
impl SaveImageWithSeed {
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
    #[pyo3(name = "OUTPUT_NODE")]
    fn output_node() -> bool {
        true
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types(py: Python<'_>) -> Py<PyTuple> {
        PyTuple::empty(py).unbind()
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_UTILITY;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Save images to the ComfyUI output directory, optionally adding the seed to the filename."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            InputSpec::new()
                .with_required("images", InputType::image().tooltip("The images to save."))
                .with_required(
                    "filename_prefix",
                    InputType::string().default("ComfyUI").tooltip(
                        "The prefix for the file to save. May contain a subfolder and the \
                         %width%, %height% and %batch_num% tokens.",
                    ),
                )
                .with_optional(
                    "seed",
                    InputType::int()
                        .default(0u64)
                        .min(0u64)
                        .max(NODE_INT_MAX)
                        .force_input(true)
                        .tooltip("Seed appended to the filename"),
                )
                .with_hidden("prompt", InputType::hidden(NODE_HIDDEN_PROMPT))
                .with_hidden("extra_pnginfo", InputType::hidden(NODE_HIDDEN_EXTRA_PNGINFO))
                .build(py)
        })
    }

    #[pyo3(name = "execute", signature = (images, filename_prefix, seed=None, prompt=None, extra_pnginfo=None))]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        images: Bound<'py, PyAny>,
        filename_prefix: String,
        seed: Option<u64>,
        prompt: Option<Bound<'py, PyAny>>,
        extra_pnginfo: Option<Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let results = self.save_images(py, &images, &filename_prefix, seed, prompt, extra_pnginfo);

        match results {
            Ok(saved) => self.node_result(py, &saved),
            Err(e) => {
                error!("SaveImageWithSeed error, {e}");
                if let Err(e) = self.send_error(py, "SaveImageWithSeed".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl SaveImageWithSeed {
    /// 组合为前端需要的数据结构
    fn node_result<'py>(&self, py: Python<'py>, saved: &[SavedImage]) -> PyResult<Bound<'py, PyAny>> {
        let output = NodeOutput {
            ui: UiImages { images: saved },
        };
        Ok(pythonize::pythonize(py, &output)?)
    }
}

impl SaveImageWithSeed {
    fn save_images<'py>(
        &self,
        py: Python<'py>,
        images: &Bound<'py, PyAny>,
        filename_prefix: &str,
        seed: Option<u64>,
        prompt: Option<Bound<'py, PyAny>>,
        extra_pnginfo: Option<Bound<'py, PyDict>>,
    ) -> Result<Vec<SavedImage>, Error> {
        let output_dir = get_output_directory(py)?;

        let images = TensorWrapper::<f32>::new(images, &self.device)?.into_tensor();
        let frames = tensor_to_images(&images)?;

        let metadata = if disable_metadata(py)? {
            Vec::new()
        } else {
            WorkflowMetadata::new(prompt, extra_pnginfo).text_chunks()?
        };

        ImageSaver::new(output_dir).save_batch(&frames, filename_prefix, seed, &metadata)
    }
}

#[cfg(test)]
mod tests {
    use pyo3::types::{PyAnyMethods, PyDictMethods, PyListMethods};

    use super::*;

    #[test]
    #[ignore]
    fn test_node_result_ui_images() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();

        Python::with_gil(|py| -> anyhow::Result<()> {
            let saved = vec![SavedImage {
                filename: "ComfyUI_00001_.png".to_string(),
                subfolder: "seeds".to_string(),
                kind: "output".to_string(),
            }];

            let result = SaveImageWithSeed::new()
                .node_result(py, &saved)?
                .downcast_into::<PyDict>()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;

            let ui = result
                .get_item("ui")?
                .ok_or_else(|| anyhow::anyhow!("missing ui"))?
                .downcast_into::<PyDict>()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            let images = ui
                .get_item("images")?
                .ok_or_else(|| anyhow::anyhow!("missing images"))?
                .downcast_into::<pyo3::types::PyList>()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            assert_eq!(images.len(), 1);

            let image = images.get_item(0)?;
            let filename: String = image.get_item("filename")?.extract()?;
            let subfolder: String = image.get_item("subfolder")?.extract()?;
            let kind: String = image.get_item("type")?.extract()?;
            assert_eq!(filename, "ComfyUI_00001_.png");
            assert_eq!(subfolder, "seeds");
            assert_eq!(kind, "output");
            Ok(())
        })
    }
}
