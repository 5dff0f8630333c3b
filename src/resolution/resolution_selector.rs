//! 分辨率选择节点
//!
//! 支持 WAN / FLUX / FLUX Kontext / SDXL 预设表

use log::error;
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, IntoPyObjectExt, Py, PyAny, PyErr, PyObject, PyResult, Python,
};

use crate::{
    core::{
        category::CATEGORY_RESOLUTION,
        node_base::{InputSpec, InputType},
    },
    error::Error,
    resolution::{
        presets::PresetTables,
        selector::{
            validate_inputs, ImageFit, RatioOverride, ResolutionSelector as Selector,
            SelectionMode, SelectionRequest,
        },
        ImageSize,
    },
    wrapper::{
        comfyui::{types::NODE_INT, PromptServer},
        torch::tensor::tensor_shape,
    },
};

const DEFAULT_MODEL: &str = "WAN";
const DEFAULT_QUALITY: &str = "480p";
const DEFAULT_PRESET: &str = "1024×1024  (1:1)";

/// 分辨率选择
#[pyclass(subclass)]
pub struct ResolutionSelector {}

impl PromptServer for ResolutionSelector {}

#[pymethods]
impl ResolutionSelector {
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
    fn return_types() -> (&'static str, &'static str) {
        (NODE_INT, NODE_INT)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("width", "height")
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool, bool) {
        (false, false)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_RESOLUTION;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Select an output resolution from model presets, an input image or manual values."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        let tables =
            PresetTables::builtin().map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?;
        let wan = tables
            .model(DEFAULT_MODEL)
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?;
        let quality_options = wan.quality_names();
        let limits = wan.limits;

        Python::with_gil(|py| {
            InputSpec::new()
                .with_required(
                    "mode",
                    InputType::list(SelectionMode::options())
                        .default(SelectionMode::Auto.to_string())
                        .tooltip("Auto from image or preset; or manual size"),
                )
                .with_required(
                    "model",
                    InputType::list(tables.model_names())
                        .default(DEFAULT_MODEL)
                        .tooltip("Model type: WAN uses quality presets, others use specific resolution presets"),
                )
                .with_required(
                    "quality",
                    InputType::list(quality_options)
                        .default(DEFAULT_QUALITY)
                        .tooltip("Preset quality tier (WAN only)"),
                )
                .with_required(
                    "aspect_ratio_override",
                    InputType::list(RatioOverride::options())
                        .default(RatioOverride::Off.to_string())
                        .tooltip("Force a specific aspect ratio in auto mode (WAN only)"),
                )
                .with_required(
                    "aspect_ratio",
                    InputType::list(tables.all_preset_labels())
                        .default(DEFAULT_PRESET)
                        .tooltip("Resolution preset for the selected model"),
                )
                .with_required(
                    "manual_width",
                    InputType::int()
                        .default(832usize)
                        .min(limits.min_dimension)
                        .max(limits.max_dimension)
                        .step(limits.alignment)
                        .tooltip(format!("Manual width (multiples of {})", limits.alignment)),
                )
                .with_required(
                    "manual_height",
                    InputType::int()
                        .default(480usize)
                        .min(limits.min_dimension)
                        .max(limits.max_dimension)
                        .step(limits.alignment)
                        .tooltip(format!("Manual height (multiples of {})", limits.alignment)),
                )
                .with_required(
                    "image_fit",
                    InputType::list(ImageFit::options())
                        .default(ImageFit::Preset.to_string())
                        .tooltip("With an image: pick a preset by its ratio, or align the image size"),
                )
                .with_optional("image", InputType::image().tooltip("Optional input image"))
                .build(py)
        })
    }

    #[classmethod]
    #[pyo3(name = "VALIDATE_INPUTS", signature = (mode, model, aspect_ratio, **_kwargs))]
    fn validate_inputs(
        _cls: &Bound<'_, PyType>,
        py: Python<'_>,
        mode: &str,
        model: &str,
        aspect_ratio: &str,
        _kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<PyObject> {
        let tables =
            PresetTables::builtin().map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?;

        match validate_inputs(tables, mode, model, aspect_ratio) {
            Ok(()) => true.into_py_any(py),
            Err(message) => message.into_py_any(py),
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(
        name = "execute",
        signature = (mode, model, quality, aspect_ratio_override, aspect_ratio, manual_width, manual_height, image_fit, image=None)
    )]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        mode: &str,
        model: &str,
        quality: &str,
        aspect_ratio_override: &str,
        aspect_ratio: &str,
        manual_width: usize,
        manual_height: usize,
        image_fit: &str,
        image: Option<Bound<'py, PyAny>>,
    ) -> PyResult<(usize, usize)> {
        let results = self.select_resolution(
            mode,
            model,
            quality,
            aspect_ratio_override,
            aspect_ratio,
            manual_width,
            manual_height,
            image_fit,
            image.as_ref(),
        );

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("ResolutionSelector error, {e}");
                if let Err(e) = self.send_error(py, "ResolutionSelector".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl ResolutionSelector {
    #[allow(clippy::too_many_arguments)]
    fn select_resolution(
        &self,
        mode: &str,
        model: &str,
        quality: &str,
        aspect_ratio_override: &str,
        aspect_ratio: &str,
        manual_width: usize,
        manual_height: usize,
        image_fit: &str,
        image: Option<&Bound<'_, PyAny>>,
    ) -> Result<(usize, usize), Error> {
        let tables = PresetTables::builtin()?;
        let selector = Selector::from_tables(tables, model)?;

        let request = SelectionRequest {
            mode: parse_enum(mode)?,
            quality,
            ratio_override: parse_enum(aspect_ratio_override)?,
            aspect_ratio,
            manual_width,
            manual_height,
            image: image_size(image)?,
            image_fit: parse_enum(image_fit)?,
        };

        selector.select(&request)
    }
}

/// 解析下拉选项
pub(crate) fn parse_enum<T>(value: &str) -> Result<T, Error>
where
    T: std::str::FromStr<Err = strum::ParseError>,
{
    value
        .parse::<T>()
        .map_err(|e| Error::ParseEnumString(format!("'{value}', {e}")))
}

/// 读取可选图像的尺寸
pub(crate) fn image_size(image: Option<&Bound<'_, PyAny>>) -> Result<Option<ImageSize>, Error> {
    image
        .map(|image| ImageSize::from_shape(&tensor_shape(image)?))
        .transpose()
}

#[cfg(test)]
mod tests {
    use pyo3::types::{PyAnyMethods, PyDictMethods};

    use super::*;

    fn validate(py: Python<'_>, mode: &str, model: &str, aspect_ratio: &str) -> PyResult<PyObject> {
        let kwargs = PyDict::new(py);
        kwargs.set_item("mode", mode)?;
        kwargs.set_item("model", model)?;
        kwargs.set_item("aspect_ratio", aspect_ratio)?;
        kwargs.set_item("quality", DEFAULT_QUALITY)?;
        Ok(py
            .get_type::<ResolutionSelector>()
            .call_method("VALIDATE_INPUTS", (), Some(&kwargs))?
            .unbind())
    }

    #[test]
    #[ignore]
    fn test_input_types_groups() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();

        Python::with_gil(|py| -> anyhow::Result<()> {
            let input_types = py
                .get_type::<ResolutionSelector>()
                .call_method0("INPUT_TYPES")?
                .downcast_into::<PyDict>()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;

            let keys: Vec<String> = input_types.keys().extract()?;
            assert_eq!(keys, vec!["required", "optional"]);

            let required = input_types
                .get_item("required")?
                .ok_or_else(|| anyhow::anyhow!("missing required"))?;
            let (models, params): (Vec<String>, Bound<'_, PyDict>) =
                required.get_item("model")?.extract()?;
            assert!(models.contains(&"SDXL".to_string()));
            let default: String = params
                .get_item("default")?
                .ok_or_else(|| anyhow::anyhow!("missing default"))?
                .extract()?;
            assert_eq!(default, DEFAULT_MODEL);

            let optional = input_types
                .get_item("optional")?
                .ok_or_else(|| anyhow::anyhow!("missing optional"))?;
            let (image_type, _): (String, Bound<'_, PyDict>) =
                optional.get_item("image")?.extract()?;
            assert_eq!(image_type, "IMAGE");
            Ok(())
        })
    }

    #[test]
    #[ignore]
    fn test_validate_inputs_return_values() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();

        Python::with_gil(|py| -> anyhow::Result<()> {
            let ok: bool = validate(py, "auto", "FLUX", DEFAULT_PRESET)?.extract(py)?;
            assert!(ok);

            let message: String = validate(py, "auto", "SDXL", "1344×768  (16:9)")?.extract(py)?;
            assert_eq!(
                message,
                "Selected resolution '1344×768  (16:9)' is not valid for SDXL model"
            );
            Ok(())
        })
    }
}
