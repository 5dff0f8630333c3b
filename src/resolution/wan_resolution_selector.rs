//! WAN 分辨率选择节点
//!
//! 仅使用 WAN 质量档位预设, 手动尺寸需为 32 的倍数

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
    resolution::{
        presets::PresetTables,
        resolution_selector::{image_size, parse_enum},
        selector::{ImageFit, RatioOverride, ResolutionSelector, SelectionMode, SelectionRequest},
    },
    wrapper::comfyui::{types::NODE_INT, PromptServer},
};

const WAN_MODEL: &str = "WAN";
const DEFAULT_QUALITY: &str = "720p";

/// WAN 分辨率选择
#[pyclass(subclass)]
pub struct WanResolutionSelector {}

impl PromptServer for WanResolutionSelector {}

#[pymethods]
impl WanResolutionSelector {
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
        "Select a WAN-supported resolution from an input image, a ratio override or manual values."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        let tables =
            PresetTables::builtin().map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?;
        let quality_options = tables
            .model(WAN_MODEL)
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?
            .quality_names();
        let limits = tables.wan_selector_limits;

        Python::with_gil(|py| {
            InputSpec::new()
                .with_required(
                    "mode",
                    InputType::list(SelectionMode::options())
                        .default(SelectionMode::Auto.to_string())
                        .tooltip("Auto from image or override; or manual size"),
                )
                .with_required(
                    "quality",
                    InputType::list(quality_options)
                        .default(DEFAULT_QUALITY)
                        .tooltip("Preset quality tier"),
                )
                .with_required(
                    "aspect_ratio_override",
                    InputType::list(RatioOverride::options())
                        .default(RatioOverride::Off.to_string())
                        .tooltip("Force a specific aspect ratio in auto mode"),
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

    #[allow(clippy::too_many_arguments)]
    #[pyo3(
        name = "execute",
        signature = (mode, quality, aspect_ratio_override, manual_width, manual_height, image_fit, image=None)
    )]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        mode: &str,
        quality: &str,
        aspect_ratio_override: &str,
        manual_width: usize,
        manual_height: usize,
        image_fit: &str,
        image: Option<Bound<'py, PyAny>>,
    ) -> PyResult<(usize, usize)> {
        let results = self.select_resolution(
            mode,
            quality,
            aspect_ratio_override,
            manual_width,
            manual_height,
            image_fit,
            image.as_ref(),
        );

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("WanResolutionSelector error, {e}");
                if let Err(e) =
                    self.send_error(py, "WanResolutionSelector".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl WanResolutionSelector {
    #[allow(clippy::too_many_arguments)]
    fn select_resolution(
        &self,
        mode: &str,
        quality: &str,
        aspect_ratio_override: &str,
        manual_width: usize,
        manual_height: usize,
        image_fit: &str,
        image: Option<&Bound<'_, PyAny>>,
    ) -> Result<(usize, usize), Error> {
        let tables = PresetTables::builtin()?;
        let selector = ResolutionSelector::from_tables(tables, WAN_MODEL)?
            .with_limits(tables.wan_selector_limits);

        let request = SelectionRequest {
            mode: parse_enum(mode)?,
            quality,
            ratio_override: parse_enum(aspect_ratio_override)?,
            aspect_ratio: "",
            manual_width,
            manual_height,
            image: image_size(image)?,
            image_fit: parse_enum(image_fit)?,
        };

        selector.select(&request)
    }
}
