//! KSampler XY 图表节点

use std::str::FromStr;

use candle_core::Device;
use image::DynamicImage;
use log::{error, info};
use pyo3::{
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyDict, PyType},
    Bound, Py, PyAny, PyErr, PyResult, Python,
};
use serde_json::Value;

use crate::{
    core::{
        category::CATEGORY_XY_PLOT,
        node_base::{InputSpec, InputType},
        utils::image::{image_to_tensor, tensor_to_images},
    },
    error::Error,
    wrapper::{
        comfy::sample::{sample_and_decode, sampler_names, scheduler_names},
        comfyui::{
            types::{
                NODE_ADV_XYPLOT, NODE_CONDITIONING, NODE_HIDDEN_EXTRA_PNGINFO, NODE_HIDDEN_PROMPT,
                NODE_HIDDEN_UNIQUE_ID, NODE_IMAGE, NODE_INT_MAX, NODE_LATENT, NODE_MODEL, NODE_VAE,
            },
            PromptServer,
        },
        torch::tensor::TensorWrapper,
    },
    xy_plot::{
        grid::{
            compose_grid, FontColor, LabelFont, PlotStyle, DEFAULT_FONT_SIZE, MAX_FONT_SIZE,
            MIN_FONT_SIZE,
        },
        plot_values::{extract_plot_values, PlotAxis, PlotValue, SampleParams},
    },
};

/// 采样模型与条件
struct SampleInputs<'a, 'py> {
    model: &'a Bound<'py, PyAny>,
    positive: &'a Bound<'py, PyAny>,
    negative: &'a Bound<'py, PyAny>,
    latent_image: &'a Bound<'py, PyDict>,
    vae: &'a Bound<'py, PyAny>,
}

/// 按 XY 坐标轴组合参数采样, 输出对比网格
#[pyclass(subclass)]
pub struct KSamplerXYPlot {
    device: Device,
}

impl PromptServer for KSamplerXYPlot {}

#[pymethods]
impl KSamplerXYPlot {
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
    fn return_types() -> (&'static str,) {
        (NODE_IMAGE,)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str,) {
        ("xy_plot_image",)
    }

    #[classattr]
    #[pyo3(name = "OUTPUT_IS_LIST")]
    fn output_is_list() -> (bool,) {
        (false,)
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_XY_PLOT;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "KSampler that samples every combination of the X/Y plot values and returns a labelled comparison grid."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        Python::with_gil(|py| {
            InputSpec::new()
                .with_required("model", InputType::custom(NODE_MODEL))
                .with_required(
                    "seed",
                    InputType::int()
                        .default(0u64)
                        .min(0u64)
                        .max(NODE_INT_MAX)
                        .control_after_generate(true),
                )
                .with_required("steps", InputType::int().default(20).min(1).max(10000))
                .with_required(
                    "cfg",
                    InputType::float()
                        .default(8.0)
                        .min(0.0)
                        .max(100.0)
                        .step(0.1)
                        .round(0.01),
                )
                .with_required("sampler_name", InputType::list(sampler_names(py)?))
                .with_required("scheduler", InputType::list(scheduler_names(py)?))
                .with_required("positive", InputType::custom(NODE_CONDITIONING))
                .with_required("negative", InputType::custom(NODE_CONDITIONING))
                .with_required("latent_image", InputType::custom(NODE_LATENT))
                .with_required("vae", InputType::custom(NODE_VAE))
                .with_required(
                    "denoise",
                    InputType::float().default(1.0).min(0.0).max(1.0).step(0.01),
                )
                .with_required("adv_xyPlot", InputType::custom(NODE_ADV_XYPLOT))
                .with_required(
                    "plot_font_size",
                    InputType::int()
                        .default(DEFAULT_FONT_SIZE as i64)
                        .min(MIN_FONT_SIZE as i64)
                        .max(MAX_FONT_SIZE as i64)
                        .step(1),
                )
                .with_required(
                    "plot_font_color",
                    InputType::list(FontColor::options()).default(FontColor::White.to_string()),
                )
                .with_required("plot_font_border", InputType::bool().default(true))
                .with_hidden("prompt", InputType::hidden(NODE_HIDDEN_PROMPT))
                .with_hidden("extra_pnginfo", InputType::hidden(NODE_HIDDEN_EXTRA_PNGINFO))
                .with_hidden("my_unique_id", InputType::hidden(NODE_HIDDEN_UNIQUE_ID))
                .build(py)
        })
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(
        name = "execute",
        signature = (
            model, seed, steps, cfg, sampler_name, scheduler, positive, negative, latent_image,
            vae, denoise, adv_xyPlot, plot_font_size, plot_font_color, plot_font_border,
            prompt=None, extra_pnginfo=None, my_unique_id=None
        )
    )]
    #[allow(non_snake_case, unused_variables)]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        model: Bound<'py, PyAny>,
        seed: u64,
        steps: u32,
        cfg: f64,
        sampler_name: String,
        scheduler: String,
        positive: Bound<'py, PyAny>,
        negative: Bound<'py, PyAny>,
        latent_image: Bound<'py, PyDict>,
        vae: Bound<'py, PyAny>,
        denoise: f64,
        adv_xyPlot: Bound<'py, PyAny>,
        plot_font_size: u32,
        plot_font_color: String,
        plot_font_border: bool,
        prompt: Option<Bound<'py, PyAny>>,
        extra_pnginfo: Option<Bound<'py, PyAny>>,
        my_unique_id: Option<Bound<'py, PyAny>>,
    ) -> PyResult<(Bound<'py, PyAny>,)> {
        let inputs = SampleInputs {
            model: &model,
            positive: &positive,
            negative: &negative,
            latent_image: &latent_image,
            vae: &vae,
        };
        let params = SampleParams {
            seed,
            steps,
            cfg,
            sampler_name,
            scheduler,
            denoise,
        };

        let results = self.plot(
            py,
            &inputs,
            params,
            &adv_xyPlot,
            plot_font_size,
            &plot_font_color,
            plot_font_border,
        );

        match results {
            Ok(v) => Ok(v),
            Err(e) => {
                error!("KSamplerXYPlot error, {e}");
                if let Err(e) = self.send_error(py, "KSamplerXYPlot".to_string(), e.to_string()) {
                    error!("send error failed, {e}");
                    return Err(PyErr::new::<PyRuntimeError, _>(e.to_string()));
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl KSamplerXYPlot {
    #[allow(clippy::too_many_arguments)]
    fn plot<'py>(
        &self,
        py: Python<'py>,
        inputs: &SampleInputs<'_, 'py>,
        params: SampleParams,
        adv_xy_plot: &Bound<'py, PyAny>,
        font_size: u32,
        font_color: &str,
        font_border: bool,
    ) -> Result<(Bound<'py, PyAny>,), Error> {
        let plot: Value = pythonize::depythonize(adv_xy_plot)?;
        let x_axis = extract_plot_values(plot.get("x_plot"), "X").filter(|a| !a.values.is_empty());
        let y_axis = extract_plot_values(plot.get("y_plot"), "Y").filter(|a| !a.values.is_empty());

        // 没有 X 轴时退化为普通采样
        let Some(x_axis) = x_axis else {
            info!("KSamplerXYPlot: no x axis values, single sample");
            let image = self.sample(py, inputs, &params)?;
            return Ok((image,));
        };

        let style = PlotStyle {
            spacing: plot
                .get("grid_spacing")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
            font_color: FontColor::from_str(font_color)
                .map_err(|e| Error::ParseEnumString(format!("{font_color}, {e}")))?,
            border: font_border,
        };

        let rows = self.sample_grid(py, inputs, &params, &x_axis, y_axis.as_ref())?;

        let font = LabelFont::load(font_size);
        let grid = compose_grid(&rows, &x_axis, y_axis.as_ref(), &style, font.as_ref())?;

        let tensor = image_to_tensor(&DynamicImage::ImageRgb8(grid), &self.device)?;
        let image = TensorWrapper::<f32>::from_tensor(tensor).to_py_tensor(py)?;
        Ok((image,))
    }

    /// 逐行逐列采样, 返回 rows[y][x]
    fn sample_grid<'py>(
        &self,
        py: Python<'py>,
        inputs: &SampleInputs<'_, 'py>,
        params: &SampleParams,
        x_axis: &PlotAxis,
        y_axis: Option<&PlotAxis>,
    ) -> Result<Vec<Vec<DynamicImage>>, Error> {
        let samplers = sampler_names(py)?;
        let schedulers = scheduler_names(py)?;

        let y_values: Vec<Option<&PlotValue>> = match y_axis {
            Some(axis) => axis.values.iter().map(Some).collect(),
            None => vec![None],
        };

        let mut rows = Vec::with_capacity(y_values.len());
        for (y_idx, y_value) in y_values.iter().enumerate() {
            let mut row = Vec::with_capacity(x_axis.values.len());

            for (x_idx, x_value) in x_axis.values.iter().enumerate() {
                let mut cell = params.clone().with_axis_value(&x_axis.param, x_value)?;
                if let (Some(axis), Some(value)) = (y_axis, y_value) {
                    cell = cell.with_axis_value(&axis.param, value)?;
                }

                if !samplers.contains(&cell.sampler_name) {
                    return Err(Error::Validation(format!(
                        "unknown sampler '{}'",
                        cell.sampler_name
                    )));
                }
                if !schedulers.contains(&cell.scheduler) {
                    return Err(Error::Validation(format!(
                        "unknown scheduler '{}'",
                        cell.scheduler
                    )));
                }

                info!(
                    "KSamplerXYPlot: sampling ({}/{}, {}/{}) {}={x_value}{}",
                    x_idx + 1,
                    x_axis.values.len(),
                    y_idx + 1,
                    y_values.len(),
                    x_axis.param,
                    match (y_axis, y_value) {
                        (Some(axis), Some(value)) => format!(", {}={value}", axis.param),
                        _ => String::new(),
                    }
                );

                let decoded = self.sample(py, inputs, &cell)?;
                let decoded = TensorWrapper::<f32>::new(&decoded, &self.device)?.into_tensor();
                let frame = tensor_to_images(&decoded)?
                    .into_iter()
                    .next()
                    .ok_or(Error::EmptyBatch)?;
                row.push(frame);
            }

            rows.push(row);
        }

        Ok(rows)
    }

    fn sample<'py>(
        &self,
        py: Python<'py>,
        inputs: &SampleInputs<'_, 'py>,
        params: &SampleParams,
    ) -> Result<Bound<'py, PyAny>, Error> {
        sample_and_decode(
            py,
            inputs.model,
            inputs.positive,
            inputs.negative,
            inputs.latent_image,
            inputs.vae,
            params,
        )
    }
}

#[cfg(test)]
mod tests {
    use pyo3::types::{PyAnyMethods, PyDictMethods};

    use super::*;

    #[test]
    #[ignore]
    fn test_input_types_shape() -> anyhow::Result<()> {
        pyo3::prepare_freethreaded_python();

        Python::with_gil(|py| -> anyhow::Result<()> {
            let input_types = py
                .get_type::<KSamplerXYPlot>()
                .call_method0("INPUT_TYPES")?
                .downcast_into::<PyDict>()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;

            let required = input_types
                .get_item("required")?
                .ok_or_else(|| anyhow::anyhow!("missing required"))?;
            let cfg: (String, Bound<'_, PyDict>) = required.get_item("cfg")?.extract()?;
            assert_eq!(cfg.0, "FLOAT");
            let model: (String, Bound<'_, PyDict>) = required.get_item("model")?.extract()?;
            assert_eq!(model.0, "MODEL");

            let hidden = input_types
                .get_item("hidden")?
                .ok_or_else(|| anyhow::anyhow!("missing hidden"))?;
            let unique_id: String = hidden.get_item("my_unique_id")?.extract()?;
            assert_eq!(unique_id, "UNIQUE_ID");
            Ok(())
        })
    }
}
