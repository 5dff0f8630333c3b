//! 采样
//!
//! 对应 ComfyUI/comfy/sample.py, comfy/samplers.py, latent_preview.py

use pyo3::{
    types::{PyAnyMethods, PyDict, PyDictMethods},
    Bound, PyAny, PyResult, Python,
};

use crate::{error::Error, xy_plot::plot_values::SampleParams};

/// 可用采样器名称
pub fn sampler_names(py: Python<'_>) -> PyResult<Vec<String>> {
    py.import("comfy.samplers")?
        .getattr("KSampler")?
        .getattr("SAMPLERS")?
        .extract()
}

/// 可用调度器名称
pub fn scheduler_names(py: Python<'_>) -> PyResult<Vec<String>> {
    py.import("comfy.samplers")?
        .getattr("KSampler")?
        .getattr("SCHEDULERS")?
        .extract()
}

/// 采样一次并用 VAE 解码, 返回 IMAGE 张量
pub fn sample_and_decode<'py>(
    py: Python<'py>,
    model: &Bound<'py, PyAny>,
    positive: &Bound<'py, PyAny>,
    negative: &Bound<'py, PyAny>,
    latent_image: &Bound<'py, PyDict>,
    vae: &Bound<'py, PyAny>,
    params: &SampleParams,
) -> Result<Bound<'py, PyAny>, Error> {
    let comfy_sample = py.import("comfy.sample")?;

    let samples = latent_image
        .get_item("samples")?
        .ok_or_else(|| Error::Lookup("latent_image has no samples".to_string()))?;
    let samples = comfy_sample.call_method1("fix_empty_latent_channels", (model, samples))?;

    let batch_index = latent_image.get_item("batch_index")?;
    let noise = comfy_sample.call_method1("prepare_noise", (&samples, params.seed, batch_index))?;
    let noise_mask = latent_image.get_item("noise_mask")?;

    let callback = py
        .import("latent_preview")?
        .call_method1("prepare_callback", (model, params.steps))?;
    let progress_bar: bool = py
        .import("comfy.utils")?
        .getattr("PROGRESS_BAR_ENABLED")?
        .extract()?;

    let kwargs = PyDict::new(py);
    kwargs.set_item("denoise", params.denoise)?;
    kwargs.set_item("noise_mask", noise_mask)?;
    kwargs.set_item("callback", callback)?;
    kwargs.set_item("disable_pbar", !progress_bar)?;
    kwargs.set_item("seed", params.seed)?;

    let sampled = comfy_sample.getattr("sample")?.call(
        (
            model,
            noise,
            params.steps,
            params.cfg,
            params.sampler_name.as_str(),
            params.scheduler.as_str(),
            positive,
            negative,
            samples,
        ),
        Some(&kwargs),
    )?;

    Ok(vae.call_method1("decode", (sampled,))?)
}
