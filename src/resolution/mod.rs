//! 分辨率
use pyo3::{
    types::{PyModule, PyModuleMethods},
    wrap_pyfunction, Bound, PyResult, Python,
};

use crate::core::node::NodeRegister;

mod aspect_ratio;
pub use aspect_ratio::{gcd, AspectRatio};

mod image_size;
pub use image_size::ImageSize;

pub mod presets;
pub mod selector;
pub mod widget_visibility;

mod ratio_matcher;
pub use ratio_matcher::{NamedRatioEntry, RatioMatch, RatioMatcher};

mod aspect_ratio_from_image;
pub use aspect_ratio_from_image::AspectRatioFromImage;

mod image_dimensions;
pub use image_dimensions::ImageDimensions;

mod named_aspect_ratio_matcher;
pub use named_aspect_ratio_matcher::NamedAspectRatioMatcher;

mod resolution_selector;
pub use resolution_selector::ResolutionSelector;

mod wan_resolution_selector;
pub use wan_resolution_selector::WanResolutionSelector;

/// 分辨率模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "resolution")?;
    submodule.add_class::<AspectRatioFromImage>()?;
    submodule.add_class::<ImageDimensions>()?;
    submodule.add_class::<NamedAspectRatioMatcher>()?;
    submodule.add_class::<ResolutionSelector>()?;
    submodule.add_class::<WanResolutionSelector>()?;
    submodule.add_function(wrap_pyfunction!(
        widget_visibility::widget_visibility,
        &submodule
    )?)?;
    submodule.add_function(wrap_pyfunction!(
        widget_visibility::aspect_ratio_options,
        &submodule
    )?)?;
    Ok(submodule)
}

/// Resolution node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![
        NodeRegister(
            "AspectRatioFromImage",
            py.get_type::<AspectRatioFromImage>(),
            "J1mB091's Aspect Ratio From Image 📐",
        ),
        NodeRegister(
            "ImageDimensions",
            py.get_type::<ImageDimensions>(),
            "J1mB091's Image Dimensions 📏",
        ),
        NodeRegister(
            "NamedAspectRatioMatcher",
            py.get_type::<NamedAspectRatioMatcher>(),
            "J1mB091's Match Named Aspect Ratio 🎯",
        ),
        NodeRegister(
            "ResolutionSelector",
            py.get_type::<ResolutionSelector>(),
            "J1mB091's Resolution Selector 🖥️",
        ),
        NodeRegister(
            "WanResolutionSelector",
            py.get_type::<WanResolutionSelector>(),
            "J1mB091's WAN Resolution Selector 🎞️",
        ),
    ];
    Ok(nodes)
}
