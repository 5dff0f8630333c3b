//! 控件可见性
//!
//! 根据当前的 mode / model 计算分辨率选择节点中应显示的控件

use pyo3::{exceptions::PyValueError, pyfunction, PyErr, PyResult};

use crate::{
    error::Error,
    resolution::{
        presets::{PresetFamily, PresetTables},
        selector::SelectionMode,
    },
};

pub const WIDGET_MODE: &str = "mode";
pub const WIDGET_MODEL: &str = "model";
pub const WIDGET_QUALITY: &str = "quality";
pub const WIDGET_ASPECT_RATIO_OVERRIDE: &str = "aspect_ratio_override";
pub const WIDGET_ASPECT_RATIO: &str = "aspect_ratio";
pub const WIDGET_MANUAL_WIDTH: &str = "manual_width";
pub const WIDGET_MANUAL_HEIGHT: &str = "manual_height";
pub const WIDGET_IMAGE_FIT: &str = "image_fit";

/// 控件声明顺序
const ALL_WIDGETS: [&str; 8] = [
    WIDGET_MODE,
    WIDGET_MODEL,
    WIDGET_QUALITY,
    WIDGET_ASPECT_RATIO_OVERRIDE,
    WIDGET_ASPECT_RATIO,
    WIDGET_MANUAL_WIDTH,
    WIDGET_MANUAL_HEIGHT,
    WIDGET_IMAGE_FIT,
];

/// 可见控件, 按声明顺序返回
pub fn visible_widgets(mode: SelectionMode, family: PresetFamily) -> Vec<&'static str> {
    ALL_WIDGETS
        .into_iter()
        .filter(|widget| match *widget {
            WIDGET_MODE | WIDGET_MODEL => true,
            WIDGET_MANUAL_WIDTH | WIDGET_MANUAL_HEIGHT => mode == SelectionMode::Manual,
            WIDGET_IMAGE_FIT => mode == SelectionMode::Auto,
            WIDGET_QUALITY | WIDGET_ASPECT_RATIO_OVERRIDE => {
                mode == SelectionMode::Auto && family == PresetFamily::Quality
            }
            WIDGET_ASPECT_RATIO => mode == SelectionMode::Auto && family == PresetFamily::Fixed,
            _ => false,
        })
        .collect()
}

/// 按名称解析 mode / model 后计算可见控件
pub fn visible_widgets_for(
    tables: &PresetTables,
    mode: &str,
    model: &str,
) -> Result<Vec<&'static str>, Error> {
    let mode: SelectionMode = mode
        .parse()
        .map_err(|e| Error::ParseEnumString(format!("mode '{mode}', {e}")))?;
    let family = tables.model(model)?.family;
    Ok(visible_widgets(mode, family))
}

/// 前端调用: 当前值对应的可见控件
#[pyfunction]
pub fn widget_visibility(mode: &str, model: &str) -> PyResult<Vec<String>> {
    let tables = PresetTables::builtin().map_err(to_py_err)?;
    let widgets = visible_widgets_for(tables, mode, model).map_err(to_py_err)?;
    Ok(widgets.into_iter().map(String::from).collect())
}

/// 前端调用: 模型的固定预设标签
#[pyfunction]
pub fn aspect_ratio_options(model: &str) -> PyResult<Vec<String>> {
    let tables = PresetTables::builtin().map_err(to_py_err)?;
    let profile = tables.model(model).map_err(to_py_err)?;
    Ok(profile.preset_labels())
}

fn to_py_err(e: Error) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_mode() {
        let widgets = visible_widgets(SelectionMode::Manual, PresetFamily::Quality);
        assert_eq!(
            widgets,
            vec![WIDGET_MODE, WIDGET_MODEL, WIDGET_MANUAL_WIDTH, WIDGET_MANUAL_HEIGHT]
        );
        assert_eq!(
            visible_widgets(SelectionMode::Manual, PresetFamily::Fixed),
            widgets
        );
    }

    #[test]
    fn test_auto_mode_by_family() {
        assert_eq!(
            visible_widgets(SelectionMode::Auto, PresetFamily::Quality),
            vec![
                WIDGET_MODE,
                WIDGET_MODEL,
                WIDGET_QUALITY,
                WIDGET_ASPECT_RATIO_OVERRIDE,
                WIDGET_IMAGE_FIT
            ]
        );
        assert_eq!(
            visible_widgets(SelectionMode::Auto, PresetFamily::Fixed),
            vec![WIDGET_MODE, WIDGET_MODEL, WIDGET_ASPECT_RATIO, WIDGET_IMAGE_FIT]
        );
    }

    #[test]
    fn test_visible_widgets_for_names() -> anyhow::Result<()> {
        let tables = PresetTables::builtin()?;

        let widgets = visible_widgets_for(tables, "auto", "FLUX Kontext")?;
        assert!(widgets.contains(&WIDGET_ASPECT_RATIO));
        assert!(!widgets.contains(&WIDGET_QUALITY));

        assert!(matches!(
            visible_widgets_for(tables, "auto", "SD3"),
            Err(Error::Lookup(_))
        ));
        assert!(matches!(
            visible_widgets_for(tables, "semi", "WAN"),
            Err(Error::ParseEnumString(_))
        ));
        Ok(())
    }
}
