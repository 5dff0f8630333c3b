//! XY 图表坐标轴取值
//!
//! adv_xyPlot 的 x_plot / y_plot 结构:
//! ```json
//! {
//!     "label": "steps",
//!     "1": {"label": "10", "3": {"steps": 10}},
//!     "2": {"label": "20", "3": {"steps": 20}}
//! }
//! ```
//! 每个取值点的 label 作为坐标值, 节点字段中第一个常用采样参数作为坐标参数名

use std::fmt;

use log::{info, warn};
use serde_json::Value;

use crate::error::Error;

/// 可作为坐标参数的采样参数
pub const COMMON_PARAMETERS: [&str; 6] = ["steps", "cfg", "denoise", "seed", "sampler_name", "scheduler"];

const LABEL_KEY: &str = "label";

/// 坐标值
#[derive(Debug, Clone, PartialEq)]
pub enum PlotValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl PlotValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            PlotValue::Int(v) => Some(*v as f64),
            PlotValue::Float(v) => Some(*v),
            PlotValue::Text(_) => None,
        }
    }
}

impl fmt::Display for PlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotValue::Int(v) => write!(f, "{v}"),
            // 整数值的浮点保留一位小数, 如 8.0
            PlotValue::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            PlotValue::Float(v) => write!(f, "{v}"),
            PlotValue::Text(v) => f.write_str(v),
        }
    }
}

/// 坐标轴
#[derive(Debug, Clone, PartialEq)]
pub struct PlotAxis {
    pub param: String,
    pub values: Vec<PlotValue>,
}

/// 从坐标轴数据中提取参数名与取值
///
/// 数据为空或不是对象时返回 None, 取值点结构异常时退化为 1..=n 的序号
pub fn extract_plot_values(plot_data: Option<&Value>, axis: &str) -> Option<PlotAxis> {
    let plot_data = plot_data.filter(|v| is_truthy(v))?;

    let Some(points) = plot_data.as_object() else {
        warn!("invalid plot data for {axis} axis, expected dict, got {plot_data}");
        return None;
    };

    let mut labels = Vec::with_capacity(points.len());
    let mut param = None;
    for (key, point) in points {
        if key == LABEL_KEY {
            continue;
        }

        let Some(point) = point.as_object() else {
            warn!("malformed plot point '{key}' on {axis} axis, falling back to indices");
            return Some(PlotAxis {
                param: format!("{}_axis", axis.to_lowercase()),
                values: (1..=points.len() as i64).map(PlotValue::Int).collect(),
            });
        };

        let label = point
            .get(LABEL_KEY)
            .map(value_to_label)
            .unwrap_or_else(|| key.clone());

        if param.is_none() {
            param = point
                .iter()
                .filter(|(node_id, _)| *node_id != LABEL_KEY)
                .filter_map(|(_, node)| node.as_object())
                .flat_map(|node| node.keys())
                .find(|name| COMMON_PARAMETERS.contains(&name.as_str()))
                .cloned();
        }

        labels.push(label);
    }

    let param = param.unwrap_or_else(|| format!("{}_param", axis.to_lowercase()));
    let values = parse_values(labels);
    info!("extracted {axis} axis: param='{param}', values={values:?}");

    Some(PlotAxis { param, values })
}

/// 解析坐标值
///
/// 全部为整数时解析为整数, 全部为数值时解析为浮点, 否则保留字符串
pub fn parse_values(labels: Vec<String>) -> Vec<PlotValue> {
    if !labels.iter().all(|v| is_numeric(v)) {
        return labels.into_iter().map(PlotValue::Text).collect();
    }

    if labels.iter().all(|v| is_integer(v)) {
        return labels
            .iter()
            .filter_map(|v| v.parse::<i64>().ok())
            .map(PlotValue::Int)
            .collect();
    }

    labels
        .iter()
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .map(PlotValue::Float)
        .collect()
}

fn is_numeric(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

// 只允许数字与负号, "+5" / " 5" 不算整数
fn is_integer(value: &str) -> bool {
    value.parse::<i64>().is_ok()
        && value
            .chars()
            .filter(|c| *c != '.' && *c != '-')
            .all(|c| c.is_ascii_digit())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 单次采样参数
#[derive(Debug, Clone, PartialEq)]
pub struct SampleParams {
    pub seed: u64,
    pub steps: u32,
    pub cfg: f64,
    pub sampler_name: String,
    pub scheduler: String,
    pub denoise: f64,
}

impl SampleParams {
    /// 用坐标值覆盖对应的采样参数
    ///
    /// 非采样参数 (如 x_param) 不做修改
    pub fn with_axis_value(mut self, param: &str, value: &PlotValue) -> Result<Self, Error> {
        let invalid = || Error::Validation(format!("invalid value '{value}' for {param}"));

        match param {
            "seed" => match value {
                PlotValue::Int(v) => self.seed = u64::try_from(*v).map_err(|_| invalid())?,
                _ => return Err(invalid()),
            },
            "steps" => match value {
                PlotValue::Int(v) if *v >= 1 => {
                    self.steps = u32::try_from(*v).map_err(|_| invalid())?
                }
                _ => return Err(invalid()),
            },
            "cfg" => self.cfg = value.as_f64().ok_or_else(invalid)?,
            "denoise" => self.denoise = value.as_f64().ok_or_else(invalid)?,
            "sampler_name" => self.sampler_name = value.to_string(),
            "scheduler" => self.scheduler = value.to_string(),
            _ => {}
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params() -> SampleParams {
        SampleParams {
            seed: 42,
            steps: 20,
            cfg: 8.0,
            sampler_name: "euler".to_string(),
            scheduler: "normal".to_string(),
            denoise: 1.0,
        }
    }

    #[test]
    fn test_extract_steps_axis() -> anyhow::Result<()> {
        let data = json!({
            "label": "steps",
            "1": {"label": "10", "3": {"steps": 10}},
            "2": {"label": "20", "3": {"steps": 20}},
            "3": {"label": "30", "3": {"steps": 30}}
        });

        let axis = extract_plot_values(Some(&data), "X").ok_or_else(|| anyhow::anyhow!("no axis"))?;
        assert_eq!(axis.param, "steps");
        assert_eq!(
            axis.values,
            vec![PlotValue::Int(10), PlotValue::Int(20), PlotValue::Int(30)]
        );
        Ok(())
    }

    #[test]
    fn test_extract_text_axis_and_missing_labels() -> anyhow::Result<()> {
        let data = json!({
            "euler": {"5": {"sampler_name": "euler"}},
            "dpmpp_2m": {"label": "dpmpp_2m", "5": {"sampler_name": "dpmpp_2m"}}
        });

        let axis = extract_plot_values(Some(&data), "Y").ok_or_else(|| anyhow::anyhow!("no axis"))?;
        assert_eq!(axis.param, "sampler_name");
        assert_eq!(
            axis.values,
            vec![
                PlotValue::Text("euler".to_string()),
                PlotValue::Text("dpmpp_2m".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn test_extract_unknown_param_uses_axis_name() -> anyhow::Result<()> {
        let data = json!({"1": {"label": "a", "7": {"lora_strength": 0.5}}});

        let axis = extract_plot_values(Some(&data), "X").ok_or_else(|| anyhow::anyhow!("no axis"))?;
        assert_eq!(axis.param, "x_param");
        Ok(())
    }

    #[test]
    fn test_extract_malformed_points_fall_back_to_indices() -> anyhow::Result<()> {
        let data = json!({"label": "cfg", "1": "7.5", "2": "8.5"});

        let axis = extract_plot_values(Some(&data), "Y").ok_or_else(|| anyhow::anyhow!("no axis"))?;
        assert_eq!(axis.param, "y_axis");
        assert_eq!(
            axis.values,
            vec![PlotValue::Int(1), PlotValue::Int(2), PlotValue::Int(3)]
        );
        Ok(())
    }

    #[test]
    fn test_extract_empty_or_invalid() -> anyhow::Result<()> {
        assert_eq!(extract_plot_values(None, "X"), None);
        assert_eq!(extract_plot_values(Some(&json!({})), "X"), None);
        assert_eq!(extract_plot_values(Some(&json!(null)), "X"), None);
        assert_eq!(extract_plot_values(Some(&json!(["1", "2"])), "X"), None);
        Ok(())
    }

    #[test]
    fn test_parse_values() -> anyhow::Result<()> {
        let strings = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert_eq!(
            parse_values(strings(&["-3", "4"])),
            vec![PlotValue::Int(-3), PlotValue::Int(4)]
        );
        assert_eq!(
            parse_values(strings(&["7", "7.5"])),
            vec![PlotValue::Float(7.0), PlotValue::Float(7.5)]
        );
        // "+5" 是数值但不是整数
        assert_eq!(
            parse_values(strings(&["+5", "6"])),
            vec![PlotValue::Float(5.0), PlotValue::Float(6.0)]
        );
        assert_eq!(
            parse_values(strings(&["1", "karras"])),
            vec![
                PlotValue::Text("1".to_string()),
                PlotValue::Text("karras".to_string())
            ]
        );
        assert!(parse_values(Vec::new()).is_empty());
        Ok(())
    }

    #[test]
    fn test_plot_value_display() {
        assert_eq!(PlotValue::Float(8.0).to_string(), "8.0");
        assert_eq!(PlotValue::Float(7.25).to_string(), "7.25");
        assert_eq!(PlotValue::Int(-2).to_string(), "-2");
        assert_eq!(PlotValue::Text("euler".to_string()).to_string(), "euler");
    }

    #[test]
    fn test_with_axis_value() -> anyhow::Result<()> {
        let updated = params()
            .with_axis_value("cfg", &PlotValue::Int(6))?
            .with_axis_value("steps", &PlotValue::Int(30))?
            .with_axis_value("scheduler", &PlotValue::Text("karras".to_string()))?
            .with_axis_value("x_param", &PlotValue::Text("ignored".to_string()))?;

        assert_eq!(updated.cfg, 6.0);
        assert_eq!(updated.steps, 30);
        assert_eq!(updated.scheduler, "karras");
        assert_eq!(updated.seed, 42);
        assert_eq!(updated.sampler_name, "euler");
        Ok(())
    }

    #[test]
    fn test_with_axis_value_rejects_bad_types() {
        assert!(matches!(
            params().with_axis_value("steps", &PlotValue::Float(2.5)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            params().with_axis_value("seed", &PlotValue::Int(-1)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            params().with_axis_value("cfg", &PlotValue::Text("high".to_string())),
            Err(Error::Validation(_))
        ));
    }
}
