//! ComfyUI 节点输入构建器
//!
//! 提供类型安全的构建器 API，用于生成 ComfyUI 节点的 INPUT_TYPES
//!
//! # 使用示例
//!
//! ```rust,ignore
//! Python::with_gil(|py| {
//!     InputSpec::new()
//!         .with_required("width", InputType::int().default(832).min(16).max(8192).step(16))
//!         .with_required("mode", InputType::list(vec!["auto".to_string(), "manual".to_string()]).default("auto"))
//!         .with_optional("image", InputType::image())
//!         .with_hidden("prompt", InputType::hidden("PROMPT"))
//!         .build(py)
//! })
//! ```

use indexmap::IndexMap;
use pyo3::{
    types::{PyDict, PyDictMethods},
    Bound, IntoPyObject, Py, PyAny, PyResult, Python,
};

use crate::wrapper::comfyui::types::{NODE_BOOLEAN, NODE_FLOAT, NODE_IMAGE, NODE_INT, NODE_STRING};

/// 输入规范构建器
///
/// 用于构建 ComfyUI 节点的 INPUT_TYPES 字典结构
pub struct InputSpec {
    required: Vec<(String, InputType)>,
    optional: Vec<(String, InputType)>,
    hidden: Vec<(String, InputType)>,
}

impl InputSpec {
    /// 创建一个新的输入规范构建器
    pub fn new() -> Self {
        Self {
            required: Vec::new(),
            optional: Vec::new(),
            hidden: Vec::new(),
        }
    }

    /// 添加必需输入
    pub fn with_required(mut self, name: impl Into<String>, input: InputType) -> Self {
        self.required.push((name.into(), input));
        self
    }

    /// 添加可选输入
    pub fn with_optional(mut self, name: impl Into<String>, input: InputType) -> Self {
        self.optional.push((name.into(), input));
        self
    }

    /// 添加隐藏输入
    pub fn with_hidden(mut self, name: impl Into<String>, input: InputType) -> Self {
        self.hidden.push((name.into(), input));
        self
    }

    /// 构建 PyDict
    ///
    /// 空的 optional/hidden 分组不会写入字典
    pub fn build(self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new(py);

        let groups = [
            ("required", self.required),
            ("optional", self.optional),
            ("hidden", self.hidden),
        ];
        for (group_name, inputs) in groups {
            if inputs.is_empty() && group_name != "required" {
                continue;
            }
            let group = PyDict::new(py);
            for (name, input_type) in inputs {
                group.set_item(name, input_type.to_py_object(py)?)?;
            }
            dict.set_item(group_name, group)?;
        }

        Ok(dict.into())
    }
}

impl Default for InputSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// 输入类型（包含类型和参数）
pub struct InputType {
    kind: InputKind,
    params: IndexMap<String, ParamValue>,
    list_options: Vec<String>,
}

/// 输入类型枚举（仅表示类型，不包含参数）
#[derive(Debug, Clone, PartialEq)]
enum InputKind {
    String,
    Int,
    Float,
    Bool,
    Image,
    List,
    /// 宿主自定义类型, 如 MODEL / CONDITIONING / LATENT
    Custom(&'static str),
    /// 隐藏输入, 由宿主注入, 如 PROMPT / EXTRA_PNGINFO
    Hidden(&'static str),
}

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl InputType {
    fn new(kind: InputKind) -> Self {
        Self {
            kind,
            params: IndexMap::new(),
            list_options: Vec::new(),
        }
    }

    /// String 类型
    pub fn string() -> Self {
        Self::new(InputKind::String)
    }

    /// Int 类型
    pub fn int() -> Self {
        Self::new(InputKind::Int)
    }

    /// Float 类型
    pub fn float() -> Self {
        Self::new(InputKind::Float)
    }

    /// 自定义类型
    pub fn custom(type_name: &'static str) -> Self {
        Self::new(InputKind::Custom(type_name))
    }

    /// Bool 类型
    pub fn bool() -> Self {
        Self::new(InputKind::Bool)
    }

    /// Image 类型
    pub fn image() -> Self {
        Self::new(InputKind::Image)
    }

    /// 下拉选项列表
    pub fn list(options: Vec<String>) -> Self {
        Self {
            kind: InputKind::List,
            params: IndexMap::new(),
            list_options: options,
        }
    }

    /// 隐藏输入
    pub fn hidden(name: &'static str) -> Self {
        Self::new(InputKind::Hidden(name))
    }
}

impl InputType {
    /// 设置默认值
    pub fn default<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("default".to_string(), value.into());
        self
    }

    /// 设置提示文本
    pub fn tooltip<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("tooltip".to_string(), value.into());
        self
    }

    /// 强制输入
    pub fn force_input(mut self, force: bool) -> Self {
        self.params
            .insert("forceInput".to_string(), ParamValue::Bool(force));
        self
    }

    /// 设置最小值
    pub fn min<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("min".to_string(), value.into());
        self
    }

    /// 设置最大值
    pub fn max<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("max".to_string(), value.into());
        self
    }

    /// 设置步长
    pub fn step<V: Into<ParamValue>>(mut self, value: V) -> Self {
        self.params.insert("step".to_string(), value.into());
        self
    }

    /// 生成后由前端更新数值, 如随机种子
    pub fn control_after_generate(mut self, enable: bool) -> Self {
        self.params
            .insert("control_after_generate".to_string(), ParamValue::Bool(enable));
        self
    }

    /// 设置前端取整精度
    pub fn round(mut self, value: f64) -> Self {
        self.params
            .insert("round".to_string(), ParamValue::Float(value));
        self
    }

    /// 设置开标签
    pub fn label_on(mut self, label: impl Into<String>) -> Self {
        self.params
            .insert("label_on".to_string(), ParamValue::String(label.into()));
        self
    }

    /// 设置关标签
    pub fn label_off(mut self, label: impl Into<String>) -> Self {
        self.params
            .insert("label_off".to_string(), ParamValue::String(label.into()));
        self
    }

    /// 转换为 Python 对象
    ///
    /// 列表类型：(options_list, params_dict)
    /// 隐藏类型：type_name
    /// 其他类型：(type_name, params_dict)
    fn to_py_object<'py>(self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let type_str = match &self.kind {
            InputKind::List => {
                let params_dict = self.params.to_py_dict(py)?;
                return Ok((self.list_options, params_dict)
                    .into_pyobject(py)?
                    .into_any());
            }
            InputKind::Hidden(name) => {
                return Ok((*name).into_pyobject(py)?.into_any());
            }
            InputKind::String => NODE_STRING,
            InputKind::Int => NODE_INT,
            InputKind::Float => NODE_FLOAT,
            InputKind::Custom(name) => *name,
            InputKind::Bool => NODE_BOOLEAN,
            InputKind::Image => NODE_IMAGE,
        };
        let params_dict = self.params.to_py_dict(py)?;
        Ok((type_str, params_dict).into_pyobject(py)?.into_any())
    }
}

/// 将 IndexMap<String, ParamValue> 转换为 PyDict
trait ToPyDict {
    fn to_py_dict(&self, py: Python<'_>) -> PyResult<Py<PyDict>>;
}

impl ToPyDict for IndexMap<String, ParamValue> {
    fn to_py_dict(&self, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let dict = PyDict::new(py);
        for (key, value) in self {
            match value {
                ParamValue::String(s) => dict.set_item(key, s.as_str())?,
                ParamValue::Int(i) => dict.set_item(key, *i)?,
                ParamValue::UInt(u) => dict.set_item(key, *u)?,
                ParamValue::Float(f) => dict.set_item(key, *f)?,
                ParamValue::Bool(b) => dict.set_item(key, *b)?,
            }
        }
        Ok(dict.into())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<u64> for ParamValue {
    fn from(u: u64) -> Self {
        ParamValue::UInt(u)
    }
}

impl From<usize> for ParamValue {
    fn from(u: usize) -> Self {
        ParamValue::UInt(u as u64)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_spec_groups() -> anyhow::Result<()> {
        let spec = InputSpec::new()
            .with_required("images", InputType::image())
            .with_required("filename_prefix", InputType::string().default("ComfyUI"))
            .with_optional("seed", InputType::int().force_input(true))
            .with_hidden("prompt", InputType::hidden("PROMPT"))
            .with_hidden("extra_pnginfo", InputType::hidden("EXTRA_PNGINFO"));

        assert_eq!(spec.required.len(), 2);
        assert_eq!(spec.optional.len(), 1);
        assert_eq!(spec.hidden.len(), 2);
        assert_eq!(spec.required[1].0, "filename_prefix");
        assert_eq!(spec.hidden[0].1.kind, InputKind::Hidden("PROMPT"));
        Ok(())
    }

    #[test]
    fn test_list_input_keeps_options() -> anyhow::Result<()> {
        let options = vec!["auto".to_string(), "manual".to_string()];
        let input = InputType::list(options.clone()).default("auto");

        assert_eq!(input.kind, InputKind::List);
        assert_eq!(input.list_options, options);
        assert_eq!(
            input.params.get("default"),
            Some(&ParamValue::String("auto".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_param_order_is_declaration_order() -> anyhow::Result<()> {
        let input = InputType::int()
            .default(832usize)
            .min(16usize)
            .max(8192usize)
            .step(16usize)
            .tooltip("width");

        let keys: Vec<&str> = input.params.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["default", "min", "max", "step", "tooltip"]);
        Ok(())
    }

    #[test]
    fn test_float_and_custom_inputs() -> anyhow::Result<()> {
        let cfg = InputType::float().default(8.0).min(0.0).max(100.0).step(0.1).round(0.01);
        assert_eq!(cfg.kind, InputKind::Float);
        assert_eq!(cfg.params.get("round"), Some(&ParamValue::Float(0.01)));

        let model = InputType::custom("MODEL");
        assert_eq!(model.kind, InputKind::Custom("MODEL"));
        assert!(model.params.is_empty());
        Ok(())
    }

    #[test]
    fn test_unsigned_max_is_preserved() -> anyhow::Result<()> {
        let input = InputType::int().max(u64::MAX);
        assert_eq!(input.params.get("max"), Some(&ParamValue::UInt(u64::MAX)));
        Ok(())
    }
}
