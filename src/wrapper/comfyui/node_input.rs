//! 工作流隐藏输入 prompt / extra_pnginfo 解析

use pyo3::{
    types::{PyAnyMethods, PyDict, PyDictMethods},
    Bound, PyAny,
};
use serde_json::Value;

use crate::{error::Error, utils::TextChunk};

/// 工作流元数据
///
/// 由 ComfyUI 通过隐藏输入 PROMPT / EXTRA_PNGINFO 注入
pub struct WorkflowMetadata<'py> {
    prompt: Option<Bound<'py, PyAny>>,
    extra_pnginfo: Option<Bound<'py, PyDict>>,
}

impl<'py> WorkflowMetadata<'py> {
    pub fn new(prompt: Option<Bound<'py, PyAny>>, extra_pnginfo: Option<Bound<'py, PyDict>>) -> Self {
        Self {
            prompt,
            extra_pnginfo,
        }
    }

    /// 转换为 PNG 文本块
    ///
    /// 顺序: prompt, 然后 extra_pnginfo 中的每个键
    pub fn text_chunks(&self) -> Result<Vec<TextChunk>, Error> {
        let mut chunks = Vec::new();

        if let Some(prompt) = &self.prompt {
            let prompt: Value = pythonize::depythonize(prompt)?;
            chunks.push(TextChunk::new("prompt", serde_json::to_string(&prompt)?));
        }

        if let Some(extra_pnginfo) = &self.extra_pnginfo {
            for (key, value) in extra_pnginfo.iter() {
                let keyword: String = key.extract()?;
                let text: Value = pythonize::depythonize(&value)?;
                chunks.push(TextChunk::new(keyword, serde_json::to_string(&text)?));
            }
        }

        Ok(chunks)
    }
}
