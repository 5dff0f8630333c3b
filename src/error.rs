//! 错误处理

#[allow(unused)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // 标准库错误处理
    #[error("io error, {0}")]
    Io(#[from] std::io::Error),

    // 节点业务错误
    #[error("parse error, {0}")]
    Parse(String),
    #[error("validation error, {0}")]
    Validation(String),
    #[error("the image batch is empty")]
    EmptyBatch,
    #[error("lookup error, {0}")]
    Lookup(String),
    #[error("invalid preset data, {0}")]
    InvalidPresetData(String),
    #[error("invalid tensor shape, {0}")]
    InvalidTensorShape(String),
    #[error("unsupported number of channels, {0}")]
    UnsupportedNumberOfChannels(usize),

    #[error("py error, {0}")]
    PyErr(#[from] pyo3::PyErr),
    #[error("pythonize error, {0}")]
    PythonizeError(#[from] pythonize::PythonizeError),
    #[error("py downcast error, {0}")]
    PyDowncastError(String),

    #[error("tensor error, {0}")]
    TensorErr(#[from] candle_core::Error),
    #[error("numpy error, {0}")]
    NotContiguousError(#[from] numpy::NotContiguousError),
    #[error("strum error, {0}")]
    ParseEnumString(String),

    #[error("serde json error, {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("regex error, {0}")]
    Regex(#[from] regex::Error),

    #[error("creating image buffer error")]
    ImageBuffer,
    #[error("image error, {0}")]
    ImageError(#[from] image::ImageError),
    #[error("invalid font, {0}")]
    InvalidFont(#[from] ab_glyph::InvalidFont),
    #[error("png encoding error, {0}")]
    PngEncoding(#[from] png::EncodingError),
}
