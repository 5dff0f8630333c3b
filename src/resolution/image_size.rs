//! 图像尺寸
//!
//! 从张量形状读取宽高, 不访问像素数据

use crate::error::Error;

/// 图像尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
    /// 批次帧数, 非 4 维张量为 1
    pub batch: usize,
}

impl ImageSize {
    /// 支持的形状: [B, H, W, C], [H, W, C], [H, W]
    pub fn from_shape(shape: &[usize]) -> Result<Self, Error> {
        let (batch, height, width) = match shape {
            [b, h, w, _] => (*b, *h, *w),
            [h, w, _] | [h, w] => (1, *h, *w),
            _ => {
                return Err(Error::InvalidTensorShape(format!(
                    "expected a 2D, 3D or 4D image tensor, got shape {shape:?}"
                )))
            }
        };

        if width == 0 || height == 0 {
            return Err(Error::InvalidTensorShape(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }

        Ok(Self {
            width,
            height,
            batch,
        })
    }
}
