//! 帧序列操作
//!
//! 两段视频首尾相接时, 第一段的最后一帧与第二段的第一帧重复, 合并时丢弃前者

use candle_core::Tensor;

use crate::error::Error;

/// 合并两段帧序列
///
/// - ignore_first: 直接返回 last
/// - 否则返回 first[..len-1] ++ last, first 不足两帧时返回 last
pub fn combine<T: Clone>(first: &[T], last: &[T], ignore_first: bool) -> Vec<T> {
    if ignore_first || first.len() <= 1 {
        return last.to_vec();
    }

    let mut combined = Vec::with_capacity(first.len() - 1 + last.len());
    combined.extend_from_slice(&first[..first.len() - 1]);
    combined.extend_from_slice(last);
    combined
}

/// 取最后一帧
pub fn extract_last<T: Clone>(frames: &[T]) -> Result<T, Error> {
    frames.last().cloned().ok_or(Error::EmptyBatch)
}

/// 合并两个图像批次
///
/// images: [B, H, W, C]
pub fn combine_batches(first: &Tensor, last: &Tensor, ignore_first: bool) -> Result<Tensor, Error> {
    let first_len = first.dim(0)?;
    if ignore_first || first_len <= 1 {
        return Ok(last.clone());
    }

    let (_, first_h, first_w, first_c) = first.dims4()?;
    let (_, last_h, last_w, last_c) = last.dims4()?;
    if (first_h, first_w, first_c) != (last_h, last_w, last_c) {
        return Err(Error::Validation(format!(
            "frame shapes differ, first {first_h}x{first_w}x{first_c}, last {last_h}x{last_w}x{last_c}"
        )));
    }

    let trimmed = first.narrow(0, 0, first_len - 1)?;
    Ok(Tensor::cat(&[&trimmed, last], 0)?)
}

/// 取批次的最后一帧, 保留批次维度
///
/// output: [1, H, W, C]
pub fn extract_last_frame(images: &Tensor) -> Result<Tensor, Error> {
    let len = images.dim(0)?;
    if len == 0 {
        return Err(Error::EmptyBatch);
    }
    Ok(images.narrow(0, len - 1, 1)?)
}

#[cfg(test)]
mod tests {
    use candle_core::{DType, Device};

    use super::*;

    #[test]
    fn test_combine_drops_duplicate_frame() {
        let first = ['A', 'B', 'C'];
        let last = ['C', 'D'];

        assert_eq!(combine(&first, &last, false), vec!['A', 'B', 'C', 'D']);
        assert_eq!(combine(&first, &last, true), vec!['C', 'D']);
    }

    #[test]
    fn test_combine_short_first() {
        let last = ['X', 'Y'];

        assert_eq!(combine(&[], &last, false), vec!['X', 'Y']);
        assert_eq!(combine(&['A'], &last, false), vec!['X', 'Y']);
        assert_eq!(combine::<char>(&['A', 'B'], &[], false), vec!['A']);
    }

    #[test]
    fn test_combine_length() {
        for first_len in 0..4 {
            for last_len in 0..3 {
                let first = vec![0u8; first_len];
                let last = vec![1u8; last_len];
                let expected = first_len.saturating_sub(1) + last_len;
                assert_eq!(combine(&first, &last, false).len(), expected);
            }
        }
    }

    #[test]
    fn test_extract_last() -> anyhow::Result<()> {
        assert_eq!(extract_last(&['A', 'B', 'C'])?, 'C');
        assert!(matches!(extract_last::<char>(&[]), Err(Error::EmptyBatch)));
        Ok(())
    }

    #[test]
    fn test_combine_batches() -> anyhow::Result<()> {
        let device = Device::Cpu;
        let first = Tensor::arange(0f32, 3., &device)?.reshape((3, 1, 1, 1))?;
        let last = Tensor::new(&[10f32, 11.], &device)?.reshape((2, 1, 1, 1))?;

        let combined = combine_batches(&first, &last, false)?;
        assert_eq!(combined.dims4()?, (4, 1, 1, 1));
        assert_eq!(
            combined.flatten_all()?.to_vec1::<f32>()?,
            vec![0., 1., 10., 11.]
        );

        let combined = combine_batches(&first, &last, true)?;
        assert_eq!(combined.flatten_all()?.to_vec1::<f32>()?, vec![10., 11.]);

        let single = first.narrow(0, 0, 1)?;
        let combined = combine_batches(&single, &last, false)?;
        assert_eq!(combined.dims4()?, (2, 1, 1, 1));
        Ok(())
    }

    #[test]
    fn test_combine_batches_shape_mismatch() -> anyhow::Result<()> {
        let device = Device::Cpu;
        let first = Tensor::zeros((2, 4, 4, 3), DType::F32, &device)?;
        let last = Tensor::zeros((2, 8, 4, 3), DType::F32, &device)?;

        assert!(matches!(
            combine_batches(&first, &last, false),
            Err(Error::Validation(_))
        ));
        // 忽略第一段时不需要校验
        assert_eq!(combine_batches(&first, &last, true)?.dims4()?, (2, 8, 4, 3));
        Ok(())
    }

    #[test]
    fn test_extract_last_frame() -> anyhow::Result<()> {
        let device = Device::Cpu;
        let images = Tensor::arange(0f32, 3., &device)?.reshape((3, 1, 1, 1))?;

        let frame = extract_last_frame(&images)?;
        assert_eq!(frame.dims4()?, (1, 1, 1, 1));
        assert_eq!(frame.flatten_all()?.to_vec1::<f32>()?, vec![2.]);

        let empty = Tensor::zeros((0, 2, 2, 3), DType::F32, &device)?;
        assert!(matches!(extract_last_frame(&empty), Err(Error::EmptyBatch)));
        Ok(())
    }
}
