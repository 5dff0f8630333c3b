//! image 与 tensor 相互转换
//!
use candle_core::{DType, Device, Tensor};
use image::{DynamicImage, GenericImageView, GrayImage, RgbImage, RgbaImage};

use crate::error::Error;

/// 将批次张量转换为图像列表
///
/// tensor: BHWC, 数值范围 [0, 1]
pub fn tensor_to_images(tensor: &Tensor) -> Result<Vec<DynamicImage>, Error> {
    let (batch, _, _, _) = tensor.dims4()?;
    if batch == 0 {
        return Err(Error::EmptyBatch);
    }

    // BHWC -> Vec<1HWC>
    let tensors = tensor.chunk(batch, 0)?;

    let mut images = Vec::with_capacity(batch);
    for tensor in tensors.iter() {
        images.push(tensor_to_image(tensor)?);
    }

    Ok(images)
}

/// 将张量转换为图像
///
/// tensor: HWC/1HWC
pub fn tensor_to_image(tensor: &Tensor) -> Result<DynamicImage, Error> {
    let (height, width, channels) = match tensor.dims() {
        [h, w, c] => (*h, *w, *c),
        [b, h, w, c] if *b == 1 => (*h, *w, *c),
        _ => {
            return Err(Error::InvalidTensorShape(format!(
                "expected HWC or 1HWC, got {:?}",
                tensor.dims()
            )));
        }
    };

    // 缩放并裁剪到 0-255 范围后转换为 u8
    let tensor = (tensor.to_dtype(DType::F32)? * 255.0)?;
    let tensor = tensor.clamp(0.0, 255.0)?.to_dtype(DType::U8)?;

    let buffer = tensor.contiguous()?.flatten_all()?.to_vec1::<u8>()?;

    match channels {
        1 => {
            let img = GrayImage::from_raw(width as u32, height as u32, buffer)
                .ok_or(Error::ImageBuffer)?;
            Ok(DynamicImage::ImageLuma8(img))
        }
        3 => {
            let img = RgbImage::from_raw(width as u32, height as u32, buffer)
                .ok_or(Error::ImageBuffer)?;
            Ok(DynamicImage::ImageRgb8(img))
        }
        4 => {
            let img = RgbaImage::from_raw(width as u32, height as u32, buffer)
                .ok_or(Error::ImageBuffer)?;
            Ok(DynamicImage::ImageRgba8(img))
        }
        _ => Err(Error::UnsupportedNumberOfChannels(channels)),
    }
}

/// 将图像转换为张量
///
/// 返回 1HWC, RGB, 数值范围 [0, 1]
pub fn image_to_tensor(image: &DynamicImage, device: &Device) -> Result<Tensor, Error> {
    let (width, height) = image.dimensions();

    let img_buffer = image.to_rgb32f().into_raw();
    // HWC
    let tensor = Tensor::from_vec(img_buffer, (height as usize, width as usize, 3), device)?;

    Ok(tensor.unsqueeze(0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_to_images_rgb() -> anyhow::Result<()> {
        let tensor = Tensor::ones((2, 4, 3, 3), DType::F32, &Device::Cpu)?;
        let images = tensor_to_images(&tensor)?;

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].dimensions(), (3, 4));
        assert_eq!(images[1].to_rgb8().get_pixel(2, 3).0, [255, 255, 255]);
        Ok(())
    }

    #[test]
    fn test_tensor_to_image_clamps_values() -> anyhow::Result<()> {
        let tensor = Tensor::new(&[[[-0.5f32], [2.0]]], &Device::Cpu)?;
        let image = tensor_to_image(&tensor)?;

        assert!(matches!(image, DynamicImage::ImageLuma8(_)));
        assert_eq!(image.to_luma8().into_raw(), vec![0, 255]);
        Ok(())
    }

    #[test]
    fn test_image_to_tensor_adds_batch_dim() -> anyhow::Result<()> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 2, image::Rgb([255, 0, 255])));
        let tensor = image_to_tensor(&image, &Device::Cpu)?;

        assert_eq!(tensor.dims4()?, (1, 2, 5, 3));
        let back = tensor_to_image(&tensor)?;
        assert_eq!(back.to_rgb8().get_pixel(4, 1).0, [255, 0, 255]);
        Ok(())
    }

    #[test]
    fn test_tensor_to_image_rejects_two_channels() -> anyhow::Result<()> {
        let tensor = Tensor::zeros((1, 2, 2, 2), DType::F32, &Device::Cpu)?;
        let result = tensor_to_image(&tensor);

        assert!(matches!(result, Err(Error::UnsupportedNumberOfChannels(2))));
        Ok(())
    }
}
