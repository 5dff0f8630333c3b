//! PNG 图像保存
//!
//! 文本块优先写入 tEXt (Latin-1), 无法编码时写入 iTXt (UTF-8)

use std::{
    borrow::Cow,
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use encoding::{all::ISO_8859_1, EncoderTrap, Encoding};
use image::{DynamicImage, GenericImageView};
use log::info;
use serde::Serialize;

use crate::{
    error::Error,
    utils::save_counter::{build_filename, SaveCounter, SavePath, BATCH_NUM_TOKEN},
};

/// 写入压缩等级, 取最接近 zlib 4 级的档位 (Fast 约为 1 级, Default 约为 6 级)
pub const PNG_COMPRESSION: png::Compression = png::Compression::Default;

/// PNG 文本块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
}

impl TextChunk {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
        }
    }

    fn is_latin1(&self) -> bool {
        ISO_8859_1
            .encode(&self.keyword, EncoderTrap::Strict)
            .and_then(|_| ISO_8859_1.encode(&self.text, EncoderTrap::Strict))
            .is_ok()
    }
}

/// 已保存图像, 对应 ComfyUI 预览的 ui.images 项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub filename: String,
    pub subfolder: String,
    #[serde(rename = "type")]
    pub kind: String,
}

pub struct ImageSaver {
    output_dir: PathBuf,
}

impl ImageSaver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 保存一个批次
    ///
    /// 序号只在批次开始时计算一次, 之后逐帧递增
    pub fn save_batch(
        &self,
        images: &[DynamicImage],
        filename_prefix: &str,
        seed: Option<u64>,
        metadata: &[TextChunk],
    ) -> Result<Vec<SavedImage>, Error> {
        let first = images.first().ok_or(Error::EmptyBatch)?;
        let (width, height) = first.dimensions();
        let save_path = SavePath::resolve(
            &self.output_dir,
            filename_prefix,
            width as usize,
            height as usize,
        )?;
        fs::create_dir_all(&save_path.full_output_folder)?;

        let mut index =
            SaveCounter::new(&save_path.full_output_folder, &save_path.filename)?.next_index()?;

        let mut saved = Vec::with_capacity(images.len());
        for (batch_number, image) in images.iter().enumerate() {
            let prefix = save_path
                .filename
                .replace(BATCH_NUM_TOKEN, &batch_number.to_string());
            let filename = build_filename(&prefix, index, seed);

            save_png(
                image,
                save_path.full_output_folder.join(&filename),
                metadata,
            )?;
            info!("saved image: {filename}");

            saved.push(SavedImage {
                filename,
                subfolder: save_path.subfolder.clone(),
                kind: "output".to_string(),
            });
            index += 1;
        }

        Ok(saved)
    }
}

/// 写入 PNG 文件, 附带文本块
pub fn save_png<P: AsRef<Path>>(
    image: &DynamicImage,
    path: P,
    metadata: &[TextChunk],
) -> Result<(), Error> {
    // 非 8 位格式统一转为 RGB8
    let image = match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    };
    let color_type = match image.as_ref() {
        DynamicImage::ImageLuma8(_) => png::ColorType::Grayscale,
        DynamicImage::ImageLumaA8(_) => png::ColorType::GrayscaleAlpha,
        DynamicImage::ImageRgba8(_) => png::ColorType::Rgba,
        _ => png::ColorType::Rgb,
    };

    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(PNG_COMPRESSION);

    for chunk in metadata {
        if chunk.is_latin1() {
            encoder.add_text_chunk(chunk.keyword.clone(), chunk.text.clone())?;
        } else {
            encoder.add_itxt_chunk(chunk.keyword.clone(), chunk.text.clone())?;
        }
    }

    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_bytes())?;
    writer.finish()?;

    Ok(())
}
