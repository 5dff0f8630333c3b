//! 分辨率选择
//!
//! - manual: 校验手动输入的宽高
//! - auto: 根据图像或宽高比覆盖值从预设表中选择

use log::debug;
use strum_macros::{Display, EnumString};

use crate::{
    error::Error,
    resolution::{
        presets::{DimensionLimits, ModelProfile, PresetFamily, PresetTables, QualityTier},
        AspectRatio, ImageSize,
    },
};

/// 选择模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum SelectionMode {
    #[strum(to_string = "auto")]
    Auto,
    #[strum(to_string = "manual")]
    Manual,
}

impl SelectionMode {
    pub fn options() -> Vec<String> {
        vec![Self::Auto.to_string(), Self::Manual.to_string()]
    }
}

/// 宽高比覆盖值, 仅用于质量档位模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum RatioOverride {
    #[strum(to_string = "off")]
    Off,
    #[strum(to_string = "1:1")]
    Square,
    #[strum(to_string = "4:3")]
    Landscape4x3,
    #[strum(to_string = "16:9")]
    Landscape16x9,
    #[strum(to_string = "3:4")]
    Portrait3x4,
    #[strum(to_string = "9:16")]
    Portrait9x16,
}

impl RatioOverride {
    pub fn options() -> Vec<String> {
        vec![
            Self::Off.to_string(),
            Self::Square.to_string(),
            Self::Landscape4x3.to_string(),
            Self::Landscape16x9.to_string(),
            Self::Portrait3x4.to_string(),
            Self::Portrait9x16.to_string(),
        ]
    }

    fn ratio(&self) -> Result<Option<AspectRatio>, Error> {
        match self {
            Self::Off => Ok(None),
            other => other.to_string().parse().map(Some),
        }
    }
}

/// 存在输入图像时的尺寸策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum ImageFit {
    /// 按图像宽高比选择预设
    #[strum(to_string = "preset")]
    Preset,
    /// 图像尺寸向下对齐
    #[strum(to_string = "align down")]
    AlignDown,
    /// 图像尺寸就近对齐
    #[strum(to_string = "align nearest")]
    AlignNearest,
}

impl ImageFit {
    pub fn options() -> Vec<String> {
        vec![
            Self::Preset.to_string(),
            Self::AlignDown.to_string(),
            Self::AlignNearest.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Landscape,
    Portrait,
}

/// 选择请求
#[derive(Debug, Clone)]
pub struct SelectionRequest<'a> {
    pub mode: SelectionMode,
    pub quality: &'a str,
    pub ratio_override: RatioOverride,
    /// 固定预设标签
    pub aspect_ratio: &'a str,
    pub manual_width: usize,
    pub manual_height: usize,
    pub image: Option<ImageSize>,
    pub image_fit: ImageFit,
}

pub struct ResolutionSelector<'a> {
    profile: &'a ModelProfile,
    limits: DimensionLimits,
    square_tolerance: f64,
}

impl<'a> ResolutionSelector<'a> {
    pub fn new(profile: &'a ModelProfile, square_tolerance: f64) -> Self {
        Self {
            profile,
            limits: profile.limits,
            square_tolerance,
        }
    }

    /// 从预设表创建
    pub fn from_tables(tables: &'a PresetTables, model: &str) -> Result<Self, Error> {
        Ok(Self::new(tables.model(model)?, tables.square_tolerance))
    }

    /// 替换尺寸约束
    pub fn with_limits(mut self, limits: DimensionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// 返回 (width, height)
    pub fn select(&self, request: &SelectionRequest) -> Result<(usize, usize), Error> {
        let (width, height) = match request.mode {
            SelectionMode::Manual => {
                self.validate_manual(request.manual_width, request.manual_height)?
            }
            SelectionMode::Auto => match (request.image, request.image_fit) {
                (Some(image), ImageFit::AlignDown | ImageFit::AlignNearest) => {
                    self.align_image(&image, request.image_fit)
                }
                (image, _) => match self.profile.family {
                    PresetFamily::Quality => self.select_by_quality(
                        request.quality,
                        request.ratio_override,
                        image.as_ref(),
                    )?,
                    PresetFamily::Fixed => self.select_fixed(request.aspect_ratio)?,
                },
            },
        };

        debug!(
            "{} {} resolution: {width}x{height}",
            self.profile.name, request.mode
        );
        Ok((width, height))
    }

    /// 手动宽高校验: 正数, 对齐, 且在 [min, max] 范围内
    pub fn validate_manual(&self, width: usize, height: usize) -> Result<(usize, usize), Error> {
        let DimensionLimits {
            alignment,
            min_dimension,
            max_dimension,
        } = self.limits;

        for (name, value) in [("manual_width", width), ("manual_height", height)] {
            if value == 0 || value % alignment != 0 {
                return Err(Error::Validation(format!(
                    "{name} must be a positive multiple of {alignment}, got {value}"
                )));
            }
            if !(min_dimension..=max_dimension).contains(&value) {
                return Err(Error::Validation(format!(
                    "{name} must be within [{min_dimension}, {max_dimension}], got {value}"
                )));
            }
        }

        Ok((width, height))
    }

    /// 将图像尺寸对齐后限制在 [min, max] 范围内
    fn align_image(&self, image: &ImageSize, fit: ImageFit) -> (usize, usize) {
        let DimensionLimits {
            alignment,
            min_dimension,
            max_dimension,
        } = self.limits;

        let align = |value: usize| {
            let aligned = match fit {
                ImageFit::AlignNearest => (value + alignment / 2) / alignment * alignment,
                _ => value / alignment * alignment,
            };
            aligned.clamp(min_dimension, max_dimension)
        };

        (align(image.width), align(image.height))
    }

    fn select_fixed(&self, label: &str) -> Result<(usize, usize), Error> {
        let preset = self.profile.preset(label)?;
        Ok((preset.width, preset.height))
    }

    fn select_by_quality(
        &self,
        quality: &str,
        ratio_override: RatioOverride,
        image: Option<&ImageSize>,
    ) -> Result<(usize, usize), Error> {
        let tier = self.profile.quality(quality)?;

        // 预设以横向宽高比为键, 竖向覆盖值映射到对应的横向键
        let (ratio, forced) = match ratio_override.ratio()? {
            Some(ratio) if ratio.is_square() => (ratio, None),
            Some(ratio) if ratio.is_portrait() => (ratio.inverted(), Some(Orientation::Portrait)),
            Some(ratio) => (ratio, Some(Orientation::Landscape)),
            None => {
                let image = image.ok_or_else(|| {
                    Error::Validation(
                        "in auto mode without an image, aspect_ratio_override must be set (not 'off')"
                            .to_string(),
                    )
                })?;
                (self.nearest_tier_ratio(tier, image)?, None)
            }
        };

        let preset = tier.preset(&ratio)?;

        let orientation = forced
            .or_else(|| {
                image.map(|image| {
                    if image.width >= image.height {
                        Orientation::Landscape
                    } else {
                        Orientation::Portrait
                    }
                })
            })
            .unwrap_or(Orientation::Landscape);

        if orientation == Orientation::Portrait && !ratio.is_square() {
            return Ok((preset.height, preset.width));
        }
        Ok((preset.width, preset.height))
    }

    /// 图像宽高比归一化为 long/short 后匹配档位中的预设
    ///
    /// 按比值的线性差 |aspect - ratio| 选择, 距离相同时取表中靠前的预设
    fn nearest_tier_ratio(&self, tier: &QualityTier, image: &ImageSize) -> Result<AspectRatio, Error> {
        let aspect = AspectRatio::new(
            image.width.max(image.height),
            image.width.min(image.height),
        )?;

        if (aspect.value() - 1.0).abs() <= self.square_tolerance {
            return AspectRatio::new(1, 1);
        }

        tier.presets
            .iter()
            .filter(|preset| !preset.ratio.is_square())
            .min_by(|a, b| {
                let distance_a = (aspect.value() - a.ratio.value()).abs();
                let distance_b = (aspect.value() - b.ratio.value()).abs();
                distance_a.total_cmp(&distance_b)
            })
            .map(|preset| preset.ratio)
            .ok_or_else(|| {
                Error::Lookup(format!(
                    "quality {} has no non-square presets",
                    tier.name
                ))
            })
    }
}

/// 节点输入预校验
///
/// manual 模式与质量档位模型总是通过, 否则预设标签必须属于所选模型
pub fn validate_inputs(
    tables: &PresetTables,
    mode: &str,
    model: &str,
    aspect_ratio: &str,
) -> Result<(), String> {
    let mode: SelectionMode = mode.parse().map_err(|e| format!("invalid mode '{mode}', {e}"))?;
    if mode == SelectionMode::Manual {
        return Ok(());
    }

    let profile = tables.model(model).map_err(|e| e.to_string())?;
    if profile.family == PresetFamily::Quality {
        return Ok(());
    }

    profile
        .preset(aspect_ratio)
        .map(|_| ())
        .map_err(|_| format!("Selected resolution '{aspect_ratio}' is not valid for {model} model"))
}
