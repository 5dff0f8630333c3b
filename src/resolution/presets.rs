//! 分辨率预设表
//!
//! 数据来自 resources/resolution_presets.json, 首次访问时加载一次

use lazy_static::lazy_static;
use serde::Deserialize;

use crate::{error::Error, resolution::AspectRatio};

const PRESETS_DATA: &str = include_str!("../../resources/resolution_presets.json");

lazy_static! {
    static ref PRESET_TABLES: Result<PresetTables, String> =
        PresetTables::from_json(PRESETS_DATA).map_err(|e| e.to_string());
}

/// 尺寸约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DimensionLimits {
    /// 宽高必须是该值的整数倍
    pub alignment: usize,
    pub min_dimension: usize,
    pub max_dimension: usize,
}

/// 预设族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetFamily {
    /// 按质量档位 + 宽高比查表, 如 WAN
    Quality,
    /// 固定分辨率列表, 如 FLUX / SDXL
    Fixed,
}

/// 固定分辨率预设, label 形如 `1024×1024  (1:1)`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolutionPreset {
    pub label: String,
    pub width: usize,
    pub height: usize,
}

/// 质量档位内按横向宽高比索引的预设
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RatioPreset {
    pub ratio: AspectRatio,
    pub width: usize,
    pub height: usize,
}

/// 质量档位, 如 480p / 720p
#[derive(Debug, Clone, Deserialize)]
pub struct QualityTier {
    pub name: String,
    pub presets: Vec<RatioPreset>,
}

impl QualityTier {
    pub fn preset(&self, ratio: &AspectRatio) -> Result<&RatioPreset, Error> {
        self.presets
            .iter()
            .find(|preset| preset.ratio == *ratio)
            .ok_or_else(|| {
                Error::Lookup(format!(
                    "unsupported combination: quality={}, ratio={ratio}",
                    self.name
                ))
            })
    }
}

/// 模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    pub family: PresetFamily,
    #[serde(flatten)]
    pub limits: DimensionLimits,
    #[serde(default)]
    pub quality_tiers: Vec<QualityTier>,
    #[serde(default)]
    pub presets: Vec<ResolutionPreset>,
    #[serde(default)]
    pub default_preset: Option<String>,
}

impl ModelProfile {
    pub fn quality(&self, name: &str) -> Result<&QualityTier, Error> {
        self.quality_tiers
            .iter()
            .find(|tier| tier.name == name)
            .ok_or_else(|| {
                Error::Lookup(format!(
                    "unknown quality '{name}' for {} model",
                    self.name
                ))
            })
    }

    pub fn preset(&self, label: &str) -> Result<&ResolutionPreset, Error> {
        self.presets
            .iter()
            .find(|preset| preset.label == label)
            .ok_or_else(|| Error::Lookup(format!("invalid {} aspect ratio: {label}", self.name)))
    }

    pub fn preset_labels(&self) -> Vec<String> {
        self.presets.iter().map(|p| p.label.clone()).collect()
    }

    pub fn quality_names(&self) -> Vec<String> {
        self.quality_tiers.iter().map(|t| t.name.clone()).collect()
    }
}

/// 全部预设表
#[derive(Debug, Clone, Deserialize)]
pub struct PresetTables {
    /// 判定为正方形的容差, |long/short - 1| <= tolerance
    pub square_tolerance: f64,
    pub models: Vec<ModelProfile>,
    /// WAN 专用选择器的尺寸约束
    pub wan_selector_limits: DimensionLimits,
}

impl PresetTables {
    pub fn from_json(data: &str) -> Result<Self, Error> {
        let tables: PresetTables = serde_json::from_str(data)?;
        tables.check()?;
        Ok(tables)
    }

    /// 内置预设表
    pub fn builtin() -> Result<&'static PresetTables, Error> {
        PRESET_TABLES
            .as_ref()
            .map_err(|e| Error::InvalidPresetData(e.clone()))
    }

    pub fn model(&self, name: &str) -> Result<&ModelProfile, Error> {
        self.models
            .iter()
            .find(|model| model.name == name)
            .ok_or_else(|| Error::Lookup(format!("unknown model '{name}'")))
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }

    /// 所有固定预设的标签, 去重并保持首次出现的顺序
    pub fn all_preset_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for label in self.models.iter().flat_map(|m| m.presets.iter().map(|p| &p.label)) {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }

    fn check(&self) -> Result<(), Error> {
        let all_limits = self
            .models
            .iter()
            .map(|m| (m.name.as_str(), &m.limits))
            .chain(std::iter::once(("wan selector", &self.wan_selector_limits)));
        for (name, limits) in all_limits {
            if limits.alignment == 0
                || limits.min_dimension == 0
                || limits.min_dimension > limits.max_dimension
                || limits.min_dimension % limits.alignment != 0
                || limits.max_dimension % limits.alignment != 0
            {
                return Err(Error::InvalidPresetData(format!(
                    "bad dimension limits for {name}: {limits:?}"
                )));
            }
        }

        for model in &self.models {
            let empty = match model.family {
                PresetFamily::Quality => model.quality_tiers.is_empty(),
                PresetFamily::Fixed => model.presets.is_empty(),
            };
            if empty {
                return Err(Error::InvalidPresetData(format!(
                    "model {} has no presets",
                    model.name
                )));
            }
        }
        Ok(())
    }
}
