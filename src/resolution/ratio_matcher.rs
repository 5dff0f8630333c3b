//! 命名宽高比匹配
//!
//! 在对数域中寻找距离最近的命名宽高比, 距离相同时取表中靠前的条目

use std::fmt;

use lazy_static::lazy_static;
use log::debug;
use serde::Deserialize;

use crate::{error::Error, resolution::AspectRatio};

const NAMED_RATIOS_DATA: &str = include_str!("../../resources/named_ratios.json");

lazy_static! {
    static ref NAMED_RATIOS: Result<RatioMatcher, String> =
        RatioMatcher::from_json(NAMED_RATIOS_DATA).map_err(|e| e.to_string());
}

/// 命名宽高比条目
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedRatioEntry {
    pub ratio: AspectRatio,
    pub label: String,
}

/// 匹配结果
#[derive(Debug, Clone, PartialEq)]
pub struct RatioMatch {
    pub label: String,
    /// 命名条目的规范宽高比
    pub ratio: String,
}

impl fmt::Display for RatioMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ratio, self.label)
    }
}

pub struct RatioMatcher {
    entries: Vec<NamedRatioEntry>,
}

impl RatioMatcher {
    pub fn new(entries: Vec<NamedRatioEntry>) -> Result<Self, Error> {
        if entries.is_empty() {
            return Err(Error::InvalidPresetData(
                "named ratio table is empty".to_string(),
            ));
        }
        Ok(Self { entries })
    }

    pub fn from_json(data: &str) -> Result<Self, Error> {
        Self::new(serde_json::from_str(data)?)
    }

    /// 内置命名宽高比表
    pub fn builtin() -> Result<&'static RatioMatcher, Error> {
        NAMED_RATIOS
            .as_ref()
            .map_err(|e| Error::InvalidPresetData(e.clone()))
    }

    pub fn entries(&self) -> &[NamedRatioEntry] {
        &self.entries
    }

    /// 解析 `w:h` 字符串并匹配
    pub fn match_ratio(&self, input: &str) -> Result<RatioMatch, Error> {
        let ratio: AspectRatio = input.parse()?;
        let result = self.closest(&ratio);
        debug!("matched ratio {ratio} to {result}");
        Ok(result)
    }

    pub fn closest(&self, ratio: &AspectRatio) -> RatioMatch {
        // entries 在构造时保证非空
        let mut best = &self.entries[0];
        let mut best_distance = ratio.log_distance(&best.ratio);

        for entry in &self.entries[1..] {
            let distance = ratio.log_distance(&entry.ratio);
            if distance < best_distance {
                best = entry;
                best_distance = distance;
            }
        }

        RatioMatch {
            label: best.label.clone(),
            ratio: best.ratio.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ratio: &str, label: &str) -> anyhow::Result<NamedRatioEntry> {
        Ok(NamedRatioEntry {
            ratio: ratio.parse()?,
            label: label.to_string(),
        })
    }

    #[test]
    fn test_builtin_table() -> anyhow::Result<()> {
        let matcher = RatioMatcher::builtin()?;
        assert_eq!(matcher.entries().len(), 22);
        assert_eq!(matcher.entries()[0].label, "Perfect Square");
        Ok(())
    }

    #[test]
    fn test_exact_matches() -> anyhow::Result<()> {
        let matcher = RatioMatcher::builtin()?;

        let result = matcher.match_ratio("16:9")?;
        assert_eq!(result.ratio, "16:9");
        assert_eq!(result.label, "Panorama");
        assert_eq!(result.to_string(), "16:9 (Panorama)");

        assert_eq!(matcher.match_ratio("1:1")?.label, "Perfect Square");
        assert_eq!(matcher.match_ratio("9:32")?.label, "Skyline");
        Ok(())
    }

    #[test]
    fn test_nearest_matches() -> anyhow::Result<()> {
        let matcher = RatioMatcher::builtin()?;

        assert_eq!(matcher.match_ratio("1920:1080")?.ratio, "16:9");
        assert_eq!(matcher.match_ratio("2:1")?.ratio, "19:9");
        assert_eq!(matcher.match_ratio("12:5")?.ratio, "21:9");
        assert_eq!(matcher.match_ratio("100:99")?.ratio, "1:1");
        Ok(())
    }

    #[test]
    fn test_tie_goes_to_first_entry() -> anyhow::Result<()> {
        let matcher = RatioMatcher::new(vec![entry("2:1", "Wide")?, entry("1:2", "Tall")?])?;
        assert_eq!(matcher.match_ratio("1:1")?.label, "Wide");

        let matcher = RatioMatcher::new(vec![entry("1:2", "Tall")?, entry("2:1", "Wide")?])?;
        assert_eq!(matcher.match_ratio("1:1")?.label, "Tall");
        Ok(())
    }

    #[test]
    fn test_invalid_input() -> anyhow::Result<()> {
        let matcher = RatioMatcher::builtin()?;
        assert!(matches!(matcher.match_ratio("abc"), Err(Error::Parse(_))));
        assert!(matches!(matcher.match_ratio("16:0"), Err(Error::Parse(_))));
        assert!(matches!(
            RatioMatcher::new(Vec::new()),
            Err(Error::InvalidPresetData(_))
        ));
        Ok(())
    }
}
