//! 宽高比
//!
//! 由两个正整数组成, 字符串形式为 `w:h`

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::error::Error;

/// 宽高比
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct AspectRatio {
    width: usize,
    height: usize,
}

impl AspectRatio {
    pub fn new(width: usize, height: usize) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::Parse(format!(
                "ratio terms must be positive, got {width}:{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// 由图像尺寸约分得到最简宽高比
    pub fn from_dimensions(width: usize, height: usize) -> Result<Self, Error> {
        let divisor = gcd(width, height).max(1);
        Self::new(width / divisor, height / divisor)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// 比值 w/h
    pub fn value(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// 对数域距离 |ln(a) - ln(b)|
    ///
    /// 2:1 与 1:2 到 1:1 的距离相等
    pub fn log_distance(&self, other: &AspectRatio) -> f64 {
        (self.value().ln() - other.value().ln()).abs()
    }

    /// 交换宽高
    pub fn inverted(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub fn is_portrait(&self) -> bool {
        self.width < self.height
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(':')
            .ok_or_else(|| Error::Parse(format!("expected 'w:h', got '{s}'")))?;

        let parse_term = |term: &str| {
            term.trim()
                .parse::<usize>()
                .map_err(|e| Error::Parse(format!("invalid ratio term '{term}' in '{s}', {e}")))
        };

        Self::new(parse_term(width)?, parse_term(height)?)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 最大公约数
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratio() -> anyhow::Result<()> {
        let ratio: AspectRatio = "16:9".parse()?;
        assert_eq!((ratio.width(), ratio.height()), (16, 9));
        assert_eq!(ratio.to_string(), "16:9");

        let ratio: AspectRatio = " 4 : 3 ".parse()?;
        assert_eq!(ratio.to_string(), "4:3");
        Ok(())
    }

    #[test]
    fn test_parse_ratio_rejects_malformed_input() -> anyhow::Result<()> {
        for input in ["", "16", "16:0", "0:9", "a:b", "2.39:1", "1:2:3", "-4:3"] {
            let result = input.parse::<AspectRatio>();
            assert!(
                matches!(result, Err(Error::Parse(_))),
                "'{input}' should not parse"
            );
        }
        Ok(())
    }

    #[test]
    fn test_from_dimensions_reduces() -> anyhow::Result<()> {
        assert_eq!(AspectRatio::from_dimensions(1920, 1080)?.to_string(), "16:9");
        assert_eq!(AspectRatio::from_dimensions(832, 480)?.to_string(), "26:15");
        assert_eq!(AspectRatio::from_dimensions(512, 512)?.to_string(), "1:1");
        assert!(AspectRatio::from_dimensions(0, 512).is_err());
        Ok(())
    }

    #[test]
    fn test_log_distance_is_symmetric_around_square() -> anyhow::Result<()> {
        let square = AspectRatio::new(1, 1)?;
        let wide = AspectRatio::new(2, 1)?;
        let tall = wide.inverted();

        assert!((square.log_distance(&wide) - square.log_distance(&tall)).abs() < 1e-12);
        assert!(tall.is_portrait());
        assert!(square.is_square());
        Ok(())
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(1920, 1080), 120);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(gcd(0, 0), 0);
    }
}
