//! XY 图表网格合成

use std::{fs, path::PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use log::{debug, warn};
use strum_macros::{Display, EnumString};

use crate::{
    error::Error,
    xy_plot::plot_values::{PlotAxis, PlotValue},
};

pub const DEFAULT_FONT_SIZE: u32 = 30;
pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 100;

/// 描边宽度
pub const BORDER_WIDTH: i32 = 2;
/// 标签相对单元格左上角的偏移
const LABEL_MARGIN: i32 = 5;
/// 多行标签的行间距
const LINE_SPACING: f32 = 4.0;

const FONT_FILES: [&str; 3] = ["calibri.ttf", "arial.ttf", "DejaVuSans.ttf"];
const FONT_DIRS: [&str; 6] = [
    "C:/Windows/Fonts",
    "/usr/share/fonts/truetype/msttcorefonts",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];

/// 标签颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum FontColor {
    #[strum(to_string = "white")]
    White,
    #[strum(to_string = "black")]
    Black,
}

impl FontColor {
    pub fn options() -> Vec<String> {
        vec![FontColor::White.to_string(), FontColor::Black.to_string()]
    }

    /// (文字颜色, 描边颜色)
    pub fn colors(&self) -> (Rgb<u8>, Rgb<u8>) {
        match self {
            FontColor::White => (Rgb([255, 255, 255]), Rgb([0, 0, 0])),
            FontColor::Black => (Rgb([0, 0, 0]), Rgb([255, 255, 255])),
        }
    }
}

/// 网格样式
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotStyle {
    pub spacing: u32,
    pub font_color: FontColor,
    pub border: bool,
}

/// 网格布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub spacing: u32,
}

impl GridLayout {
    /// 整张网格的尺寸
    pub fn size(&self) -> (u32, u32) {
        let span = |count: u32, cell: u32| {
            count * cell + count.saturating_sub(1) * self.spacing
        };
        (
            span(self.columns, self.cell_width),
            span(self.rows, self.cell_height),
        )
    }

    /// 单元格左上角坐标
    pub fn cell_origin(&self, column: u32, row: u32) -> (u32, u32) {
        (
            column * (self.cell_width + self.spacing),
            row * (self.cell_height + self.spacing),
        )
    }
}

/// 单元格标签
pub fn cell_label(x_param: &str, x_value: &PlotValue, y: Option<(&str, &PlotValue)>) -> String {
    match y {
        Some((y_param, y_value)) => format!("{x_param}: {x_value}\n{y_param}: {y_value}"),
        None => format!("{x_param}: {x_value}"),
    }
}

/// 描边的偏移位置, 不含中心
pub fn border_offsets(width: i32) -> Vec<(i32, i32)> {
    (-width..=width)
        .flat_map(|dx| (-width..=width).map(move |dy| (dx, dy)))
        .filter(|offset| *offset != (0, 0))
        .collect()
}

/// 标签字体
pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    /// 从字体文件数据创建, size 为字号 (em 像素)
    pub fn from_bytes(data: Vec<u8>, size: u32) -> Result<Self, Error> {
        let font = FontVec::try_from_vec(data)?;
        let size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE) as f32;
        let scale = match font.units_per_em() {
            Some(units_per_em) => PxScale::from(size * font.height_unscaled() / units_per_em),
            None => PxScale::from(size),
        };
        Ok(Self { font, scale })
    }

    /// 在常见字体目录中查找可用字体
    ///
    /// 找不到字体时返回 None, 网格不绘制标签
    pub fn load(size: u32) -> Option<Self> {
        let candidates = FONT_FILES
            .iter()
            .flat_map(|file| FONT_DIRS.iter().map(move |dir| PathBuf::from(dir).join(file)));

        for path in candidates {
            let Ok(data) = fs::read(&path) else {
                continue;
            };
            match Self::from_bytes(data, size) {
                Ok(font) => {
                    debug!("label font loaded: {}", path.display());
                    return Some(font);
                }
                Err(e) => warn!("skip font {}, {e}", path.display()),
            }
        }

        warn!("no label font found, the plot is drawn without labels");
        None
    }

    fn line_height(&self) -> i32 {
        (self.font.as_scaled(self.scale).height() + LINE_SPACING).ceil() as i32
    }

    /// 绘制多行文字
    fn draw(&self, canvas: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        let line_height = self.line_height();
        for (idx, line) in text.lines().enumerate() {
            draw_text_mut(
                canvas,
                color,
                x,
                y + idx as i32 * line_height,
                self.scale,
                &self.font,
                line,
            );
        }
    }
}

/// 合成 XY 图表
///
/// rows[y][x] 为各参数组合的采样结果, 单元格尺寸取第一张图像
pub fn compose_grid(
    rows: &[Vec<DynamicImage>],
    x_axis: &PlotAxis,
    y_axis: Option<&PlotAxis>,
    style: &PlotStyle,
    font: Option<&LabelFont>,
) -> Result<RgbImage, Error> {
    let first = rows
        .first()
        .and_then(|row| row.first())
        .ok_or(Error::EmptyBatch)?;
    let (cell_width, cell_height) = first.dimensions();

    let row_count = y_axis.map(|axis| axis.values.len()).unwrap_or(1);
    if rows.len() != row_count || rows.iter().any(|row| row.len() != x_axis.values.len()) {
        return Err(Error::Validation(format!(
            "grid has {} rows, expected {row_count} rows of {} images",
            rows.len(),
            x_axis.values.len()
        )));
    }

    let layout = GridLayout {
        columns: x_axis.values.len() as u32,
        rows: row_count as u32,
        cell_width,
        cell_height,
        spacing: style.spacing,
    };
    let (width, height) = layout.size();
    let mut canvas = RgbImage::new(width, height);
    let (text_color, border_color) = style.font_color.colors();

    for (row_idx, row) in rows.iter().enumerate() {
        let y_label = y_axis.map(|axis| (axis.param.as_str(), &axis.values[row_idx]));

        for (column_idx, cell) in row.iter().enumerate() {
            let (x, y) = layout.cell_origin(column_idx as u32, row_idx as u32);
            imageops::replace(&mut canvas, &cell.to_rgb8(), x as i64, y as i64);

            let Some(font) = font else {
                continue;
            };
            let label = cell_label(&x_axis.param, &x_axis.values[column_idx], y_label);
            let (text_x, text_y) = (x as i32 + LABEL_MARGIN, y as i32 + LABEL_MARGIN);

            if style.border {
                for (dx, dy) in border_offsets(BORDER_WIDTH) {
                    font.draw(&mut canvas, border_color, text_x + dx, text_y + dy, &label);
                }
            }
            font.draw(&mut canvas, text_color, text_x, text_y, &label);
        }
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
    }

    fn axis(param: &str, values: &[i64]) -> PlotAxis {
        PlotAxis {
            param: param.to_string(),
            values: values.iter().copied().map(PlotValue::Int).collect(),
        }
    }

    fn style(spacing: u32) -> PlotStyle {
        PlotStyle {
            spacing,
            font_color: FontColor::White,
            border: true,
        }
    }

    #[test]
    fn test_grid_layout() {
        let layout = GridLayout {
            columns: 3,
            rows: 2,
            cell_width: 64,
            cell_height: 32,
            spacing: 4,
        };

        assert_eq!(layout.size(), (3 * 64 + 2 * 4, 2 * 32 + 4));
        assert_eq!(layout.cell_origin(0, 0), (0, 0));
        assert_eq!(layout.cell_origin(2, 1), (2 * 68, 36));
    }

    #[test]
    fn test_cell_label() {
        let steps = PlotValue::Int(20);
        let cfg = PlotValue::Float(7.0);

        assert_eq!(cell_label("steps", &steps, None), "steps: 20");
        assert_eq!(
            cell_label("steps", &steps, Some(("cfg", &cfg))),
            "steps: 20\ncfg: 7.0"
        );
    }

    #[test]
    fn test_border_offsets() {
        let offsets = border_offsets(BORDER_WIDTH);

        assert_eq!(offsets.len(), 24);
        assert!(!offsets.contains(&(0, 0)));
        assert!(offsets.contains(&(-2, 2)));
    }

    #[test]
    fn test_font_color() -> anyhow::Result<()> {
        assert_eq!(FontColor::from_str("black")?, FontColor::Black);
        assert_eq!(FontColor::options(), vec!["white", "black"]);
        assert_eq!(
            FontColor::White.colors(),
            (Rgb([255, 255, 255]), Rgb([0, 0, 0]))
        );
        Ok(())
    }

    #[test]
    fn test_compose_grid_places_cells_with_spacing() -> anyhow::Result<()> {
        let x = axis("steps", &[10, 20]);
        let y = axis("seed", &[1, 2]);
        let rows = vec![
            vec![solid(8, 6, 10), solid(8, 6, 20)],
            vec![solid(8, 6, 30), solid(8, 6, 40)],
        ];

        let grid = compose_grid(&rows, &x, Some(&y), &style(3), None)?;

        assert_eq!(grid.dimensions(), (19, 15));
        assert_eq!(grid.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(grid.get_pixel(11, 0).0, [20, 20, 20]);
        assert_eq!(grid.get_pixel(0, 9).0, [30, 30, 30]);
        assert_eq!(grid.get_pixel(18, 14).0, [40, 40, 40]);
        // 间隔为黑色背景
        assert_eq!(grid.get_pixel(9, 0).0, [0, 0, 0]);
        assert_eq!(grid.get_pixel(0, 7).0, [0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_compose_grid_single_row() -> anyhow::Result<()> {
        let x = axis("cfg", &[5, 6, 7]);
        let rows = vec![vec![solid(4, 4, 1), solid(4, 4, 2), solid(4, 4, 3)]];

        let grid = compose_grid(&rows, &x, None, &style(0), None)?;

        assert_eq!(grid.dimensions(), (12, 4));
        assert_eq!(grid.get_pixel(8, 3).0, [3, 3, 3]);
        Ok(())
    }

    #[test]
    fn test_compose_grid_rejects_mismatched_rows() {
        let x = axis("steps", &[10, 20]);
        let rows = vec![vec![solid(4, 4, 1)]];

        assert!(matches!(
            compose_grid(&rows, &x, None, &style(0), None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            compose_grid(&[], &x, None, &style(0), None),
            Err(Error::EmptyBatch)
        ));
    }

    #[test]
    fn test_compose_grid_draws_labels_when_font_available() -> anyhow::Result<()> {
        let Some(font) = LabelFont::load(DEFAULT_FONT_SIZE) else {
            return Ok(());
        };
        let x = axis("steps", &[10]);
        let rows = vec![vec![solid(200, 80, 128)]];

        let grid = compose_grid(&rows, &x, None, &style(0), Some(&font))?;

        let changed = grid.pixels().filter(|p| p.0 != [128, 128, 128]).count();
        assert!(changed > 0);
        Ok(())
    }

    #[test]
    fn test_label_font_rejects_invalid_data() {
        assert!(matches!(
            LabelFont::from_bytes(vec![0, 1, 2, 3], DEFAULT_FONT_SIZE),
            Err(Error::InvalidFont(_))
        ));
    }
}
