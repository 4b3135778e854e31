use crate::font::{draw_text, text_width, GLYPH_HEIGHT};
use image::{ImageError, Rgb, RgbImage};
use itertools::Itertools;
use meridian_indicator_engine::IndicatorFrame;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 600;
const MARGIN: u32 = 40;
const LEGEND_HEIGHT: u32 = 24;
const GRID_LINES: u32 = 8;
const TITLE_TOP: i64 = 6;
const LEGEND_TOP: u32 = 28;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([228, 228, 228]);
const AXIS: Rgb<u8> = Rgb([90, 90, 90]);
const TEXT: Rgb<u8> = Rgb([40, 40, 40]);

const PRICE: Rgb<u8> = Rgb([31, 119, 180]);
const RSI: Rgb<u8> = Rgb([44, 160, 44]);
const MACD: Rgb<u8> = Rgb([214, 39, 40]);
const SIGNAL: Rgb<u8> = Rgb([255, 127, 14]);
const MVRV: Rgb<u8> = Rgb([148, 103, 189]);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("nothing to plot")]
    Empty,
    #[error("failed to write chart {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Persists a chart of an asset's indicator frame and returns where it went.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, asset: &str, frame: &IndicatorFrame) -> Result<PathBuf, RenderError>;
}

pub fn chart_file_name(asset: &str) -> String {
    format!("{}_chart.png", asset.to_lowercase())
}

/// Overlays price, RSI, MACD, Signal and MVRV on one value axis.
pub struct PngChartRenderer {
    output_dir: PathBuf,
}

impl PngChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

fn draw(asset: &str, frame: &IndicatorFrame) -> Result<RgbImage, RenderError> {
    if frame.is_empty() {
        return Err(RenderError::Empty);
    }

    let series: [(&str, Vec<Option<f64>>, Rgb<u8>); 5] = [
        ("Price", frame.prices.iter().copied().map(Some).collect(), PRICE),
        ("RSI", frame.rsi.clone(), RSI),
        ("MACD", frame.macd.iter().copied().map(Some).collect(), MACD),
        ("Signal", frame.signal.iter().copied().map(Some).collect(), SIGNAL),
        ("MVRV", frame.mvrv.clone(), MVRV),
    ];

    let (min, max) = series
        .iter()
        .flat_map(|(_, values, _)| values.iter().flatten().copied())
        .filter(|v| v.is_finite())
        .minmax()
        .into_option()
        .ok_or(RenderError::Empty)?;

    let plot = PlotArea::new(frame.len(), min, max);
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    plot.draw_grid(&mut img);

    for (_, values, color) in &series {
        for ((i, a), (j, b)) in values.iter().enumerate().tuple_windows() {
            if let (Some(a), Some(b)) = (a, b) {
                if a.is_finite() && b.is_finite() {
                    draw_line(&mut img, plot.point(i, *a), plot.point(j, *b), *color);
                }
            }
        }
    }

    draw_text(
        &mut img,
        &format!("{asset} indicators"),
        MARGIN as i64,
        TITLE_TOP,
        2,
        TEXT,
    );
    draw_legend(&mut img, series.iter().map(|(label, _, color)| (*label, *color)));
    plot.draw_labels(&mut img, frame);

    Ok(img)
}

impl ChartRenderer for PngChartRenderer {
    fn render(&self, asset: &str, frame: &IndicatorFrame) -> Result<PathBuf, RenderError> {
        let img = draw(asset, frame)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(chart_file_name(asset));
        save(&img, &path)?;

        tracing::debug!(path = %path.display(), "Chart written for {}", asset);
        Ok(path)
    }
}

fn save(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
    img.save(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Maps row index and value into pixel space.
struct PlotArea {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    rows: usize,
    min: f64,
    max: f64,
}

impl PlotArea {
    fn new(rows: usize, min: f64, max: f64) -> Self {
        // A flat range still needs some height.
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 1.0, max + 1.0)
        } else {
            (min, max)
        };

        Self {
            left: MARGIN as f64,
            right: (WIDTH - MARGIN) as f64,
            top: (MARGIN + LEGEND_HEIGHT) as f64,
            bottom: (HEIGHT - MARGIN) as f64,
            rows,
            min,
            max,
        }
    }

    fn point(&self, row: usize, value: f64) -> (i64, i64) {
        let x = if self.rows > 1 {
            self.left + (self.right - self.left) * row as f64 / (self.rows - 1) as f64
        } else {
            (self.left + self.right) / 2.0
        };
        let y = self.bottom - (self.bottom - self.top) * (value - self.min) / (self.max - self.min);

        (x.round() as i64, y.round() as i64)
    }

    fn draw_grid(&self, img: &mut RgbImage) {
        for step in 0..=GRID_LINES {
            let y = self.top + (self.bottom - self.top) * step as f64 / GRID_LINES as f64;
            let x = self.left + (self.right - self.left) * step as f64 / GRID_LINES as f64;
            let y = y.round() as i64;
            let x = x.round() as i64;

            draw_line(img, (self.left as i64, y), (self.right as i64, y), GRID);
            draw_line(img, (x, self.top as i64), (x, self.bottom as i64), GRID);
        }

        let (left, bottom) = (self.left as i64, self.bottom as i64);
        draw_line(img, (left, self.top as i64), (left, bottom), AXIS);
        draw_line(img, (left, bottom), (self.right as i64, bottom), AXIS);
    }

    /// Value range inside the top and bottom corners, first and last date
    /// under the x-axis.
    fn draw_labels(&self, img: &mut RgbImage, frame: &IndicatorFrame) {
        let (left, right) = (self.left as i64, self.right as i64);
        let (top, bottom) = (self.top as i64, self.bottom as i64);
        let glyph = GLYPH_HEIGHT as i64;

        draw_text(img, &format!("{:.2}", self.max), left + 4, top + 3, 1, TEXT);
        draw_text(img, &format!("{:.2}", self.min), left + 4, bottom - glyph - 3, 1, TEXT);

        let (Some(first), Some(last)) = (frame.dates.first(), frame.dates.last()) else {
            return;
        };
        let tick_top = bottom + 8;

        let first = first.format("%Y-%m-%d").to_string();
        draw_line(img, (left, bottom), (left, bottom + 4), AXIS);
        draw_text(img, &first, left, tick_top, 1, TEXT);

        if frame.len() > 1 {
            let last = last.format("%Y-%m-%d").to_string();
            let width = i64::from(text_width(&last, 1));
            draw_line(img, (right, bottom), (right, bottom + 4), AXIS);
            draw_text(img, &last, right - width, tick_top, 1, TEXT);
        }
    }
}

fn draw_legend<'a>(img: &mut RgbImage, entries: impl Iterator<Item = (&'a str, Rgb<u8>)>) {
    const SWATCH: u32 = 16;
    const GAP: u32 = 6;
    const SPACING: u32 = 24;

    let mut x0 = MARGIN;
    for (label, color) in entries {
        for x in x0..x0 + SWATCH {
            for y in LEGEND_TOP..LEGEND_TOP + GLYPH_HEIGHT {
                img.put_pixel(x, y, color);
            }
        }
        let text_x = x0 + SWATCH + GAP;
        draw_text(img, label, text_x as i64, LEGEND_TOP as i64, 1, TEXT);
        x0 = text_x + text_width(label, 1) + SPACING;
    }
}

/// Bresenham line, two pixels thick, clipped to the image.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(img, x, y, color);
        plot(img, x, y + 1, color);

        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn plot(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use std::ops::Range;

    fn frame(len: usize) -> IndicatorFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        IndicatorFrame {
            dates: (0..len).map(|i| start + Days::new(i as u64)).collect(),
            prices: (0..len).map(|i| 100.0 + i as f64).collect(),
            rsi: (0..len).map(|i| (i > 0).then_some(55.0)).collect(),
            macd: vec![0.5; len],
            signal: vec![0.25; len],
            mvrv: (0..len).map(|i| (i >= 2).then_some(1.02)).collect(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "valuation-chart-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn file_name_is_lowercased() {
        assert_eq!(chart_file_name("Bitcoin"), "bitcoin_chart.png");
        assert_eq!(chart_file_name("Gold"), "gold_chart.png");
    }

    #[test]
    fn writes_a_png_named_after_the_asset() {
        let dir = scratch_dir("write");
        let renderer = PngChartRenderer::new(&dir);

        let path = renderer.render("Ethereum", &frame(40)).unwrap();

        assert_eq!(path, dir.join("ethereum_chart.png"));
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert!(img.pixels().any(|p| *p == PRICE));
        assert!(img.pixels().any(|p| *p == MVRV));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn single_row_still_renders() {
        let dir = scratch_dir("single");
        let renderer = PngChartRenderer::new(&dir);

        let path = renderer.render("Gold", &frame(1)).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_frame_is_rejected() {
        let renderer = PngChartRenderer::new(scratch_dir("empty"));

        let err = renderer.render("Gold", &frame(0)).unwrap_err();
        assert!(matches!(err, RenderError::Empty));
    }

    fn has_text(img: &RgbImage, rows: Range<u32>, columns: Range<u32>) -> bool {
        rows.flat_map(|y| columns.clone().map(move |x| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) == TEXT)
    }

    #[test]
    fn labels_title_legend_and_dates() {
        let img = draw("Gold", &frame(40)).unwrap();
        let below_axis = HEIGHT - MARGIN + 8..HEIGHT;

        assert!(has_text(&img, 0..LEGEND_TOP, 0..WIDTH));
        assert!(has_text(&img, LEGEND_TOP..LEGEND_TOP + GLYPH_HEIGHT, 0..WIDTH));
        assert_eq!(*img.get_pixel(MARGIN, LEGEND_TOP), PRICE);

        // First date at the left edge, last date right-aligned.
        assert!(has_text(&img, below_axis.clone(), 0..WIDTH / 2));
        assert!(has_text(&img, below_axis, WIDTH / 2..WIDTH));
    }

    #[test]
    fn single_row_has_one_date_tick() {
        let img = draw("Gold", &frame(1)).unwrap();
        let below_axis = HEIGHT - MARGIN + 8..HEIGHT;

        assert!(has_text(&img, below_axis.clone(), 0..WIDTH / 2));
        assert!(!has_text(&img, below_axis, WIDTH / 2..WIDTH));
    }

    #[test]
    fn lines_stay_inside_the_image() {
        let mut img = RgbImage::from_pixel(10, 10, BACKGROUND);
        draw_line(&mut img, (-5, -5), (20, 20), AXIS);

        assert_eq!(*img.get_pixel(0, 0), AXIS);
        assert_eq!(*img.get_pixel(9, 9), AXIS);
        assert_eq!(*img.get_pixel(9, 0), BACKGROUND);
    }
}
