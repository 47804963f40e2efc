//! PNG line chart export.
//!
//! Draws humidity against the left scale and temperature against the right
//! scale on one canvas. There is no text rendering; the scale ranges are
//! returned in [`ChartLayout`] so the caller can print them next to the file
//! name.

use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use silo_core::series::ChartSeries;

pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 600;

const MARGIN: u32 = 48;
const GRID_LINES: u32 = 5;

pub const HUMIDITY_COLOR: Rgb<u8> = Rgb([0x5F, 0x8C, 0x1B]);
pub const TEMPERATURE_COLOR: Rgb<u8> = Rgb([0xF2, 0xCF, 0x63]);
const BACKGROUND: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const AXIS: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
const GRID: Rgb<u8> = Rgb([0xE5, 0xE5, 0xE5]);

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("No data to chart")]
    Empty,

    #[error("Failed to write chart: {0}")]
    Image(#[from] image::ImageError),
}

/// Value range of one vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub min: f64,
    pub max: f64,
}

impl Scale {
    /// Fit the values with 10% headroom. A flat series gets a unit band.
    fn fit(values: &[f64]) -> Self {
        let (lo, hi) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if (hi - lo).abs() < f64::EPSILON {
            return Self {
                min: lo - 1.0,
                max: hi + 1.0,
            };
        }
        let pad = (hi - lo) * 0.1;
        Self {
            min: lo - pad,
            max: hi + pad,
        }
    }

    /// Map a value onto a pixel row inside the plot area.
    fn project(&self, value: f64, top: u32, bottom: u32) -> i64 {
        let t = (value - self.min) / (self.max - self.min);
        let span = f64::from(bottom - top);
        (f64::from(bottom) - t * span).round() as i64
    }
}

/// Scales used for the two series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub humidity: Scale,
    pub temperature: Scale,
}

/// Draw the chart into an image.
///
/// Series are drawn oldest on the left, so the newest-first input order is
/// reversed.
pub fn draw_chart(
    series: &ChartSeries,
    width: u32,
    height: u32,
) -> Result<(RgbImage, ChartLayout), ChartError> {
    if series.is_empty() {
        return Err(ChartError::Empty);
    }

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    let (left, right) = (MARGIN, width.saturating_sub(MARGIN).max(MARGIN + 1));
    let (top, bottom) = (MARGIN, height.saturating_sub(MARGIN).max(MARGIN + 1));

    for i in 0..=GRID_LINES {
        let y = top + (bottom - top) * i / GRID_LINES;
        draw_line(&mut img, (left.into(), y.into()), (right.into(), y.into()), GRID);
    }
    draw_line(&mut img, (left.into(), top.into()), (left.into(), bottom.into()), HUMIDITY_COLOR);
    draw_line(&mut img, (right.into(), top.into()), (right.into(), bottom.into()), TEMPERATURE_COLOR);
    draw_line(&mut img, (left.into(), bottom.into()), (right.into(), bottom.into()), AXIS);

    let layout = ChartLayout {
        humidity: Scale::fit(&series.humidity),
        temperature: Scale::fit(&series.temperature),
    };

    let n = series.len();
    let x_at = |i: usize| -> i64 {
        if n == 1 {
            return i64::from((left + right) / 2);
        }
        let slot = n - 1 - i;
        i64::from(left) + (f64::from(right - left) * slot as f64 / (n - 1) as f64).round() as i64
    };

    for (values, scale, color) in [
        (&series.humidity, layout.humidity, HUMIDITY_COLOR),
        (&series.temperature, layout.temperature, TEMPERATURE_COLOR),
    ] {
        let points: Vec<(i64, i64)> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| (x_at(i), scale.project(v, top, bottom)))
            .collect();

        for pair in points.windows(2) {
            draw_line(&mut img, pair[0], pair[1], color);
        }
        for &point in &points {
            draw_marker(&mut img, point, color);
        }
    }

    Ok((img, layout))
}

/// Draw the chart at the default size and save it as PNG.
pub fn save_chart(series: &ChartSeries, path: &Path) -> Result<ChartLayout, ChartError> {
    let (img, layout) = draw_chart(series, CHART_WIDTH, CHART_HEIGHT)?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(layout)
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(img, x, y, color);
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

fn draw_marker(img: &mut RgbImage, (cx, cy): (i64, i64), color: Rgb<u8>) {
    for dx in -2..=2 {
        for dy in -2..=2 {
            put(img, cx + dx, cy + dy, color);
        }
    }
}
