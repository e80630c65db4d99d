//! Candlestick chart with a cumulative position overlay.
//!
//! Layout: candles on the top three quarters with the cumulative signed quantity as a blue
//! line on a secondary axis, volume bars underneath. The backend follows the output
//! extension: `.svg` is vector, anything else (`.png`, `.jpg`, `.bmp`) a bitmap.
//!
//! Text is rasterized with an embedded DejaVu Sans, so bitmaps need no system fonts.

use std::{fmt::Display, fs, ops::Range, path::Path, sync::OnceLock};

use kline_ingestor::models::timeframe::Timeframe;
use plotters::{
    coord::Shift,
    prelude::*,
    style::{FontStyle, register_font},
};
use serde::Deserialize;
use snafu::{Backtrace, ResultExt, Snafu, ensure};
use tracing::debug;

use crate::series::ChartRow;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RenderError {
    #[snafu(display("Nothing to plot: no candle overlaps the trade series"))]
    NoData { backtrace: Backtrace },

    #[snafu(display("Failed to create output directory {}: {source}", path.display()))]
    OutputDir {
        path: std::path::PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Drawing backend error: {message}"))]
    Backend { message: String, backtrace: Backtrace },
}

fn backend_err(e: impl Display) -> RenderError {
    BackendSnafu {
        message: e.to_string(),
    }
    .build()
}

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 720,
        }
    }
}

const FONT_FAMILY: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Registers the embedded font under [`FONT_FAMILY`] on first use.
fn ensure_font() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "embedded font is not a valid TrueType file".to_string())
        })
        .clone()
        .map_err(backend_err)
}

pub fn chart_title(symbol: &str, timeframe: Timeframe) -> String {
    format!("[{symbol} - PERP - {timeframe}] Monitored Cumsum Position")
}

/// Draws `rows` to `path`, picking the backend from the file extension.
pub fn render_chart(
    rows: &[ChartRow],
    title: &str,
    path: &Path,
    style: &ChartStyle,
) -> Result<(), RenderError> {
    ensure!(!rows.is_empty(), NoDataSnafu);
    ensure_font()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(OutputDirSnafu { path: parent })?;
    }

    let size = (style.width, style.height);
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

    if is_svg {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw(&root, rows, title)?;
        root.present().map_err(backend_err)?;
    } else {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw(&root, rows, title)?;
        root.present().map_err(backend_err)?;
    }

    debug!(path = %path.display(), rows = rows.len(), svg = is_svg, "rendered chart");
    Ok(())
}

/// Range around `[lo, hi]` with a 5% margin; a flat series gets a unit margin.
fn padded(lo: f64, hi: f64) -> Range<f64> {
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    rows: &[ChartRow],
    title: &str,
) -> Result<(), RenderError> {
    root.fill(&WHITE).map_err(backend_err)?;
    let area = root.titled(title, (FONT_FAMILY, 22)).map_err(backend_err)?;

    let (_, height) = area.dim_in_pixel();
    let (upper, lower) = area.split_vertically((f64::from(height) * 0.75) as i32);

    let n = rows.len();
    let x_range = -0.5..(n as f64 - 0.5);
    let (price_lo, price_hi) = bounds(rows.iter().flat_map(|r| [r.low, r.high]));
    let (cum_lo, cum_hi) = bounds(rows.iter().map(|r| r.cumulative));
    let (_, vol_hi) = bounds(rows.iter().map(|r| r.volume));
    let vol_top = if vol_hi > 0.0 { vol_hi * 1.1 } else { 1.0 };

    let label_area = 70;
    let (plot_width, _) = upper.dim_in_pixel();
    let candle_px = ((f64::from(plot_width.saturating_sub(2 * label_area)) / n as f64) * 0.7)
        .max(1.0) as u32;

    let time_label = |x: &f64| {
        let i = x.round();
        if i >= 0.0 && (i as usize) < n {
            rows[i as usize].time.format("%m-%d %H:%M").to_string()
        } else {
            String::new()
        }
    };

    let mut price = {
        let mut builder = ChartBuilder::on(&upper);
        builder
            .margin(8)
            .y_label_area_size(label_area)
            .right_y_label_area_size(label_area);
        builder
            .build_cartesian_2d(x_range.clone(), padded(price_lo, price_hi))
            .map_err(backend_err)?
            .set_secondary_coord(x_range.clone(), padded(cum_lo, cum_hi))
    };

    price
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(8)
        .x_label_formatter(&time_label)
        .label_style((FONT_FAMILY, 12))
        .y_desc("Price")
        .draw()
        .map_err(backend_err)?;
    price
        .configure_secondary_axes()
        .label_style((FONT_FAMILY, 12))
        .y_desc("Cumsum signed qty")
        .draw()
        .map_err(backend_err)?;

    price
        .draw_series(rows.iter().enumerate().map(|(i, r)| {
            CandleStick::new(
                i as f64,
                r.open,
                r.high,
                r.low,
                r.close,
                GREEN.filled(),
                RED.filled(),
                candle_px,
            )
        }))
        .map_err(backend_err)?;
    price
        .draw_secondary_series(LineSeries::new(
            rows.iter().enumerate().map(|(i, r)| (i as f64, r.cumulative)),
            BLUE.stroke_width(2),
        ))
        .map_err(backend_err)?;

    let mut volume = {
        let mut builder = ChartBuilder::on(&lower);
        builder
            .margin(8)
            .x_label_area_size(30)
            .y_label_area_size(label_area)
            .right_y_label_area_size(label_area);
        builder
            .build_cartesian_2d(x_range, 0.0..vol_top)
            .map_err(backend_err)?
    };

    volume
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(8)
        .x_label_formatter(&time_label)
        .label_style((FONT_FAMILY, 12))
        .y_desc("Volume")
        .y_labels(3)
        .draw()
        .map_err(backend_err)?;

    volume
        .draw_series(rows.iter().enumerate().map(|(i, r)| {
            let x = i as f64;
            let color = if r.close >= r.open { GREEN } else { RED };
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, r.volume)], color.filled())
        }))
        .map_err(backend_err)?;

    Ok(())
}
