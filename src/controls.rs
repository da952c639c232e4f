use cairo::Context;
use geo::Coord;

use crate::error::Result;
use crate::geometry::Frame;

/// `x, y` with a fixed number of decimals.
pub fn format_coordinate(coord: Coord<f64>, decimals: usize) -> String {
    format!("{:.*}, {:.*}", decimals, coord.x, decimals, coord.y)
}

pub fn format_opacity(opacity: f64) -> String {
    format!("{:.2}", opacity)
}

/// Screen resolution assumed when no print resolution is set.
pub const DEFAULT_DPI: f64 = 25.4 / 0.28;
const INCHES_PER_METER: f64 = 1000.0 / 25.4;
const LEADING_DIGITS: [f64; 3] = [1.0, 2.0, 5.0];

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub width_px: f64,
    pub label: String,
    pub scale: String,
}

/// Metric scale bar that is at least `min_width` pixels wide.
#[derive(Debug, Clone)]
pub struct ScaleLine {
    min_width: f64,
    dpi: Option<f64>,
}

impl ScaleLine {
    pub fn new(min_width: f64) -> Self {
        Self {
            min_width,
            dpi: None,
        }
    }

    /// Print resolution used for the `1 : N` text; `None` restores the
    /// screen default.
    pub fn set_dpi(&mut self, dpi: Option<f64>) {
        self.dpi = dpi;
    }

    /// Bar for a ground resolution of `point_resolution` meters per pixel.
    pub fn compute(&self, point_resolution: f64) -> ScaleBar {
        let nominal = self.min_width * point_resolution;
        let (unit, per_pixel) = if nominal < 1.0 {
            ("mm", point_resolution * 1000.0)
        } else if nominal < 1000.0 {
            ("m", point_resolution)
        } else {
            ("km", point_resolution / 1000.0)
        };

        let mut i = 3 * (self.min_width * per_pixel).log10().floor().clamp(-30.0, 30.0) as i32;
        let (count, width_px) = loop {
            let decimal = 10f64.powi(i.div_euclid(3));
            let count = LEADING_DIGITS[i.rem_euclid(3) as usize] * decimal;
            let width = (count / per_pixel).round();
            if width >= self.min_width {
                break (count, width);
            }
            i += 1;
        };

        let dpi = self.dpi.unwrap_or(DEFAULT_DPI);
        let denominator = (point_resolution * INCHES_PER_METER * dpi).round();

        ScaleBar {
            width_px,
            label: format!("{} {}", count, unit),
            scale: format!("1 : {}", group_thousands(denominator as u64)),
        }
    }

    /// Draw the bar in the bottom-left corner of `frame`.
    pub fn draw(&self, cr: &Context, frame: &Frame, point_resolution: f64) -> Result<()> {
        const MARGIN: f64 = 10.0;
        const BAR_HEIGHT: f64 = 8.0;
        const SEGMENTS: usize = 4;

        let bar = self.compute(point_resolution);
        let x0 = MARGIN;
        let y0 = frame.height - MARGIN - BAR_HEIGHT - 14.0;
        let segment = bar.width_px / SEGMENTS as f64;

        for i in 0..SEGMENTS {
            let shade = if i % 2 == 0 { 0.0 } else { 1.0 };
            cr.set_source_rgb(shade, shade, shade);
            cr.rectangle(x0 + i as f64 * segment, y0, segment, BAR_HEIGHT);
            cr.fill()?;
        }
        cr.set_source_rgb(0.0, 0.0, 0.0);
        cr.set_line_width(1.0);
        cr.rectangle(x0, y0, bar.width_px, BAR_HEIGHT);
        cr.stroke()?;

        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        cr.set_font_size(10.0);
        cr.move_to(x0 + bar.width_px + 4.0, y0 + BAR_HEIGHT);
        cr.show_text(&bar.label)?;
        cr.move_to(x0, y0 + BAR_HEIGHT + 13.0);
        cr.show_text(&bar.scale)?;
        Ok(())
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
