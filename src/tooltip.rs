use std::cell::Cell;

use cairo::Context;
use geo::Coord;

use crate::colormap::Rgba;
use crate::error::Result;
use crate::geometry::Frame;

const PADDING_X: f64 = 8.0;
const PADDING_Y: f64 = 4.0;
const CORNER_RADIUS: f64 = 4.0;
const FONT_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipStyle {
    /// Follows the pointer with drawing hints.
    Help,
    /// Live measurement of the sketch being drawn; pointer events pass through.
    Measure,
    /// Measurement frozen on a finished geometry.
    Static,
}

/// Which point of the bubble sits on the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    CenterLeft,
    BottomCenter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    text: String,
    style: TooltipStyle,
    offset: (f64, f64),
    positioning: Positioning,
    position: Option<Coord<f64>>,
    hidden: bool,
    stop_event: bool,
    /// Pixel size of the bubble as last drawn.
    drawn_size: Cell<Option<(f64, f64)>>,
}

impl Tooltip {
    pub fn help() -> Self {
        Self {
            text: String::new(),
            style: TooltipStyle::Help,
            offset: (15.0, 0.0),
            positioning: Positioning::CenterLeft,
            position: None,
            hidden: true,
            stop_event: true,
            drawn_size: Cell::new(None),
        }
    }

    pub fn measure() -> Self {
        Self {
            text: String::new(),
            style: TooltipStyle::Measure,
            offset: (0.0, -15.0),
            positioning: Positioning::BottomCenter,
            position: None,
            hidden: false,
            stop_event: false,
            drawn_size: Cell::new(None),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> TooltipStyle {
        self.style
    }

    pub fn offset(&self) -> (f64, f64) {
        self.offset
    }

    pub fn position(&self) -> Option<Coord<f64>> {
        self.position
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the bubble swallows pointer events instead of passing them to the map.
    pub fn stops_events(&self) -> bool {
        self.stop_event
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_position(&mut self, position: Coord<f64>) {
        self.position = Some(position);
    }

    pub fn show(&mut self) {
        self.hidden = false;
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    /// Turn a live measure bubble into a static annotation.
    pub fn freeze(&mut self) {
        self.style = TooltipStyle::Static;
        self.offset = (0.0, -7.0);
        self.stop_event = true;
    }

    /// Top-left corner of a bubble of `size` anchored at pixel `anchor`.
    pub fn placement(&self, anchor: (f64, f64), size: (f64, f64)) -> (f64, f64) {
        let x = anchor.0 + self.offset.0;
        let y = anchor.1 + self.offset.1;
        match self.positioning {
            Positioning::CenterLeft => (x, y - size.1 / 2.0),
            Positioning::BottomCenter => (x - size.0 / 2.0, y - size.1),
        }
    }

    /// Whether pixel `point` falls on the bubble as last drawn in `frame`.
    pub fn contains(&self, frame: &Frame, point: (f64, f64)) -> bool {
        let (Some(position), Some(size)) = (self.position, self.drawn_size.get()) else {
            return false;
        };
        if self.hidden || self.text.is_empty() {
            return false;
        }
        let (x, y) = self.placement(frame.to_pixel(position), size);
        (x..=x + size.0).contains(&point.0) && (y..=y + size.1).contains(&point.1)
    }

    fn colors(&self) -> (Rgba, Rgba) {
        match self.style {
            TooltipStyle::Help => (Rgba::new(0, 0, 0, 0.5), Rgba::opaque(255, 255, 255)),
            TooltipStyle::Measure => (Rgba::new(0, 0, 0, 0.5), Rgba::opaque(255, 255, 255)),
            TooltipStyle::Static => (Rgba::opaque(255, 204, 51), Rgba::opaque(0, 0, 0)),
        }
    }

    pub fn draw(&self, cr: &Context, frame: &Frame) -> Result<()> {
        let Some(position) = self.position else {
            return Ok(());
        };
        if self.hidden || self.text.is_empty() {
            return Ok(());
        }

        let weight = match self.style {
            TooltipStyle::Help => cairo::FontWeight::Normal,
            _ => cairo::FontWeight::Bold,
        };
        cr.select_font_face("Sans", cairo::FontSlant::Normal, weight);
        cr.set_font_size(FONT_SIZE);
        let extents = cr.text_extents(&self.text)?;

        let size = (
            extents.width() + 2.0 * PADDING_X,
            FONT_SIZE + 2.0 * PADDING_Y,
        );
        self.drawn_size.set(Some(size));
        let (x, y) = self.placement(frame.to_pixel(position), size);

        let (background, foreground) = self.colors();
        rounded_rect(cr, x, y, size.0, size.1, CORNER_RADIUS);
        let (r, g, b, a) = background.components();
        cr.set_source_rgba(r, g, b, a);
        if self.style == TooltipStyle::Static {
            cr.fill_preserve()?;
            cr.set_source_rgb(1.0, 1.0, 1.0);
            cr.set_line_width(1.0);
            cr.stroke()?;
        } else {
            cr.fill()?;
        }

        let (r, g, b, a) = foreground.components();
        cr.set_source_rgba(r, g, b, a);
        cr.move_to(
            x + PADDING_X - extents.x_bearing(),
            y + PADDING_Y + FONT_SIZE * 0.8,
        );
        cr.show_text(&self.text)?;
        Ok(())
    }
}

fn rounded_rect(cr: &Context, x: f64, y: f64, width: f64, height: f64, radius: f64) {
    use std::f64::consts::{FRAC_PI_2, PI};

    cr.new_sub_path();
    cr.arc(x + width - radius, y + radius, radius, -FRAC_PI_2, 0.0);
    cr.arc(x + width - radius, y + height - radius, radius, 0.0, FRAC_PI_2);
    cr.arc(x + radius, y + height - radius, radius, FRAC_PI_2, PI);
    cr.arc(x + radius, y + radius, radius, PI, 3.0 * FRAC_PI_2);
    cr.close_path();
}
