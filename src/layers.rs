use std::{cell::RefCell, rc::Rc};

use cairo::{Context, ImageSurface};
use tracing::debug;

use crate::colormap::Rgba;
use crate::draw::SketchGeometry;
use crate::error::Result;
use crate::expr::ColorStyle;
use crate::geometry::{Extent, Frame};
use crate::measure::Feature;
use crate::raster::BandRaster;

pub trait Layer {
    fn draw(&self, cr: &Context, frame: &Frame) -> Result<()>;
}

/// Base layers are mutually exclusive; overlays toggle independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Base,
    Overlay,
}

pub struct LayerEntry {
    pub title: String,
    pub kind: LayerKind,
    pub visible: bool,
    pub opacity: f64,
    /// Whether the shared opacity control applies to this layer.
    pub follows_opacity: bool,
    z_index: usize,
    layer: Rc<RefCell<dyn Layer>>,
}

/// Layers in drawing order with layer-switcher semantics.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<LayerEntry>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(
        &mut self,
        title: impl Into<String>,
        kind: LayerKind,
        layer: Rc<RefCell<dyn Layer>>,
        z_index: usize,
    ) -> &mut LayerEntry {
        let visible = kind == LayerKind::Overlay
            || !self.layers.iter().any(|l| l.kind == LayerKind::Base && l.visible);
        self.layers.push(LayerEntry {
            title: title.into(),
            kind,
            visible,
            opacity: 1.0,
            follows_opacity: false,
            z_index,
            layer,
        });
        self.layers.sort_by_key(|entry| entry.z_index);
        let index = self
            .layers
            .iter()
            .rposition(|entry| entry.z_index == z_index)
            .unwrap_or(self.layers.len() - 1);
        &mut self.layers[index]
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.layers
    }

    pub fn get(&self, title: &str) -> Option<&LayerEntry> {
        self.layers.iter().find(|entry| entry.title == title)
    }

    /// Show the base layer `title` and hide every other base layer.
    pub fn select_base(&mut self, title: &str) -> bool {
        if !self
            .layers
            .iter()
            .any(|entry| entry.kind == LayerKind::Base && entry.title == title)
        {
            return false;
        }
        for entry in self.layers.iter_mut().filter(|e| e.kind == LayerKind::Base) {
            entry.visible = entry.title == title;
        }
        debug!(%title, "base layer selected");
        true
    }

    pub fn set_visible(&mut self, title: &str, visible: bool) -> bool {
        match self
            .layers
            .iter_mut()
            .find(|entry| entry.kind == LayerKind::Overlay && entry.title == title)
        {
            Some(entry) => {
                entry.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Apply the opacity control to every layer that follows it.
    pub fn set_shared_opacity(&mut self, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        for entry in self.layers.iter_mut().filter(|e| e.follows_opacity) {
            entry.opacity = opacity;
        }
    }

    pub fn draw(&self, cr: &Context, frame: &Frame) -> Result<()> {
        for entry in self.layers.iter().filter(|entry| entry.visible) {
            if entry.opacity >= 1.0 {
                entry.layer.borrow().draw(cr, frame)?;
                continue;
            }
            cr.push_group();
            entry.layer.borrow().draw(cr, frame)?;
            cr.pop_group_to_source()?;
            cr.paint_with_alpha(entry.opacity)?;
        }
        Ok(())
    }
}

/// Basemap backdrop with a fading metric grid.
pub struct BasemapLayer {
    background: Rgba,
    grid: Rgba,
    grid_thresholds: Vec<f64>,
}

impl BasemapLayer {
    pub fn new(background: Rgba, grid: Rgba) -> Self {
        let grid_thresholds = (1..8).map(|i| 10.0_f64.powi(i)).collect();
        Self {
            background,
            grid,
            grid_thresholds,
        }
    }

    /// Grid line opacity for a line spacing at the current resolution;
    /// lines fade out when they get too dense or too sparse.
    fn grid_alpha(resolution: f64, grid_threshold: f64) -> f64 {
        let x_factor = (resolution * 100.0 / grid_threshold).log2() * 0.4;
        1.0 - x_factor * x_factor
    }
}

impl Layer for BasemapLayer {
    fn draw(&self, cr: &Context, frame: &Frame) -> Result<()> {
        let (r, g, b, a) = self.background.components();
        cr.set_source_rgba(r, g, b, a);
        cr.paint()?;

        let rect = frame.extent;
        for grid_threshold in &self.grid_thresholds {
            let alpha = Self::grid_alpha(frame.resolution(), *grid_threshold);
            if alpha < 0.0 {
                continue;
            }

            let (r, g, b, _) = self.grid.components();
            cr.set_source_rgba(r, g, b, alpha * self.grid.a as f64);
            cr.set_line_width(1.0);

            let grid_start_x = (rect.min_x / grid_threshold).floor() * grid_threshold;
            let grid_end_x = (rect.max_x / grid_threshold).ceil() * grid_threshold;

            let mut x = grid_start_x;
            while x <= grid_end_x {
                let (ix, _) = frame.to_pixel(geo::Coord { x, y: rect.min_y });
                cr.move_to(ix, 0.0);
                cr.line_to(ix, frame.height);
                x += grid_threshold;
            }

            let grid_start_y = (rect.min_y / grid_threshold).floor() * grid_threshold;
            let grid_end_y = (rect.max_y / grid_threshold).ceil() * grid_threshold;

            let mut y = grid_start_y;
            while y <= grid_end_y {
                let (_, iy) = frame.to_pixel(geo::Coord { x: rect.min_x, y });
                cr.move_to(0.0, iy);
                cr.line_to(frame.width, iy);
                y += grid_threshold;
            }
            cr.stroke()?;
        }
        Ok(())
    }
}

/// Raster colorized once through a style and drawn scaled to the view.
pub struct RasterLayer {
    extent: Extent,
    image: ImageSurface,
}

impl RasterLayer {
    pub fn new(raster: &BandRaster, style: &ColorStyle) -> Result<Self> {
        Ok(Self {
            extent: raster.extent,
            image: raster.render(style)?,
        })
    }
}

impl Layer for RasterLayer {
    fn draw(&self, cr: &Context, frame: &Frame) -> Result<()> {
        if !self.extent.intersects(&frame.extent) {
            return Ok(());
        }
        let (x0, y0) = frame.to_pixel(geo::Coord {
            x: self.extent.min_x,
            y: self.extent.max_y,
        });
        let (x1, y1) = frame.to_pixel(geo::Coord {
            x: self.extent.max_x,
            y: self.extent.min_y,
        });

        cr.save()?;
        cr.translate(x0, y0);
        cr.scale(
            (x1 - x0) / self.image.width() as f64,
            (y1 - y0) / self.image.height() as f64,
        );
        cr.set_source_surface(&self.image, 0.0, 0.0)?;
        cr.source().set_filter(cairo::Filter::Nearest);
        cr.paint()?;
        cr.restore()?;
        Ok(())
    }
}

pub struct VectorStyle {
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f64,
    pub dash: Option<[f64; 2]>,
}

impl VectorStyle {
    /// Finished features.
    pub fn feature() -> Self {
        Self {
            fill: Rgba::new(255, 255, 255, 0.2),
            stroke: Rgba::opaque(255, 204, 51),
            stroke_width: 2.0,
            dash: None,
        }
    }

    /// The sketch being drawn.
    pub fn sketch() -> Self {
        Self {
            fill: Rgba::new(255, 255, 255, 0.2),
            stroke: Rgba::opaque(255, 240, 0),
            stroke_width: 2.0,
            dash: Some([10.0, 10.0]),
        }
    }

    pub fn draw_geometry(&self, cr: &Context, frame: &Frame, geometry: &SketchGeometry) -> Result<()> {
        let coords = geometry.coords();
        if coords.is_empty() {
            return Ok(());
        }

        cr.new_path();
        for (i, coord) in coords.iter().enumerate() {
            let (x, y) = frame.to_pixel(*coord);
            if i == 0 {
                cr.move_to(x, y);
            } else {
                cr.line_to(x, y);
            }
        }
        if let SketchGeometry::Polygon(_) = geometry {
            cr.close_path();
            let (r, g, b, a) = self.fill.components();
            cr.set_source_rgba(r, g, b, a);
            cr.fill_preserve()?;
        }

        let (r, g, b, a) = self.stroke.components();
        cr.set_source_rgba(r, g, b, a);
        cr.set_line_width(self.stroke_width);
        match self.dash {
            Some(dash) => cr.set_dash(&dash, 0.0),
            None => cr.set_dash(&[], 0.0),
        }
        cr.stroke()?;
        cr.set_dash(&[], 0.0);

        // pointer vertex of a sketch
        if let (Some(last), Some(_)) = (geometry.last_coordinate(), self.dash) {
            let (x, y) = frame.to_pixel(last);
            cr.arc(x, y, 5.0, 0.0, 2.0 * std::f64::consts::PI);
            cr.set_source_rgba(r, g, b, a);
            cr.fill()?;
        }
        Ok(())
    }
}

/// Finished measurement features.
pub struct VectorLayer {
    features: Vec<Feature>,
    style: VectorStyle,
}

impl Default for VectorLayer {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            style: VectorStyle::feature(),
        }
    }
}

impl VectorLayer {
    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }
}

impl Layer for VectorLayer {
    fn draw(&self, cr: &Context, frame: &Frame) -> Result<()> {
        for feature in &self.features {
            self.style.draw_geometry(cr, frame, &feature.geometry)?;
        }
        Ok(())
    }
}
