use std::{cell::RefCell, path::Path, rc::Rc};

use cairo::{Context, Format, ImageSurface};
use geo::Coord;
use tracing::{debug, info, warn};

use crate::config::MapConfig;
use crate::controls::{format_coordinate, ScaleLine};
use crate::error::Result;
use crate::export::{write_pdf, ExportRequest, PrintLayout};
use crate::expr::ColorStyle;
use crate::geometry::{Extent, Frame};
use crate::layers::{BasemapLayer, LayerKind, LayerStack, RasterLayer, VectorLayer, VectorStyle};
use crate::measure::{DrawType, MeasurementOverlay};
use crate::projection::{Projection, ProjectionRegistry};
use crate::raster::{DemoScene, DemoTrueColor, RasterSource};
use crate::view::View;

/// Snapping distance for closing a sketch, in pixels.
const SNAP_TOLERANCE_PX: f64 = 12.0;
const SCALE_LINE_MIN_WIDTH: f64 = 125.0;
pub const MEASUREMENTS_TITLE: &str = "Measurements";

pub struct MapModel {
    view: View,
    size: (f64, f64),
    projection: Rc<dyn Projection>,
    display_projection: Rc<dyn Projection>,
    coordinate_decimals: usize,
    layers: LayerStack,
    vector: Rc<RefCell<VectorLayer>>,
    measurement: MeasurementOverlay,
    scale_line: ScaleLine,
}

impl MapModel {
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        let mut registry = ProjectionRegistry::new()?;
        for projection in &config.projections {
            registry.register(&projection.code, &projection.definition)?;
        }
        let projection = registry.get(&config.view.projection)?;
        let display_projection = registry.get(&config.view.display_projection)?;

        let [x, y] = config.view.center;
        let view = View::new(Coord { x, y }, config.view.zoom);

        let mut layers = LayerStack::new();
        let mut z_index = 0;
        for basemap in &config.basemaps {
            debug!(title = %basemap.title, url = %basemap.url, "basemap");
            let layer = BasemapLayer::new(basemap.background(), basemap.grid());
            layers.add_layer(&basemap.title, LayerKind::Base, Rc::new(RefCell::new(layer)), z_index);
            z_index += 1;
        }
        if let Some(top) = config.basemaps.last() {
            layers.select_base(&top.title);
        }

        let [min_x, min_y, max_x, max_y] = config.scene.extent;
        let scene = DemoScene::new(
            Extent::new(min_x, min_y, max_x, max_y),
            config.scene.width,
            config.scene.height,
            config.reflectance.iter().map(|band| band.max).collect(),
        );
        let raster = scene.read()?;

        for index in &config.indices {
            let layer = RasterLayer::new(&raster, &index.style()?)?;
            let entry = layers.add_layer(&index.title, LayerKind::Overlay, Rc::new(RefCell::new(layer)), z_index);
            entry.visible = false;
            entry.follows_opacity = true;
            z_index += 1;
        }

        debug!(url = %config.true_color.url, "true color source");
        let rgb = DemoTrueColor::new(scene, config.true_color.max).read()?;
        let true_color = RasterLayer::new(&rgb, &ColorStyle::rgb())?;
        layers
            .add_layer("True Color", LayerKind::Overlay, Rc::new(RefCell::new(true_color)), z_index)
            .follows_opacity = true;
        z_index += 1;

        let vector = Rc::new(RefCell::new(VectorLayer::default()));
        layers.add_layer(MEASUREMENTS_TITLE, LayerKind::Overlay, vector.clone(), z_index);
        layers.set_shared_opacity(config.opacity);

        let mut measurement = MeasurementOverlay::new(projection.clone(), config.draw_type);
        measurement.arm();

        info!(
            projection = projection.code(),
            layers = layers.entries().len(),
            "map ready"
        );

        Ok(Self {
            view,
            size: (800.0, 600.0),
            projection,
            display_projection,
            coordinate_decimals: config.view.coordinate_decimals,
            layers,
            vector,
            measurement,
            scale_line: ScaleLine::new(SCALE_LINE_MIN_WIDTH),
        })
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn measurement(&self) -> &MeasurementOverlay {
        &self.measurement
    }

    pub fn vector(&self) -> Rc<RefCell<VectorLayer>> {
        self.vector.clone()
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = (width, height);
    }

    pub fn frame(&self) -> Frame {
        self.view.frame(self.size.0, self.size.1)
    }

    /// Pointer position in the display projection.
    pub fn coordinate_text(&self, x: f64, y: f64) -> String {
        let coord = self.frame().to_map(x, y);
        let display = if self.display_projection.code() == self.projection.code() {
            coord
        } else {
            self.display_projection
                .from_lon_lat(self.projection.to_lon_lat(coord))
        };
        format_coordinate(display, self.coordinate_decimals)
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, dragging: bool) {
        let coord = self.frame().to_map(x, y);
        self.measurement.pointer_move(coord, dragging);
    }

    pub fn pointer_leave(&mut self) {
        self.measurement.pointer_leave();
    }

    pub fn click(&mut self, x: f64, y: f64) {
        let frame = self.frame();
        let blocked = self
            .measurement
            .annotations()
            .iter()
            .any(|tooltip| tooltip.stops_events() && tooltip.contains(&frame, (x, y)));
        if blocked {
            debug!(x, y, "click on annotation");
            return;
        }
        let tolerance = SNAP_TOLERANCE_PX * frame.resolution();
        if let Some(feature) = self.measurement.click(frame.to_map(x, y), tolerance) {
            self.vector.borrow_mut().add_feature(feature);
        }
    }

    pub fn finish_sketch(&mut self) {
        if let Some(feature) = self.measurement.finish() {
            self.vector.borrow_mut().add_feature(feature);
        }
    }

    pub fn abort_sketch(&mut self) {
        self.measurement.abort();
    }

    pub fn undo_vertex(&mut self) {
        self.measurement.undo();
    }

    pub fn set_draw_type(&mut self, draw_type: DrawType) {
        self.measurement.set_draw_type(draw_type);
    }

    /// Drop every finished measurement and its annotation.
    pub fn clear_measurements(&mut self) {
        self.vector.borrow_mut().clear();
        self.measurement.reset();
    }

    pub fn render(&self, cr: &Context, frame: &Frame) -> Result<()> {
        self.layers.draw(cr, frame)?;

        if let Some(sketch) = self.measurement.sketch_geometry() {
            VectorStyle::sketch().draw_geometry(cr, frame, &sketch)?;
        }
        for annotation in self.measurement.annotations() {
            annotation.draw(cr, frame)?;
        }
        if let Some(measure) = self.measurement.measure() {
            measure.draw(cr, frame)?;
        }
        if let Some(help) = self.measurement.help() {
            help.draw(cr, frame)?;
        }

        let point_resolution = self
            .projection
            .point_resolution(frame.resolution(), frame.extent.center());
        self.scale_line.draw(cr, frame, point_resolution)
    }

    /// Render the map at the requested paper size, resolution and scale into
    /// a PDF, then put the view back the way it was.
    pub fn export_pdf(&mut self, path: &Path, request: ExportRequest) -> Result<PrintLayout> {
        let layout = PrintLayout::new(&request, self.projection.as_ref(), self.view.center())?;
        info!(
            paper = %request.paper,
            dpi = request.dpi,
            scale = request.scale,
            width = layout.width,
            height = layout.height,
            "exporting map"
        );

        let view_resolution = self.view.resolution();
        self.scale_line.set_dpi(Some(request.dpi));
        self.view.set_resolution(layout.resolution);

        let result = self.render_page(path, &request, &layout);

        self.scale_line.set_dpi(None);
        self.view.set_resolution(view_resolution);
        if let Err(err) = &result {
            warn!(%err, "export failed");
        }
        result.map(|()| layout)
    }

    fn render_page(&self, path: &Path, request: &ExportRequest, layout: &PrintLayout) -> Result<()> {
        let image = ImageSurface::create(Format::ARgb32, layout.width as i32, layout.height as i32)?;
        {
            let cr = Context::new(&image)?;
            let frame = self.view.frame(layout.width as f64, layout.height as f64);
            self.render(&cr, &frame)?;
        }
        write_pdf(path, request.paper, &image)
    }
}
