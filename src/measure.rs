//! Draw-and-measure tool: a help tooltip follows the pointer, a live
//! tooltip tracks the length or area of the sketch being drawn, and every
//! finished sketch keeps its measurement as a static annotation.

use std::rc::Rc;

use geo::{Coord, InteriorPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::draw::{Draw, DrawEvent, SketchGeometry, SketchId, SketchKind};
use crate::format::{format_area, format_length};
use crate::projection::Projection;
use crate::sphere;
use crate::tooltip::Tooltip;

pub const START_MSG: &str = "Click to start drawing";
pub const CONTINUE_POLYGON_MSG: &str = "Click to continue drawing the polygon";
pub const CONTINUE_LINE_MSG: &str = "Click to continue drawing the line";

/// Measurement selected in the draw-type control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawType {
    #[default]
    Length,
    Area,
}

impl DrawType {
    pub const ALL: [DrawType; 2] = [DrawType::Length, DrawType::Area];

    pub fn sketch_kind(self) -> SketchKind {
        match self {
            DrawType::Length => SketchKind::Line,
            DrawType::Area => SketchKind::Polygon,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrawType::Length => "Length (LineString)",
            DrawType::Area => "Area (Polygon)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureState {
    Idle,
    Drawing,
    Finalized,
}

/// Subscription of the controller to one sketch's geometry changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerKey(u64);

#[derive(Debug)]
struct ActiveSketch {
    id: SketchId,
    kind: SketchKind,
    listener: ListenerKey,
}

/// A finished sketch with its measurement text.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: SketchGeometry,
    pub label: String,
}

/// Measurement text and tooltip anchor for a sketch geometry.
pub fn measure(geometry: &SketchGeometry, projection: &dyn Projection) -> (String, Option<Coord<f64>>) {
    match geometry {
        SketchGeometry::Polygon(polygon) => {
            let text = format_area(sphere::area(polygon, projection));
            let anchor = polygon
                .interior_point()
                .map(|p| p.0)
                .or_else(|| geometry.last_coordinate());
            (text, anchor)
        }
        SketchGeometry::Line(line) => {
            let text = format_length(sphere::length(line, projection));
            (text, geometry.last_coordinate())
        }
    }
}

pub struct MeasurementOverlay {
    projection: Rc<dyn Projection>,
    draw_type: DrawType,
    interaction: Option<Draw>,
    help: Option<Tooltip>,
    measure: Option<Tooltip>,
    annotations: Vec<Tooltip>,
    sketch: Option<ActiveSketch>,
    listeners: Vec<ListenerKey>,
    next_listener: u64,
    state: MeasureState,
}

impl MeasurementOverlay {
    pub fn new(projection: Rc<dyn Projection>, draw_type: DrawType) -> Self {
        Self {
            projection,
            draw_type,
            interaction: None,
            help: None,
            measure: None,
            annotations: Vec::new(),
            sketch: None,
            listeners: Vec::new(),
            next_listener: 0,
            state: MeasureState::Idle,
        }
    }

    pub fn state(&self) -> MeasureState {
        self.state
    }

    pub fn draw_type(&self) -> DrawType {
        self.draw_type
    }

    pub fn is_armed(&self) -> bool {
        self.interaction.is_some()
    }

    pub fn help(&self) -> Option<&Tooltip> {
        self.help.as_ref()
    }

    pub fn measure(&self) -> Option<&Tooltip> {
        self.measure.as_ref()
    }

    pub fn annotations(&self) -> &[Tooltip] {
        &self.annotations
    }

    /// Number of live geometry-change subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// In-progress sketch with its floating vertex.
    pub fn sketch_geometry(&self) -> Option<SketchGeometry> {
        self.interaction.as_ref().and_then(Draw::geometry)
    }

    /// Install the drawing interaction with fresh help and measure tooltips.
    pub fn arm(&mut self) {
        let kind = self.draw_type.sketch_kind();
        self.interaction = Some(Draw::new(kind));
        self.measure = Some(Tooltip::measure());
        self.help = Some(Tooltip::help());
        self.state = MeasureState::Idle;
        info!(draw_type = ?self.draw_type, "measurement armed");
    }

    /// Remove the interaction, dropping any unfinished sketch along with the
    /// live tooltips. Finished annotations stay.
    pub fn disarm(&mut self) {
        if let Some(mut draw) = self.interaction.take() {
            if let Some(event) = draw.abort() {
                self.apply(event);
            }
        }
        self.help = None;
        self.measure = None;
        self.state = MeasureState::Idle;
        debug!("measurement disarmed");
    }

    /// Forget every annotation and start over with the current draw type.
    pub fn reset(&mut self) {
        self.disarm();
        self.annotations.clear();
        self.arm();
    }

    pub fn set_draw_type(&mut self, draw_type: DrawType) {
        self.disarm();
        self.draw_type = draw_type;
        self.arm();
    }

    pub fn pointer_move(&mut self, coord: Coord<f64>, dragging: bool) {
        if dragging {
            return;
        }

        let message = match self.sketch.as_ref().map(|s| s.kind) {
            None => START_MSG,
            Some(SketchKind::Polygon) => CONTINUE_POLYGON_MSG,
            Some(SketchKind::Line) => CONTINUE_LINE_MSG,
        };
        if let Some(help) = self.help.as_mut() {
            help.set_text(message);
            help.set_position(coord);
            help.show();
        }

        let event = self
            .interaction
            .as_mut()
            .and_then(|draw| draw.pointer_move(coord));
        if let Some(event) = event {
            self.apply(event);
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(help) = self.help.as_mut() {
            help.hide();
        }
    }

    /// Place a vertex; `tolerance` is the snapping distance in map units.
    /// Returns the feature when the click closed the sketch.
    pub fn click(&mut self, coord: Coord<f64>, tolerance: f64) -> Option<Feature> {
        let events = self.interaction.as_mut()?.click(coord, tolerance);
        self.apply_all(events)
    }

    /// Finish gesture (double click, Enter).
    pub fn finish(&mut self) -> Option<Feature> {
        let event = self.interaction.as_mut()?.finish()?;
        self.apply(event)
    }

    /// Escape: throw away the sketch being drawn.
    pub fn abort(&mut self) {
        if let Some(event) = self.interaction.as_mut().and_then(Draw::abort) {
            self.apply(event);
        }
    }

    /// Backspace: remove the last placed vertex.
    pub fn undo(&mut self) {
        if let Some(event) = self.interaction.as_mut().and_then(Draw::undo) {
            self.apply(event);
        }
    }

    fn apply_all(&mut self, events: Vec<DrawEvent>) -> Option<Feature> {
        let mut finished = None;
        for event in events {
            if let Some(feature) = self.apply(event) {
                finished = Some(feature);
            }
        }
        finished
    }

    fn apply(&mut self, event: DrawEvent) -> Option<Feature> {
        match event {
            DrawEvent::Start { sketch, coordinate } => {
                self.on_draw_start(sketch, coordinate);
                None
            }
            DrawEvent::Change { sketch, geometry } => {
                self.on_change(sketch, &geometry);
                None
            }
            DrawEvent::End { sketch, geometry } => self.on_draw_end(sketch, geometry),
            DrawEvent::Abort { sketch } => {
                self.on_abort(sketch);
                None
            }
        }
    }

    fn subscribe(&mut self) -> ListenerKey {
        let key = ListenerKey(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(key);
        key
    }

    fn unsubscribe(&mut self, key: ListenerKey) {
        self.listeners.retain(|k| *k != key);
    }

    fn is_listening(&self, sketch: SketchId) -> bool {
        self.sketch
            .as_ref()
            .is_some_and(|s| s.id == sketch && self.listeners.contains(&s.listener))
    }

    fn on_draw_start(&mut self, sketch: SketchId, coordinate: Coord<f64>) {
        let kind = self.draw_type.sketch_kind();
        let listener = self.subscribe();
        self.sketch = Some(ActiveSketch {
            id: sketch,
            kind,
            listener,
        });
        self.state = MeasureState::Drawing;
        debug!(?sketch, x = coordinate.x, y = coordinate.y, "sketch started");
    }

    fn on_change(&mut self, sketch: SketchId, geometry: &SketchGeometry) {
        if !self.is_listening(sketch) {
            trace!(?sketch, "change on unsubscribed sketch");
            return;
        }
        let (text, anchor) = measure(geometry, self.projection.as_ref());
        if let Some(tooltip) = self.measure.as_mut() {
            tooltip.set_text(text);
            if let Some(anchor) = anchor {
                tooltip.set_position(anchor);
            }
        }
    }

    fn on_draw_end(&mut self, sketch: SketchId, geometry: SketchGeometry) -> Option<Feature> {
        if !self.is_listening(sketch) {
            return None;
        }
        self.on_change(sketch, &geometry);

        let mut tooltip = self.measure.take().unwrap_or_else(Tooltip::measure);
        tooltip.freeze();
        let label = tooltip.text().to_string();
        self.annotations.push(tooltip);

        if let Some(active) = self.sketch.take() {
            self.unsubscribe(active.listener);
        }
        self.measure = Some(Tooltip::measure());
        self.state = MeasureState::Finalized;
        info!(?sketch, %label, "sketch finished");

        Some(Feature { geometry, label })
    }

    fn on_abort(&mut self, sketch: SketchId) {
        if let Some(active) = self.sketch.take() {
            if active.id != sketch {
                self.sketch = Some(active);
                return;
            }
            self.unsubscribe(active.listener);
        }
        if self.measure.is_some() {
            self.measure = Some(Tooltip::measure());
        }
        self.state = MeasureState::Idle;
        debug!(?sketch, "sketch discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltip::TooltipStyle;

    /// Meters along the equator, so lengths come out exact.
    struct EquatorMeters;

    const METERS_PER_DEGREE: f64 = std::f64::consts::PI * 6_371_008.8 / 180.0;

    impl Projection for EquatorMeters {
        fn code(&self) -> &str {
            "TEST:meters"
        }

        fn to_lon_lat(&self, coord: Coord<f64>) -> Coord<f64> {
            Coord {
                x: coord.x / METERS_PER_DEGREE,
                y: coord.y / METERS_PER_DEGREE,
            }
        }

        fn from_lon_lat(&self, lon_lat: Coord<f64>) -> Coord<f64> {
            Coord {
                x: lon_lat.x * METERS_PER_DEGREE,
                y: lon_lat.y * METERS_PER_DEGREE,
            }
        }

        fn point_resolution(&self, resolution: f64, _point: Coord<f64>) -> f64 {
            resolution
        }
    }

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn armed(draw_type: DrawType) -> MeasurementOverlay {
        let mut overlay = MeasurementOverlay::new(Rc::new(EquatorMeters), draw_type);
        overlay.arm();
        overlay
    }

    #[test]
    fn help_text_follows_sketch_kind() {
        let mut overlay = armed(DrawType::Area);
        assert!(overlay.help().unwrap().is_hidden());

        overlay.pointer_move(c(0.0, 0.0), false);
        assert_eq!(overlay.help().unwrap().text(), START_MSG);
        assert!(!overlay.help().unwrap().is_hidden());

        overlay.click(c(0.0, 0.0), 1.0);
        overlay.pointer_move(c(10.0, 0.0), false);
        assert_eq!(overlay.help().unwrap().text(), CONTINUE_POLYGON_MSG);
        assert_eq!(overlay.help().unwrap().position(), Some(c(10.0, 0.0)));

        overlay.set_draw_type(DrawType::Length);
        overlay.click(c(0.0, 0.0), 1.0);
        overlay.pointer_move(c(5.0, 0.0), false);
        assert_eq!(overlay.help().unwrap().text(), CONTINUE_LINE_MSG);
    }

    #[test]
    fn dragging_and_leaving_the_map() {
        let mut overlay = armed(DrawType::Length);
        overlay.pointer_move(c(3.0, 3.0), true);
        assert!(overlay.help().unwrap().is_hidden());
        overlay.pointer_move(c(3.0, 3.0), false);
        overlay.pointer_leave();
        assert!(overlay.help().unwrap().is_hidden());
        overlay.pointer_move(c(4.0, 3.0), false);
        assert!(!overlay.help().unwrap().is_hidden());
    }

    #[test]
    fn line_tooltip_tracks_last_vertex() {
        let mut overlay = armed(DrawType::Length);
        overlay.click(c(0.0, 0.0), 1.0);
        assert_eq!(overlay.state(), MeasureState::Drawing);
        overlay.pointer_move(c(50.0, 0.0), false);

        let measure = overlay.measure().unwrap();
        assert_eq!(measure.text(), "50 m");
        assert_eq!(measure.position(), Some(c(50.0, 0.0)));

        overlay.click(c(2000.0, 0.0), 1.0);
        let measure = overlay.measure().unwrap();
        assert_eq!(measure.text(), "2 km");
        assert_eq!(measure.position(), Some(c(2000.0, 0.0)));
    }

    #[test]
    fn polygon_tooltip_sits_inside() {
        let mut overlay = armed(DrawType::Area);
        overlay.click(c(0.0, 0.0), 1.0);
        overlay.click(c(1000.0, 0.0), 1.0);
        overlay.click(c(1000.0, 1000.0), 1.0);
        overlay.pointer_move(c(0.0, 1000.0), false);

        let measure = overlay.measure().unwrap();
        assert!(measure.text().ends_with(" km²"), "{}", measure.text());
        let anchor = measure.position().unwrap();
        assert!(anchor.x > 0.0 && anchor.x < 1000.0);
        assert!(anchor.y > 0.0 && anchor.y < 1000.0);
    }

    #[test]
    fn finishing_leaves_one_static_and_one_fresh_tooltip() {
        let mut overlay = armed(DrawType::Length);
        for round in 1..=3 {
            overlay.click(c(0.0, 0.0), 1.0);
            overlay.click(c(1500.0, 0.0), 1.0);
            let feature = overlay.finish().expect("line has two vertices");
            assert_eq!(feature.label, "1.5 km");

            assert_eq!(overlay.state(), MeasureState::Finalized);
            assert_eq!(overlay.annotations().len(), round);
            assert!(overlay
                .annotations()
                .iter()
                .all(|t| t.style() == TooltipStyle::Static));
            let fresh = overlay.measure().unwrap();
            assert_eq!(fresh.style(), TooltipStyle::Measure);
            assert_eq!(fresh.text(), "");
            assert_eq!(fresh.position(), None);
            assert_eq!(overlay.listener_count(), 0);
        }
    }

    #[test]
    fn clicks_while_drawing_extend_the_same_sketch() {
        let mut overlay = armed(DrawType::Length);
        overlay.click(c(0.0, 0.0), 1.0);
        overlay.click(c(100.0, 0.0), 1.0);
        overlay.click(c(200.0, 0.0), 1.0);
        assert_eq!(overlay.listener_count(), 1);
        assert_eq!(overlay.sketch_geometry().unwrap().coords().len(), 4);
    }

    #[test]
    fn switching_draw_type_discards_sketch() {
        let mut overlay = armed(DrawType::Length);
        overlay.click(c(0.0, 0.0), 1.0);
        overlay.click(c(500.0, 0.0), 1.0);
        assert!(!overlay.measure().unwrap().text().is_empty());

        overlay.set_draw_type(DrawType::Area);
        assert_eq!(overlay.state(), MeasureState::Idle);
        assert_eq!(overlay.listener_count(), 0);
        assert!(overlay.sketch_geometry().is_none());
        assert!(overlay.annotations().is_empty());
        assert_eq!(overlay.measure().unwrap().text(), "");
        assert_eq!(overlay.draw_type(), DrawType::Area);
    }

    #[test]
    fn abort_and_undo() {
        let mut overlay = armed(DrawType::Length);
        overlay.click(c(0.0, 0.0), 1.0);
        overlay.click(c(500.0, 0.0), 1.0);
        overlay.undo();
        assert_eq!(overlay.state(), MeasureState::Drawing);
        overlay.abort();
        assert_eq!(overlay.state(), MeasureState::Idle);
        assert_eq!(overlay.listener_count(), 0);
        assert_eq!(overlay.measure().unwrap().text(), "");
        assert!(overlay.finish().is_none());
    }

    #[test]
    fn disarm_keeps_annotations_reset_clears_them() {
        let mut overlay = armed(DrawType::Length);
        overlay.click(c(0.0, 0.0), 1.0);
        overlay.click(c(50.0, 0.0), 1.0);
        overlay.finish();

        overlay.disarm();
        assert!(!overlay.is_armed());
        assert!(overlay.help().is_none());
        assert!(overlay.measure().is_none());
        assert_eq!(overlay.annotations().len(), 1);
        assert!(overlay.click(c(0.0, 0.0), 1.0).is_none());

        overlay.reset();
        assert!(overlay.is_armed());
        assert!(overlay.annotations().is_empty());
    }
}
