use std::rc::Rc;

use bandview::measure::{DrawType, MeasureState, MeasurementOverlay, START_MSG};
use bandview::projection::Projection;
use bandview::tooltip::TooltipStyle;
use geo::Coord;

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

fn overlay(draw_type: DrawType) -> MeasurementOverlay {
    let mut overlay = MeasurementOverlay::new(Rc::new(EquatorMeters), draw_type);
    overlay.arm();
    overlay
}

#[test]
fn every_finished_sketch_leaves_one_static_annotation() {
    let mut overlay = overlay(DrawType::Length);

    for round in 0..3 {
        let y = round as f64 * 500.0;
        overlay.click(c(0.0, y), 1.0);
        overlay.pointer_move(c(80.0, y), false);
        overlay.click(c(150.0, y), 1.0);
        let feature = overlay.click(c(150.0, y), 1.0).expect("closing click finishes");

        assert_eq!(overlay.state(), MeasureState::Finalized);
        assert_eq!(overlay.annotations().len(), round + 1);
        assert_eq!(overlay.listener_count(), 0);

        let annotation = overlay.annotations().last().unwrap();
        assert_eq!(annotation.style(), TooltipStyle::Static);
        assert_eq!(annotation.offset(), (0.0, -7.0));
        assert_eq!(annotation.text(), feature.label);

        let fresh = overlay.measure().unwrap();
        assert_eq!(fresh.style(), TooltipStyle::Measure);
        assert_eq!(fresh.text(), "");
    }
}

#[test]
fn polygon_area_switches_to_square_kilometers() {
    let mut overlay = overlay(DrawType::Area);
    overlay.click(c(0.0, 0.0), 5.0);
    overlay.click(c(1000.0, 0.0), 5.0);
    overlay.click(c(1000.0, 1000.0), 5.0);
    overlay.click(c(0.0, 1000.0), 5.0);

    let live = overlay.measure().unwrap().text().to_string();
    assert!(live.ends_with(" km²"), "{live}");

    let feature = overlay.click(c(1.0, 1.0), 5.0).expect("clicking the first vertex closes");
    assert!(feature.label.ends_with(" km²"));

    let anchor = overlay.annotations()[0].position().unwrap();
    assert!(anchor.x > 0.0 && anchor.x < 1000.0);
    assert!(anchor.y > 0.0 && anchor.y < 1000.0);
}

#[test]
fn small_polygon_stays_in_square_meters() {
    let mut overlay = overlay(DrawType::Area);
    overlay.click(c(0.0, 0.0), 1.0);
    overlay.click(c(50.0, 0.0), 1.0);
    overlay.click(c(50.0, 50.0), 1.0);
    let feature = overlay.finish().unwrap();
    assert!(feature.label.ends_with(" m²"), "{}", feature.label);
}

#[test]
fn switching_draw_type_discards_the_sketch() {
    let mut overlay = overlay(DrawType::Length);
    overlay.click(c(0.0, 0.0), 1.0);
    overlay.click(c(300.0, 0.0), 1.0);
    assert_eq!(overlay.listener_count(), 1);

    overlay.set_draw_type(DrawType::Area);
    assert_eq!(overlay.draw_type(), DrawType::Area);
    assert_eq!(overlay.state(), MeasureState::Idle);
    assert_eq!(overlay.listener_count(), 0);
    assert!(overlay.annotations().is_empty());
    assert!(overlay.sketch_geometry().is_none());

    overlay.pointer_move(c(10.0, 10.0), false);
    assert_eq!(overlay.help().unwrap().text(), START_MSG);
}

#[test]
fn finish_needs_enough_vertices() {
    let mut overlay = overlay(DrawType::Area);
    overlay.click(c(0.0, 0.0), 1.0);
    overlay.click(c(100.0, 0.0), 1.0);
    assert!(overlay.finish().is_none());
    assert_eq!(overlay.state(), MeasureState::Drawing);
}

#[test]
fn unarmed_overlay_ignores_input() {
    let mut overlay = MeasurementOverlay::new(Rc::new(EquatorMeters), DrawType::Length);
    assert!(overlay.click(c(0.0, 0.0), 1.0).is_none());
    overlay.pointer_move(c(1.0, 1.0), false);
    assert!(overlay.help().is_none());
    assert!(overlay.measure().is_none());
}
