use bandview::config::MapConfig;
use bandview::export::{ExportRequest, PaperSize};
use bandview::layers::LayerKind;
use bandview::map::{MapModel, MEASUREMENTS_TITLE};
use bandview::measure::DrawType;

fn small_config() -> MapConfig {
    let mut config = MapConfig::default();
    config.scene.width = 16;
    config.scene.height = 16;
    config
}

fn map() -> MapModel {
    let mut map = MapModel::from_config(&small_config()).unwrap();
    map.set_size(800.0, 600.0);
    map
}

#[test]
fn layer_switcher_starts_with_one_base_layer() {
    let map = map();
    let layers = map.layers();
    let visible_bases = layers
        .entries()
        .iter()
        .filter(|e| e.kind == LayerKind::Base && e.visible)
        .count();
    assert_eq!(visible_bases, 1);
    assert!(layers.get("OpenStreetMap").unwrap().visible);
    assert!(!layers.get("NDVI").unwrap().visible);
    assert!(layers.get("True Color").unwrap().visible);
    assert!(layers.get(MEASUREMENTS_TITLE).unwrap().visible);
}

#[test]
fn finished_measurements_land_in_the_vector_layer() {
    let mut map = map();
    map.click(400.0, 300.0);
    map.pointer_move(500.0, 300.0, false);
    map.click(600.0, 300.0);
    map.click(603.0, 301.0);

    assert_eq!(map.vector().borrow().features().len(), 1);
    assert_eq!(map.measurement().annotations().len(), 1);

    map.set_draw_type(DrawType::Area);
    assert_eq!(map.measurement().annotations().len(), 1);

    map.clear_measurements();
    assert!(map.vector().borrow().features().is_empty());
    assert!(map.measurement().annotations().is_empty());
}

#[test]
fn clicks_on_a_finished_annotation_do_not_start_a_sketch() {
    let mut map = map();
    map.click(400.0, 300.0);
    map.pointer_move(500.0, 300.0, false);
    map.click(600.0, 300.0);
    map.click(603.0, 301.0);
    assert!(map.measurement().sketch_geometry().is_none());

    let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 800, 600).unwrap();
    let cr = cairo::Context::new(&surface).unwrap();
    map.render(&cr, &map.frame()).unwrap();

    // just above the last vertex, inside the annotation bubble
    map.click(601.0, 283.0);
    assert!(map.measurement().sketch_geometry().is_none());

    map.click(200.0, 200.0);
    assert!(map.measurement().sketch_geometry().is_some());
}

#[test]
fn coordinate_readout_is_in_view_projection() {
    let map = map();
    assert_eq!(map.coordinate_text(400.0, 300.0), "354900.0000, 5245140.0000");
}

#[test]
fn export_writes_pdf_and_restores_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("map.pdf");
    let mut map = map();
    let resolution = map.view().resolution();

    let layout = map
        .export_pdf(
            &path,
            ExportRequest {
                paper: PaperSize::A5,
                dpi: 72.0,
                scale: 250_000.0,
            },
        )
        .unwrap();

    assert_eq!((layout.width, layout.height), (595, 420));
    assert_eq!(map.view().resolution(), resolution);
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn export_rejects_zero_dpi() {
    let dir = tempfile::tempdir().unwrap();
    let mut map = map();
    let request = ExportRequest {
        paper: PaperSize::A4,
        dpi: 0.0,
        scale: 10_000.0,
    };
    assert!(map.export_pdf(&dir.path().join("x.pdf"), request).is_err());
}
