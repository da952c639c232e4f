use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use gtk4::{
    gdk,
    glib::{self, idle_add_local_once, timeout_add_local, ControlFlow, ExitCode, Propagation},
    prelude::*,
    Application, ApplicationWindow, Button, CheckButton, DrawingArea, DropDown,
    EventControllerKey, EventControllerMotion, EventControllerScroll, EventControllerScrollFlags,
    GestureClick, GestureDrag, Label, Orientation, Scale,
};
use tracing::{error, info, warn};

use crate::config::MapConfig;
use crate::controls::format_opacity;
use crate::export::{ExportRequest, PaperSize};
use crate::layers::LayerKind;
use crate::map::MapModel;
use crate::measure::DrawType;

/// Pointer travel, in pixels, after which a press counts as a drag.
const DRAG_THRESHOLD: f64 = 3.0;

pub struct Visualizer {
    app: Application,
    window_width: i32,
    window_height: i32,
    config: MapConfig,
    map: Rc<RefCell<MapModel>>,
    export_path: PathBuf,
}

impl Visualizer {
    pub fn new(config: MapConfig, map: MapModel, window_width: i32, window_height: i32) -> Self {
        let app = Application::builder()
            .application_id("dev.bandview.visualizer")
            .build();
        Self {
            app,
            window_width,
            window_height,
            config,
            map: Rc::new(RefCell::new(map)),
            export_path: PathBuf::from("map.pdf"),
        }
    }

    pub fn set_export_path(&mut self, path: PathBuf) {
        self.export_path = path;
    }

    pub fn run(self) -> ExitCode {
        let Self {
            app,
            window_width,
            window_height,
            config,
            map,
            export_path,
        } = self;

        app.connect_activate(move |app| {
            let window = ApplicationWindow::builder()
                .application(app)
                .default_width(window_width)
                .default_height(window_height)
                .title("bandview")
                .build();

            let drawing_area = DrawingArea::new();
            drawing_area.set_hexpand(true);
            drawing_area.set_vexpand(true);

            let coordinate_label = Label::new(Some(""));
            coordinate_label.set_xalign(0.0);

            drawing_area.set_draw_func({
                let map = Rc::clone(&map);
                move |_, cr, width, height| {
                    let mut map = map.borrow_mut();
                    map.set_size(width as f64, height as f64);
                    map.view_mut().update();
                    let frame = map.frame();
                    if let Err(err) = map.render(cr, &frame) {
                        warn!(%err, "render failed");
                    }
                }
            });

            let dragging = Rc::new(Cell::new(false));
            // set when the press that is being released moved the map
            let dragged = Rc::new(Cell::new(false));
            let gesture_drag = GestureDrag::new();
            let last_position = Rc::new(RefCell::new(None));
            gesture_drag.connect_drag_begin({
                let dragged = Rc::clone(&dragged);
                move |_, _, _| dragged.set(false)
            });
            gesture_drag.connect_drag_update({
                let map = Rc::clone(&map);
                let last_position = Rc::clone(&last_position);
                let dragging = Rc::clone(&dragging);
                move |_, x, y| {
                    if x.hypot(y) > DRAG_THRESHOLD {
                        dragging.set(true);
                    }
                    let mut last_position = last_position.borrow_mut();
                    let (dx, dy) = match *last_position {
                        Some((last_x, last_y)) => (x - last_x, y - last_y),
                        None => (0.0, 0.0),
                    };
                    *last_position = Some((x, y));
                    map.borrow_mut().view_mut().move_focus(dx, dy);
                }
            });

            gesture_drag.connect_drag_end({
                let last_position = Rc::clone(&last_position);
                let dragging = Rc::clone(&dragging);
                let dragged = Rc::clone(&dragged);
                move |_, _, _| {
                    *last_position.borrow_mut() = None;
                    dragged.set(dragging.replace(false));
                }
            });

            let gesture_click = GestureClick::new();
            gesture_click.connect_released({
                let map = Rc::clone(&map);
                let dragging = Rc::clone(&dragging);
                let dragged = Rc::clone(&dragged);
                move |_, n_press, x, y| {
                    if dragging.get() || dragged.replace(false) {
                        return;
                    }
                    let mut map = map.borrow_mut();
                    if n_press >= 2 {
                        map.finish_sketch();
                    } else {
                        map.click(x, y);
                    }
                }
            });

            let motion = EventControllerMotion::new();
            motion.connect_motion({
                let map = Rc::clone(&map);
                let dragging = Rc::clone(&dragging);
                let coordinate_label = coordinate_label.clone();
                move |_, x, y| {
                    let mut map = map.borrow_mut();
                    map.pointer_move(x, y, dragging.get());
                    coordinate_label.set_text(&map.coordinate_text(x, y));
                }
            });
            motion.connect_leave({
                let map = Rc::clone(&map);
                let coordinate_label = coordinate_label.clone();
                move |_| {
                    map.borrow_mut().pointer_leave();
                    coordinate_label.set_text("");
                }
            });

            let event_controller_scroll =
                EventControllerScroll::new(EventControllerScrollFlags::VERTICAL);
            event_controller_scroll.connect_scroll({
                let map = Rc::clone(&map);
                move |_, _, dy| {
                    map.borrow_mut().view_mut().zoom(dy);
                    Propagation::Stop
                }
            });

            drawing_area.add_controller(gesture_drag);
            drawing_area.add_controller(gesture_click);
            drawing_area.add_controller(motion);
            drawing_area.add_controller(event_controller_scroll);

            let keys = EventControllerKey::new();
            keys.connect_key_pressed({
                let map = Rc::clone(&map);
                move |_, key, _, _| {
                    let mut map = map.borrow_mut();
                    match key {
                        gdk::Key::Escape => map.abort_sketch(),
                        gdk::Key::BackSpace => map.undo_vertex(),
                        gdk::Key::Return | gdk::Key::KP_Enter => map.finish_sketch(),
                        _ => return Propagation::Proceed,
                    }
                    Propagation::Stop
                }
            });
            window.add_controller(keys);

            let panel = build_panel(&config, &map, &export_path, coordinate_label);
            let content = gtk4::Box::new(Orientation::Horizontal, 0);
            content.append(&drawing_area);
            content.append(&panel);
            window.set_child(Some(&content));

            window.present();

            let tick = move || {
                drawing_area.queue_draw();
                ControlFlow::Continue
            };
            timeout_add_local(Duration::from_millis(1000 / 40), tick);
        });

        info!("starting window");
        app.run_with_args(&["bandview"])
    }
}

fn section(title: &str) -> Label {
    let label = Label::new(None);
    label.set_markup(&format!("<b>{}</b>", glib::markup_escape_text(title)));
    label.set_xalign(0.0);
    label
}

fn build_panel(
    config: &MapConfig,
    map: &Rc<RefCell<MapModel>>,
    export_path: &Path,
    coordinate_label: Label,
) -> gtk4::Box {
    let panel = gtk4::Box::new(Orientation::Vertical, 6);
    panel.set_margin_top(8);
    panel.set_margin_bottom(8);
    panel.set_margin_start(8);
    panel.set_margin_end(8);
    panel.set_width_request(240);

    // layer switcher
    panel.append(&section("Basemap"));
    let base_titles = config
        .basemaps
        .iter()
        .map(|basemap| basemap.title.as_str())
        .collect::<Vec<_>>();
    let basemap_select = DropDown::from_strings(&base_titles);
    if let Some(visible) = map
        .borrow()
        .layers()
        .entries()
        .iter()
        .filter(|e| e.kind == LayerKind::Base)
        .position(|e| e.visible)
    {
        basemap_select.set_selected(visible as u32);
    }
    basemap_select.connect_selected_notify({
        let map = Rc::clone(map);
        let titles = base_titles.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        move |select| {
            if let Some(title) = titles.get(select.selected() as usize) {
                map.borrow_mut().layers_mut().select_base(title);
            }
        }
    });
    panel.append(&basemap_select);

    panel.append(&section("Layers"));
    let overlays = map
        .borrow()
        .layers()
        .entries()
        .iter()
        .filter(|e| e.kind == LayerKind::Overlay)
        .map(|e| (e.title.clone(), e.visible))
        .collect::<Vec<_>>();
    for (title, visible) in overlays.into_iter().rev() {
        let toggle = CheckButton::with_label(&title);
        toggle.set_active(visible);
        toggle.connect_toggled({
            let map = Rc::clone(map);
            move |toggle| {
                map.borrow_mut()
                    .layers_mut()
                    .set_visible(&title, toggle.is_active());
            }
        });
        panel.append(&toggle);
    }

    panel.append(&section("Opacity"));
    let opacity_output = Label::new(Some(format_opacity(config.opacity).as_str()));
    let opacity_input = Scale::with_range(Orientation::Horizontal, 0.0, 1.0, 0.01);
    opacity_input.set_value(config.opacity);
    opacity_input.connect_value_changed({
        let map = Rc::clone(map);
        let opacity_output = opacity_output.clone();
        move |input| {
            let opacity = input.value();
            map.borrow_mut().layers_mut().set_shared_opacity(opacity);
            opacity_output.set_text(&format_opacity(opacity));
        }
    });
    panel.append(&opacity_input);
    panel.append(&opacity_output);

    panel.append(&section("Measure"));
    let type_labels = DrawType::ALL.map(DrawType::label);
    let type_select = DropDown::from_strings(&type_labels);
    let current = DrawType::ALL
        .iter()
        .position(|t| *t == config.draw_type)
        .unwrap_or(0);
    type_select.set_selected(current as u32);
    type_select.connect_selected_notify({
        let map = Rc::clone(map);
        move |select| {
            if let Some(draw_type) = DrawType::ALL.get(select.selected() as usize) {
                map.borrow_mut().set_draw_type(*draw_type);
            }
        }
    });
    panel.append(&type_select);

    let clear = Button::with_label("Clear measurements");
    clear.connect_clicked({
        let map = Rc::clone(map);
        move |_| map.borrow_mut().clear_measurements()
    });
    panel.append(&clear);

    panel.append(&section("Export"));
    let paper_names = PaperSize::ALL.map(PaperSize::name);
    let format_select = DropDown::from_strings(&paper_names);
    let paper_index = PaperSize::ALL
        .iter()
        .position(|p| *p == config.export.format)
        .unwrap_or(0);
    format_select.set_selected(paper_index as u32);

    let dpi_labels = config
        .export
        .resolutions
        .iter()
        .map(|dpi| format!("{dpi} dpi"))
        .collect::<Vec<_>>();
    let dpi_select = DropDown::from_strings(&dpi_labels.iter().map(String::as_str).collect::<Vec<_>>());
    if let Some(i) = config.export.resolutions.iter().position(|d| *d == config.export.dpi) {
        dpi_select.set_selected(i as u32);
    }

    let scale_labels = config
        .export
        .scales
        .iter()
        .map(|scale| format!("1:{scale}"))
        .collect::<Vec<_>>();
    let scale_select =
        DropDown::from_strings(&scale_labels.iter().map(String::as_str).collect::<Vec<_>>());
    if let Some(i) = config.export.scales.iter().position(|s| *s == config.export.scale) {
        scale_select.set_selected(i as u32);
    }

    let export_button = Button::with_label("Export PDF");
    export_button.connect_clicked({
        let map = Rc::clone(map);
        let export_path = export_path.to_path_buf();
        let resolutions = config.export.resolutions.clone();
        let scales = config.export.scales.clone();
        let format_select = format_select.clone();
        let dpi_select = dpi_select.clone();
        let scale_select = scale_select.clone();
        move |button| {
            let paper = PaperSize::ALL
                .get(format_select.selected() as usize)
                .copied()
                .unwrap_or(PaperSize::A4);
            let (Some(dpi), Some(scale)) = (
                resolutions.get(dpi_select.selected() as usize).copied(),
                scales.get(scale_select.selected() as usize).copied(),
            ) else {
                return;
            };

            button.set_sensitive(false);
            button.set_cursor_from_name(Some("progress"));

            let map = Rc::clone(&map);
            let export_path = export_path.clone();
            let button = button.clone();
            idle_add_local_once(move || {
                let request = ExportRequest { paper, dpi, scale };
                match map.borrow_mut().export_pdf(&export_path, request) {
                    Ok(layout) => info!(
                        path = %export_path.display(),
                        width = layout.width,
                        height = layout.height,
                        "export complete"
                    ),
                    Err(err) => error!(%err, "export failed"),
                }
                button.set_sensitive(true);
                button.set_cursor_from_name(None);
            });
        }
    });
    panel.append(&format_select);
    panel.append(&dpi_select);
    panel.append(&scale_select);
    panel.append(&export_button);

    panel.append(&section("Position"));
    panel.append(&coordinate_label);

    panel
}
