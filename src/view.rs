use geo::Coord;

use crate::geometry::{Extent, Frame};

/// Resolution of zoom level 0: the equator on one 256 px tile.
pub const MAX_RESOLUTION: f64 = 2.0 * std::f64::consts::PI * 6_378_137.0 / 256.0;

/// Map view: center and resolution easing towards their goals on every
/// `update`, so panning and zooming animate smoothly.
#[derive(Debug, Clone)]
pub struct View {
    center: Coord<f64>,
    center_goal: Coord<f64>,
    resolution: f64,
    resolution_goal: f64,
    zoom_level: f64,
    move_smooth_factor: f64,
    zoom_smooth_factor: f64,
}

impl View {
    pub fn new(center: Coord<f64>, zoom_level: f64) -> Self {
        let resolution = resolution_for_zoom(zoom_level);
        Self {
            center,
            center_goal: center,
            resolution,
            resolution_goal: resolution,
            zoom_level,
            move_smooth_factor: 0.5,
            zoom_smooth_factor: 0.5,
        }
    }

    pub fn center(&self) -> Coord<f64> {
        self.center
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    /// Zoom by `d_zoom_level` scroll steps; positive zooms out.
    pub fn zoom(&mut self, d_zoom_level: f64) {
        self.zoom_level = (self.zoom_level - d_zoom_level * 0.25).clamp(0.0, 24.0);
        self.resolution_goal = resolution_for_zoom(self.zoom_level);
    }

    /// Pan by a pointer drag of `dx`, `dy` pixels.
    pub fn move_focus(&mut self, dx: f64, dy: f64) {
        self.center_goal.x -= dx * self.resolution;
        self.center_goal.y += dy * self.resolution;
    }

    /// Jump to `resolution` without easing.
    pub fn set_resolution(&mut self, resolution: f64) {
        self.resolution = resolution;
        self.resolution_goal = resolution;
        self.zoom_level = (MAX_RESOLUTION / resolution).log2();
    }

    /// Advance the easing; returns whether anything is still moving.
    pub fn update(&mut self) -> bool {
        let before = (self.center, self.resolution);

        self.center.x = self.center.x * (1.0 - self.move_smooth_factor)
            + self.center_goal.x * self.move_smooth_factor;
        self.center.y = self.center.y * (1.0 - self.move_smooth_factor)
            + self.center_goal.y * self.move_smooth_factor;
        self.resolution = self.resolution * (1.0 - self.zoom_smooth_factor)
            + self.resolution_goal * self.zoom_smooth_factor;

        let moved = (self.center.x - before.0.x).abs() + (self.center.y - before.0.y).abs();
        moved > self.resolution * 1e-3 || (self.resolution - before.1).abs() > self.resolution * 1e-4
    }

    pub fn frame(&self, width: f64, height: f64) -> Frame {
        let extent = Extent::from_center(
            self.center,
            width / 2.0 * self.resolution,
            height / 2.0 * self.resolution,
        );
        Frame::new(extent, width, height)
    }
}

pub fn resolution_for_zoom(zoom_level: f64) -> f64 {
    MAX_RESOLUTION / 2.0_f64.powf(zoom_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_centered() {
        let view = View::new(Coord { x: 100.0, y: 200.0 }, 10.0);
        let frame = view.frame(800.0, 600.0);
        assert!((frame.extent.center().x - 100.0).abs() < 1e-9);
        assert!((frame.resolution() - resolution_for_zoom(10.0)).abs() < 1e-9);
    }

    #[test]
    fn zoom_eases_towards_goal() {
        let mut view = View::new(Coord { x: 0.0, y: 0.0 }, 10.0);
        view.zoom(-4.0);
        assert!(view.update());
        for _ in 0..60 {
            view.update();
        }
        assert!((view.resolution() - resolution_for_zoom(11.0)).abs() < 1e-6);
        assert!(!view.update());
    }

    #[test]
    fn set_resolution_is_immediate() {
        let mut view = View::new(Coord { x: 0.0, y: 0.0 }, 3.0);
        view.set_resolution(resolution_for_zoom(5.0));
        assert!((view.zoom_level() - 5.0).abs() < 1e-9);
        assert!(!view.update());
    }

    #[test]
    fn drag_moves_center_against_pointer() {
        let mut view = View::new(Coord { x: 0.0, y: 0.0 }, 0.0);
        view.move_focus(10.0, 10.0);
        for _ in 0..60 {
            view.update();
        }
        assert!(view.center().x < 0.0);
        assert!(view.center().y > 0.0);
    }
}
