use geo::Coord;

/// Axis-aligned box in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_center(center: Coord<f64>, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coord<f64> {
        Coord {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// One rendered viewport: the map extent shown on a pixel area.
///
/// Pixel rows grow downwards while map y grows northwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub extent: Extent,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(extent: Extent, width: f64, height: f64) -> Self {
        Self {
            extent,
            width,
            height,
        }
    }

    /// Map units per pixel.
    pub fn resolution(&self) -> f64 {
        self.extent.width() / self.width
    }

    pub fn to_pixel(&self, coord: Coord<f64>) -> (f64, f64) {
        let x = (coord.x - self.extent.min_x) / self.extent.width() * self.width;
        let y = (self.extent.max_y - coord.y) / self.extent.height() * self.height;
        (x, y)
    }

    pub fn to_map(&self, x: f64, y: f64) -> Coord<f64> {
        Coord {
            x: self.extent.min_x + x / self.width * self.extent.width(),
            y: self.extent.max_y - y / self.height * self.extent.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_and_map_coordinates_agree() {
        let frame = Frame::new(Extent::new(0.0, 0.0, 200.0, 100.0), 400.0, 200.0);
        assert_eq!(frame.resolution(), 0.5);
        assert_eq!(frame.to_pixel(Coord { x: 0.0, y: 100.0 }), (0.0, 0.0));
        assert_eq!(frame.to_pixel(Coord { x: 200.0, y: 0.0 }), (400.0, 200.0));
        assert_eq!(frame.to_map(100.0, 50.0), Coord { x: 50.0, y: 75.0 });
    }

    #[test]
    fn extent_intersection() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Extent::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&Extent::new(11.0, 0.0, 15.0, 10.0)));
    }
}
