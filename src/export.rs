use std::fmt;
use std::path::Path;
use std::str::FromStr;

use cairo::{Context, ImageSurface, PdfSurface};
use geo::Coord;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::projection::Projection;

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
}

impl PaperSize {
    pub const ALL: [PaperSize; 6] = [
        PaperSize::A0,
        PaperSize::A1,
        PaperSize::A2,
        PaperSize::A3,
        PaperSize::A4,
        PaperSize::A5,
    ];

    /// Landscape width and height in millimeters.
    pub fn dimensions_mm(self) -> [f64; 2] {
        match self {
            PaperSize::A0 => [1189.0, 841.0],
            PaperSize::A1 => [841.0, 594.0],
            PaperSize::A2 => [594.0, 420.0],
            PaperSize::A3 => [420.0, 297.0],
            PaperSize::A4 => [297.0, 210.0],
            PaperSize::A5 => [210.0, 148.0],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A0 => "a0",
            PaperSize::A1 => "a1",
            PaperSize::A2 => "a2",
            PaperSize::A3 => "a3",
            PaperSize::A4 => "a4",
            PaperSize::A5 => "a5",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PaperSize::ALL
            .into_iter()
            .find(|paper| paper.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownPaperSize(s.to_string()))
    }
}

/// `round(mm * dpi / 25.4)` for both page dimensions.
pub fn page_pixels(paper: PaperSize, dpi: f64) -> (u32, u32) {
    let [width, height] = paper.dimensions_mm();
    let to_pixels = |mm: f64| (mm * dpi / MM_PER_INCH).round() as u32;
    (to_pixels(width), to_pixels(height))
}

/// View resolution for printing at `1 : scale` with `dpi`.
pub fn scale_resolution(scale: f64, dpi: f64, projection: &dyn Projection, center: Coord<f64>) -> f64 {
    scale / projection.point_resolution(dpi / MM_PER_INCH, center)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRequest {
    pub paper: PaperSize,
    pub dpi: f64,
    pub scale: f64,
}

impl ExportRequest {
    pub fn validate(&self) -> Result<()> {
        if !(self.dpi > 0.0) {
            return Err(Error::InvalidParameter {
                name: "dpi",
                value: self.dpi.to_string(),
                reason: "resolution must be positive".to_string(),
            });
        }
        if !(self.scale > 0.0) {
            return Err(Error::InvalidParameter {
                name: "scale",
                value: self.scale.to_string(),
                reason: "scale denominator must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Page pixel size and the view resolution to render it at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintLayout {
    pub width: u32,
    pub height: u32,
    pub resolution: f64,
}

impl PrintLayout {
    pub fn new(request: &ExportRequest, projection: &dyn Projection, center: Coord<f64>) -> Result<Self> {
        request.validate()?;
        let (width, height) = page_pixels(request.paper, request.dpi);
        Ok(Self {
            width,
            height,
            resolution: scale_resolution(request.scale, request.dpi, projection, center),
        })
    }
}

/// Place `image` over a whole landscape page of `paper` and write it to `path`.
pub fn write_pdf(path: &Path, paper: PaperSize, image: &ImageSurface) -> Result<()> {
    let [width_mm, height_mm] = paper.dimensions_mm();
    let width_pt = width_mm / MM_PER_INCH * POINTS_PER_INCH;
    let height_pt = height_mm / MM_PER_INCH * POINTS_PER_INCH;

    let surface = PdfSurface::new(width_pt, height_pt, path)?;
    {
        let cr = Context::new(&surface)?;
        cr.scale(
            width_pt / image.width() as f64,
            height_pt / image.height() as f64,
        );
        cr.set_source_surface(image, 0.0, 0.0)?;
        cr.paint()?;
        cr.show_page()?;
    }
    surface.finish();
    info!(path = %path.display(), %paper, "pdf written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{
        ProjDefinition, UTM_34N_CODE, UTM_34N_DEFINITION, WGS84_CODE, WGS84_DEFINITION,
    };

    #[test]
    fn a4_at_150_dpi() {
        assert_eq!(page_pixels(PaperSize::A4, 150.0), (1754, 1240));
        assert_eq!(page_pixels(PaperSize::A0, 72.0), (3370, 2384));
    }

    #[test]
    fn paper_names_parse() {
        assert_eq!("A3".parse::<PaperSize>().unwrap(), PaperSize::A3);
        assert!(matches!(
            "letter".parse::<PaperSize>(),
            Err(Error::UnknownPaperSize(_))
        ));
    }

    #[test]
    fn scale_resolution_on_central_meridian() {
        let utm = ProjDefinition::new(UTM_34N_CODE, UTM_34N_DEFINITION).unwrap();
        let center = Coord { x: 500_000.0, y: 0.0 };
        let resolution = scale_resolution(254_000.0, 254.0, &utm, center);
        assert!((resolution - 25_400.0).abs() < 254.0, "{resolution}");
    }

    #[test]
    fn layout_rejects_bad_request() {
        let request = ExportRequest {
            paper: PaperSize::A4,
            dpi: 0.0,
            scale: 1000.0,
        };
        let wgs84 = ProjDefinition::new(WGS84_CODE, WGS84_DEFINITION).unwrap();
        assert!(PrintLayout::new(&request, &wgs84, Coord { x: 0.0, y: 0.0 }).is_err());
    }
}
