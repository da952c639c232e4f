use cairo::{Format, ImageSurface};
use serde::{Deserialize, Serialize};

use crate::colormap::Rgba;
use crate::error::{Error, Result};
use crate::expr::ColorStyle;
use crate::geometry::Extent;

/// One remote band: where it lives and the value mapped to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBand {
    pub url: String,
    pub max: f64,
}

/// Band values of a raster covering `extent`, row-major from the north-west
/// corner, one `Vec` per band.
#[derive(Debug, Clone)]
pub struct BandRaster {
    pub width: usize,
    pub height: usize,
    pub extent: Extent,
    pub bands: Vec<Vec<f32>>,
    pub max: Vec<f64>,
    pub nodata: Option<f32>,
}

impl BandRaster {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Normalized band values of one pixel, `None` for nodata pixels.
    pub fn pixel(&self, col: usize, row: usize, out: &mut Vec<f64>) -> Option<()> {
        let index = row * self.width + col;
        out.clear();
        for (band, max) in self.bands.iter().zip(&self.max) {
            let value = band[index];
            if Some(value) == self.nodata {
                return None;
            }
            out.push(value as f64 / max);
        }
        Some(())
    }

    /// Apply `style` to every pixel; transparent where the style yields no color.
    pub fn colorize(&self, style: &ColorStyle) -> Vec<Rgba> {
        let mut values = Vec::with_capacity(self.band_count());
        let mut colors = Vec::with_capacity(self.width * self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let color = match self.pixel(col, row, &mut values) {
                    Some(()) => style.color(&values),
                    None => Rgba::TRANSPARENT,
                };
                colors.push(color);
            }
        }
        colors
    }

    /// Colorized raster as a premultiplied ARGB32 surface.
    pub fn render(&self, style: &ColorStyle) -> Result<ImageSurface> {
        let colors = self.colorize(style);
        let mut surface = ImageSurface::create(Format::ARgb32, self.width as i32, self.height as i32)?;
        let stride = surface.stride() as usize;
        {
            let mut data = surface.data()?;
            for (i, color) in colors.iter().enumerate() {
                let (row, col) = (i / self.width, i % self.width);
                let offset = row * stride + col * 4;
                data[offset..offset + 4].copy_from_slice(&premultiplied_argb(color).to_ne_bytes());
            }
        }
        surface.mark_dirty();
        Ok(surface)
    }
}

fn premultiplied_argb(color: &Rgba) -> u32 {
    let alpha = color.a.clamp(0.0, 1.0);
    let premultiply = |c: u8| (c as f32 * alpha).round() as u32;
    let a = (alpha * 255.0).round() as u32;
    (a << 24) | (premultiply(color.r) << 16) | (premultiply(color.g) << 8) | premultiply(color.b)
}

pub trait RasterSource {
    fn read(&self) -> Result<BandRaster>;
}

/// Deterministic blue / green / red / near-infrared reflectances with
/// vegetated land crossed by a river and a lake, standing in for remote
/// imagery when nothing is fetched.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub extent: Extent,
    pub width: usize,
    pub height: usize,
    pub max: Vec<f64>,
}

impl DemoScene {
    pub fn new(extent: Extent, width: usize, height: usize, max: Vec<f64>) -> Self {
        Self {
            extent,
            width,
            height,
            max,
        }
    }

    fn is_water(u: f64, v: f64) -> bool {
        let river = (v - 0.5 - 0.12 * (6.0 * u).sin()).abs() < 0.03;
        let lake = (u - 0.25).hypot(v - 0.25) < 0.08;
        river || lake
    }

    /// Reflectance of blue, green, red and near-infrared at a pixel.
    fn reflectance(u: f64, v: f64) -> [f32; 4] {
        if Self::is_water(u, v) {
            return [600.0, 500.0, 300.0, 100.0];
        }
        let vegetation = 0.5 + 0.5 * (9.0 * u).sin() * (7.0 * v).cos();
        [
            300.0,
            (350.0 + 50.0 * vegetation) as f32,
            (400.0 - 250.0 * vegetation) as f32,
            (300.0 + 500.0 * vegetation) as f32,
        ]
    }
}

impl RasterSource for DemoScene {
    fn read(&self) -> Result<BandRaster> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidParameter {
                name: "scene size",
                value: format!("{}x{}", self.width, self.height),
                reason: "scene must have pixels".to_string(),
            });
        }
        if self.max.len() != 4 {
            return Err(Error::InvalidParameter {
                name: "band max",
                value: format!("{:?}", self.max),
                reason: "the scene has four bands".to_string(),
            });
        }

        let mut bands = vec![Vec::with_capacity(self.width * self.height); 4];
        for row in 0..self.height {
            for col in 0..self.width {
                let u = (col as f64 + 0.5) / self.width as f64;
                let v = (row as f64 + 0.5) / self.height as f64;
                for (band, value) in bands.iter_mut().zip(Self::reflectance(u, v)) {
                    band.push(value);
                }
            }
        }

        Ok(BandRaster {
            width: self.width,
            height: self.height,
            extent: self.extent,
            bands,
            max: self.max.clone(),
            nodata: Some(0.0),
        })
    }
}

/// Eight-bit red, green, blue rendition of a [`DemoScene`], laid out like a
/// true color image product.
#[derive(Debug, Clone)]
pub struct DemoTrueColor {
    pub scene: DemoScene,
    /// Value of a fully saturated channel.
    pub max: f64,
}

impl DemoTrueColor {
    pub fn new(scene: DemoScene, max: f64) -> Self {
        Self { scene, max }
    }
}

impl RasterSource for DemoTrueColor {
    fn read(&self) -> Result<BandRaster> {
        if !(self.max >= 1.0) {
            return Err(Error::InvalidParameter {
                name: "true color max",
                value: self.max.to_string(),
                reason: "channels need at least one level".to_string(),
            });
        }
        let reflectance = self.scene.read()?;
        let channel = |index: usize| {
            let max = reflectance.max[index];
            reflectance.bands[index]
                .iter()
                .map(|v| ((*v as f64 / max).clamp(0.0, 1.0) * self.max).round().max(1.0) as f32)
                .collect::<Vec<_>>()
        };

        Ok(BandRaster {
            width: reflectance.width,
            height: reflectance.height,
            extent: reflectance.extent,
            bands: vec![channel(2), channel(1), channel(0)],
            max: vec![self.max; 3],
            nodata: Some(0.0),
        })
    }
}
