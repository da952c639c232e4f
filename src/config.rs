use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::colormap::{build_ramp, Rgba};
use crate::error::Result;
use crate::export::PaperSize;
use crate::expr::{ndvi, ndwi, ColorStyle, Expr};
use crate::measure::DrawType;
use crate::projection::{UTM_34N_CODE, UTM_34N_DEFINITION};
use crate::raster::SourceBand;

const SCENE_BASE_URL: &str = "https://sentinel-cogs.s3.us-west-2.amazonaws.com/sentinel-s2-l2a-cogs/34/T/CT/2019/8/S2B_34TCT_20190831_0_L2A";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub projections: Vec<ProjectionConfig>,
    pub view: ViewConfig,
    pub basemaps: Vec<BasemapConfig>,
    pub scene: SceneConfig,
    pub reflectance: Vec<SourceBand>,
    pub true_color: SourceBand,
    pub indices: Vec<IndexLayerConfig>,
    pub opacity: f64,
    pub draw_type: DrawType,
    pub export: ExportConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        let band = |name: &str| SourceBand {
            url: format!("{SCENE_BASE_URL}/{name}.tif"),
            max: 1000.0,
        };
        Self {
            projections: vec![ProjectionConfig {
                code: UTM_34N_CODE.to_string(),
                definition: UTM_34N_DEFINITION.to_string(),
            }],
            view: ViewConfig::default(),
            basemaps: vec![
                BasemapConfig {
                    title: "Stamen Toner Dark".to_string(),
                    url: "https://stamen-tiles.a.ssl.fastly.net/toner/{z}/{x}/{y}.png".to_string(),
                    background: [30, 30, 30],
                    grid: [90, 90, 90],
                },
                BasemapConfig {
                    title: "OpenStreetMap".to_string(),
                    url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
                    background: [242, 239, 233],
                    grid: [170, 211, 223],
                },
            ],
            scene: SceneConfig::default(),
            reflectance: vec![band("B02"), band("B03"), band("B04"), band("B08")],
            true_color: SourceBand {
                url: format!("{SCENE_BASE_URL}/TCI.tif"),
                max: 255.0,
            },
            indices: vec![
                IndexLayerConfig {
                    title: "NDVI".to_string(),
                    index: SpectralIndex::Ndvi,
                    palette: "chlorophyll".to_string(),
                    min: -0.2,
                    max: 1.0,
                    steps: 10,
                    reverse: true,
                },
                IndexLayerConfig {
                    title: "NDWI".to_string(),
                    index: SpectralIndex::Ndwi,
                    palette: "viridis".to_string(),
                    min: -1.0,
                    max: 1.0,
                    steps: 10,
                    reverse: true,
                },
            ],
            opacity: 1.0,
            draw_type: DrawType::Length,
            export: ExportConfig::default(),
        }
    }
}

impl MapConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// A projection registered from its proj-string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub code: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// In `projection` units.
    pub center: [f64; 2],
    pub zoom: f64,
    pub projection: String,
    /// Projection of the pointer coordinate readout.
    pub display_projection: String,
    pub coordinate_decimals: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: [354_900.0, 5_245_140.0],
            zoom: 10.0,
            projection: UTM_34N_CODE.to_string(),
            display_projection: UTM_34N_CODE.to_string(),
            coordinate_decimals: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasemapConfig {
    pub title: String,
    pub url: String,
    pub background: [u8; 3],
    pub grid: [u8; 3],
}

impl BasemapConfig {
    pub fn background(&self) -> Rgba {
        let [r, g, b] = self.background;
        Rgba::opaque(r, g, b)
    }

    pub fn grid(&self) -> Rgba {
        let [r, g, b] = self.grid;
        Rgba::new(r, g, b, 0.8)
    }
}

/// Footprint of the imagery in view projection units and the raster size it
/// is sampled at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub extent: [f64; 4],
    pub width: usize,
    pub height: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            extent: [300_000.0, 5_190_240.0, 409_800.0, 5_300_040.0],
            width: 512,
            height: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralIndex {
    Ndvi,
    Ndwi,
}

impl SpectralIndex {
    pub fn expr(self) -> Expr {
        match self {
            SpectralIndex::Ndvi => ndvi(),
            SpectralIndex::Ndwi => ndwi(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexLayerConfig {
    pub title: String,
    pub index: SpectralIndex,
    pub palette: String,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
    pub reverse: bool,
}

impl IndexLayerConfig {
    pub fn style(&self) -> Result<ColorStyle> {
        let ramp = build_ramp(&self.palette, self.min, self.max, self.steps, self.reverse)?;
        Ok(ColorStyle::interpolate(self.index.expr(), ramp))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: PaperSize,
    pub dpi: f64,
    pub scale: f64,
    pub resolutions: Vec<f64>,
    pub scales: Vec<f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: PaperSize::A4,
            dpi: 150.0,
            scale: 250_000.0,
            resolutions: vec![72.0, 150.0, 300.0],
            scales: vec![500_000.0, 250_000.0, 100_000.0, 50_000.0, 25_000.0, 10_000.0],
        }
    }
}
