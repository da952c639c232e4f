use std::collections::HashMap;
use std::rc::Rc;

use geo::{Coord, Haversine, Length, LineString};
use proj4rs::Proj;
use tracing::{debug, trace};

use crate::error::{Error, Result};

pub const WGS84_CODE: &str = "EPSG:4326";
pub const WGS84_DEFINITION: &str = "+proj=longlat +datum=WGS84 +no_defs";
pub const UTM_34N_CODE: &str = "EPSG:32634";
pub const UTM_34N_DEFINITION: &str = "+proj=utm +zone=34 +datum=WGS84 +units=m +no_defs";

/// Meters per degree on the sphere used for geographic point resolutions.
const METERS_PER_DEGREE: f64 = 2.0 * std::f64::consts::PI * 6_370_997.0 / 360.0;

pub trait Projection {
    fn code(&self) -> &str;

    /// Projected map coordinate to longitude/latitude degrees.
    fn to_lon_lat(&self, coord: Coord<f64>) -> Coord<f64>;

    fn from_lon_lat(&self, lon_lat: Coord<f64>) -> Coord<f64>;

    /// Ground resolution (meters per pixel) at `point` for a view
    /// resolution expressed in projection units per pixel.
    fn point_resolution(&self, resolution: f64, point: Coord<f64>) -> f64;
}

/// A projection defined by a proj-string.
pub struct ProjDefinition {
    code: String,
    definition: String,
    proj: Proj,
    wgs84: Proj,
    latlong: bool,
}

impl ProjDefinition {
    pub fn new(code: impl Into<String>, definition: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let definition = definition.into();
        let parse = |text: &str| {
            Proj::from_proj_string(text).map_err(|err| Error::ProjDefinition {
                code: code.clone(),
                reason: format!("{err:?}"),
            })
        };
        let proj = parse(&definition)?;
        let wgs84 = parse(WGS84_DEFINITION)?;
        let latlong = definition
            .split_whitespace()
            .any(|token| token == "+proj=longlat" || token == "+proj=latlong");
        Ok(Self {
            code,
            definition,
            proj,
            wgs84,
            latlong,
        })
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    fn transform(&self, src: &Proj, dst: &Proj, coord: Coord<f64>) -> Coord<f64> {
        let mut point = (coord.x, coord.y, 0.0);
        match proj4rs::transform::transform(src, dst, &mut point) {
            Ok(()) => Coord {
                x: point.0,
                y: point.1,
            },
            Err(err) => {
                trace!(code = %self.code, ?err, "coordinate outside projection");
                Coord {
                    x: f64::NAN,
                    y: f64::NAN,
                }
            }
        }
    }
}

impl Projection for ProjDefinition {
    fn code(&self) -> &str {
        &self.code
    }

    fn to_lon_lat(&self, coord: Coord<f64>) -> Coord<f64> {
        let input = if self.latlong {
            Coord {
                x: coord.x.to_radians(),
                y: coord.y.to_radians(),
            }
        } else {
            coord
        };
        let radians = self.transform(&self.proj, &self.wgs84, input);
        Coord {
            x: radians.x.to_degrees(),
            y: radians.y.to_degrees(),
        }
    }

    fn from_lon_lat(&self, lon_lat: Coord<f64>) -> Coord<f64> {
        let radians = Coord {
            x: lon_lat.x.to_radians(),
            y: lon_lat.y.to_radians(),
        };
        let out = self.transform(&self.wgs84, &self.proj, radians);
        if self.latlong {
            Coord {
                x: out.x.to_degrees(),
                y: out.y.to_degrees(),
            }
        } else {
            out
        }
    }

    /// Degrees scale by a fixed factor; projected units measure a one-pixel
    /// cross around `point` on the sphere.
    fn point_resolution(&self, resolution: f64, point: Coord<f64>) -> f64 {
        if self.latlong {
            return resolution * METERS_PER_DEGREE;
        }
        let half = resolution / 2.0;
        let ground = |a: Coord<f64>, b: Coord<f64>| {
            LineString::new(vec![self.to_lon_lat(a), self.to_lon_lat(b)]).length::<Haversine>()
        };
        let width = ground(
            Coord { x: point.x - half, y: point.y },
            Coord { x: point.x + half, y: point.y },
        );
        let height = ground(
            Coord { x: point.x, y: point.y - half },
            Coord { x: point.x, y: point.y + half },
        );
        (width + height) / 2.0
    }
}

/// Lookup of projections by EPSG code.
pub struct ProjectionRegistry {
    projections: HashMap<String, Rc<dyn Projection>>,
}

impl ProjectionRegistry {
    /// Registry holding only EPSG:4326.
    pub fn new() -> Result<Self> {
        let mut registry = Self {
            projections: HashMap::new(),
        };
        registry.register(WGS84_CODE, WGS84_DEFINITION)?;
        Ok(registry)
    }

    /// Define `code` from a proj-string, replacing any earlier definition.
    pub fn register(&mut self, code: &str, definition: &str) -> Result<Rc<dyn Projection>> {
        let projection: Rc<dyn Projection> = Rc::new(ProjDefinition::new(code, definition)?);
        debug!(%code, %definition, "projection registered");
        self.projections
            .insert(code.to_string(), projection.clone());
        Ok(projection)
    }

    pub fn get(&self, code: &str) -> Result<Rc<dyn Projection>> {
        self.projections
            .get(code)
            .cloned()
            .ok_or_else(|| Error::UnknownProjection(code.to_string()))
    }

    /// Convert `coord` from one registered projection to another.
    pub fn transform(&self, coord: Coord<f64>, from: &str, to: &str) -> Result<Coord<f64>> {
        let from = self.get(from)?;
        let to = self.get(to)?;
        Ok(to.from_lon_lat(from.to_lon_lat(coord)))
    }
}
