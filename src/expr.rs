use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::colormap::{ColorRamp, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 1-based band reference.
    Band(usize),
    Const(f64),
    Sub(Box<Expr>, Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

pub fn band(index: usize) -> Expr {
    Expr::Band(index)
}

impl Expr {
    pub fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }

    pub fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }

    pub fn div(self, rhs: Expr) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs))
    }

    /// Evaluate against normalized band values; bands are 1-based and a
    /// missing band reads as NaN.
    pub fn evaluate(&self, bands: &[f64]) -> f64 {
        match self {
            Expr::Band(i) => i
                .checked_sub(1)
                .and_then(|i| bands.get(i))
                .copied()
                .unwrap_or(f64::NAN),
            Expr::Const(v) => *v,
            Expr::Sub(a, b) => a.evaluate(bands) - b.evaluate(bands),
            Expr::Add(a, b) => a.evaluate(bands) + b.evaluate(bands),
            Expr::Div(a, b) => a.evaluate(bands) / b.evaluate(bands),
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let binary = |op: &str, a: &Expr, b: &Expr, serializer: S| -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(3))?;
            seq.serialize_element(op)?;
            seq.serialize_element(a)?;
            seq.serialize_element(b)?;
            seq.end()
        };
        match self {
            Expr::Band(i) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("band")?;
                seq.serialize_element(i)?;
                seq.end()
            }
            Expr::Const(v) => serializer.serialize_f64(*v),
            Expr::Sub(a, b) => binary("-", a, b, serializer),
            Expr::Add(a, b) => binary("+", a, b, serializer),
            Expr::Div(a, b) => binary("/", a, b, serializer),
        }
    }
}

/// Band layout of the four-band reflectance source.
pub mod bands {
    use super::{band, Expr};

    pub fn blue() -> Expr {
        band(1)
    }

    pub fn green() -> Expr {
        band(2)
    }

    pub fn red() -> Expr {
        band(3)
    }

    pub fn nir() -> Expr {
        band(4)
    }
}

/// `(nir - red) / (nir + red)`
pub fn ndvi() -> Expr {
    bands::nir()
        .sub(bands::red())
        .div(bands::nir().add(bands::red()))
}

/// `(green - nir) / (green + nir)`
pub fn ndwi() -> Expr {
    bands::green()
        .sub(bands::nir())
        .div(bands::green().add(bands::nir()))
}

/// How a raster layer turns band values into a pixel color.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorStyle {
    /// Normalized bands used directly as red, green and blue.
    Rgb { red: Expr, green: Expr, blue: Expr },
    /// `["interpolate", ["linear"], input, v0, c0, v1, c1, ...]`
    Interpolate { input: Expr, ramp: ColorRamp },
}

impl ColorStyle {
    pub fn interpolate(input: Expr, ramp: ColorRamp) -> Self {
        ColorStyle::Interpolate { input, ramp }
    }

    /// Bands 1, 2 and 3 of a red, green, blue image.
    pub fn rgb() -> Self {
        ColorStyle::Rgb {
            red: band(1),
            green: band(2),
            blue: band(3),
        }
    }

    /// Pixel color, transparent when the expression is not a number.
    pub fn color(&self, bands: &[f64]) -> Rgba {
        match self {
            ColorStyle::Rgb { red, green, blue } => {
                let channel = |e: &Expr| e.evaluate(bands);
                let (r, g, b) = (channel(red), channel(green), channel(blue));
                if r.is_nan() || g.is_nan() || b.is_nan() {
                    return Rgba::TRANSPARENT;
                }
                let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                Rgba::opaque(to_u8(r), to_u8(g), to_u8(b))
            }
            ColorStyle::Interpolate { input, ramp } => {
                let value = input.evaluate(bands);
                if value.is_nan() {
                    Rgba::TRANSPARENT
                } else {
                    ramp.color_at(value)
                }
            }
        }
    }
}

impl Serialize for ColorStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColorStyle::Rgb { red, green, blue } => {
                let mut seq = serializer.serialize_seq(Some(5))?;
                seq.serialize_element("array")?;
                seq.serialize_element(red)?;
                seq.serialize_element(green)?;
                seq.serialize_element(blue)?;
                seq.serialize_element(&1)?;
                seq.end()
            }
            ColorStyle::Interpolate { input, ramp } => {
                let entries = ramp.flatten();
                let mut seq = serializer.serialize_seq(Some(3 + entries.len()))?;
                seq.serialize_element("interpolate")?;
                seq.serialize_element(&["linear"])?;
                seq.serialize_element(input)?;
                for entry in &entries {
                    seq.serialize_element(entry)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::build_ramp;

    #[test]
    fn ndvi_and_ndwi_evaluate() {
        let pixel = [0.1, 0.2, 0.3, 0.7];
        assert!((ndvi().evaluate(&pixel) - 0.4).abs() < 1e-12);
        assert!((ndwi().evaluate(&pixel) - (-0.5 / 0.9)).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_is_transparent() {
        let ramp = build_ramp("viridis", -1.0, 1.0, 10, true).unwrap();
        let style = ColorStyle::interpolate(ndwi(), ramp);
        assert_eq!(style.color(&[0.0, 0.0, 0.0, 0.0]), Rgba::TRANSPARENT);
    }

    #[test]
    fn missing_band_is_nan() {
        assert!(band(5).evaluate(&[1.0, 2.0]).is_nan());
        assert!(band(0).evaluate(&[1.0]).is_nan());
    }

    #[test]
    fn expression_serializes_to_nested_arrays() {
        let json = serde_json::to_string(&ndvi()).unwrap();
        assert_eq!(
            json,
            r#"["/",["-",["band",4],["band",3]],["+",["band",4],["band",3]]]"#
        );
    }

    #[test]
    fn interpolate_style_serializes_with_stops() {
        let ramp = build_ramp("greys", 0.0, 1.0, 2, false).unwrap();
        let value = serde_json::to_value(ColorStyle::interpolate(band(1), ramp)).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 3 + 4);
        assert_eq!(items[0], "interpolate");
        assert_eq!(items[1], serde_json::json!(["linear"]));
    }

    #[test]
    fn rgb_clamps_channels() {
        let color = ColorStyle::rgb().color(&[0.0, 0.5, 2.0]);
        assert_eq!(color, Rgba::opaque(0, 128, 255));
    }
}
