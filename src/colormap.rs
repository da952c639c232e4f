use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    /// Channels as cairo source components in `0.0..=1.0`.
    pub fn components(&self) -> (f64, f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64,
        )
    }

    fn lerp(&self, other: &Rgba, ratio: f64) -> Rgba {
        let channel = |c1: u8, c2: u8| (c1 as f64 + ratio * (c2 as f64 - c1 as f64)).round() as u8;
        Rgba {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
            a: self.a + ratio as f32 * (other.a - self.a),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Palette anchors: position in `[0, 1]` and the rgb at that position.
type Anchors = &'static [(f64, [u8; 3])];

const VIRIDIS: Anchors = &[
    (0.0, [68, 1, 84]),
    (0.13, [71, 44, 122]),
    (0.25, [59, 81, 139]),
    (0.38, [44, 113, 142]),
    (0.5, [33, 144, 141]),
    (0.63, [39, 173, 129]),
    (0.75, [92, 200, 99]),
    (0.88, [170, 220, 50]),
    (1.0, [253, 231, 37]),
];

const CHLOROPHYLL: Anchors = &[
    (0.0, [18, 36, 20]),
    (0.25, [25, 63, 41]),
    (0.5, [24, 91, 59]),
    (0.75, [13, 119, 72]),
    (1.0, [18, 148, 80]),
];

const JET: Anchors = &[
    (0.0, [0, 0, 131]),
    (0.125, [0, 60, 170]),
    (0.375, [5, 255, 255]),
    (0.625, [255, 255, 0]),
    (0.875, [250, 0, 0]),
    (1.0, [128, 0, 0]),
];

const GREYS: Anchors = &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])];

const BLUERED: Anchors = &[(0.0, [0, 0, 255]), (1.0, [255, 0, 0])];

pub const PALETTE_NAMES: &[&str] = &["viridis", "chlorophyll", "jet", "greys", "bluered"];

fn anchors(name: &str) -> Option<Anchors> {
    match name {
        "viridis" => Some(VIRIDIS),
        "chlorophyll" => Some(CHLOROPHYLL),
        "jet" => Some(JET),
        "greys" => Some(GREYS),
        "bluered" => Some(BLUERED),
        _ => None,
    }
}

/// Generate `count` evenly spread opaque shades of the named palette.
///
/// Shade `i` samples the piecewise-linear palette curve at `i / (count - 1)`,
/// so the first and last shades are exactly the end anchors.
pub fn generate_palette(name: &str, count: usize) -> Result<Vec<Rgba>> {
    let anchors = anchors(name).ok_or_else(|| Error::UnknownPalette(name.to_string()))?;
    let opaque = |[r, g, b]: [u8; 3]| Rgba::opaque(r, g, b);

    let sample = |position: f64| {
        let upper = anchors
            .iter()
            .position(|(anchor, _)| *anchor >= position)
            .unwrap_or(anchors.len() - 1);
        if upper == 0 {
            return opaque(anchors[0].1);
        }
        let (from_position, from) = anchors[upper - 1];
        let (to_position, to) = anchors[upper];
        let ratio = (position - from_position) / (to_position - from_position);
        opaque(from).lerp(&opaque(to), ratio)
    };

    Ok(match count {
        0 => Vec::new(),
        1 => vec![opaque(anchors[0].1)],
        _ => (0..count)
            .map(|i| sample(i as f64 / (count - 1) as f64))
            .collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgba,
}

/// One element of the flat `value, color, value, color, ...` form that the
/// `interpolate` style expression takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RampEntry {
    Value(f64),
    Color(Rgba),
}

/// Ordered breakpoints for a piecewise-linear color interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl ColorRamp {
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn flatten(&self) -> Vec<RampEntry> {
        self.stops
            .iter()
            .flat_map(|stop| [RampEntry::Value(stop.value), RampEntry::Color(stop.color)])
            .collect()
    }

    /// Color at `value`, clamped to the end stops outside the ramp.
    pub fn color_at(&self, value: f64) -> Rgba {
        if value <= self.stops[0].value {
            return self.stops[0].color;
        }

        for i in 1..self.stops.len() {
            if value < self.stops[i].value {
                let low = &self.stops[i - 1];
                let high = &self.stops[i];
                let ratio = (value - low.value) / (high.value - low.value);
                return low.color.lerp(&high.color, ratio);
            }
        }

        self.stops[self.stops.len() - 1].color
    }
}

/// Partition `[min, max]` into `steps` equally spaced values and pair them
/// with `steps` shades of `palette`, reversing the shades first when
/// `reverse` is set.
pub fn build_ramp(palette: &str, min: f64, max: f64, steps: usize, reverse: bool) -> Result<ColorRamp> {
    if steps < 2 {
        return Err(Error::InvalidParameter {
            name: "steps",
            value: steps.to_string(),
            reason: "a ramp needs at least two stops".to_string(),
        });
    }
    if !(min < max) {
        return Err(Error::InvalidParameter {
            name: "min",
            value: format!("{min}..{max}"),
            reason: "min must be below max".to_string(),
        });
    }

    let mut colors = generate_palette(palette, steps)?;
    if reverse {
        colors.reverse();
    }

    let delta = (max - min) / (steps - 1) as f64;
    let stops = colors
        .into_iter()
        .enumerate()
        .map(|(i, color)| ColorStop {
            value: if i == steps - 1 { max } else { min + i as f64 * delta },
            color,
        })
        .collect();

    Ok(ColorRamp { stops })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_count_and_exact_ends() {
        for name in PALETTE_NAMES {
            let colors = generate_palette(name, 10).unwrap();
            assert_eq!(colors.len(), 10, "{name}");
        }
        let viridis = generate_palette("viridis", 10).unwrap();
        assert_eq!(viridis[0], Rgba::opaque(68, 1, 84));
        assert_eq!(viridis[9], Rgba::opaque(253, 231, 37));
    }

    #[test]
    fn two_anchor_palette_interpolates() {
        let greys = generate_palette("greys", 3).unwrap();
        assert_eq!(greys[1], Rgba::opaque(128, 128, 128));
    }

    #[test]
    fn unknown_palette_is_an_error() {
        assert!(matches!(
            build_ramp("plasma-ish", 0.0, 1.0, 10, false),
            Err(Error::UnknownPalette(_))
        ));
    }

    #[test]
    fn short_palettes_sample_the_curve() {
        let jet = generate_palette("jet", 2).unwrap();
        assert_eq!(jet, vec![Rgba::opaque(0, 0, 131), Rgba::opaque(128, 0, 0)]);

        let viridis = generate_palette("viridis", 3).unwrap();
        assert_eq!(viridis[1], Rgba::opaque(33, 144, 141));
    }

    #[test]
    fn ramp_values_span_range() {
        for steps in 2..20 {
            let ramp = build_ramp("chlorophyll", -0.2, 1.0, steps, true).unwrap();
            assert_eq!(ramp.flatten().len(), 2 * steps);
            assert_eq!(ramp.stops()[0].value, -0.2);
            assert_eq!(ramp.stops()[steps - 1].value, 1.0);
            assert!(ramp.stops().windows(2).all(|w| w[0].value < w[1].value));
        }
    }

    #[test]
    fn reverse_only_flips_colors() {
        let forward = build_ramp("viridis", 0.0, 1.0, 10, false).unwrap();
        let reversed = build_ramp("viridis", 0.0, 1.0, 10, true).unwrap();

        let values = |r: &ColorRamp| r.stops().iter().map(|s| s.value).collect::<Vec<_>>();
        assert_eq!(values(&forward), values(&reversed));

        let mut colors = forward.stops().iter().map(|s| s.color).collect::<Vec<_>>();
        colors.reverse();
        let reversed_colors = reversed.stops().iter().map(|s| s.color).collect::<Vec<_>>();
        assert_eq!(colors, reversed_colors);
    }

    #[test]
    fn invalid_range_and_steps() {
        assert!(build_ramp("viridis", 1.0, 1.0, 10, false).is_err());
        assert!(build_ramp("greys", 0.0, 1.0, 1, false).is_err());
    }

    #[test]
    fn color_at_clamps_and_interpolates() {
        let ramp = build_ramp("greys", 0.0, 1.0, 2, false).unwrap();
        assert_eq!(ramp.color_at(-5.0), Rgba::opaque(0, 0, 0));
        assert_eq!(ramp.color_at(5.0), Rgba::opaque(255, 255, 255));
        assert_eq!(ramp.color_at(0.5), Rgba::opaque(128, 128, 128));
    }

    #[test]
    fn flatten_serializes_as_interpolate_stops() {
        let ramp = build_ramp("greys", 0.0, 1.0, 2, false).unwrap();
        let json = serde_json::to_string(&ramp.flatten()).unwrap();
        assert_eq!(json, r#"[0.0,"rgba(0, 0, 0, 1)",1.0,"rgba(255, 255, 255, 1)"]"#);
    }
}
