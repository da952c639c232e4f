fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Meters above 100 switch to kilometers.
pub fn format_length(meters: f64) -> String {
    if meters > 100.0 {
        format!("{} km", round2(meters / 1000.0))
    } else {
        format!("{} m", round2(meters))
    }
}

/// Square meters above 10 000 switch to square kilometers.
pub fn format_area(square_meters: f64) -> String {
    if square_meters > 10_000.0 {
        format!("{} km\u{b2}", round2(square_meters / 1_000_000.0))
    } else {
        format!("{} m\u{b2}", round2(square_meters))
    }
}
