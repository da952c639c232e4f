use bandview::colormap::{build_ramp, generate_palette, PALETTE_NAMES};
use bandview::Error;

#[test]
fn ramps_span_min_to_max_for_every_palette() {
    for name in PALETTE_NAMES {
        for steps in 2..=20 {
            let ramp = build_ramp(name, -1.0, 1.0, steps, false).unwrap();
            let stops = ramp.stops();
            assert_eq!(stops.len(), steps);
            assert_eq!(stops[0].value, -1.0);
            assert_eq!(stops[steps - 1].value, 1.0);
            assert!(stops.windows(2).all(|w| w[0].value < w[1].value));
        }
    }
}

#[test]
fn short_ramps_keep_palette_ends() {
    for name in PALETTE_NAMES {
        let full = generate_palette(name, 20).unwrap();
        let ramp = build_ramp(name, 0.0, 1.0, 2, false).unwrap();
        assert_eq!(ramp.flatten().len(), 4);
        assert_eq!(ramp.stops()[0].color, full[0]);
        assert_eq!(ramp.stops()[1].color, full[19]);
    }
}

#[test]
fn reversing_only_flips_colors() {
    let forward = build_ramp("viridis", -0.2, 1.0, 10, false).unwrap();
    let reversed = build_ramp("viridis", -0.2, 1.0, 10, true).unwrap();
    let palette = generate_palette("viridis", 10).unwrap();

    for (i, (f, r)) in forward.stops().iter().zip(reversed.stops()).enumerate() {
        assert_eq!(f.value, r.value);
        assert_eq!(f.color, palette[i]);
        assert_eq!(r.color, palette[9 - i]);
    }
}

#[test]
fn bad_ramp_parameters_are_rejected() {
    assert!(matches!(
        build_ramp("magma-ish", 0.0, 1.0, 10, false),
        Err(Error::UnknownPalette(_))
    ));
    assert!(matches!(
        build_ramp("viridis", 1.0, 0.0, 10, false),
        Err(Error::InvalidParameter { name: "min", .. })
    ));
}
