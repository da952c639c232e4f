use geo::{ChamberlainDuquetteArea, Coord, Haversine, Length, LineString, MapCoords, Polygon};

use crate::projection::Projection;

/// Great-circle length in meters of a line given in map coordinates.
pub fn length(line: &LineString<f64>, projection: &dyn Projection) -> f64 {
    let lon_lat = line.map_coords(|c| projection.to_lon_lat(c));
    lon_lat.length::<Haversine>()
}

/// Spherical area in square meters of a polygon given in map coordinates.
pub fn area(polygon: &Polygon<f64>, projection: &dyn Projection) -> f64 {
    let lon_lat = polygon.map_coords(|c: Coord<f64>| projection.to_lon_lat(c));
    lon_lat.chamberlain_duquette_unsigned_area()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{
        ProjDefinition, UTM_34N_CODE, UTM_34N_DEFINITION, WGS84_CODE, WGS84_DEFINITION,
    };

    fn wgs84() -> ProjDefinition {
        ProjDefinition::new(WGS84_CODE, WGS84_DEFINITION).unwrap()
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let meters = length(&line, &wgs84());
        assert!((meters - 111_195.0).abs() < 10.0, "{meters}");
    }

    #[test]
    fn utm_length_is_ground_length() {
        let utm = ProjDefinition::new(UTM_34N_CODE, UTM_34N_DEFINITION).unwrap();
        let a = utm.from_lon_lat(Coord { x: 19.0, y: 47.0 });
        let b = utm.from_lon_lat(Coord { x: 19.0, y: 47.01 });
        let meters = length(&LineString::new(vec![a, b]), &utm);
        assert!((meters - 1_112.0).abs() < 1.0, "{meters}");
    }

    #[test]
    fn degenerate_geometry_measures_zero() {
        let wgs84 = wgs84();
        assert_eq!(length(&LineString::new(vec![]), &wgs84), 0.0);
        let point_ring = Polygon::new(LineString::from(vec![(1.0, 1.0), (1.0, 1.0)]), vec![]);
        assert_eq!(area(&point_ring, &wgs84), 0.0);
    }

    #[test]
    fn small_square_area() {
        // roughly 1.11 km x 1.11 km at the equator
        let square = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (0.01, 0.0),
                (0.01, 0.01),
                (0.0, 0.01),
                (0.0, 0.0),
            ]),
            vec![],
        );
        let m2 = area(&square, &wgs84());
        assert!((m2 - 1.239e6).abs() < 0.01e6, "{m2}");
    }
}
