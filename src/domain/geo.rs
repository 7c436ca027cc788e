// Spherical-earth geometry helpers for grouping and layout
use crate::domain::model::{Coordinate, CompassDirection};

pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Great-circle distance in meters (haversine).
pub fn great_circle_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

pub fn meters_per_degree_lat() -> f64 {
    EARTH_CIRCUMFERENCE_M / 360.0
}

pub fn meters_per_degree_lon(latitude: f64) -> f64 {
    meters_per_degree_lat() * latitude.to_radians().cos()
}

/// Shift a coordinate by metric offsets (east, north).
/// Near the poles the east component degenerates and is dropped.
pub fn offset_by_meters(origin: Coordinate, east_m: f64, north_m: f64) -> Coordinate {
    let d_lat = north_m / meters_per_degree_lat();
    let per_lon = meters_per_degree_lon(origin.latitude);
    let d_lon = if per_lon.abs() < 1e-9 {
        0.0
    } else {
        east_m / per_lon
    };
    Coordinate::new(origin.latitude + d_lat, origin.longitude + d_lon)
}

/// Compass bucket for the direction from `from` towards `to`.
///
/// Equirectangular approximation, fine for indicator arrows but not for
/// navigation. Boundary bearings (22.5°, 67.5°, ...) fall clockwise.
pub fn compass_between(from: Coordinate, to: Coordinate) -> CompassDirection {
    let mut d_lon = to.longitude - from.longitude;
    if d_lon > 180.0 {
        d_lon -= 360.0;
    } else if d_lon < -180.0 {
        d_lon += 360.0;
    }

    let north = to.latitude - from.latitude;
    let mid_lat = ((from.latitude + to.latitude) / 2.0).to_radians();
    let east = d_lon * mid_lat.cos();

    let bearing = east.atan2(north).to_degrees();
    let bearing = (bearing + 360.0) % 360.0;
    let bucket = ((bearing + 22.5) / 45.0).floor() as usize % 8;
    CompassDirection::ALL[bucket]
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS: Coordinate = Coordinate {
        latitude: 48.8566,
        longitude: 2.3522,
    };
    const LONDON: Coordinate = Coordinate {
        latitude: 51.5074,
        longitude: -0.1278,
    };

    #[test]
    fn paris_to_london_distance() {
        let d = great_circle_m(PARIS, LONDON);
        assert!(
            (340_000.0..348_000.0).contains(&d),
            "Paris-London should be ~344 km, got {} m",
            d
        );
    }

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(great_circle_m(PARIS, PARIS), 0.0);
    }

    #[test]
    fn small_latitude_step_is_about_111_meters() {
        let a = Coordinate::new(48.0, 2.0);
        let b = Coordinate::new(48.001, 2.0);
        let d = great_circle_m(a, b);
        assert!((109.0..114.0).contains(&d), "got {} m", d);
    }

    #[test]
    fn metric_offset_round_trips_through_distance() {
        let origin = Coordinate::new(60.0, 11.0);
        let east = offset_by_meters(origin, 100.0, 0.0);
        let north = offset_by_meters(origin, 0.0, 100.0);
        assert!((great_circle_m(origin, east) - 100.0).abs() < 1.5);
        assert!((great_circle_m(origin, north) - 100.0).abs() < 1.5);
    }

    #[test]
    fn compass_buckets_cover_all_eight_directions() {
        let center = Coordinate::new(0.0, 0.0);
        let cases = [
            (1.0, 0.0, CompassDirection::North),
            (1.0, 1.0, CompassDirection::NorthEast),
            (0.0, 1.0, CompassDirection::East),
            (-1.0, 1.0, CompassDirection::SouthEast),
            (-1.0, 0.0, CompassDirection::South),
            (-1.0, -1.0, CompassDirection::SouthWest),
            (0.0, -1.0, CompassDirection::West),
            (1.0, -1.0, CompassDirection::NorthWest),
        ];
        for (lat, lon, expected) in cases {
            let got = compass_between(center, Coordinate::new(lat, lon));
            assert_eq!(got, expected, "target ({}, {})", lat, lon);
        }
    }

    #[test]
    fn compass_handles_antimeridian() {
        let from = Coordinate::new(0.0, 179.0);
        let to = Coordinate::new(0.0, -179.0);
        assert_eq!(compass_between(from, to), CompassDirection::East);
    }
}
