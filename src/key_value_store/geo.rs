//! Geospatial scores.
//!
//! A (longitude, latitude) pair is packed into 52 bits by 26 rounds of binary
//! search over each axis, longitude bit first in every round. The result fits
//! exactly in an `f64`, so geo members live in ordinary sorted sets.

pub const LONGITUDE_MIN: f64 = -180.0;
pub const LONGITUDE_MAX: f64 = 180.0;
pub const LATITUDE_MIN: f64 = -85.05112878;
pub const LATITUDE_MAX: f64 = 85.05112878;
pub const EARTH_RADIUS_IN_METERS: f64 = 6372797.560856;

const STEPS: u32 = 26;

pub fn encode(longitude: f64, latitude: f64) -> u64 {
    let (mut lon_min, mut lon_max) = (LONGITUDE_MIN, LONGITUDE_MAX);
    let (mut lat_min, mut lat_max) = (LATITUDE_MIN, LATITUDE_MAX);
    let mut hash: u64 = 0;

    for _ in 0..STEPS {
        let mid = (lon_min + lon_max) / 2.0;
        if longitude > mid {
            hash = (hash << 1) | 1;
            lon_min = mid;
        } else {
            hash <<= 1;
            lon_max = mid;
        }

        let mid = (lat_min + lat_max) / 2.0;
        if latitude > mid {
            hash = (hash << 1) | 1;
            lat_min = mid;
        } else {
            hash <<= 1;
            lat_max = mid;
        }
    }

    hash
}

/// Returns the centre of the cell `hash` describes, as (longitude, latitude).
pub fn decode(hash: u64) -> (f64, f64) {
    let (mut lon_min, mut lon_max) = (LONGITUDE_MIN, LONGITUDE_MAX);
    let (mut lat_min, mut lat_max) = (LATITUDE_MIN, LATITUDE_MAX);

    for step in (0..STEPS).rev() {
        let lon_bit = (hash >> (step * 2 + 1)) & 1;
        let lat_bit = (hash >> (step * 2)) & 1;

        let mid = (lon_min + lon_max) / 2.0;
        if lon_bit == 1 {
            lon_min = mid;
        } else {
            lon_max = mid;
        }

        let mid = (lat_min + lat_max) / 2.0;
        if lat_bit == 1 {
            lat_min = mid;
        } else {
            lat_max = mid;
        }
    }

    ((lon_min + lon_max) / 2.0, (lat_min + lat_max) / 2.0)
}

/// Great-circle distance in meters between two (longitude, latitude) points.
pub fn haversine_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lon1, lat1) = from;
    let (lon2, lat2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_IN_METERS * c
}

/// Names the violated bounds, or `None` when the pair is valid.
pub fn validate(longitude: f64, latitude: f64) -> Option<String> {
    let invalid_longitude = !(LONGITUDE_MIN..=LONGITUDE_MAX).contains(&longitude);
    let invalid_latitude = !(LATITUDE_MIN..=LATITUDE_MAX).contains(&latitude);

    match (invalid_longitude, invalid_latitude) {
        (false, false) => None,
        (true, false) => Some(format!("ERR invalid longitude {}", longitude)),
        (false, true) => Some(format!("ERR invalid latitude {}", latitude)),
        (true, true) => Some(format!(
            "ERR invalid longitude,latitude pair {},{}",
            longitude, latitude
        )),
    }
}

/// Meters per distance unit accepted by GEODIST and GEOSEARCH.
pub fn unit_in_meters(unit: &str) -> Option<f64> {
    match unit.to_lowercase().as_str() {
        "m" => Some(1.0),
        "km" => Some(1000.0),
        "mi" => Some(1609.34),
        "ft" => Some(0.3048),
        _ => None,
    }
}
