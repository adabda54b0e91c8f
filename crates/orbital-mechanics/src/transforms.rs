//! Coordinate transforms
//!
//! ECI (TEME) positions from the propagator feed two independent outputs:
//! - geodetic latitude/longitude/height for 2D maps and the live globe
//! - a fixed axis remap into scene space for 3D orbit lines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::{GeodeticPoint, OrbitalError, Result};

/// WGS84 ellipsoid
const EARTH_RADIUS_KM: f64 = 6378.137;
const EARTH_POLAR_RADIUS_KM: f64 = 6356.7523142;
const LATITUDE_ITERATIONS: usize = 20;

const TWO_PI: f64 = 2.0 * PI;
const JULIAN_DATE_UNIX_EPOCH: f64 = 2440587.5;
const JULIAN_DATE_J2000: f64 = 2451545.0;

/// 3D rendering-frame point (km). Y is up, Z is depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Greenwich Mean Sidereal Time (IAU 1982) in radians, in [0, 2π)
pub fn gmst(time: DateTime<Utc>) -> f64 {
    // Julian Date from Unix milliseconds
    let jd = time.timestamp_millis() as f64 / 86_400_000.0 + JULIAN_DATE_UNIX_EPOCH;

    // Julian centuries from J2000.0
    let t = (jd - JULIAN_DATE_J2000) / 36525.0;

    // GMST in seconds
    let gmst_sec = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * t
        + 0.093104 * t * t
        - 6.2e-6 * t * t * t;

    // 240 seconds of time per degree
    ((gmst_sec / 240.0).to_radians()).rem_euclid(TWO_PI)
}

/// Wrap a longitude in degrees into (-180, 180].
///
/// `((lon + 180) mod 360 + 360) mod 360 - 180`, with the -180 edge folded
/// onto +180 so the result stays in a half-open interval.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Convert an ECI position (km) at a given sidereal angle to geodetic degrees.
///
/// Non-finite results and latitudes beyond the poles are rejected as
/// [`OrbitalError::GeodeticSingularity`]; callers skip such samples.
pub fn eci_to_geodetic(position: [f64; 3], gmst_rad: f64) -> Result<GeodeticPoint> {
    let [x, y, z] = position;
    let flattening = (EARTH_RADIUS_KM - EARTH_POLAR_RADIUS_KM) / EARTH_RADIUS_KM;
    let e2 = 2.0 * flattening - flattening * flattening;

    let r = (x * x + y * y).sqrt();

    let mut longitude = y.atan2(x) - gmst_rad;
    while longitude < -PI {
        longitude += TWO_PI;
    }
    while longitude > PI {
        longitude -= TWO_PI;
    }

    let mut latitude = z.atan2(r);
    let mut c = 1.0;
    for _ in 0..LATITUDE_ITERATIONS {
        c = 1.0 / (1.0 - e2 * latitude.sin().powi(2)).sqrt();
        latitude = (z + EARTH_RADIUS_KM * c * e2 * latitude.sin()).atan2(r);
    }
    let altitude_km = r / latitude.cos() - EARTH_RADIUS_KM * c;

    let latitude = latitude.to_degrees();
    let longitude = longitude.to_degrees();

    if !latitude.is_finite() || !longitude.is_finite() || latitude.abs() > 90.0 {
        return Err(OrbitalError::GeodeticSingularity {
            latitude,
            longitude,
        });
    }

    Ok(GeodeticPoint {
        latitude,
        longitude: normalize_longitude(longitude),
        altitude_km,
    })
}

/// Remap ECI axes into scene space: `(x, z, -y)`
pub fn eci_to_scene(position: [f64; 3]) -> ScenePoint {
    ScenePoint {
        x: position[0],
        y: position[2],
        z: -position[1],
    }
}
