use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::propagation::GeocentricState;

// WGS-84
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const EARTH_ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;

const LATITUDE_TOLERANCE_RAD: f64 = 1e-12;
const MAX_LATITUDE_ITERATIONS: usize = 16;

/// Point on the Earth's surface directly below the satellite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Subpoint {
    pub timestamp: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Project a geocentric state onto the WGS-84 ellipsoid.
///
/// The returned longitude is in (-180, 180].
pub fn project(state: &GeocentricState) -> Subpoint {
    let gmst = greenwich_sidereal_angle(state.timestamp);
    let [x, y, z] = teme_to_ecef_position(state.position_km, gmst);
    let (latitude, altitude_km) = geodetic_latitude_altitude(x, y, z);

    Subpoint {
        timestamp: state.timestamp,
        latitude_deg: latitude.to_degrees().clamp(-90.0, 90.0),
        longitude_deg: normalize_longitude(y.atan2(x).to_degrees()),
        altitude_km,
    }
}

/// Wrap a longitude in degrees into (-180, 180].
pub fn normalize_longitude(longitude_deg: f64) -> f64 {
    let wrapped = (longitude_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

pub fn greenwich_sidereal_angle(at: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()))
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

/// Geodetic latitude (radians) and height above the ellipsoid (km) by
/// fixed-point iteration on the latitude.
fn geodetic_latitude_altitude(x: f64, y: f64, z: f64) -> (f64, f64) {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let e2 = EARTH_ECCENTRICITY_SQ;
    let p = (x * x + y * y).sqrt();

    let mut latitude = z.atan2(p * (1.0 - e2));
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let sin_lat = latitude.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + n * e2 * sin_lat).atan2(p);
        let delta = (next - latitude).abs();
        latitude = next;
        if delta < LATITUDE_TOLERANCE_RAD {
            break;
        }
    }

    let sin_lat = latitude.sin();
    let altitude = p * latitude.cos() + z * sin_lat - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();
    (latitude, altitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn state(position_km: [f64; 3]) -> GeocentricState {
        GeocentricState {
            timestamp: instant(),
            position_km,
            velocity_km_s: [0.0, 7.6, 0.0],
        }
    }

    // Inverse of the projection, for building states with known subpoints.
    fn geodetic_to_teme(lat_deg: f64, lon_deg: f64, alt_km: f64, gmst: f64) -> [f64; 3] {
        let a = EARTH_EQUATORIAL_RADIUS_KM;
        let e2 = EARTH_ECCENTRICITY_SQ;
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let n = a / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
        let x = (n + alt_km) * lat.cos() * lon.cos();
        let y = (n + alt_km) * lat.cos() * lon.sin();
        let z = (n * (1.0 - e2) + alt_km) * lat.sin();
        [
            x * gmst.cos() - y * gmst.sin(),
            x * gmst.sin() + y * gmst.cos(),
            z,
        ]
    }

    #[test]
    fn equatorial_position() {
        let gmst = greenwich_sidereal_angle(instant());
        let sub = project(&state([6778.137, 0.0, 0.0]));

        assert_relative_eq!(sub.latitude_deg, 0.0, epsilon = 1e-9);
        assert_relative_eq!(sub.altitude_km, 400.0, epsilon = 1e-6);
        assert_relative_eq!(
            sub.longitude_deg,
            normalize_longitude(-gmst.to_degrees()),
            epsilon = 1e-9
        );
        assert_eq!(sub.timestamp, instant());
    }

    #[test]
    fn polar_position() {
        let sub = project(&state([0.0, 0.0, 7000.0]));
        let polar_radius = EARTH_EQUATORIAL_RADIUS_KM * (1.0 - EARTH_ECCENTRICITY_SQ).sqrt();

        assert_relative_eq!(sub.latitude_deg, 90.0, epsilon = 1e-9);
        assert_relative_eq!(sub.altitude_km, 7000.0 - polar_radius, epsilon = 1e-6);
    }

    #[test]
    fn recovers_known_geodetic_coordinates() {
        let gmst = greenwich_sidereal_angle(instant());
        for &(lat, lon) in &[(45.0, 10.0), (-51.6, 179.9), (12.5, -120.0), (-0.5, -179.5)] {
            let sub = project(&state(geodetic_to_teme(lat, lon, 420.0, gmst)));
            assert_relative_eq!(sub.latitude_deg, lat, epsilon = 1e-8);
            assert_relative_eq!(sub.longitude_deg, lon, epsilon = 1e-8);
            assert_relative_eq!(sub.altitude_km, 420.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn longitude_range() {
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
        assert_eq!(normalize_longitude(12.25), 12.25);
    }
}
