use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::error::PropagationError;
use super::propagation::Propagator;
use super::subpoint::{project, Subpoint};

const FULL_TURN_DEG: f64 = 360.0;
const HALF_TURN_DEG: f64 = 180.0;

/// Predicted ground track, one subpoint per minute starting at offset 0.
///
/// Longitudes are unwrapped: neighbouring samples never differ by more than
/// 180 degrees, so values past the antimeridian leave (-180, 180].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trajectory {
    points: Vec<Subpoint>,
}

impl Trajectory {
    pub fn points(&self) -> &[Subpoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `[latitude, longitude]` pairs, the layout map polylines expect.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.latitude_deg, p.longitude_deg])
            .collect()
    }
}

/// Shift `raw` by whole turns until it lies within 180 degrees of
/// `previous`, the already corrected longitude of the preceding sample.
///
/// A difference of exactly 180 degrees is kept on the side `raw` started on.
pub fn unwrap_longitude(previous: f64, raw: f64) -> f64 {
    if !raw.is_finite() || !previous.is_finite() {
        return raw;
    }

    let delta = raw - previous;
    if delta.abs() <= HALF_TURN_DEG {
        return raw;
    }

    let turns = (delta / FULL_TURN_DEG).round();
    let corrected = raw - FULL_TURN_DEG * turns;
    let remaining = corrected - previous;
    if remaining == -HALF_TURN_DEG && delta > 0.0 {
        corrected + FULL_TURN_DEG
    } else if remaining == HALF_TURN_DEG && delta < 0.0 {
        corrected - FULL_TURN_DEG
    } else {
        corrected
    }
}

/// Build a trajectory of `minutes + 1` samples starting from `start`.
///
/// `sample` yields the raw subpoint for an instant. The first error it
/// returns aborts the whole prediction.
pub fn predict_trajectory<F, E>(start: Subpoint, minutes: u32, mut sample: F) -> Result<Trajectory, E>
where
    F: FnMut(DateTime<Utc>) -> Result<Subpoint, E>,
{
    let mut points = vec![start];

    let mut previous_lon = start.longitude_deg;
    for offset in 1..=minutes {
        let at = start.timestamp + Duration::minutes(i64::from(offset));
        let mut point = sample(at)?;
        point.longitude_deg = unwrap_longitude(previous_lon, point.longitude_deg);
        previous_lon = point.longitude_deg;
        points.push(point);
    }

    Ok(Trajectory { points })
}

pub fn predict_from<P: Propagator + ?Sized>(
    propagator: &P,
    start: Subpoint,
    minutes: u32,
) -> Result<Trajectory, PropagationError> {
    predict_trajectory(start, minutes, |at| {
        propagator.propagate(at).map(|state| project(&state))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::subpoint::normalize_longitude;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn point(at: DateTime<Utc>, lat: f64, lon: f64) -> Subpoint {
        Subpoint {
            timestamp: at,
            latitude_deg: lat,
            longitude_deg: lon,
            altitude_km: 420.0,
        }
    }

    fn minutes_since_start(at: DateTime<Utc>) -> i64 {
        (at - t0()).num_minutes()
    }

    #[test]
    fn small_steps_are_left_alone() {
        assert_eq!(unwrap_longitude(10.0, 15.0), 15.0);
        assert_eq!(unwrap_longitude(-170.0, 10.0), 10.0);
        assert_eq!(unwrap_longitude(0.0, 180.0), 180.0);
        assert_eq!(unwrap_longitude(90.0, -90.0), -90.0);
    }

    #[test]
    fn eastward_antimeridian_crossing() {
        let corrected = unwrap_longitude(179.5, -179.8);
        assert_relative_eq!(corrected, 180.2, epsilon = 1e-9);
        assert_relative_eq!(corrected - 179.5, 0.7, epsilon = 1e-9);
    }

    #[test]
    fn westward_antimeridian_crossing() {
        let corrected = unwrap_longitude(-179.0, 179.0);
        assert_relative_eq!(corrected, -181.0, epsilon = 1e-9);
        assert_relative_eq!(corrected - -179.0, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn correction_is_relative_to_previous_corrected_value() {
        // Second crossing in the same direction: previous is already 190.
        assert_relative_eq!(unwrap_longitude(530.0, -170.0), 550.0, epsilon = 1e-9);
        assert_relative_eq!(unwrap_longitude(190.0, -150.0), 210.0, epsilon = 1e-9);
    }

    #[test]
    fn far_drifted_previous_is_unwrapped_directly() {
        let corrected = unwrap_longitude(3.6e9, 10.0);
        assert_eq!(corrected, 3.6e9 + 10.0);
        assert_eq!(unwrap_longitude(0.0, 540.0), 180.0);
        assert_eq!(unwrap_longitude(0.0, -540.0), -180.0);
        assert!(unwrap_longitude(0.0, f64::NAN).is_nan());
    }

    #[test]
    fn has_one_sample_per_minute_plus_start() {
        let start = point(t0(), 0.0, 0.0);
        for minutes in [0, 1, 37, 90] {
            let trajectory = predict_trajectory(start, minutes, |at| {
                Ok::<_, PropagationError>(point(at, 1.0, minutes_since_start(at) as f64))
            })
            .unwrap();

            assert_eq!(trajectory.len(), minutes as usize + 1);
            for (offset, p) in trajectory.points().iter().enumerate() {
                assert_eq!(p.timestamp, t0() + Duration::minutes(offset as i64));
            }
        }
    }

    #[test]
    fn multiple_crossings_stay_continuous() {
        // Ground track drifting east 20 degrees a minute, wrapped like a
        // projector would report it. Four full turns in 72 minutes.
        let start = point(t0(), 0.0, 100.0);
        let trajectory = predict_trajectory(start, 72, |at| {
            let lon = 100.0 + 20.0 * minutes_since_start(at) as f64;
            Ok::<_, PropagationError>(point(at, 10.0, normalize_longitude(lon)))
        })
        .unwrap();

        for (offset, p) in trajectory.points().iter().enumerate() {
            assert_relative_eq!(p.longitude_deg, 100.0 + 20.0 * offset as f64, epsilon = 1e-6);
        }
        for pair in trajectory.points().windows(2) {
            assert!((pair[1].longitude_deg - pair[0].longitude_deg).abs() <= 180.0);
        }
    }

    #[test]
    fn latitude_is_never_adjusted() {
        let start = point(t0(), -51.0, 179.0);
        let trajectory = predict_trajectory(start, 2, |at| {
            Ok::<_, PropagationError>(point(at, -50.0, -178.0))
        })
        .unwrap();

        assert_eq!(trajectory.points()[1].latitude_deg, -50.0);
        assert_relative_eq!(trajectory.points()[1].longitude_deg, 182.0, epsilon = 1e-9);
        assert_eq!(trajectory.coordinates()[1][0], -50.0);
    }

    #[test]
    fn sampling_error_aborts_prediction() {
        let start = point(t0(), 0.0, 0.0);
        let mut calls = 0;
        let result = predict_trajectory(start, 90, |at| {
            calls += 1;
            if minutes_since_start(at) == 37 {
                Err(PropagationError::new(at, "out of validity window"))
            } else {
                Ok(point(at, 0.0, 1.0))
            }
        });

        let err = result.unwrap_err();
        assert_eq!(err.at, t0() + Duration::minutes(37));
        assert_eq!(calls, 37);
    }

    #[test]
    fn huge_duration_fails_on_first_sample_without_allocating() {
        let start = point(t0(), 0.0, 0.0);
        let mut calls = 0;
        let result = predict_trajectory(start, u32::MAX, |at| {
            calls += 1;
            Err::<Subpoint, _>(PropagationError::new(at, "decayed"))
        });

        assert_eq!(result.unwrap_err().at, t0() + Duration::minutes(1));
        assert_eq!(calls, 1);
    }
}
