use std::fmt;

use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::elements::error::SourceError;
use crate::tracker::{GeocentricState, PropagationError, Propagator};

const MINUTES_PER_DAY: f64 = 1440.0;
const MILLISECONDS_PER_DAY: f64 = 86_400_000.0;

/// Parsed two-line element set of one object, ready for SGP4.
pub struct OrbitalElementSet {
    pub name: String,
    pub norad_id: u32,
    pub epoch: DateTime<Utc>,
    pub tle_source: String,
    elements: Elements,
    constants: Constants,
}

impl OrbitalElementSet {
    pub fn from_tle(
        name: Option<String>,
        line1: &str,
        line2: &str,
        tle_source: &str,
    ) -> Result<Self, SourceError> {
        let invalid = |message: String| SourceError::InvalidTle {
            file: tle_source.to_string(),
            message,
        };

        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| invalid(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            name: elements
                .object_name
                .clone()
                .unwrap_or_else(|| format!("NORAD {}", elements.norad_id)),
            norad_id: elements.norad_id as u32,
            epoch: elements.datetime.and_utc(),
            tle_source: tle_source.to_string(),
            elements,
            constants,
        })
    }

    pub fn epoch_age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.epoch).num_milliseconds() as f64 / MILLISECONDS_PER_DAY
    }

    pub fn orbital_period_minutes(&self) -> f64 {
        MINUTES_PER_DAY / self.elements.mean_motion
    }
}

impl fmt::Debug for OrbitalElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalElementSet")
            .field("name", &self.name)
            .field("norad_id", &self.norad_id)
            .field("epoch", &self.epoch)
            .field("tle_source", &self.tle_source)
            .finish_non_exhaustive()
    }
}

impl Propagator for OrbitalElementSet {
    fn propagate(&self, at: DateTime<Utc>) -> Result<GeocentricState, PropagationError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&at.naive_utc())
            .map_err(|e| PropagationError::new(at, e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PropagationError::new(at, e.to_string()))?;

        Ok(GeocentricState {
            timestamp: at,
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        })
    }

    fn object_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
