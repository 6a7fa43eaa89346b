use chrono::{DateTime, Utc};

use super::error::PropagationError;

/// Position and velocity relative to the Earth's center of mass, in the
/// TEME frame SGP4 works in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocentricState {
    pub timestamp: DateTime<Utc>,
    pub position_km: [f64; 3],
    #[allow(dead_code)]
    pub velocity_km_s: [f64; 3],
}

pub trait Propagator {
    fn propagate(&self, at: DateTime<Utc>) -> Result<GeocentricState, PropagationError>;

    fn object_name(&self) -> Option<String> {
        None
    }
}
