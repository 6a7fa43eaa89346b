mod error;
mod propagation;
mod subpoint;
mod tracker;
mod trajectory;

pub use error::PropagationError;
pub use propagation::{GeocentricState, Propagator};
pub use subpoint::Subpoint;
pub use tracker::{
    needs_refresh, Frame, StalenessCheck, TrackSettings, Tracker, DEFAULT_NORAD_ID,
    DEFAULT_ORBIT_DURATION_MINUTES, DEFAULT_STALENESS_THRESHOLD_DAYS, DEFAULT_UPDATE_INTERVAL,
};

#[cfg(test)]
pub use subpoint::project;
#[cfg(test)]
pub use tracker::compute_frame;
#[cfg(test)]
pub use trajectory::predict_trajectory;
