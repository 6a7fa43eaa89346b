use std::time::Duration as StdDuration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::sleep;
use utoipa::ToSchema;

use super::error::{PropagationError, TrackError};
use super::propagation::Propagator;
use super::subpoint::{project, Subpoint};
use super::trajectory::{predict_from, Trajectory};
use crate::elements::{ElementSource, SourceError};
use crate::render::Renderer;

pub const DEFAULT_NORAD_ID: u32 = 25544;
pub const DEFAULT_ORBIT_DURATION_MINUTES: u32 = 90;
pub const DEFAULT_UPDATE_INTERVAL: StdDuration = StdDuration::from_secs(60);
pub const DEFAULT_STALENESS_THRESHOLD_DAYS: f64 = 1.0;

/// When the element source is checked for staleness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StalenessCheck {
    /// Once, while bootstrapping.
    #[default]
    Startup,
    /// At the start of every cycle; a refresh also reloads the elements.
    EveryCycle,
}

#[derive(Debug, Clone)]
pub struct TrackSettings {
    pub norad_id: u32,
    pub orbit_duration_minutes: u32,
    pub update_interval: StdDuration,
    pub staleness_threshold_days: f64,
    pub staleness_check: StalenessCheck,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            norad_id: DEFAULT_NORAD_ID,
            orbit_duration_minutes: DEFAULT_ORBIT_DURATION_MINUTES,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            staleness_threshold_days: DEFAULT_STALENESS_THRESHOLD_DAYS,
            staleness_check: StalenessCheck::Startup,
        }
    }
}

/// One cycle's output: where the satellite is now and where it is going.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Frame {
    pub cycle: u64,
    pub satellite: String,
    pub norad_id: u32,
    pub current: Subpoint,
    #[schema(value_type = Vec<Subpoint>)]
    pub trajectory: Trajectory,
}

enum Phase<E> {
    Bootstrapping,
    CycleRunning { elements: E },
}

/// Engine context: the element source, the current element set and the
/// render sink, threaded through every cycle.
pub struct Tracker<S: ElementSource, R: Renderer> {
    source: S,
    renderer: R,
    settings: TrackSettings,
    phase: Phase<S::Elements>,
    cycle: u64,
}

impl<S: ElementSource, R: Renderer> Tracker<S, R> {
    pub fn new(source: S, renderer: R, settings: TrackSettings) -> Self {
        Self {
            source,
            renderer,
            settings,
            phase: Phase::Bootstrapping,
            cycle: 0,
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        matches!(self.phase, Phase::CycleRunning { .. })
    }

    #[cfg(test)]
    fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Refresh stale elements, load them and prepare the render sink.
    /// Every error here is fatal.
    pub fn bootstrap(&mut self, now: DateTime<Utc>) -> Result<(), TrackError> {
        let elements = self.start(now)?;
        self.phase = Phase::CycleRunning { elements };
        Ok(())
    }

    fn start(&mut self, now: DateTime<Utc>) -> Result<S::Elements, TrackError> {
        log::info!("Bootstrapping tracker for NORAD {}", self.settings.norad_id);
        self.refresh_if_stale(now)?;
        let elements = self.source.load()?;
        if let Some(name) = elements.object_name() {
            log::info!("Loaded elements for {}", name);
        }
        self.renderer.prepare()?;
        Ok(elements)
    }

    fn refresh_if_stale(&mut self, now: DateTime<Utc>) -> Result<bool, SourceError> {
        let age = self.source.age_days(now)?;
        let threshold = self.settings.staleness_threshold_days;
        if !needs_refresh(age, threshold) {
            log::debug!("Element set is fresh ({:?} days old)", age);
            return Ok(false);
        }

        match age {
            Some(age) => log::info!(
                "Element set is {:.2} days old (threshold {:.2}), refreshing",
                age,
                threshold
            ),
            None => log::info!("No element set available yet, fetching"),
        }
        self.source.refresh()?;
        Ok(true)
    }

    /// Run one polling cycle at `now`: compute the current subpoint and the
    /// trajectory, then hand both to the renderer.
    ///
    /// Nothing is rendered when any propagation in the cycle fails.
    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<(), TrackError> {
        let now = now.trunc_subsecs(0);
        self.cycle += 1;

        let elements = match std::mem::replace(&mut self.phase, Phase::Bootstrapping) {
            Phase::Bootstrapping => self.start(now)?,
            Phase::CycleRunning { elements } => {
                if self.settings.staleness_check == StalenessCheck::EveryCycle
                    && self.refresh_if_stale(now)?
                {
                    self.source.load()?
                } else {
                    elements
                }
            }
        };

        let computed = compute_frame(&elements, now, self.settings.orbit_duration_minutes);
        let satellite = elements
            .object_name()
            .unwrap_or_else(|| format!("NORAD {}", self.settings.norad_id));
        self.phase = Phase::CycleRunning { elements };
        let (current, trajectory) = computed?;

        let frame = Frame {
            cycle: self.cycle,
            satellite,
            norad_id: self.settings.norad_id,
            current,
            trajectory,
        };
        self.renderer.render(&frame)?;

        log::info!(
            "Cycle {}: {} at lat {:.4}, lon {:.4}, alt {:.1} km ({} track points)",
            frame.cycle,
            frame.satellite,
            frame.current.latitude_deg,
            frame.current.longitude_deg,
            frame.current.altitude_km,
            frame.trajectory.len()
        );
        Ok(())
    }

    /// Poll until `stop_rx` fires or a fatal error occurs.
    ///
    /// The stop signal is only observed between cycles, while sleeping.
    pub async fn run(mut self, mut stop_rx: oneshot::Receiver<()>) -> Result<(), TrackError> {
        let interval = self.settings.update_interval;
        loop {
            match self.run_cycle(Utc::now()) {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => log::error!("Cycle {} failed: {}", self.cycle, err),
            }

            let should_stop = tokio::select! {
                _ = sleep(interval) => false,
                _ = &mut stop_rx => true,
            };
            if should_stop {
                log::info!("Stop requested after cycle {}", self.cycle);
                return Ok(());
            }
        }
    }
}

/// Absent elements, or elements older than the threshold, need a refresh.
pub fn needs_refresh(age_days: Option<f64>, threshold_days: f64) -> bool {
    match age_days {
        Some(age) => age > threshold_days,
        None => true,
    }
}

pub fn compute_frame<P: Propagator + ?Sized>(
    propagator: &P,
    now: DateTime<Utc>,
    orbit_duration_minutes: u32,
) -> Result<(Subpoint, Trajectory), PropagationError> {
    let current = project(&propagator.propagate(now)?);
    let trajectory = predict_from(propagator, current, orbit_duration_minutes)?;
    Ok((current, trajectory))
}
