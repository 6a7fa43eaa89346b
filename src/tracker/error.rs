use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::elements::SourceError;
use crate::render::RenderError;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("propagation failed at {at}: {message}")]
pub struct PropagationError {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl PropagationError {
    pub fn new(at: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            at,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("element source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
    #[error("{0}")]
    Propagation(#[from] PropagationError),
    #[error("render sink error: {0}")]
    RenderSink(#[from] RenderError),
}

impl TrackError {
    /// Fatal errors end the process. A propagation error only fails the
    /// current cycle; the next cycle starts from scratch.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TrackError::Propagation(_))
    }
}
