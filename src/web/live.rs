use std::sync::{Arc, Mutex, PoisonError};

use crate::render::{RenderError, Renderer};
use crate::tracker::Frame;

/// Latest frame, shared between the tracking loop and the web handlers.
#[derive(Clone, Default)]
pub struct LiveFrame {
    shared: Arc<Mutex<Option<Frame>>>,
}

impl LiveFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Frame> {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Renderer for LiveFrame {
    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        *self.shared.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame.clone());
        Ok(())
    }
}
