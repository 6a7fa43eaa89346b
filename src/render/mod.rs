mod json;
mod map_file;

use thiserror::Error;

use crate::tracker::Frame;

pub use json::JsonWriter;
pub use map_file::MapFile;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render destination missing: {0}")]
    MissingDestination(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sink for tracking frames. Calls are synchronous: `render` returns once
/// the frame has fully replaced whatever the sink showed before.
pub trait Renderer {
    /// Called once while bootstrapping, before the first frame.
    fn prepare(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn prepare(&mut self) -> Result<(), RenderError> {
        (**self).prepare()
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        (**self).render(frame)
    }
}

/// Hands every frame to each sink in order, stopping at the first error.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Box<dyn Renderer>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Renderer + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Renderer for Fanout {
    fn prepare(&mut self) -> Result<(), RenderError> {
        self.sinks.iter_mut().try_for_each(|sink| sink.prepare())
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        self.sinks.iter_mut().try_for_each(|sink| sink.render(frame))
    }
}
