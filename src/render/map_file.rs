use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use askama::Template;

use crate::render::{RenderError, Renderer};
use crate::tracker::Frame;

struct Marker {
    lat: f64,
    lon: f64,
    tooltip_json: String,
}

#[derive(Template)]
#[template(path = "map.html")]
struct MapTemplate {
    title: String,
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    refresh_seconds: u64,
    marker: Option<Marker>,
    track_json: String,
}

/// Self-reloading HTML map file, rewritten on every frame.
pub struct MapFile {
    path: PathBuf,
    zoom: u8,
    refresh: Duration,
}

impl MapFile {
    pub fn new(path: PathBuf, zoom: u8, refresh: Duration) -> Self {
        Self {
            path,
            zoom,
            refresh,
        }
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn write(&self, template: &MapTemplate) -> Result<(), RenderError> {
        let html = template.render()?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, html)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn refresh_seconds(&self) -> u64 {
        self.refresh.as_secs().max(1)
    }
}

impl Renderer for MapFile {
    /// The destination directory must already exist; a blank map is written
    /// so the file can be opened before the first frame arrives.
    fn prepare(&mut self) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(RenderError::MissingDestination(parent.display().to_string()));
            }
        }

        self.write(&MapTemplate {
            title: "Satellite tracker".to_string(),
            center_lat: 0.0,
            center_lon: 0.0,
            zoom: self.zoom,
            refresh_seconds: self.refresh_seconds(),
            marker: None,
            track_json: "[]".to_string(),
        })?;
        log::info!("Blank map written to {}", self.path.display());
        Ok(())
    }

    fn render(&mut self, frame: &Frame) -> Result<(), RenderError> {
        let current = &frame.current;
        let tooltip = format!(
            "{} (Lat: {:.4}, Lon: {:.4})",
            frame.satellite, current.latitude_deg, current.longitude_deg
        );

        self.write(&MapTemplate {
            title: frame.satellite.clone(),
            center_lat: current.latitude_deg,
            center_lon: current.longitude_deg,
            zoom: self.zoom,
            refresh_seconds: self.refresh_seconds(),
            marker: Some(Marker {
                lat: current.latitude_deg,
                lon: current.longitude_deg,
                tooltip_json: serde_json::to_string(&tooltip)?,
            }),
            track_json: serde_json::to_string(&frame.trajectory.coordinates())?,
        })
    }
}
