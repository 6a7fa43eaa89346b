use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::elements::error::SourceError;
use crate::elements::tle_loader::{find_satellite, load_satellite};
use crate::elements::types::OrbitalElementSet;
use crate::tracker::Propagator;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const MILLISECONDS_PER_DAY: f64 = 86_400_000.0;

pub trait ElementSource {
    type Elements: Propagator;

    /// Age of the stored elements in days, `None` when nothing is stored.
    fn age_days(&self, now: DateTime<Utc>) -> Result<Option<f64>, SourceError>;

    /// Replace the stored elements with a fresh copy.
    fn refresh(&mut self) -> Result<(), SourceError>;

    fn load(&self) -> Result<Self::Elements, SourceError>;
}

pub fn celestrak_url(norad_id: u32) -> String {
    format!(
        "https://celestrak.org/NORAD/elements/gp.php?CATNR={}&FORMAT=TLE",
        norad_id
    )
}

/// Elements of one satellite kept in a TLE file and refreshed over HTTP.
/// The age is the file's modification age.
pub struct TleFileSource {
    path: PathBuf,
    url: String,
    norad_id: u32,
}

impl TleFileSource {
    pub fn new(path: PathBuf, url: String, norad_id: u32) -> Self {
        Self {
            path,
            url,
            norad_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn download(&self) -> Result<String, SourceError> {
        log::info!(
            "Downloading elements for NORAD {} from {}",
            self.norad_id,
            self.url
        );

        let response = ureq::get(&self.url)
            .timeout(DOWNLOAD_TIMEOUT)
            .call()
            .map_err(|e| SourceError::Download(e.to_string()))?;

        response
            .into_string()
            .map_err(|e| SourceError::Download(format!("Failed to read response: {}", e)))
    }
}

impl ElementSource for TleFileSource {
    type Elements = OrbitalElementSet;

    fn age_days(&self, now: DateTime<Utc>) -> Result<Option<f64>, SourceError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let modified: DateTime<Utc> = metadata.modified()?.into();
        Ok(Some(age_in_days(modified, now)))
    }

    fn refresh(&mut self) -> Result<(), SourceError> {
        let body = self.download()?;

        // CelesTrak answers unknown catalog numbers with a 200 and a short
        // text body; keep the old file rather than storing that.
        let set = find_satellite(&body, &self.url, self.norad_id)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &body)?;
        fs::rename(&temp_path, &self.path)?;

        log::info!(
            "Stored elements for {} (epoch {}) in {}",
            set.name,
            set.epoch,
            self.path.display()
        );
        Ok(())
    }

    fn load(&self) -> Result<OrbitalElementSet, SourceError> {
        load_satellite(&self.path, self.norad_id)
    }
}

fn age_in_days(produced: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - produced).num_milliseconds() as f64 / MILLISECONDS_PER_DAY).max(0.0)
}
