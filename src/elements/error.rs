use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("TLE file not found: {0}")]
    NotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Download failed: {0}")]
    Download(String),
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
    #[error("NORAD {norad_id} not found in {file}")]
    SatelliteNotFound { norad_id: u32, file: String },
}
