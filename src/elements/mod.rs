mod error;
mod source;
mod tle_loader;
mod types;

pub use error::SourceError;
pub use source::{celestrak_url, ElementSource, TleFileSource};
