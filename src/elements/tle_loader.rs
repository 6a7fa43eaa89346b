use std::fs;
use std::path::Path;

use crate::elements::error::SourceError;
use crate::elements::types::OrbitalElementSet;

/// Load the element set of `norad_id` from a TLE file.
pub fn load_satellite(path: &Path, norad_id: u32) -> Result<OrbitalElementSet, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    find_satellite(&content, &filename, norad_id)
}

/// Pick `norad_id` out of TLE text that may hold several satellites.
///
/// Entries that fail to parse are skipped; CelesTrak group files
/// occasionally carry a broken entry unrelated to the one we want.
pub fn find_satellite(
    content: &str,
    source: &str,
    norad_id: u32,
) -> Result<OrbitalElementSet, SourceError> {
    let mut last_error = None;

    for (name, line1, line2) in parse_multi_tle(content) {
        match OrbitalElementSet::from_tle(name, &line1, &line2, source) {
            Ok(set) if set.norad_id == norad_id => return Ok(set),
            Ok(_) => {}
            Err(e) => {
                log::warn!("Skipping TLE entry in {}: {}", source, e);
                last_error = Some(e);
            }
        }
    }

    // A lone broken entry is more useful to report than "not found".
    match last_error {
        Some(err @ SourceError::InvalidTle { .. }) if catalog_numbers(content) == [norad_id] => {
            Err(err)
        }
        _ => Err(SourceError::SatelliteNotFound {
            norad_id,
            file: source.to_string(),
        }),
    }
}

/// Parse multi-satellite TLE content
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            // 2-line TLE (no name)
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            // 3-line TLE (with name)
            result.push((
                Some(lines[i].to_string()),
                lines[i + 1].to_string(),
                lines[i + 2].to_string(),
            ));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}

// Catalog numbers from line 1 columns 3-7, without a full parse.
fn catalog_numbers(content: &str) -> Vec<u32> {
    parse_multi_tle(content)
        .iter()
        .filter_map(|(_, line1, _)| line1.get(2..7)?.trim().parse().ok())
        .collect()
}
