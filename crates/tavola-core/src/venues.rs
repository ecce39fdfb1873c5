use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

/// Operator-supplied list of venue names to reconcile.
#[derive(Debug, Deserialize)]
pub struct VenueList {
    pub venues: Vec<String>,
}

/// Load and validate the venue list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (empty list, blank names, duplicate names).
pub fn load_venue_list(path: &Path) -> Result<VenueList, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::VenuesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let list: VenueList = serde_yaml::from_str(&content)?;
    validate_venues(&list)?;

    Ok(list)
}

fn validate_venues(list: &VenueList) -> Result<(), ConfigError> {
    if list.venues.is_empty() {
        return Err(ConfigError::Validation(
            "venue list must contain at least one name".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for name in &list.venues {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "venue names must be non-empty".to_string(),
            ));
        }
        // Duplicate inputs would double-charge the provider for no gain.
        if !seen.insert(name.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate venue name: '{name}'"
            )));
        }
    }

    Ok(())
}
