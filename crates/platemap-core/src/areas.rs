use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One delivery-platform area (coarse neighborhood) to collect listings for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Human-readable label, e.g. `"Florentin"`.
    pub name: String,
    /// Platform query slug, e.g. `"florentin"`.
    pub slug: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AreasFile {
    pub areas: Vec<AreaConfig>,
}

/// Load and validate the areas configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_areas(path: &Path) -> Result<AreasFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::AreasFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let areas_file: AreasFile = serde_yaml::from_str(&content)?;

    validate_areas(&areas_file)?;

    Ok(areas_file)
}

fn validate_areas(file: &AreasFile) -> Result<(), ConfigError> {
    if file.areas.is_empty() {
        return Err(ConfigError::AreasValidation(
            "areas file contains no areas".to_string(),
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for area in &file.areas {
        if area.slug.trim().is_empty() {
            return Err(ConfigError::AreasValidation(format!(
                "area \"{}\" has an empty slug",
                area.name
            )));
        }
        if !seen.insert(area.slug.as_str()) {
            return Err(ConfigError::AreasValidation(format!(
                "duplicate area slug: {}",
                area.slug
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(name: &str, slug: &str) -> AreaConfig {
        AreaConfig {
            name: name.to_string(),
            slug: slug.to_string(),
            notes: None,
        }
    }

    #[test]
    fn validate_accepts_distinct_slugs() {
        let file = AreasFile {
            areas: vec![area("Old North", "old-north"), area("Florentin", "florentin")],
        };
        assert!(validate_areas(&file).is_ok());
    }

    #[test]
    fn validate_rejects_empty_file() {
        let file = AreasFile { areas: vec![] };
        assert!(matches!(
            validate_areas(&file),
            Err(ConfigError::AreasValidation(_))
        ));
    }

    #[test]
    fn validate_rejects_duplicate_slug() {
        let file = AreasFile {
            areas: vec![area("A", "center"), area("B", "center")],
        };
        let err = validate_areas(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate area slug"));
    }

    #[test]
    fn validate_rejects_blank_slug() {
        let file = AreasFile {
            areas: vec![area("Blank", "  ")],
        };
        assert!(matches!(
            validate_areas(&file),
            Err(ConfigError::AreasValidation(_))
        ));
    }

    #[test]
    fn parses_yaml_shape() {
        let raw = "areas:\n  - name: Florentin\n    slug: florentin\n  - name: Old North\n    slug: old-north\n    notes: dense coverage\n";
        let file: AreasFile = serde_yaml::from_str(raw).expect("parse yaml");
        assert_eq!(file.areas.len(), 2);
        assert_eq!(file.areas[1].notes.as_deref(), Some("dense coverage"));
    }
}
