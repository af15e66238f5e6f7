// ABOUTME: Loader for field profiles: a name, an optional default URL, and the fields to extract.
// ABOUTME: Provides the embedded default catalog profile and reading profiles from JSON files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::extractors::field::{FieldSet, FieldSpec};

/// Embedded JSON for the default catalog profile.
const BUILTIN_PROFILE_JSON: &str = include_str!("../../data/chitai_gorod.json");

/// A named list of fields, optionally with the page they were written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    pub fields: Vec<FieldSpec>,
}

impl Profile {
    /// Parse a profile from JSON text.
    pub fn from_json(json: &str, origin: &str) -> Result<Self, ScrapeError> {
        serde_json::from_str(json).map_err(|e| {
            ScrapeError::config(
                origin,
                "LoadProfile",
                Some(anyhow::anyhow!("invalid profile JSON: {}", e)),
            )
        })
    }

    /// Compile the profile's fields.
    pub fn compile(&self) -> Result<FieldSet, ScrapeError> {
        FieldSet::compile(self.fields.iter().cloned())
    }
}

/// Loads the embedded default profile (the chitai-gorod manga catalog).
///
/// # Panics
///
/// Panics if the embedded JSON is malformed.
pub fn load_builtin_profile() -> Profile {
    serde_json::from_str(BUILTIN_PROFILE_JSON).expect("failed to parse builtin profile")
}

/// Reads a profile from a JSON file.
pub fn load_profile(path: &Path) -> Result<Profile, ScrapeError> {
    let origin = path.display().to_string();
    let json = fs::read_to_string(path).map_err(|e| {
        ScrapeError::config(
            origin.clone(),
            "LoadProfile",
            Some(anyhow::anyhow!("failed to read profile: {}", e)),
        )
    })?;
    Profile::from_json(&json, &origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::field::ExtractMode;

    #[test]
    fn builtin_profile_has_catalog_fields() {
        let profile = load_builtin_profile();
        let names: Vec<_> = profile.fields.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["title", "author", "price", "link"]);
        assert!(profile
            .url
            .as_deref()
            .is_some_and(|u| u.starts_with("https://www.chitai-gorod.ru/")));
    }

    #[test]
    fn builtin_profile_link_reads_href() {
        let profile = load_builtin_profile();
        let link = profile.fields.iter().find(|f| f.name() == "link").unwrap();
        assert_eq!(link.extract(), &ExtractMode::Attribute("href".to_string()));
    }

    #[test]
    fn builtin_profile_compiles() {
        let set = load_builtin_profile().compile().expect("builtin profile compiles");
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn load_profile_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{"name":"shop","fields":[{"name":"title","path":"h2.title"}]}"#,
        )
        .unwrap();

        let profile = load_profile(&path).unwrap();
        assert_eq!(profile.name, "shop");
        assert!(profile.url.is_none());
        assert_eq!(profile.fields.len(), 1);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = load_profile(Path::new("/nonexistent/profile.json")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = Profile::from_json("{\"name\": ", "inline").unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.target, "inline");
    }
}
