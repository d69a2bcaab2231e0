//! Configuration constants and profile loading for shopline
//!
//! Settings live in an INI file where every section is a named profile:
//!
//! ```ini
//! [default]
//! catalog_url = https://example.com/search
//! image_cache_bytes = 33554432
//! timeout_secs = 30
//! glyphs = unicode
//! ```

use anyhow::{Context, Result};
use ini::Ini;
use std::path::Path;
use std::str::FromStr;

/// Default profile file path for shopline
pub const DEFAULT_PROFILE_PATH: &str = "~/.shopline/profile";

/// Environment variable name for overriding the profile path
pub const PROFILE_PATH_ENV_VAR: &str = "SHOPLINE_PROFILE_PATH";

/// Catalog search endpoint used when the profile does not name one
pub const DEFAULT_CATALOG_URL: &str =
    "https://bdk0sta2n0.execute-api.eu-west-1.amazonaws.com/ios-assignment/search";

/// 32 MiB
pub const DEFAULT_IMAGE_CACHE_BYTES: usize = 32 * 1024 * 1024;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str = concat!("shopline/", env!("CARGO_PKG_VERSION"));

/// Get the profile file path, checking environment variable first, then falling back to default
pub fn get_profile_path() -> String {
    std::env::var_os(PROFILE_PATH_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string())
}

/// Which glyphs decorate review and feature labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyphStyle {
    #[default]
    Unicode,
    Ascii,
    /// No glyphs at all; labels fall back to plain text
    None,
}

impl FromStr for GlyphStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unicode" => Ok(GlyphStyle::Unicode),
            "ascii" => Ok(GlyphStyle::Ascii),
            "none" | "off" => Ok(GlyphStyle::None),
            other => Err(anyhow::anyhow!(
                "Unknown glyph style '{other}' (expected unicode, ascii or none)"
            )),
        }
    }
}

/// Settings for one named profile
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProfile {
    pub name: String,
    pub catalog_url: String,
    pub image_cache_bytes: usize,
    pub timeout_secs: u64,
    pub glyphs: GlyphStyle,
    pub user_agent: String,
}

impl CatalogProfile {
    /// Profile with built-in defaults
    pub fn blank(name: &str) -> Self {
        Self {
            name: name.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            image_cache_bytes: DEFAULT_IMAGE_CACHE_BYTES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            glyphs: GlyphStyle::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Parse a profile section out of INI text.
    ///
    /// Returns `Ok(None)` when the section does not exist.
    pub fn from_ini_str(text: &str, name: &str) -> Result<Option<Self>> {
        let ini = Ini::load_from_str(text).context("Failed to parse profile file")?;
        Self::from_ini(&ini, name)
    }

    fn from_ini(ini: &Ini, name: &str) -> Result<Option<Self>> {
        let Some(section) = ini.section(Some(name)) else {
            return Ok(None);
        };

        let mut profile = Self::blank(name);

        if let Some(url) = section.get("catalog_url") {
            let url = url.trim();
            reqwest::Url::parse(url).with_context(|| format!("Invalid catalog_url '{url}'"))?;
            profile.catalog_url = url.to_string();
        }
        if let Some(bytes) = section.get("image_cache_bytes") {
            profile.image_cache_bytes = bytes
                .trim()
                .parse()
                .with_context(|| format!("Invalid image_cache_bytes '{bytes}'"))?;
        }
        if let Some(secs) = section.get("timeout_secs") {
            profile.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid timeout_secs '{secs}'"))?;
        }
        if let Some(glyphs) = section.get("glyphs") {
            profile.glyphs = glyphs.parse()?;
        }
        if let Some(agent) = section.get("user_agent") {
            profile.user_agent = agent.trim().to_string();
        }

        Ok(Some(profile))
    }
}

/// Load the named profile, falling back to built-in defaults when the file or section is missing
pub fn load_profile(profile_name: &str, profile_path: &str) -> Result<CatalogProfile> {
    let expanded = shellexpand::tilde(profile_path).to_string();
    tracing::debug!("Loading profile '{}' from '{}'", profile_name, expanded);

    if !Path::new(&expanded).exists() {
        tracing::debug!("Profile file '{}' not found, using defaults", expanded);
        return Ok(CatalogProfile::blank(profile_name));
    }

    let ini = Ini::load_from_file(&expanded)
        .with_context(|| format!("Failed to read profile file '{expanded}'"))?;

    match CatalogProfile::from_ini(&ini, profile_name)? {
        Some(profile) => {
            tracing::debug!("Profile loaded, catalog: {}", profile.catalog_url);
            Ok(profile)
        }
        None => {
            tracing::debug!("Profile '{}' not found, using defaults", profile_name);
            Ok(CatalogProfile::blank(profile_name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_profile_path() {
        assert_eq!(DEFAULT_PROFILE_PATH, "~/.shopline/profile");
    }

    #[test]
    fn test_get_profile_path_env_override() {
        let original = std::env::var_os(PROFILE_PATH_ENV_VAR);

        let test_path = "/custom/profile/path";
        std::env::set_var(PROFILE_PATH_ENV_VAR, test_path);
        assert_eq!(get_profile_path(), test_path);

        std::env::remove_var(PROFILE_PATH_ENV_VAR);
        assert_eq!(get_profile_path(), DEFAULT_PROFILE_PATH);

        if let Some(val) = original {
            std::env::set_var(PROFILE_PATH_ENV_VAR, val);
        }
    }

    #[test]
    fn test_blank_profile_uses_defaults() {
        let profile = CatalogProfile::blank("default");
        assert_eq!(profile.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(profile.image_cache_bytes, DEFAULT_IMAGE_CACHE_BYTES);
        assert_eq!(profile.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(profile.glyphs, GlyphStyle::Unicode);
    }

    #[test]
    fn test_profile_section_overrides_defaults() {
        let text = "[dev]\ncatalog_url = http://localhost:9000/search\nimage_cache_bytes = 1024\nglyphs = ascii\n";
        let profile = CatalogProfile::from_ini_str(text, "dev").unwrap().unwrap();
        assert_eq!(profile.name, "dev");
        assert_eq!(profile.catalog_url, "http://localhost:9000/search");
        assert_eq!(profile.image_cache_bytes, 1024);
        assert_eq!(profile.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(profile.glyphs, GlyphStyle::Ascii);
    }

    #[test]
    fn test_missing_section_is_none() {
        let text = "[dev]\ntimeout_secs = 5\n";
        assert!(CatalogProfile::from_ini_str(text, "prod").unwrap().is_none());
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let text = "[default]\nimage_cache_bytes = lots\n";
        let err = CatalogProfile::from_ini_str(text, "default").unwrap_err();
        assert!(err.to_string().contains("image_cache_bytes"));

        let text = "[default]\nglyphs = emoji\n";
        assert!(CatalogProfile::from_ini_str(text, "default").is_err());

        let text = "[default]\ncatalog_url = not a url\n";
        assert!(CatalogProfile::from_ini_str(text, "default").is_err());
    }

    #[test]
    fn test_load_profile_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[default]\ntimeout_secs = 7\nglyphs = none").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let profile = load_profile("default", &path).unwrap();
        assert_eq!(profile.timeout_secs, 7);
        assert_eq!(profile.glyphs, GlyphStyle::None);

        let fallback = load_profile("other", &path).unwrap();
        assert_eq!(fallback, CatalogProfile::blank("other"));
    }

    #[test]
    fn test_load_profile_missing_file_falls_back() {
        let profile = load_profile("default", "/definitely/not/here/profile").unwrap();
        assert_eq!(profile, CatalogProfile::blank("default"));
    }
}
