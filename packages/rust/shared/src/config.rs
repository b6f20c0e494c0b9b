//! Application configuration for glyphsync.
//!
//! Config is read from `--config <path>`, then `./glyphsync.toml`, then
//! `~/.glyphsync/glyphsync.toml`. Missing files fall back to defaults.
//! The file-level [`AppConfig`] is validated into an immutable [`SyncConfig`]
//! which is what every component receives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GlyphSyncError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "glyphsync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".glyphsync";

/// Placeholder for the glyph identifier in the artwork pattern.
const ID_PLACEHOLDER: &str = "{id}";

/// Placeholder for the style name in the artwork pattern.
const STYLE_PLACEHOLDER: &str = "{style}";

// ---------------------------------------------------------------------------
// Config structs (matching glyphsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local file locations.
    #[serde(default)]
    pub paths: PathsSection,

    /// Remote catalog and artwork endpoints.
    #[serde(default)]
    pub remote: RemoteSection,

    /// Code point and style settings.
    #[serde(default)]
    pub glyphs: GlyphsSection,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    /// Registry JSON file.
    #[serde(default = "default_registry")]
    pub registry: PathBuf,

    /// Plain-text manifest output.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Root of the per-style artwork tree.
    #[serde(default = "default_glyphs_dir")]
    pub glyphs_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            manifest: default_manifest(),
            glyphs_dir: default_glyphs_dir(),
        }
    }
}

fn default_registry() -> PathBuf {
    PathBuf::from("glyphs_data.json")
}
fn default_manifest() -> PathBuf {
    PathBuf::from("glyphs_list.txt")
}
fn default_glyphs_dir() -> PathBuf {
    PathBuf::from("glyphs")
}

/// `[remote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSection {
    /// Location of the remote glyph catalog document.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Base URL that relative artwork locations are resolved against.
    #[serde(default = "default_artwork_base_url")]
    pub artwork_base_url: String,

    /// HTTP timeout per request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent artwork downloads.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            artwork_base_url: default_artwork_base_url(),
            timeout_secs: default_timeout_secs(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://material.io/tools/icons/static/data.json".into()
}
fn default_artwork_base_url() -> String {
    "https://material.io/tools/icons/static/icons/".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> u32 {
    4
}

/// `[glyphs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlyphsSection {
    /// First code point handed out; glyph `i` in order gets `base_offset + i`.
    #[serde(default = "default_base_offset")]
    pub base_offset: u32,

    /// Known styles, in the order their default URLs are recorded.
    #[serde(default = "default_styles")]
    pub styles: Vec<String>,

    /// Remote artwork file name used when the catalog gives no explicit URL.
    /// `{style}` and `{id}` are substituted.
    #[serde(default = "default_artwork_pattern")]
    pub artwork_pattern: String,
}

impl Default for GlyphsSection {
    fn default() -> Self {
        Self {
            base_offset: default_base_offset(),
            styles: default_styles(),
            artwork_pattern: default_artwork_pattern(),
        }
    }
}

fn default_base_offset() -> u32 {
    0xE000
}
fn default_styles() -> Vec<String> {
    ["baseline", "outline", "round", "twotone", "sharp"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_artwork_pattern() -> String {
    "{style}-{id}-24px.svg".into()
}

// ---------------------------------------------------------------------------
// Runtime config (validated, immutable)
// ---------------------------------------------------------------------------

/// Validated remote settings.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote catalog document.
    pub catalog_url: Url,
    /// Base for relative artwork locations (always ends with `/`).
    pub artwork_base_url: Url,
    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
    /// Maximum concurrent artwork downloads (at least 1).
    pub concurrency: usize,
}

/// Validated glyph settings.
#[derive(Debug, Clone)]
pub struct GlyphConfig {
    /// First assigned code point.
    pub base_offset: u32,
    /// Known styles.
    pub styles: Vec<String>,
    /// Default remote artwork file name pattern.
    pub artwork_pattern: String,
}

impl GlyphConfig {
    /// Default remote artwork name for one glyph in one style.
    pub fn artwork_name(&self, style: &str, glyph_id: &str) -> String {
        self.artwork_pattern
            .replace(STYLE_PLACEHOLDER, style)
            .replace(ID_PLACEHOLDER, glyph_id)
    }
}

/// Runtime configuration handed to every component.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Registry JSON file.
    pub registry_path: PathBuf,
    /// Manifest output file.
    pub manifest_path: PathBuf,
    /// Root of the per-style artwork tree.
    pub glyphs_dir: PathBuf,
    /// Remote endpoints.
    pub remote: RemoteConfig,
    /// Code point and style settings.
    pub glyphs: GlyphConfig,
}

impl TryFrom<&AppConfig> for SyncConfig {
    type Error = GlyphSyncError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let catalog_url = Url::parse(&config.remote.catalog_url).map_err(|e| {
            GlyphSyncError::config(format!(
                "invalid catalog_url '{}': {e}",
                config.remote.catalog_url
            ))
        })?;

        // Url::join drops the last path segment unless the base ends with '/'.
        let mut base = config.remote.artwork_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let artwork_base_url = Url::parse(&base).map_err(|e| {
            GlyphSyncError::config(format!(
                "invalid artwork_base_url '{}': {e}",
                config.remote.artwork_base_url
            ))
        })?;

        if config.remote.concurrency == 0 {
            return Err(GlyphSyncError::config("concurrency must be at least 1"));
        }
        if config.remote.timeout_secs == 0 {
            return Err(GlyphSyncError::config("timeout_secs must be at least 1"));
        }

        if config.glyphs.styles.is_empty() {
            return Err(GlyphSyncError::config("styles must not be empty"));
        }
        if let Some(bad) = config.glyphs.styles.iter().find(|s| !crate::is_valid_glyph_id(s)) {
            return Err(GlyphSyncError::config(format!(
                "style '{bad}' is not a valid directory name"
            )));
        }

        if !config.glyphs.artwork_pattern.contains(ID_PLACEHOLDER) {
            return Err(GlyphSyncError::config(format!(
                "artwork_pattern '{}' must contain {ID_PLACEHOLDER}",
                config.glyphs.artwork_pattern
            )));
        }

        Ok(Self {
            registry_path: config.paths.registry.clone(),
            manifest_path: config.paths.manifest.clone(),
            glyphs_dir: config.paths.glyphs_dir.clone(),
            remote: RemoteConfig {
                catalog_url,
                artwork_base_url,
                timeout_secs: config.remote.timeout_secs,
                concurrency: config.remote.concurrency as usize,
            },
            glyphs: GlyphConfig {
                base_offset: config.glyphs.base_offset,
                styles: config.glyphs.styles.clone(),
                artwork_pattern: config.glyphs.artwork_pattern.clone(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.glyphsync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| GlyphSyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.glyphsync/glyphsync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// An explicit path must exist. Otherwise `./glyphsync.toml` and then the user
/// config file are tried; defaults are returned when neither exists.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return load_config_from(&local);
    }

    match config_file_path() {
        Ok(path) if path.is_file() => load_config_from(&path),
        _ => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| GlyphSyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        GlyphSyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `path` (or `./glyphsync.toml`).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = path.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), Path::to_path_buf);
    if path.exists() {
        return Err(GlyphSyncError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| GlyphSyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| GlyphSyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("glyphs_data.json"));
        assert!(toml_str.contains("57344"));
        assert!(toml_str.contains("twotone"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.glyphs.base_offset, 0xE000);
        assert_eq!(parsed.glyphs.styles.len(), 5);
        assert_eq!(parsed.remote.concurrency, 4);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[glyphs]
base_offset = 61440
styles = ["filled"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.glyphs.base_offset, 0xF000);
        assert_eq!(config.glyphs.styles, vec!["filled"]);
        assert_eq!(config.glyphs.artwork_pattern, "{style}-{id}-24px.svg");
        assert_eq!(config.paths.manifest, PathBuf::from("glyphs_list.txt"));
    }

    #[test]
    fn sync_config_from_app_config() {
        let sync = SyncConfig::try_from(&AppConfig::default()).expect("valid defaults");
        assert_eq!(sync.glyphs.base_offset, 0xE000);
        assert_eq!(sync.remote.concurrency, 4);
        assert_eq!(
            sync.remote.catalog_url.as_str(),
            "https://material.io/tools/icons/static/data.json"
        );
    }

    #[test]
    fn artwork_base_gets_trailing_slash() {
        let mut app = AppConfig::default();
        app.remote.artwork_base_url = "https://cdn.example.com/icons".into();
        let sync = SyncConfig::try_from(&app).expect("valid");
        let joined = sync.remote.artwork_base_url.join("a.svg").expect("join");
        assert_eq!(joined.as_str(), "https://cdn.example.com/icons/a.svg");
    }

    #[test]
    fn rejects_invalid_settings() {
        let mut app = AppConfig::default();
        app.glyphs.styles.clear();
        assert!(SyncConfig::try_from(&app).is_err());

        let mut app = AppConfig::default();
        app.glyphs.artwork_pattern = "{style}-24px.svg".into();
        let err = SyncConfig::try_from(&app).unwrap_err();
        assert!(err.to_string().contains("{id}"));

        let mut app = AppConfig::default();
        app.remote.concurrency = 0;
        assert!(SyncConfig::try_from(&app).is_err());

        let mut app = AppConfig::default();
        app.remote.timeout_secs = 0;
        let err = SyncConfig::try_from(&app).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));

        let mut app = AppConfig::default();
        app.remote.catalog_url = "not a url".into();
        assert!(SyncConfig::try_from(&app).is_err());

        let mut app = AppConfig::default();
        app.glyphs.styles = vec!["../escape".into()];
        assert!(SyncConfig::try_from(&app).is_err());
    }

    #[test]
    fn artwork_name_substitutes_placeholders() {
        let sync = SyncConfig::try_from(&AppConfig::default()).expect("valid");
        assert_eq!(
            sync.glyphs.artwork_name("outline", "home"),
            "outline-home-24px.svg"
        );
    }

    #[test]
    fn load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn init_config_refuses_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphsync.toml");
        init_config(Some(&path)).expect("first init");
        let loaded = load_config_from(&path).expect("load written config");
        assert_eq!(loaded.glyphs.base_offset, 0xE000);
        assert!(init_config(Some(&path)).is_err());
    }
}
