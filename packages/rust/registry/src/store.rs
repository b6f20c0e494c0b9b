//! Registry file load/save.
//!
//! A missing or malformed registry is fatal: no default is ever synthesized
//! on load. Use [`init`] to create the empty registry explicitly.

use std::path::Path;

use glyphsync_shared::{GlyphRegistry, GlyphSyncError, Result, write_atomic};
use tracing::{debug, info, instrument};

/// Load and validate the registry at `path`.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<GlyphRegistry> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        let message = if e.kind() == std::io::ErrorKind::NotFound {
            "registry file not found (run `glyphsync init` to create one)".to_string()
        } else {
            format!("cannot read registry: {e}")
        };
        GlyphSyncError::store(path, message)
    })?;

    let registry: GlyphRegistry = serde_json::from_str(&content)
        .map_err(|e| GlyphSyncError::store(path, format!("invalid registry JSON: {e}")))?;

    registry
        .validate()
        .map_err(|e| GlyphSyncError::store(path, e.to_string()))?;

    debug!(glyphs = registry.len(), "loaded registry");
    Ok(registry)
}

/// Serialize the registry exactly as [`save`] writes it.
pub fn to_json(registry: &GlyphRegistry) -> Result<String> {
    let mut json = serde_json::to_string_pretty(registry)
        .map_err(|e| GlyphSyncError::validation(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Replace the registry file at `path` with `registry`.
///
/// The write goes through a temporary file and an atomic rename, so an
/// interrupted save leaves the previous registry intact.
#[instrument(skip_all, fields(path = %path.display(), glyphs = registry.len()))]
pub fn save(path: &Path, registry: &GlyphRegistry) -> Result<()> {
    let json = to_json(registry)?;
    write_atomic(path, json.as_bytes())
        .map_err(|e| GlyphSyncError::store(path, format!("cannot write registry: {e}")))?;
    info!("saved registry");
    Ok(())
}

/// Create an empty registry at `path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(GlyphSyncError::store(
            path,
            "registry already exists (use --force to reset it)",
        ));
    }
    save(path, &GlyphRegistry::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphsync_shared::GlyphInfo;
    use indexmap::IndexMap;

    fn sample() -> GlyphRegistry {
        let mut registry = GlyphRegistry::default();
        for (i, id) in ["home", "star"].iter().enumerate() {
            registry.order.push(id.to_string());
            registry.info.insert(
                id.to_string(),
                GlyphInfo {
                    urls: IndexMap::from([(
                        "baseline".to_string(),
                        format!("baseline-{id}-24px.svg"),
                    )]),
                    unicode_id: 0xE000 + i as u32,
                },
            );
        }
        registry
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphs_data.json");

        save(&path, &sample()).expect("save");
        let loaded = load(&path).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn save_is_deterministic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphs_data.json");

        save(&path, &sample()).expect("save");
        let first = std::fs::read(&path).expect("read");
        let reloaded = load(&path).expect("load");
        save(&path, &reloaded).expect("save again");
        assert_eq!(first, std::fs::read(&path).expect("read"));
    }

    #[test]
    fn load_missing_file_is_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load(&dir.path().join("glyphs_data.json")).unwrap_err();
        assert!(matches!(err, GlyphSyncError::Store { .. }));
        assert!(err.to_string().contains("glyphsync init"));
    }

    #[test]
    fn load_malformed_file_is_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphs_data.json");
        std::fs::write(&path, "{\"order\": [").expect("write");

        let err = load(&path).unwrap_err();
        assert!(matches!(err, GlyphSyncError::Store { .. }));
    }

    #[test]
    fn load_inconsistent_registry_is_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphs_data.json");
        std::fs::write(&path, r#"{"order": ["home"], "info": {}}"#).expect("write");

        let err = load(&path).unwrap_err();
        assert!(matches!(err, GlyphSyncError::Store { .. }));
        assert!(err.to_string().contains("no info entry"));
    }

    #[test]
    fn init_creates_empty_registry_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphs_data.json");

        init(&path, false).expect("init");
        assert!(load(&path).expect("load").is_empty());

        save(&path, &sample()).expect("save");
        assert!(init(&path, false).is_err());
        assert_eq!(load(&path).expect("load").len(), 2);

        init(&path, true).expect("forced init");
        assert!(load(&path).expect("load").is_empty());
    }
}
