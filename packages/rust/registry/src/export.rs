//! Plain-text glyph list (`glyphs_list.txt`).
//!
//! One line per glyph in registry order: `<hex code point> <id> <character>`.

use std::path::Path;

use glyphsync_shared::{GlyphRegistry, GlyphSyncError, Result, write_atomic};
use tracing::{info, instrument};

/// Render the manifest text for `registry`.
pub fn render_manifest(registry: &GlyphRegistry) -> Result<String> {
    let mut out = String::new();
    for id in &registry.order {
        let info = registry.info.get(id).ok_or_else(|| {
            GlyphSyncError::validation(format!("glyph '{id}' has no info entry"))
        })?;
        let ch = char::from_u32(info.unicode_id).ok_or_else(|| {
            GlyphSyncError::validation(format!(
                "glyph '{id}' has invalid code point {:#x}",
                info.unicode_id
            ))
        })?;
        out.push_str(&format!("{:x} {id} {ch}\n", info.unicode_id));
    }
    Ok(out)
}

/// Write the manifest for `registry` to `path`. Returns the number of lines.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn export_manifest(path: &Path, registry: &GlyphRegistry) -> Result<usize> {
    let text = render_manifest(registry).map_err(|e| GlyphSyncError::export(path, e.to_string()))?;
    write_atomic(path, text.as_bytes()).map_err(|e| GlyphSyncError::export(path, e.to_string()))?;

    info!(lines = registry.len(), "exported glyph list");
    Ok(registry.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphsync_shared::GlyphInfo;
    use indexmap::IndexMap;

    fn registry(ids: &[&str], base: u32) -> GlyphRegistry {
        let mut registry = GlyphRegistry::default();
        for (i, id) in ids.iter().enumerate() {
            registry.order.push(id.to_string());
            registry.info.insert(
                id.to_string(),
                GlyphInfo {
                    urls: IndexMap::new(),
                    unicode_id: base + i as u32,
                },
            );
        }
        registry
    }

    #[test]
    fn renders_one_line_per_glyph_in_order() {
        let text = render_manifest(&registry(&["home", "star"], 0xE000)).expect("render");
        assert_eq!(text, "e000 home \u{e000}\ne001 star \u{e001}\n");
    }

    #[test]
    fn follows_order_not_map_order() {
        let mut reg = registry(&["a", "b", "c"], 0xE000);
        // Scramble the map; the manifest must still follow `order`.
        reg.info.reverse();
        let text = render_manifest(&reg).expect("render");
        let ids: Vec<_> = text
            .lines()
            .map(|l| l.split(' ').nth(1).unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_registry_renders_nothing() {
        assert_eq!(render_manifest(&GlyphRegistry::default()).expect("render"), "");
    }

    #[test]
    fn invalid_code_point_is_rejected() {
        let reg = registry(&["bad"], 0xD800);
        assert!(render_manifest(&reg).is_err());
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glyphs_list.txt");

        let lines = export_manifest(&path, &registry(&["home", "star", "zoom"], 0xE000))
            .expect("export");
        assert_eq!(lines, 3);

        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("e000 home"));
    }

    #[test]
    fn export_to_missing_directory_is_export_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("glyphs_list.txt");

        let err = export_manifest(&path, &registry(&["home"], 0xE000)).unwrap_err();
        assert!(matches!(err, GlyphSyncError::Export { .. }));
    }
}
