//! Registry data model.

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GlyphSyncError, Result};

/// Identifiers and style names end up as path components.
static GLYPH_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").expect("glyph id regex"));

/// Whether `id` is usable as a glyph identifier (and file name).
pub fn is_valid_glyph_id(id: &str) -> bool {
    GLYPH_ID_RE.is_match(id)
}

// ---------------------------------------------------------------------------
// GlyphInfo
// ---------------------------------------------------------------------------

/// Per-glyph registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphInfo {
    /// Style name → artwork location (absolute URL or name relative to the
    /// artwork base URL).
    pub urls: IndexMap<String, String>,
    /// Assigned private-use code point.
    pub unicode_id: u32,
}

// ---------------------------------------------------------------------------
// GlyphRegistry
// ---------------------------------------------------------------------------

/// The persisted glyph registry (`glyphs_data.json`).
///
/// `order` is append-only; the code point of `order[i]` is `base_offset + i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphRegistry {
    /// Glyph identifiers in assignment order.
    pub order: Vec<String>,
    /// Identifier → entry. Serialized in `order` sequence.
    pub info: IndexMap<String, GlyphInfo>,
}

impl GlyphRegistry {
    /// Number of glyphs in the registry.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry holds no glyphs.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate `(identifier, entry)` pairs in `order` sequence.
    ///
    /// Identifiers without an entry are skipped; [`validate`](Self::validate)
    /// rules that out for loaded registries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GlyphInfo)> {
        self.order
            .iter()
            .filter_map(|id| self.info.get(id).map(|info| (id.as_str(), info)))
    }

    /// Check the structural invariants of a registry read from disk.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.order.len());
        for id in &self.order {
            if !is_valid_glyph_id(id) {
                return Err(GlyphSyncError::validation(format!(
                    "invalid glyph identifier '{id}'"
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(GlyphSyncError::validation(format!(
                    "duplicate glyph identifier '{id}' in order"
                )));
            }
            if !self.info.contains_key(id) {
                return Err(GlyphSyncError::validation(format!(
                    "glyph '{id}' has no info entry"
                )));
            }
        }

        if let Some(orphan) = self.info.keys().find(|id| !seen.contains(id.as_str())) {
            return Err(GlyphSyncError::validation(format!(
                "info entry '{orphan}' is missing from order"
            )));
        }

        for (id, info) in &self.info {
            if let Some(style) = info.urls.keys().find(|s| !is_valid_glyph_id(s)) {
                return Err(GlyphSyncError::validation(format!(
                    "glyph '{id}' has invalid style name '{style}'"
                )));
            }
        }

        Ok(())
    }

    /// Check that every glyph sits at `base_offset + index`.
    ///
    /// A registry written with another base, or edited by hand, would have
    /// every code point reassigned on the next append.
    pub fn check_code_points(&self, base_offset: u32) -> Result<()> {
        for (index, (id, info)) in self.iter().enumerate() {
            let expected = u32::try_from(index)
                .ok()
                .and_then(|i| base_offset.checked_add(i));
            if expected != Some(info.unicode_id) {
                return Err(GlyphSyncError::validation(format!(
                    "glyph '{id}' at position {index} has code point {:#x}, expected base {base_offset:#x} + {index}",
                    info.unicode_id
                )));
            }
        }
        Ok(())
    }
}
