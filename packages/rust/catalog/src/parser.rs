//! Remote catalog document parser.
//!
//! The catalog is a JSON document of the form:
//! - `categories`: list of categories
//! - each category: `icons`, a list of glyph entries
//! - each entry: `id` and optionally `imageUrls` (style → artwork URL)
//!
//! Other fields are ignored.

use std::collections::{HashMap, HashSet};

use glyphsync_shared::{GlyphSyncError, Result, is_valid_glyph_id};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RemoteCatalog {
    categories: Vec<RemoteCategory>,
}

#[derive(Debug, Deserialize)]
struct RemoteCategory {
    #[serde(default)]
    name: Option<String>,
    icons: Vec<RemoteGlyph>,
}

#[derive(Debug, Deserialize)]
struct RemoteGlyph {
    id: String,
    #[serde(rename = "imageUrls", default)]
    image_urls: Option<IndexMap<String, String>>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Flattened view of the remote catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Glyph identifiers in first-encounter order, without duplicates.
    pub ids: Vec<String>,
    /// Explicit per-style artwork URLs, where the catalog supplies them.
    pub overrides: HashMap<String, IndexMap<String, String>>,
}

impl Catalog {
    /// Explicit URLs for `id`, if the catalog gave any.
    pub fn override_for(&self, id: &str) -> Option<&IndexMap<String, String>> {
        self.overrides.get(id)
    }
}

/// Parse a catalog document.
///
/// Identifiers and `imageUrls` style names that are not valid file names are
/// skipped with a warning; an override left empty by that is dropped.
/// An identifier listed in several categories keeps its first position; a
/// later non-empty `imageUrls` replaces an earlier one.
pub fn parse_catalog(json: &str) -> Result<Catalog> {
    let remote: RemoteCatalog = serde_json::from_str(json)
        .map_err(|e| GlyphSyncError::parse(format!("invalid catalog document: {e}")))?;

    let mut catalog = Catalog::default();
    let mut seen = HashSet::new();

    for category in remote.categories {
        for glyph in category.icons {
            if !is_valid_glyph_id(&glyph.id) {
                warn!(
                    id = %glyph.id,
                    category = category.name.as_deref().unwrap_or("?"),
                    "skipping glyph with unusable identifier"
                );
                continue;
            }

            if let Some(urls) = glyph.image_urls.map(|urls| usable_styles(&glyph.id, urls)) {
                if !urls.is_empty() {
                    catalog.overrides.insert(glyph.id.clone(), urls);
                }
            }

            if seen.insert(glyph.id.clone()) {
                catalog.ids.push(glyph.id);
            }
        }
    }

    Ok(catalog)
}

/// Drop `imageUrls` entries whose style name cannot be a directory name.
fn usable_styles(id: &str, urls: IndexMap<String, String>) -> IndexMap<String, String> {
    urls.into_iter()
        .filter(|(style, _)| {
            let ok = is_valid_glyph_id(style);
            if !ok {
                warn!(%id, %style, "skipping artwork with unusable style name");
            }
            ok
        })
        .collect()
}
