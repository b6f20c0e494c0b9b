//! Registry merge: reconcile the local registry with the remote catalog.
//!
//! New identifiers are appended to `order` in catalog order. When anything was
//! appended, every `info` entry is rebuilt from its position in `order`, so
//! `unicode_id` is always `base_offset + index`. Because `order` only grows at
//! the end, rebuilding never changes an existing glyph's code point.

use glyphsync_catalog::Catalog;
use glyphsync_shared::{GlyphConfig, GlyphInfo, GlyphRegistry, GlyphSyncError, Result};
use indexmap::IndexMap;
use tracing::{debug, info, instrument};

/// Result of merging a catalog into a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Every catalog identifier was already known. Nothing to save.
    Unchanged,
    /// At least one identifier was appended.
    Updated {
        /// The rebuilt registry.
        registry: GlyphRegistry,
        /// Newly appended identifiers, in the order they were added.
        added: Vec<String>,
    },
}

/// Merge `catalog` into `current`. `current` is never modified.
#[instrument(skip_all, fields(known = current.len(), remote = catalog.ids.len()))]
pub fn merge(
    current: &GlyphRegistry,
    catalog: &Catalog,
    glyphs: &GlyphConfig,
) -> Result<MergeOutcome> {
    let mut order = current.order.clone();
    let mut added = Vec::new();

    for id in &catalog.ids {
        if !current.info.contains_key(id) {
            debug!(%id, "new glyph");
            order.push(id.clone());
            added.push(id.clone());
        }
    }

    if added.is_empty() {
        info!("no new glyphs found");
        return Ok(MergeOutcome::Unchanged);
    }

    // Iterate `order`, never the map: position alone decides the code point.
    let mut entries = IndexMap::with_capacity(order.len());
    for (index, id) in order.iter().enumerate() {
        let urls = catalog
            .override_for(id)
            .cloned()
            .unwrap_or_else(|| default_urls(glyphs, id));
        entries.insert(
            id.clone(),
            GlyphInfo {
                urls,
                unicode_id: code_point(glyphs.base_offset, index)?,
            },
        );
    }

    let registry = GlyphRegistry {
        order,
        info: entries,
    };
    // Never hand back anything the loader would refuse on the next run.
    registry.validate()?;

    info!(added = added.len(), total = registry.len(), "merged new glyphs");

    Ok(MergeOutcome::Updated { registry, added })
}

/// Default artwork locations for `id`, one per configured style.
pub fn default_urls(glyphs: &GlyphConfig, id: &str) -> IndexMap<String, String> {
    glyphs
        .styles
        .iter()
        .map(|style| (style.clone(), glyphs.artwork_name(style, id)))
        .collect()
}

/// Code point for the glyph at `index`.
fn code_point(base_offset: u32, index: usize) -> Result<u32> {
    let value = u32::try_from(index)
        .ok()
        .and_then(|i| base_offset.checked_add(i))
        .ok_or_else(|| {
            GlyphSyncError::validation(format!(
                "code point overflow at index {index} (base {base_offset:#x})"
            ))
        })?;

    if char::from_u32(value).is_none() {
        return Err(GlyphSyncError::validation(format!(
            "code point {value:#x} for index {index} is not a valid character"
        )));
    }

    Ok(value)
}
