//! Atomic file writes.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{GlyphSyncError, Result};

/// Write `contents` to `path` atomically.
///
/// The data goes to a temporary file in the destination directory, which is
/// then renamed over `path`. Readers see either the old file or the complete
/// new one. The temporary file is removed if any step fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| GlyphSyncError::io(dir, e))?;
    tmp.write_all(contents)
        .map_err(|e| GlyphSyncError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| GlyphSyncError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| GlyphSyncError::io(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}
