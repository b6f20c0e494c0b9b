//! SVG background stripping.
//!
//! Catalog artwork ships with an opaque 24×24 background element that carries
//! a `fill` attribute. Font tools import it as a solid square, so every direct
//! child of the root carrying `fill` is removed. Everything else is kept byte
//! for byte.

use glyphsync_shared::{GlyphSyncError, Result};
use roxmltree::{Document, ParsingOptions};

/// Default SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Declaration inserted into roots that lack a namespace.
const XMLNS_ATTR: &str = " xmlns=\"http://www.w3.org/2000/svg\"";

/// Strip fill-bearing top-level elements from an SVG document.
///
/// The root must be an `svg` element. If it has no namespace, the default SVG
/// namespace declaration is added so downstream tools accept the file.
pub fn sanitize_svg(input: &str) -> Result<String> {
    let mut opts = ParsingOptions::default();
    opts.allow_dtd = true;

    let doc = Document::parse_with_options(input, opts)
        .map_err(|e| GlyphSyncError::parse(format!("invalid SVG document: {e}")))?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(GlyphSyncError::parse(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    // (start, end, replacement) in document order.
    let mut edits: Vec<(usize, usize, &str)> = Vec::new();

    if root.tag_name().namespace().is_none() {
        // An unprefixed root: the name starts right after '<'.
        let at = root.range().start + 1 + root.tag_name().name().len();
        edits.push((at, at, XMLNS_ATTR));
    }

    for child in root.children().filter(|n| n.is_element()) {
        if child.attribute("fill").is_some() {
            let range = child.range();
            edits.push((range.start, range.end, ""));
        }
    }

    let mut out = String::with_capacity(input.len() + 48);
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        out.push_str(&input[cursor..start]);
        out.push_str(replacement);
        cursor = end;
    }
    out.push_str(&input[cursor..]);

    Ok(out)
}
