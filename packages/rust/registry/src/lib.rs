//! Local registry persistence and manifest export.
//!
//! - [`store`] loads and atomically saves `glyphs_data.json`
//! - [`export`] renders the registry as the plain-text glyph list

pub mod export;
pub mod store;

pub use export::{export_manifest, render_manifest};
pub use store::{init, load, save, to_json};
