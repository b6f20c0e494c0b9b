//! Shared types, error model, and configuration for glyphsync.
//!
//! This crate is the foundation depended on by all other glyphsync crates.
//! It provides:
//! - [`GlyphSyncError`]: the unified error type
//! - The registry data model ([`GlyphRegistry`], [`GlyphInfo`])
//! - Configuration ([`AppConfig`], [`SyncConfig`], config loading)
//! - Atomic file writes ([`write_atomic`])

pub mod config;
pub mod error;
pub mod fs;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GlyphConfig, GlyphsSection, PathsSection, RemoteConfig, RemoteSection,
    SyncConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{GlyphSyncError, Result};
pub use fs::write_atomic;
pub use types::{GlyphInfo, GlyphRegistry, is_valid_glyph_id};
