//! Core synchronization logic for glyphsync.
//!
//! This crate ties together catalog retrieval, registry merging, artwork
//! staging, and manifest export into the end-to-end `sync` workflow.

pub mod merge;
pub mod sync;
