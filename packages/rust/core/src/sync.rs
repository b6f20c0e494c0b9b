//! End-to-end `sync` run: registry → catalog → merge → save → assets → list.

use std::time::{Duration, Instant};

use glyphsync_assets::{AssetReport, DownloadSummary, Downloader, asset_path, jobs_for};
use glyphsync_catalog::{FetchOptions, fetch_catalog};
use glyphsync_registry::{export_manifest, load, save};
use glyphsync_shared::{GlyphRegistry, GlyphSyncError, Result, SyncConfig};
use indexmap::IndexMap;
use tracing::{info, instrument, warn};

use crate::merge::{MergeOutcome, merge};

/// Progress callback for reporting sync status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each glyph appended to the registry.
    fn glyph_added(&self, id: &str);
    /// Called when one asset job finishes.
    fn asset_finished(&self, report: &AssetReport, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &SyncReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn glyph_added(&self, _id: &str) {}
    fn asset_finished(&self, _report: &AssetReport, _current: usize, _total: usize) {}
    fn done(&self, _report: &SyncReport) {}
}

/// Which phases of [`run_sync`] to run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Skip the catalog fetch and merge; work from the local registry only.
    pub offline: bool,
    /// Skip the asset download phase.
    pub skip_download: bool,
    /// Skip the manifest export phase.
    pub skip_export: bool,
}

/// Result of the registry update phase.
#[derive(Debug)]
pub struct UpdateResult {
    /// The registry after the merge.
    pub registry: GlyphRegistry,
    /// Identifiers appended by this run.
    pub added: Vec<String>,
    /// Whether the registry file was rewritten.
    pub saved: bool,
}

/// Result of a full sync run.
#[derive(Debug)]
pub struct SyncReport {
    /// Glyphs in the registry after the run.
    pub glyph_count: usize,
    /// Identifiers appended by this run.
    pub added: Vec<String>,
    /// Whether the registry file was rewritten.
    pub registry_saved: bool,
    /// Download phase outcome, if it ran.
    pub downloads: Option<DownloadSummary>,
    /// Manifest line count, if the export succeeded.
    pub manifest_lines: Option<usize>,
    /// Export failure message, if the export failed.
    pub export_error: Option<String>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl SyncReport {
    /// Whether any non-fatal phase reported a failure.
    pub fn has_failures(&self) -> bool {
        self.export_error.is_some()
            || self
                .downloads
                .as_ref()
                .is_some_and(|d| !d.failed.is_empty())
    }
}

/// Present/missing asset counts for one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleStatus {
    /// Style name.
    pub style: String,
    /// Assets on disk.
    pub present: usize,
    /// Assets not yet downloaded.
    pub missing: usize,
}

/// Run the full sync.
///
/// 1. Load the registry (fatal)
/// 2. Fetch the remote catalog (fatal) and merge
/// 3. Save the registry if the merge appended anything (fatal)
/// 4. Download missing assets (per-asset failures are collected)
/// 5. Export the glyph list (failure is reported, not fatal)
#[instrument(skip_all, fields(registry = %config.registry_path.display()))]
pub async fn run_sync(
    config: &SyncConfig,
    opts: &SyncOptions,
    progress: &dyn ProgressReporter,
) -> Result<SyncReport> {
    let start = Instant::now();

    progress.phase("Loading registry");
    let registry = load_registry(config)?;

    let update = if opts.offline {
        info!("offline: skipping catalog fetch");
        UpdateResult {
            registry,
            added: Vec::new(),
            saved: false,
        }
    } else {
        merge_remote(config, registry, progress).await?
    };

    let downloads = if opts.skip_download {
        None
    } else {
        Some(download_missing(config, &update.registry, progress).await?)
    };

    let (manifest_lines, export_error) = if opts.skip_export {
        (None, None)
    } else {
        progress.phase("Exporting glyph list");
        match export_manifest(&config.manifest_path, &update.registry) {
            Ok(lines) => (Some(lines), None),
            Err(e) => {
                warn!(error = %e, "glyph list export failed");
                (None, Some(e.to_string()))
            }
        }
    };

    let report = SyncReport {
        glyph_count: update.registry.len(),
        added: update.added,
        registry_saved: update.saved,
        downloads,
        manifest_lines,
        export_error,
        elapsed: start.elapsed(),
    };

    info!(
        glyphs = report.glyph_count,
        added = report.added.len(),
        saved = report.registry_saved,
        elapsed_ms = report.elapsed.as_millis(),
        "sync complete"
    );

    progress.done(&report);
    Ok(report)
}

/// Load the registry and check its code points against the configured base.
pub fn load_registry(config: &SyncConfig) -> Result<GlyphRegistry> {
    let registry = load(&config.registry_path)?;
    registry
        .check_code_points(config.glyphs.base_offset)
        .map_err(|e| GlyphSyncError::store(&config.registry_path, e.to_string()))?;
    Ok(registry)
}

/// Load the registry, merge the remote catalog into it, and save if changed.
pub async fn update_registry(
    config: &SyncConfig,
    progress: &dyn ProgressReporter,
) -> Result<UpdateResult> {
    progress.phase("Loading registry");
    let registry = load_registry(config)?;
    merge_remote(config, registry, progress).await
}

/// Download every missing asset of `registry`.
pub async fn download_missing(
    config: &SyncConfig,
    registry: &GlyphRegistry,
    progress: &dyn ProgressReporter,
) -> Result<DownloadSummary> {
    progress.phase("Downloading missing glyphs");
    let downloader = Downloader::new(&config.remote, config.glyphs_dir.clone())?;
    let summary = downloader
        .download_all(jobs_for(registry), &|report, current, total| {
            progress.asset_finished(report, current, total)
        })
        .await;
    Ok(summary)
}

/// Per-style present/missing counts, in first-seen style order.
pub fn asset_status(config: &SyncConfig, registry: &GlyphRegistry) -> Vec<StyleStatus> {
    let mut by_style: IndexMap<String, StyleStatus> = IndexMap::new();
    for job in jobs_for(registry) {
        let present = asset_path(&config.glyphs_dir, &job.style, &job.glyph_id).is_file();
        let entry = by_style
            .entry(job.style.clone())
            .or_insert_with(|| StyleStatus {
                style: job.style,
                present: 0,
                missing: 0,
            });
        if present {
            entry.present += 1;
        } else {
            entry.missing += 1;
        }
    }
    by_style.into_values().collect()
}

/// Fetch, merge, and persist. The loaded registry stays on disk untouched
/// unless the merge produced a new one.
async fn merge_remote(
    config: &SyncConfig,
    registry: GlyphRegistry,
    progress: &dyn ProgressReporter,
) -> Result<UpdateResult> {
    progress.phase("Fetching remote catalog");
    let catalog = fetch_catalog(
        &config.remote.catalog_url,
        &FetchOptions::from(&config.remote),
    )
    .await?;

    progress.phase("Merging catalog");
    match merge(&registry, &catalog, &config.glyphs)? {
        MergeOutcome::Unchanged => Ok(UpdateResult {
            registry,
            added: Vec::new(),
            saved: false,
        }),
        MergeOutcome::Updated { registry, added } => {
            for id in &added {
                progress.glyph_added(id);
            }
            progress.phase("Saving registry");
            save(&config.registry_path, &registry)?;
            Ok(UpdateResult {
                registry,
                added,
                saved: true,
            })
        }
    }
}
