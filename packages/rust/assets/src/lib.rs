//! Idempotent artwork retrieval.
//!
//! Each (glyph, style) pair maps to one local file,
//! `<glyphs_dir>/<style>/<id>.svg`. A file that exists is never fetched or
//! rewritten again; a missing file is the only retry signal. Downloads run
//! concurrently and a failure only affects its own asset.

pub mod sanitize;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use glyphsync_shared::{GlyphRegistry, GlyphSyncError, RemoteConfig, Result, write_atomic};
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use sanitize::{SVG_NAMESPACE, sanitize_svg};

/// File extension of staged artwork.
pub const ARTWORK_EXTENSION: &str = "svg";

/// User-Agent string for artwork requests.
const USER_AGENT: &str = concat!("glyphsync/", env!("CARGO_PKG_VERSION"));

/// Maximum artwork size we accept (4 MB).
const MAX_ASSET_SIZE: u64 = 4 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Jobs & reports
// ---------------------------------------------------------------------------

/// One artwork file to stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetJob {
    /// Glyph identifier.
    pub glyph_id: String,
    /// Style name (also the subdirectory).
    pub style: String,
    /// Source location: absolute URL or name relative to the artwork base.
    pub source: String,
}

/// What happened to one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    /// The file was already on disk; nothing was requested.
    AlreadyPresent,
    /// The file was fetched, sanitized, and written.
    Downloaded,
    /// The asset could not be staged; it stays absent for the next run.
    Failed(String),
}

/// Outcome for a single job.
#[derive(Debug, Clone)]
pub struct AssetReport {
    /// The job this report is for.
    pub job: AssetJob,
    /// Local target path.
    pub path: PathBuf,
    /// Result.
    pub status: AssetStatus,
}

impl AssetReport {
    /// Whether this asset failed to stage.
    pub fn is_failed(&self) -> bool {
        matches!(self.status, AssetStatus::Failed(_))
    }
}

/// Aggregated outcome of a download phase.
#[derive(Debug, Clone, Default)]
pub struct DownloadSummary {
    /// Assets fetched during this run.
    pub downloaded: usize,
    /// Assets that were already on disk.
    pub already_present: usize,
    /// Assets that failed; retried automatically next run.
    pub failed: Vec<AssetReport>,
}

impl DownloadSummary {
    /// Total number of jobs accounted for.
    pub fn total(&self) -> usize {
        self.downloaded + self.already_present + self.failed.len()
    }

    fn record(&mut self, report: AssetReport) {
        match report.status {
            AssetStatus::AlreadyPresent => self.already_present += 1,
            AssetStatus::Downloaded => self.downloaded += 1,
            AssetStatus::Failed(_) => self.failed.push(report),
        }
    }
}

/// Local path of the artwork for `glyph_id` in `style`.
pub fn asset_path(glyphs_dir: &Path, style: &str, glyph_id: &str) -> PathBuf {
    glyphs_dir
        .join(style)
        .join(format!("{glyph_id}.{ARTWORK_EXTENSION}"))
}

/// All jobs for a registry: every glyph in order × every style it lists.
pub fn jobs_for(registry: &GlyphRegistry) -> Vec<AssetJob> {
    registry
        .iter()
        .flat_map(|(id, info)| {
            info.urls.iter().map(move |(style, source)| AssetJob {
                glyph_id: id.to_string(),
                style: style.clone(),
                source: source.clone(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Downloader
// ---------------------------------------------------------------------------

/// Fetches, sanitizes, and stages artwork files.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    artwork_base_url: Url,
    glyphs_dir: PathBuf,
    concurrency: usize,
}

impl Downloader {
    /// Create a downloader writing under `glyphs_dir`.
    pub fn new(remote: &RemoteConfig, glyphs_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()
            .map_err(|e| GlyphSyncError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            artwork_base_url: remote.artwork_base_url.clone(),
            glyphs_dir: glyphs_dir.into(),
            concurrency: remote.concurrency.max(1),
        })
    }

    /// Local path for a job.
    pub fn path_for(&self, job: &AssetJob) -> PathBuf {
        asset_path(&self.glyphs_dir, &job.style, &job.glyph_id)
    }

    /// Resolve a job's source against the artwork base URL.
    pub fn resolve(&self, source: &str) -> Result<Url> {
        match Url::parse(source) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.artwork_base_url.join(source).map_err(|e| {
                    GlyphSyncError::validation(format!("cannot resolve '{source}': {e}"))
                })
            }
            Err(e) => Err(GlyphSyncError::validation(format!(
                "invalid artwork location '{source}': {e}"
            ))),
        }
    }

    /// Stage one asset. Never returns an error: failures are reported in the
    /// returned [`AssetReport`] and logged.
    pub async fn download_one(&self, job: &AssetJob) -> AssetReport {
        let path = self.path_for(job);

        if path.is_file() {
            debug!(id = %job.glyph_id, style = %job.style, "already present");
            return AssetReport {
                job: job.clone(),
                path,
                status: AssetStatus::AlreadyPresent,
            };
        }

        let status = match self.fetch_to(job, &path).await {
            Ok(()) => {
                info!(id = %job.glyph_id, style = %job.style, "downloaded");
                AssetStatus::Downloaded
            }
            Err(e) => {
                warn!(
                    id = %job.glyph_id,
                    style = %job.style,
                    source = %job.source,
                    path = %path.display(),
                    error = %e,
                    "asset download failed"
                );
                AssetStatus::Failed(e.to_string())
            }
        };

        AssetReport {
            job: job.clone(),
            path,
            status,
        }
    }

    /// Stage all `jobs`, at most `concurrency` at a time.
    ///
    /// Jobs that target the same path are only run once. `on_result` is
    /// called in job order with each report, its 1-based position and the
    /// total.
    #[instrument(skip_all, fields(jobs = jobs.len(), concurrency = self.concurrency))]
    pub async fn download_all(
        &self,
        jobs: Vec<AssetJob>,
        on_result: &dyn Fn(&AssetReport, usize, usize),
    ) -> DownloadSummary {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut targets = HashSet::new();
        let mut handles = Vec::new();

        for job in jobs {
            if !targets.insert(self.path_for(&job)) {
                debug!(id = %job.glyph_id, style = %job.style, "duplicate job, skipping");
                continue;
            }

            let this = self.clone();
            let sem = semaphore.clone();
            let task_job = job.clone();
            let handle = tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return AssetReport {
                        path: this.path_for(&task_job),
                        job: task_job,
                        status: AssetStatus::Failed("download queue closed".into()),
                    };
                };
                this.download_one(&task_job).await
            });
            handles.push((job, handle));
        }

        let total = handles.len();
        let mut summary = DownloadSummary::default();

        for (i, (job, handle)) in handles.into_iter().enumerate() {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    warn!(id = %job.glyph_id, style = %job.style, error = %e, "download task failed");
                    AssetReport {
                        path: self.path_for(&job),
                        job,
                        status: AssetStatus::Failed(format!("task failed: {e}")),
                    }
                }
            };
            on_result(&report, i + 1, total);
            summary.record(report);
        }

        info!(
            downloaded = summary.downloaded,
            already_present = summary.already_present,
            failed = summary.failed.len(),
            "download phase complete"
        );

        summary
    }

    /// Fetch, sanitize, and write one asset.
    async fn fetch_to(&self, job: &AssetJob, path: &Path) -> Result<()> {
        let asset_err = |url: &str, msg: String| GlyphSyncError::asset(url, path, msg);

        let url = self
            .resolve(&job.source)
            .map_err(|e| asset_err(&job.source, e.to_string()))?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| asset_err(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(asset_err(url.as_str(), format!("HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_ASSET_SIZE {
                return Err(asset_err(
                    url.as_str(),
                    format!("response too large ({len} bytes, max {MAX_ASSET_SIZE})"),
                ));
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| asset_err(url.as_str(), format!("failed to read body: {e}")))?;

        let svg = sanitize_svg(&body).map_err(|e| asset_err(url.as_str(), e.to_string()))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| asset_err(url.as_str(), format!("cannot create directory: {e}")))?;
        }

        // The temp-file write and fsync are blocking; keep them off the runtime workers.
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || write_atomic(&target, svg.as_bytes()))
            .await
            .map_err(|e| asset_err(url.as_str(), format!("write task failed: {e}")))?
            .map_err(|e| asset_err(url.as_str(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphsync_shared::{AppConfig, GlyphInfo, SyncConfig};
    use indexmap::IndexMap;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME_SVG: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">"#,
        r#"<path d="M10 20v-6h4v6h5v-8h3L12 3 2 12h3v8z"/>"#,
        r#"<path d="M0 0h24v24H0z" fill="none"/>"#,
        "</svg>"
    );

    fn remote_for(server: &MockServer) -> RemoteConfig {
        let mut app = AppConfig::default();
        app.remote.artwork_base_url = format!("{}/icons/", server.uri());
        app.remote.timeout_secs = 5;
        SyncConfig::try_from(&app).expect("config").remote
    }

    fn job(id: &str, style: &str) -> AssetJob {
        AssetJob {
            glyph_id: id.into(),
            style: style.into(),
            source: format!("{style}-{id}-24px.svg"),
        }
    }

    async fn mount_svg(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn asset_path_convention() {
        assert_eq!(
            asset_path(Path::new("glyphs"), "outline", "home"),
            PathBuf::from("glyphs/outline/home.svg")
        );
    }

    #[test]
    fn jobs_follow_registry_order() {
        let mut registry = GlyphRegistry::default();
        for (i, id) in ["star", "home"].iter().enumerate() {
            registry.order.push(id.to_string());
            registry.info.insert(
                id.to_string(),
                GlyphInfo {
                    urls: IndexMap::from([
                        ("baseline".to_string(), format!("baseline-{id}-24px.svg")),
                        ("sharp".to_string(), format!("sharp-{id}-24px.svg")),
                    ]),
                    unicode_id: 0xE000 + i as u32,
                },
            );
        }
        registry.info.reverse();

        let jobs = jobs_for(&registry);
        let keys: Vec<_> = jobs
            .iter()
            .map(|j| format!("{}/{}", j.glyph_id, j.style))
            .collect();
        assert_eq!(
            keys,
            vec!["star/baseline", "star/sharp", "home/baseline", "home/sharp"]
        );
    }

    #[tokio::test]
    async fn resolves_relative_and_absolute_sources() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().expect("tempdir");
        let downloader = Downloader::new(&remote_for(&server), dir.path()).expect("downloader");

        let rel = downloader.resolve("baseline-home-24px.svg").expect("relative");
        assert_eq!(rel.as_str(), format!("{}/icons/baseline-home-24px.svg", server.uri()));

        let abs = downloader
            .resolve("https://cdn.example.com/star.svg")
            .expect("absolute");
        assert_eq!(abs.as_str(), "https://cdn.example.com/star.svg");
    }

    #[tokio::test]
    async fn downloads_and_sanitizes() {
        let server = MockServer::start().await;
        mount_svg(&server, "/icons/baseline-home-24px.svg", HOME_SVG).await;

        let dir = tempfile::tempdir().expect("tempdir");
        let downloader = Downloader::new(&remote_for(&server), dir.path()).expect("downloader");

        let report = downloader.download_one(&job("home", "baseline")).await;
        assert_eq!(report.status, AssetStatus::Downloaded);
        assert_eq!(report.path, dir.path().join("baseline").join("home.svg"));

        let written = std::fs::read_to_string(&report.path).expect("read asset");
        assert!(!written.contains("fill"));
        assert!(written.contains("M10 20v-6h4v6"));
    }

    #[tokio::test]
    async fn existing_file_is_not_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME_SVG))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("baseline").join("home.svg");
        std::fs::create_dir_all(target.parent().unwrap()).expect("mkdir");
        std::fs::write(&target, b"original bytes").expect("seed");

        let downloader = Downloader::new(&remote_for(&server), dir.path()).expect("downloader");
        let report = downloader.download_one(&job("home", "baseline")).await;

        assert_eq!(report.status, AssetStatus::AlreadyPresent);
        assert_eq!(std::fs::read(&target).expect("read"), b"original bytes");
        // MockServer verifies `expect(0)` on drop.
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let server = MockServer::start().await;
        mount_svg(&server, "/icons/baseline-home-24px.svg", HOME_SVG).await;
        mount_svg(&server, "/icons/baseline-star-24px.svg", "<not-svg/>").await;
        mount_svg(&server, "/icons/sharp-home-24px.svg", HOME_SVG).await;
        // baseline-zoom-24px.svg is not mounted -> 404

        let dir = tempfile::tempdir().expect("tempdir");
        let downloader = Downloader::new(&remote_for(&server), dir.path()).expect("downloader");

        let jobs = vec![
            job("home", "baseline"),
            job("star", "baseline"),
            job("zoom", "baseline"),
            job("home", "sharp"),
        ];
        let seen = Mutex::new(Vec::new());
        let summary = downloader
            .download_all(jobs, &|report, current, total| {
                seen.lock().unwrap().push((report.job.glyph_id.clone(), current, total));
            })
            .await;

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.failed.len(), 2);
        assert_eq!(summary.total(), 4);
        assert!(dir.path().join("baseline/home.svg").is_file());
        assert!(dir.path().join("sharp/home.svg").is_file());
        assert!(!dir.path().join("baseline/star.svg").exists());
        assert!(!dir.path().join("baseline/zoom.svg").exists());

        let failed_ids: Vec<_> = summary.failed.iter().map(|r| r.job.glyph_id.as_str()).collect();
        assert_eq!(failed_ids, vec!["star", "zoom"]);
        match &summary.failed[1].status {
            AssetStatus::Failed(msg) => assert!(msg.contains("404")),
            other => panic!("expected failure, got {other:?}"),
        }

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], ("home".to_string(), 1, 4));
        assert_eq!(seen[3], ("home".to_string(), 4, 4));
    }

    #[tokio::test]
    async fn rerun_resumes_only_missing_assets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/icons/baseline-home-24px.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME_SVG))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let downloader = Downloader::new(&remote_for(&server), dir.path()).expect("downloader");

        let first = downloader
            .download_all(vec![job("home", "baseline")], &|_, _, _| {})
            .await;
        assert_eq!(first.downloaded, 1);

        let second = downloader
            .download_all(vec![job("home", "baseline")], &|_, _, _| {})
            .await;
        assert_eq!(second.downloaded, 0);
        assert_eq!(second.already_present, 1);
    }

    #[tokio::test]
    async fn duplicate_targets_run_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/icons/baseline-home-24px.svg"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME_SVG))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let downloader = Downloader::new(&remote_for(&server), dir.path()).expect("downloader");

        let summary = downloader
            .download_all(
                vec![job("home", "baseline"), job("home", "baseline")],
                &|_, _, _| {},
            )
            .await;
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.downloaded, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_writes_on_multi_thread_runtime() {
        let server = MockServer::start().await;
        let ids = ["home", "star", "zoom", "alarm", "check"];
        for id in ids {
            for style in ["baseline", "sharp"] {
                mount_svg(&server, &format!("/icons/{style}-{id}-24px.svg"), HOME_SVG).await;
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("out").join("glyphs");
        let downloader = Downloader::new(&remote_for(&server), nested.clone()).expect("downloader");

        let jobs: Vec<_> = ids
            .iter()
            .flat_map(|id| [job(id, "baseline"), job(id, "sharp")])
            .collect();
        let summary = downloader.download_all(jobs, &|_, _, _| {}).await;

        assert_eq!(summary.downloaded, 10);
        assert!(summary.failed.is_empty());
        for id in ids {
            let written = std::fs::read_to_string(nested.join("sharp").join(format!("{id}.svg")))
                .expect("read asset");
            assert!(!written.contains("fill"));
        }
    }
}
