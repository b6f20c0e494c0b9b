//! Remote glyph catalog retrieval.
//!
//! Downloads the design catalog document and flattens it into the list of
//! glyph identifiers plus any explicit per-style artwork URLs. A failure here
//! is fatal to the merge step but never touches local state.

mod parser;

use std::time::Duration;

use glyphsync_shared::{GlyphSyncError, RemoteConfig, Result};
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

pub use parser::{Catalog, parse_catalog};

/// Maximum number of redirects to follow when fetching the catalog.
const MAX_REDIRECTS: usize = 5;

/// Default timeout in seconds for fetching the catalog.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum catalog size we accept (32 MB).
const MAX_RESPONSE_SIZE: u64 = 32 * 1024 * 1024;

/// User-Agent string for catalog requests.
const USER_AGENT: &str = concat!("glyphsync/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Fetch options
// ---------------------------------------------------------------------------

/// Configuration for catalog retrieval.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Timeout for the HTTP request in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&RemoteConfig> for FetchOptions {
    fn from(remote: &RemoteConfig) -> Self {
        Self {
            timeout_secs: remote.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch and parse the remote catalog at `url`.
///
/// Transport failures, non-success statuses, oversized bodies and malformed
/// documents are all reported as [`GlyphSyncError::Fetch`].
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_catalog(url: &Url, opts: &FetchOptions) -> Result<Catalog> {
    info!("fetching remote catalog");

    let client = build_client(opts)?;
    let body = fetch_body(&client, url).await?;

    let catalog =
        parse_catalog(&body).map_err(|e| GlyphSyncError::Fetch(format!("{url}: {e}")))?;

    info!(
        glyphs = catalog.ids.len(),
        overrides = catalog.overrides.len(),
        "remote catalog parsed"
    );

    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &FetchOptions) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| GlyphSyncError::Fetch(format!("failed to build HTTP client: {e}")))
}

/// GET `url` and return the body as text.
async fn fetch_body(client: &Client, url: &Url) -> Result<String> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| GlyphSyncError::Fetch(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GlyphSyncError::Fetch(format!("{url}: HTTP {status}")));
    }

    if let Some(len) = response.content_length() {
        if len > MAX_RESPONSE_SIZE {
            return Err(GlyphSyncError::Fetch(format!(
                "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
            )));
        }
    }

    response
        .text()
        .await
        .map_err(|e| GlyphSyncError::Fetch(format!("{url}: failed to read body: {e}")))
}
