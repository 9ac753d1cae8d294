//! Fetching the documentation reference page.
//!
//! One GET per run. There is no retry: a transport failure aborts generation, and the
//! user simply re-runs the tool.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use docbind_shared::{DocbindError, Result, SourceConfig};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Default maximum response size (32 MB).
pub const MAX_RESPONSE_SIZE: usize = 32 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// User-Agent header.
    pub user_agent: String,
    /// Bodies larger than this are rejected, whether or not the server sent a length.
    pub max_response_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&SourceConfig::default())
    }
}

impl From<&SourceConfig> for FetchOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
            user_agent: config.user_agent.clone(),
            max_response_bytes: MAX_RESPONSE_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch the HTML body at `url`.
///
/// Non-2xx statuses, transport errors, oversized bodies and non-UTF-8 bodies all map
/// to [`DocbindError::Network`].
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_document(url: &Url, opts: &FetchOptions) -> Result<String> {
    let client = build_client(opts)?;

    info!("fetching reference page");

    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| DocbindError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DocbindError::Network(format!("{url}: HTTP {status}")));
    }

    let limit = opts.max_response_bytes;
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(too_large(url, limit));
        }
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| DocbindError::Network(format!("{url}: failed to read body: {e}")))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(too_large(url, limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    let body = String::from_utf8(bytes)
        .map_err(|e| DocbindError::Network(format!("{url}: body is not valid UTF-8: {e}")))?;

    debug!(bytes = body.len(), "reference page fetched");

    Ok(body)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn too_large(url: &Url, limit: usize) -> DocbindError {
    DocbindError::Network(format!("{url}: response larger than {limit} bytes"))
}

/// Build a reqwest client with appropriate settings.
fn build_client(opts: &FetchOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(opts.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

    if let Some(timeout) = opts.timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| DocbindError::Network(format!("failed to build HTTP client: {e}")))
}
