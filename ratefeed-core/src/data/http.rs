//! Blocking HTTP plumbing shared by the remote sources.

use super::provider::SourceError;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, SourceError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ratefeed/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SourceError::Fetch(format!("failed to build HTTP client: {e}")))
}

/// GET `url` with `query` and return the decoded body.
///
/// Transport failures, timeouts and non-2xx statuses are all `Fetch` errors.
/// The body is decoded using the charset from the response headers.
pub(crate) fn get_text(
    client: &reqwest::blocking::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, SourceError> {
    tracing::debug!(url, ?query, "GET");

    let resp = client.get(url).query(query).send().map_err(|e| {
        if e.is_timeout() {
            SourceError::Fetch(format!("request to {url} timed out"))
        } else {
            SourceError::Fetch(format!("request to {url} failed: {e}"))
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Fetch(format!("HTTP {status} from {url}")));
    }

    resp.text()
        .map_err(|e| SourceError::Fetch(format!("failed to read body from {url}: {e}")))
}
