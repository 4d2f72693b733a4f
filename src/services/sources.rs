//! Image sources for export: rooted filesystem, allow-listed HTTP, and a
//! router that picks one by reference scheme.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use canvas::export::{ImageSource, SourceError};
use tracing::{debug, warn};

const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// FILESYSTEM
// =============================================================================

/// Reads relative references under one root directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a reference to a path under the root. Absolute paths and `..`
    /// segments are refused.
    fn resolve(&self, reference: &str) -> Result<PathBuf, SourceError> {
        let relative = reference.strip_prefix("file://").unwrap_or(reference);
        let relative = relative.trim_start_matches("./");
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if relative.is_empty() || escapes {
            return Err(SourceError::Tainted(reference.to_owned()));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait::async_trait]
impl ImageSource for FsSource {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "asset read");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SourceError::NotFound(reference.to_owned())),
            Err(e) => Err(SourceError::Io(format!("{}: {e}", path.display()))),
        }
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Fetches `http(s)` references from allow-listed hosts only. Anything else
/// is reported as tainted, the same as a cross-origin image that may be
/// displayed but not read back.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    allowed_hosts: Vec<String>,
}

impl HttpSource {
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the HTTP client cannot be built.
    pub fn new(allowed_hosts: Vec<String>, timeout_secs: u64) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SourceError::Io(format!("http client: {e}")))?;
        let allowed_hosts = allowed_hosts.into_iter().map(|h| h.to_lowercase()).collect();
        Ok(Self { http, allowed_hosts })
    }

    fn is_allowed(&self, url: &reqwest::Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.allowed_hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(host)))
    }
}

#[async_trait::async_trait]
impl ImageSource for HttpSource {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        let url = reqwest::Url::parse(reference).map_err(|_| SourceError::NotFound(reference.to_owned()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::NotFound(reference.to_owned()));
        }
        if !self.is_allowed(&url) {
            warn!(host = url.host_str().unwrap_or_default(), "image host not allow-listed");
            return Err(SourceError::Tainted(reference.to_owned()));
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Io(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(reference.to_owned()));
        }
        if !status.is_success() {
            return Err(SourceError::Io(format!("{reference}: http {status}")));
        }
        let bytes = response.bytes().await.map_err(|e| SourceError::Io(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// `http://`/`https://` references go to [`HttpSource`], everything else to
/// [`FsSource`].
#[derive(Debug, Clone)]
pub struct RouterSource {
    pub fs: FsSource,
    pub http: HttpSource,
}

#[must_use]
pub fn is_remote(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait::async_trait]
impl ImageSource for RouterSource {
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, SourceError> {
        if is_remote(reference) {
            self.http.fetch(reference.trim_start()).await
        } else {
            self.fs.fetch(reference).await
        }
    }
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
