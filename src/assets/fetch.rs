use std::collections::HashMap;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::foundation::config::FetchConfig;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Raw byte retrieval for asset URLs.
///
/// Implementations must be safe to share across jobs.
pub trait BlobSource: Send + Sync {
    /// Return the full body addressed by `url`.
    fn fetch(&self, url: &str) -> ForgeResult<Vec<u8>>;
}

/// Location kinds understood by the bundled sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AssetLocation {
    Http(String),
    File(PathBuf),
    Data,
}

impl AssetLocation {
    pub(crate) fn parse(url: &str) -> ForgeResult<Self> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ForgeError::asset_fetch(url, "empty URL"));
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Http(trimmed.to_string()));
        }
        if lower.starts_with("data:") {
            return Ok(Self::Data);
        }
        if let Some(rest) = trimmed.strip_prefix("file://") {
            // `file:///abs/path` and `file://localhost/abs/path`
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            if rest.is_empty() {
                return Err(ForgeError::asset_fetch(url, "file URL has no path"));
            }
            return Ok(Self::File(PathBuf::from(rest)));
        }
        if let Some((scheme, _)) = trimmed.split_once("://") {
            return Err(ForgeError::asset_fetch(
                url,
                format!("unsupported URL scheme '{scheme}'"),
            ));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }
}

/// Default source: HTTP(S) through a blocking client, `file://` URLs and plain paths from disk.
pub struct HttpBlobSource {
    client: reqwest::blocking::Client,
    max_bytes: u64,
}

impl HttpBlobSource {
    pub fn new(cfg: &FetchConfig) -> ForgeResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .user_agent(cfg.user_agent.clone())
            .build()
            .map_err(|e| ForgeError::Other(anyhow::anyhow!("build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: cfg.max_bytes,
        })
    }

    fn fetch_http(&self, url: &str) -> ForgeResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ForgeError::asset_fetch(url, format!("request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ForgeError::asset_fetch(url, format!("HTTP status {status}")));
        }
        if let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(ForgeError::asset_fetch(
                url,
                format!("body of {len} bytes exceeds limit of {}", self.max_bytes),
            ));
        }

        let mut body = Vec::new();
        resp.take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| ForgeError::asset_fetch(url, format!("read body: {e}")))?;
        if body.len() as u64 > self.max_bytes {
            return Err(ForgeError::asset_fetch(
                url,
                format!("body exceeds limit of {} bytes", self.max_bytes),
            ));
        }
        Ok(body)
    }
}

impl BlobSource for HttpBlobSource {
    #[tracing::instrument(level = "debug", skip(self))]
    fn fetch(&self, url: &str) -> ForgeResult<Vec<u8>> {
        match AssetLocation::parse(url)? {
            AssetLocation::Http(u) => self.fetch_http(&u),
            AssetLocation::File(p) => read_file(url, &p, self.max_bytes),
            AssetLocation::Data => Err(ForgeError::asset_fetch(
                truncate_for_log(url),
                "inline data URLs are not supported",
            )),
        }
    }
}

fn read_file(url: &str, path: &Path, max_bytes: u64) -> ForgeResult<Vec<u8>> {
    let meta = std::fs::metadata(path)
        .map_err(|e| ForgeError::asset_fetch(url, format!("stat '{}': {e}", path.display())))?;
    if !meta.is_file() {
        return Err(ForgeError::asset_fetch(
            url,
            format!("'{}' is not a file", path.display()),
        ));
    }
    if meta.len() > max_bytes {
        return Err(ForgeError::asset_fetch(
            url,
            format!("file of {} bytes exceeds limit of {max_bytes}", meta.len()),
        ));
    }
    std::fs::read(path)
        .map_err(|e| ForgeError::asset_fetch(url, format!("read '{}': {e}", path.display())))
}

/// Data URLs can be megabytes long; keep error messages readable.
fn truncate_for_log(url: &str) -> String {
    const MAX: usize = 48;
    match url.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &url[..idx]),
        None => url.to_string(),
    }
}

/// In-memory source keyed by exact URL. Unknown URLs fail like a 404.
#[derive(Debug, Default)]
pub struct MemoryBlobSource {
    blobs: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl MemoryBlobSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(url.into(), Arc::new(bytes));
        }
    }

    pub fn with(self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl BlobSource for MemoryBlobSource {
    fn fetch(&self, url: &str) -> ForgeResult<Vec<u8>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| ForgeError::asset_fetch(url, "blob map lock poisoned"))?;
        blobs
            .get(url)
            .map(|b| b.as_ref().clone())
            .ok_or_else(|| ForgeError::asset_fetch(url, "HTTP status 404 Not Found"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
