pub(crate) mod decode;
pub(crate) mod fetch;
pub(crate) mod media;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use image::RgbaImage;

use crate::assets::fetch::BlobSource;
use crate::assets::media::VideoSourceInfo;
use crate::foundation::error::{ForgeError, ForgeResult};

/// Retrieves remote assets and decodes them for compositing.
///
/// Failures are reported as [`ForgeError::AssetFetch`] and are never retried here.
#[derive(Clone)]
pub struct AssetFetcher {
    source: Arc<dyn BlobSource>,
    ffprobe: String,
}

impl AssetFetcher {
    pub fn new(source: Arc<dyn BlobSource>, ffprobe: impl Into<String>) -> Self {
        Self {
            source,
            ffprobe: ffprobe.into(),
        }
    }

    /// Fetch and decode an image to straight-alpha RGBA8.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn fetch_image(&self, url: &str) -> ForgeResult<RgbaImage> {
        let bytes = self.source.fetch(url)?;
        decode::decode_image(url, &bytes)
    }

    /// Download a video into `scratch_dir` and return the local path.
    #[tracing::instrument(level = "debug", skip(self, scratch_dir))]
    pub fn stage_video(&self, url: &str, scratch_dir: &Path) -> ForgeResult<PathBuf> {
        let bytes = self.source.fetch(url)?;
        if bytes.is_empty() {
            return Err(ForgeError::asset_fetch(url, "empty video payload"));
        }
        let path = scratch_dir.join("source_media");
        std::fs::write(&path, &bytes)
            .with_context(|| format!("write fetched video to '{}'", path.display()))?;
        Ok(path)
    }

    /// Probe a staged video; failures are reported against `url`.
    pub fn probe_staged(&self, url: &str, path: &Path) -> ForgeResult<VideoSourceInfo> {
        media::probe_video(&self.ffprobe, path).map_err(|e| match e {
            ForgeError::AssetFetch { reason, .. } => ForgeError::asset_fetch(url, reason),
            other => other,
        })
    }
}

impl std::fmt::Debug for AssetFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetFetcher")
            .field("ffprobe", &self.ffprobe)
            .finish_non_exhaustive()
    }
}
