use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;

use crate::encode::png;
use crate::foundation::config::OutputConfig;
use crate::foundation::core::FrameRGBA;
use crate::foundation::error::ForgeResult;
use crate::service::collab::UploadSink;

pub const PNG_CONTENT_TYPE: &str = "image/png";
pub const MP4_CONTENT_TYPE: &str = "video/mp4";

/// Builds `{prefix}/{user}_{template}_{YYYYmmdd_HHMMSS}_{8 hex}.{ext}` object names.
#[derive(Debug)]
pub struct ArtifactNamer {
    prefix: String,
    rng: Mutex<fastrand::Rng>,
}

impl ArtifactNamer {
    /// Seeded namers repeat the same suffix sequence.
    pub fn new(prefix: impl Into<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            prefix: prefix.into(),
            rng: Mutex::new(rng),
        }
    }

    pub fn from_config(cfg: &OutputConfig) -> Self {
        Self::new(cfg.key_prefix.clone(), cfg.name_seed)
    }

    /// Name stamped with the current local time.
    pub fn next_name(&self, user_id: &str, template_id: &str, ext: &str) -> String {
        self.name_at(user_id, template_id, ext, chrono::Local::now().naive_local())
    }

    pub fn name_at(&self, user_id: &str, template_id: &str, ext: &str, at: NaiveDateTime) -> String {
        let suffix = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .u32(..);
        let stem = format!(
            "{user_id}_{template_id}_{}_{suffix:08x}.{ext}",
            at.format("%Y%m%d_%H%M%S")
        );
        if self.prefix.is_empty() {
            stem
        } else {
            format!("{}/{stem}", self.prefix.trim_end_matches('/'))
        }
    }
}

/// A stored artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredArtifact {
    pub name: String,
    pub url: String,
}

/// Serializes finished outputs and hands them to the upload collaborator.
pub struct OutputEncoder {
    namer: ArtifactNamer,
    sink: Arc<dyn UploadSink>,
}

impl OutputEncoder {
    pub fn new(namer: ArtifactNamer, sink: Arc<dyn UploadSink>) -> Self {
        Self { namer, sink }
    }

    /// Encode `frame` as PNG and store it.
    #[tracing::instrument(level = "debug", skip(self, frame))]
    pub fn store_image(
        &self,
        frame: &FrameRGBA,
        user_id: &str,
        template_id: &str,
    ) -> ForgeResult<StoredArtifact> {
        let bytes = png::encode_png(frame)?;
        let name = self.namer.next_name(user_id, template_id, "png");
        self.store_named(bytes, PNG_CONTENT_TYPE, name)
    }

    /// Store an already encoded MP4.
    #[tracing::instrument(level = "debug", skip(self, mp4))]
    pub fn store_video(
        &self,
        mp4: Vec<u8>,
        user_id: &str,
        template_id: &str,
    ) -> ForgeResult<StoredArtifact> {
        let name = self.namer.next_name(user_id, template_id, "mp4");
        self.store_named(mp4, MP4_CONTENT_TYPE, name)
    }

    /// Store `bytes` under an explicit name.
    pub fn store_named(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        name: String,
    ) -> ForgeResult<StoredArtifact> {
        let len = bytes.len();
        let url = self.sink.store(bytes, content_type, &name)?;
        tracing::info!(%name, %url, bytes = len, content_type, "stored output");
        Ok(StoredArtifact { name, url })
    }
}

impl std::fmt::Debug for OutputEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputEncoder")
            .field("namer", &self.namer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/output.rs"]
mod tests;
