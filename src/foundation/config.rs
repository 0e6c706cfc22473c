use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::ForgeResult;

/// Process-wide settings handed to the fetcher, font resolver, encoders and job pool at startup.
///
/// Every section has working defaults, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForgeConfig {
    pub fetch: FetchConfig,
    pub fonts: FontConfig,
    pub output: OutputConfig,
    pub concurrency: ConcurrencyConfig,
    pub media: MediaConfig,
}

/// Remote asset retrieval settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on a single downloaded body.
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("postforge/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Font lookup settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontConfig {
    /// Directories searched for `<name>.ttf` before the platform font directories.
    pub search_dirs: Vec<PathBuf>,
    /// Query the system font database by family name when no file matches.
    pub load_system_fonts: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("fonts"), PathBuf::from("assets/fonts")],
            load_system_fonts: true,
        }
    }
}

/// Naming of stored artifacts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub key_prefix: String,
    /// Fixed seed for the random filename suffix; random when unset.
    pub name_seed: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            key_prefix: "overlay_posts".to_string(),
            name_seed: None,
        }
    }
}

/// Concurrency bounds for independent jobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConcurrencyConfig {
    pub image_jobs: usize,
    /// Video encodes are CPU bound; keep this at or below the core count.
    pub video_jobs: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            image_jobs: cores.saturating_mul(2),
            video_jobs: cores,
        }
    }
}

/// External media tool settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    /// Parent directory for per-job scratch directories; system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    pub video_crf: u8,
    pub video_preset: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            scratch_dir: None,
            video_crf: 23,
            video_preset: "veryfast".to_string(),
        }
    }
}

impl ForgeConfig {
    /// Load a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ForgeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config file '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Apply `POSTFORGE_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> ForgeResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> ForgeResult<Self> {
        Self::default().with_env_overrides()
    }

    pub(crate) fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ForgeResult<Self> {
        if let Some(v) = lookup("POSTFORGE_FETCH_TIMEOUT_SECS") {
            self.fetch.timeout_secs = parse_env("POSTFORGE_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("POSTFORGE_FONT_DIRS") {
            self.fonts.search_dirs = std::env::split_paths(&v).collect();
        }
        if let Some(v) = lookup("POSTFORGE_FFMPEG") {
            self.media.ffmpeg = v;
        }
        if let Some(v) = lookup("POSTFORGE_FFPROBE") {
            self.media.ffprobe = v;
        }
        if let Some(v) = lookup("POSTFORGE_SCRATCH_DIR") {
            self.media.scratch_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("POSTFORGE_IMAGE_JOBS") {
            self.concurrency.image_jobs = parse_env("POSTFORGE_IMAGE_JOBS", &v)?;
        }
        if let Some(v) = lookup("POSTFORGE_VIDEO_JOBS") {
            self.concurrency.video_jobs = parse_env("POSTFORGE_VIDEO_JOBS", &v)?;
        }
        Ok(self)
    }
}

fn parse_env<T>(key: &str, value: &str) -> ForgeResult<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let parsed = value
        .trim()
        .parse::<T>()
        .with_context(|| format!("environment variable '{key}' has invalid value '{value}'"))?;
    Ok(parsed)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
