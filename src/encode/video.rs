use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;
use smallvec::SmallVec;

use crate::assets::AssetFetcher;
use crate::assets::media::VideoSourceInfo;
use crate::encode::ffmpeg::{FfmpegOpts, OverlayEncode};
use crate::encode::png;
use crate::foundation::config::MediaConfig;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::layout::geometry;
use crate::model::template::Template;
use crate::model::user::UserRecord;
use crate::render::compositor::{Backdrop, CompositeReport, Compositor};
use crate::text::font::FontResolver;

/// Progress of one video overlay job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    Fetching,
    Decoding,
    Compositing,
    Encoding,
    Done,
    Failed,
}

/// Encoded MP4 plus what went into it.
#[derive(Debug)]
pub struct VideoOverlayOutput {
    pub mp4: Vec<u8>,
    pub source: VideoSourceInfo,
    pub report: CompositeReport,
    /// Fingerprint of the static overlay frame.
    pub overlay_fingerprint: u64,
}

/// Wraps one static composite frame across a source video and re-encodes it.
///
/// Runs `Fetching -> Decoding -> Compositing -> Encoding -> Done`; any failure moves to `Failed`.
/// All intermediate files live in a per-job scratch directory removed when the run returns.
pub struct VideoOverlayAdapter<'a> {
    fetcher: &'a AssetFetcher,
    fonts: &'a FontResolver,
    media: &'a MediaConfig,
    state: OverlayState,
    history: SmallVec<[OverlayState; 6]>,
}

impl<'a> VideoOverlayAdapter<'a> {
    pub fn new(fetcher: &'a AssetFetcher, fonts: &'a FontResolver, media: &'a MediaConfig) -> Self {
        Self {
            fetcher,
            fonts,
            media,
            state: OverlayState::Fetching,
            history: SmallVec::new(),
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[OverlayState] {
        &self.history
    }

    fn enter(&mut self, state: OverlayState) {
        tracing::debug!(from = ?self.state, to = ?state, "video overlay transition");
        self.state = state;
        self.history.push(state);
    }

    /// Produce the personalized MP4 for `template` (whose main media is a video).
    #[tracing::instrument(level = "debug", skip_all, fields(url = %template.main_media.url))]
    pub fn run(
        &mut self,
        template: &Template,
        user: &UserRecord,
        profile_photo: Option<ForgeResult<RgbaImage>>,
    ) -> ForgeResult<VideoOverlayOutput> {
        let scratch = scratch_dir(self.media.scratch_dir.as_deref());
        let result = scratch.and_then(|dir| {
            let out = self.run_in(dir.path(), template, user, profile_photo);
            // Cleanup happens before the result propagates.
            let cleanup = dir.close().context("remove video scratch directory");
            match (out, cleanup) {
                (Ok(v), Ok(())) => Ok(v),
                (Ok(_), Err(e)) => Err(ForgeError::from(e)),
                (Err(e), _) => Err(e),
            }
        });
        match &result {
            Ok(_) => self.enter(OverlayState::Done),
            Err(e) => {
                tracing::warn!(state = ?self.state, error = %e, "video overlay failed");
                self.enter(OverlayState::Failed);
            }
        }
        result
    }

    fn run_in(
        &mut self,
        dir: &Path,
        template: &Template,
        user: &UserRecord,
        profile_photo: Option<ForgeResult<RgbaImage>>,
    ) -> ForgeResult<VideoOverlayOutput> {
        let frame = template.frame_size;
        if !frame.is_even() {
            return Err(ForgeError::invalid_template(
                "frameSize",
                format!(
                    "{}x{} must be even for yuv420p video output",
                    frame.width, frame.height
                ),
            ));
        }
        let url = template.main_media.url.as_str();

        self.enter(OverlayState::Fetching);
        let staged = self.fetcher.stage_video(url, dir)?;

        self.enter(OverlayState::Decoding);
        let source = self.fetcher.probe_staged(url, &staged)?;
        let fit = geometry::fit_within(source.width, source.height, frame)?;
        tracing::debug!(
            src_w = source.width,
            src_h = source.height,
            duration = source.duration_secs,
            has_audio = source.has_audio,
            "probed source video"
        );

        self.enter(OverlayState::Compositing);
        let composite = Compositor::new(self.fonts).compose(
            template,
            user,
            Backdrop::Transparent,
            profile_photo,
        )?;
        let overlay_png = dir.join("overlay.png");
        png::write_png(&composite.frame, &overlay_png)?;

        self.enter(OverlayState::Encoding);
        let encode = OverlayEncode {
            source: source.clone(),
            overlay_png,
            frame,
            fit,
            out_path: dir.join("output.mp4"),
        };
        encode.run(&FfmpegOpts::from_config(self.media))?;
        let mp4 = std::fs::read(&encode.out_path)
            .with_context(|| format!("read encoded video '{}'", encode.out_path.display()))?;

        Ok(VideoOverlayOutput {
            mp4,
            source,
            overlay_fingerprint: composite.frame.fingerprint(),
            report: composite.report,
        })
    }
}

/// Fresh per-job scratch directory with a random suffix.
pub(crate) fn scratch_dir(parent: Option<&Path>) -> ForgeResult<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("postforge-");
    let dir = match parent {
        Some(p) => {
            std::fs::create_dir_all(p)
                .with_context(|| format!("create scratch parent '{}'", p.display()))?;
            builder.tempdir_in(p)
        }
        None => builder.tempdir(),
    }
    .context("create scratch directory")?;
    Ok(dir)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/video.rs"]
mod tests;
