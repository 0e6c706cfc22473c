use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::assets::media::VideoSourceInfo;
use crate::foundation::config::MediaConfig;
use crate::foundation::core::FrameSize;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::layout::geometry::FitPlacement;

/// Sample rate of the synthesized silent track.
const SILENT_SAMPLE_RATE: u32 = 44_100;

/// One overlay encode: source video fit onto a white frame, static overlay PNG on top.
#[derive(Clone, Debug)]
pub struct OverlayEncode {
    pub source: VideoSourceInfo,
    pub overlay_png: PathBuf,
    pub frame: FrameSize,
    /// Placement of the scaled source video inside the frame.
    pub fit: FitPlacement,
    pub out_path: PathBuf,
}

/// Encoder program and quality settings.
#[derive(Clone, Debug)]
pub struct FfmpegOpts {
    pub program: String,
    pub crf: u8,
    pub preset: String,
}

impl FfmpegOpts {
    pub fn from_config(media: &MediaConfig) -> Self {
        Self {
            program: media.ffmpeg.clone(),
            crf: media.video_crf,
            preset: media.video_preset.clone(),
        }
    }
}

impl OverlayEncode {
    /// `-filter_complex` graph producing the `[outv]` stream.
    pub(crate) fn filter_graph(&self) -> String {
        format!(
            "[0:v]format=rgba,scale={sw}:{sh},pad={fw}:{fh}:{ox}:{oy}:color=white,setsar=1[bg];\
             [bg][1:v]overlay=0:0:format=auto[outv]",
            sw = self.fit.width,
            sh = self.fit.height,
            fw = self.frame.width,
            fh = self.frame.height,
            ox = self.fit.offset_x,
            oy = self.fit.offset_y,
        )
    }

    /// Full ffmpeg argument list, program name excluded.
    pub(crate) fn args(&self, opts: &FfmpegOpts) -> Vec<OsString> {
        let duration = format!("{:.3}", self.source.duration_secs);
        let mut args: Vec<OsString> = Vec::with_capacity(40);

        push_all(&mut args, &["-y", "-loglevel", "error", "-i"]);
        args.push(self.source.source_path.clone().into_os_string());
        push_all(&mut args, &["-loop", "1", "-i"]);
        args.push(self.overlay_png.clone().into_os_string());

        let audio_map = if self.source.has_audio {
            "0:a:0"
        } else {
            let silent =
                format!("anullsrc=channel_layout=stereo:sample_rate={SILENT_SAMPLE_RATE}");
            push_all(&mut args, &["-f", "lavfi", "-t", duration.as_str(), "-i", silent.as_str()]);
            "2:a:0"
        };

        let filter = self.filter_graph();
        let crf = opts.crf.to_string();
        push_all(
            &mut args,
            &[
                "-filter_complex",
                filter.as_str(),
                "-map",
                "[outv]",
                "-map",
                audio_map,
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-crf",
                crf.as_str(),
                "-preset",
                opts.preset.as_str(),
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-t",
                duration.as_str(),
                "-movflags",
                "+faststart",
            ],
        );
        args.push(self.out_path.clone().into_os_string());
        args
    }

    /// Run the encode to completion.
    #[tracing::instrument(level = "debug", skip_all, fields(out = %self.out_path.display()))]
    pub fn run(&self, opts: &FfmpegOpts) -> ForgeResult<()> {
        if !self.frame.is_even() {
            return Err(ForgeError::invalid_template(
                "frameSize",
                format!(
                    "{}x{} must be even for yuv420p video output",
                    self.frame.width, self.frame.height
                ),
            ));
        }
        ensure_parent_dir(&self.out_path)?;

        let args = self.args(opts);
        tracing::debug!(program = %opts.program, ?args, "spawning ffmpeg");
        let out = Command::new(&opts.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ForgeError::encoding(format!(
                    "failed to spawn {} (is it installed and on PATH?): {e}",
                    opts.program
                ))
            })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ForgeError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        if !self.out_path.is_file() {
            return Err(ForgeError::encoding("ffmpeg finished without writing output"));
        }
        Ok(())
    }
}

fn push_all(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ForgeResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
