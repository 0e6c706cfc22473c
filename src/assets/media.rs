use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{ForgeError, ForgeResult};

/// Basic metadata about a fetched source video.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    /// Local copy of the video inside the job's scratch directory.
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Container duration in seconds.
    pub duration_secs: f64,
    /// Whether ffprobe detected at least one audio stream.
    pub has_audio: bool,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe source video metadata through `ffprobe`.
#[tracing::instrument(level = "debug", skip(ffprobe))]
pub fn probe_video(ffprobe: &str, source_path: &Path) -> ForgeResult<VideoSourceInfo> {
    let label = source_path.display().to_string();
    let out = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ForgeError::asset_fetch(&label, format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ForgeError::asset_fetch(
            &label,
            format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        ));
    }
    parse_probe_json(source_path, &out.stdout)
}

pub(crate) fn parse_probe_json(source_path: &Path, json: &[u8]) -> ForgeResult<VideoSourceInfo> {
    let label = source_path.display().to_string();
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| ForgeError::asset_fetch(&label, format!("ffprobe json parse failed: {e}")))?;

    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ForgeError::asset_fetch(&label, "no video stream found"))?;
    let width = video_stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| ForgeError::asset_fetch(&label, "missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| ForgeError::asset_fetch(&label, "missing video height from ffprobe"))?;

    // Container duration first; some muxers only report it per stream.
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ForgeError::asset_fetch(&label, "missing video duration from ffprobe"))?;

    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_secs,
        has_audio,
    })
}

/// Return `true` when `program -version` runs successfully.
pub fn is_tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
