use super::*;
use crate::layout::geometry::fit_within;

fn encode(frame: FrameSize, has_audio: bool, dir: &Path) -> OverlayEncode {
    OverlayEncode {
        source: VideoSourceInfo {
            source_path: dir.join("source_media"),
            width: 1920,
            height: 1080,
            duration_secs: 12.5,
            has_audio,
        },
        overlay_png: dir.join("overlay.png"),
        frame,
        fit: fit_within(1920, 1080, frame).unwrap(),
        out_path: dir.join("out").join("output.mp4"),
    }
}

fn opts(program: &str) -> FfmpegOpts {
    FfmpegOpts {
        program: program.to_string(),
        crf: 23,
        preset: "veryfast".to_string(),
    }
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[test]
fn filter_graph_pads_fit_video_onto_white_frame() {
    let dir = tempfile::tempdir().unwrap();
    let e = encode(FrameSize::new(1080, 1920).unwrap(), true, dir.path());
    assert_eq!(
        e.filter_graph(),
        "[0:v]format=rgba,scale=1080:607,pad=1080:1920:0:656:color=white,setsar=1[bg];\
         [bg][1:v]overlay=0:0:format=auto[outv]"
    );
}

#[test]
fn source_audio_is_mapped_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let e = encode(FrameSize::new(1080, 1920).unwrap(), true, dir.path());
    let args = strings(&e.args(&opts("ffmpeg")));
    assert!(!args.iter().any(|a| a.starts_with("anullsrc")));
    let map_audio = args.iter().rposition(|a| a == "-map").unwrap();
    assert_eq!(args[map_audio + 1], "0:a:0");
    let t = args.iter().position(|a| a == "-t").unwrap();
    assert_eq!(args[t + 1], "12.500");
    assert_eq!(*args.last().unwrap(), e.out_path.to_string_lossy().into_owned());
}

#[test]
fn silent_track_is_synthesized_without_source_audio() {
    let dir = tempfile::tempdir().unwrap();
    let e = encode(FrameSize::new(1080, 1920).unwrap(), false, dir.path());
    let args = strings(&e.args(&opts("ffmpeg")));
    assert!(args.iter().any(|a| a.starts_with("anullsrc=")));
    let map_audio = args.iter().rposition(|a| a == "-map").unwrap();
    assert_eq!(args[map_audio + 1], "2:a:0");
    for codec in ["libx264", "yuv420p", "aac"] {
        assert!(args.iter().any(|a| a == codec), "missing {codec}");
    }
}

#[test]
fn odd_frame_is_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let e = encode(FrameSize::new(1081, 1920).unwrap(), true, dir.path());
    match e.run(&opts("postforge-no-such-ffmpeg")).unwrap_err() {
        ForgeError::InvalidTemplate { field, .. } => assert_eq!(field, "frameSize"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_encoder_is_an_encoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let e = encode(FrameSize::new(1080, 1920).unwrap(), true, dir.path());
    let err = e.run(&opts("postforge-no-such-ffmpeg")).unwrap_err();
    assert_eq!(err.kind(), "encoding");
    assert!(err.to_string().contains("postforge-no-such-ffmpeg"));
}
