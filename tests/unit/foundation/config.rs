use std::collections::HashMap;

use super::*;

#[test]
fn empty_json_object_yields_defaults() {
    let cfg: ForgeConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg.fetch.timeout_secs, 30);
    assert_eq!(cfg.output.key_prefix, "overlay_posts");
    assert_eq!(cfg.media.ffmpeg, "ffmpeg");
    assert!(cfg.concurrency.video_jobs >= 1);
    assert!(cfg.concurrency.image_jobs >= cfg.concurrency.video_jobs);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg: ForgeConfig =
        serde_json::from_str(r#"{"media": {"videoCrf": 18}, "output": {"nameSeed": 7}}"#).unwrap();
    assert_eq!(cfg.media.video_crf, 18);
    assert_eq!(cfg.media.video_preset, "veryfast");
    assert_eq!(cfg.output.name_seed, Some(7));
    assert_eq!(cfg.output.key_prefix, "overlay_posts");
}

#[test]
fn overrides_apply_and_validate() {
    let env: HashMap<&str, &str> = [
        ("POSTFORGE_FETCH_TIMEOUT_SECS", "5"),
        ("POSTFORGE_FFMPEG", "/opt/ffmpeg"),
        ("POSTFORGE_VIDEO_JOBS", "2"),
    ]
    .into_iter()
    .collect();
    let cfg = ForgeConfig::default()
        .with_overrides(|k| env.get(k).map(|v| v.to_string()))
        .unwrap();
    assert_eq!(cfg.fetch.timeout_secs, 5);
    assert_eq!(cfg.media.ffmpeg, "/opt/ffmpeg");
    assert_eq!(cfg.concurrency.video_jobs, 2);

    let err = ForgeConfig::default()
        .with_overrides(|k| (k == "POSTFORGE_IMAGE_JOBS").then(|| "many".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains("POSTFORGE_IMAGE_JOBS"));
}
