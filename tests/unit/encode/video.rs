use std::sync::Arc;

use super::*;
use crate::assets::fetch::MemoryBlobSource;
use crate::foundation::config::FontConfig;
use crate::foundation::core::FrameSize;
use crate::model::template::{MainMedia, MediaKind};

fn template(w: u32, h: u32) -> Template {
    Template {
        frame_size: FrameSize::new(w, h).unwrap(),
        main_media: MainMedia {
            url: "mem://clip.mp4".to_string(),
            kind: MediaKind::Video,
        },
        profile_slot: None,
        name_slot: None,
        phone_slot: None,
        address_slot: None,
    }
}

struct Fixture {
    scratch_parent: tempfile::TempDir,
    media: MediaConfig,
    fonts: FontResolver,
}

impl Fixture {
    fn new() -> Self {
        let scratch_parent = tempfile::tempdir().unwrap();
        let media = MediaConfig {
            ffmpeg: "postforge-no-such-ffmpeg".to_string(),
            ffprobe: "postforge-no-such-ffprobe".to_string(),
            scratch_dir: Some(scratch_parent.path().to_path_buf()),
            ..MediaConfig::default()
        };
        let fonts = FontResolver::with_platform_dirs(
            &FontConfig {
                search_dirs: Vec::new(),
                load_system_fonts: false,
            },
            Vec::new(),
        );
        Self {
            scratch_parent,
            media,
            fonts,
        }
    }

    fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(self.scratch_parent.path())
            .unwrap()
            .next()
            .is_none()
    }
}

#[test]
fn odd_frame_fails_before_fetching() {
    let fx = Fixture::new();
    let fetcher = AssetFetcher::new(Arc::new(MemoryBlobSource::new()), "ffprobe");
    let mut adapter = VideoOverlayAdapter::new(&fetcher, &fx.fonts, &fx.media);

    let err = adapter
        .run(&template(1081, 1920), &UserRecord::default(), None)
        .unwrap_err();
    match err {
        ForgeError::InvalidTemplate { field, .. } => assert_eq!(field, "frameSize"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(adapter.state(), OverlayState::Failed);
    assert_eq!(adapter.history(), &[OverlayState::Failed]);
    assert!(fx.scratch_is_empty());
}

#[test]
fn fetch_failure_cleans_scratch_and_fails() {
    let fx = Fixture::new();
    let fetcher = AssetFetcher::new(Arc::new(MemoryBlobSource::new()), "ffprobe");
    let mut adapter = VideoOverlayAdapter::new(&fetcher, &fx.fonts, &fx.media);

    let err = adapter
        .run(&template(1080, 1920), &UserRecord::default(), None)
        .unwrap_err();
    assert_eq!(err.kind(), "asset_fetch");
    assert_eq!(
        adapter.history(),
        &[OverlayState::Fetching, OverlayState::Failed]
    );
    assert!(fx.scratch_is_empty());
}

#[test]
fn probe_failure_is_reported_against_the_url() {
    let fx = Fixture::new();
    let src = MemoryBlobSource::new().with("mem://clip.mp4", b"not really a video".to_vec());
    let fetcher = AssetFetcher::new(Arc::new(src), fx.media.ffprobe.clone());
    let mut adapter = VideoOverlayAdapter::new(&fetcher, &fx.fonts, &fx.media);

    let err = adapter
        .run(&template(1080, 1920), &UserRecord::default(), None)
        .unwrap_err();
    match err {
        ForgeError::AssetFetch { url, .. } => assert_eq!(url, "mem://clip.mp4"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        adapter.history(),
        &[
            OverlayState::Fetching,
            OverlayState::Decoding,
            OverlayState::Failed
        ]
    );
    assert!(fx.scratch_is_empty());
}
