use super::*;
use crate::foundation::config::FontConfig;
use crate::foundation::core::FrameSize;
use crate::model::template::{MainMedia, MediaKind};
use crate::model::user::UsageType;

const TEST_FACE: &str = "PostforgeTestFace";

fn fonts(dir: &std::path::Path) -> FontResolver {
    FontResolver::with_platform_dirs(
        &FontConfig {
            search_dirs: vec![dir.to_path_buf()],
            load_system_fonts: false,
        },
        Vec::new(),
    )
}

fn template(w: u32, h: u32) -> Template {
    Template {
        frame_size: FrameSize::new(w, h).unwrap(),
        main_media: MainMedia {
            url: "mem://main".to_string(),
            kind: MediaKind::Image,
        },
        profile_slot: None,
        name_slot: None,
        phone_slot: None,
        address_slot: None,
    }
}

fn text_slot(x: f64, y: f64, size: f32) -> TextSlot {
    TextSlot {
        x_percent: x,
        y_percent: y,
        font_name: TEST_FACE.to_string(),
        font_size_px: size,
        color: Rgba8::WHITE,
        background: None,
    }
}

fn solid(w: u32, h: u32, c: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba(c))
}

fn px(f: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    f.pixel(x, y).unwrap()
}

#[test]
fn main_media_is_fit_and_centered_on_white() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let t = template(108, 192);
    let main = solid(50, 50, [255, 0, 0, 255]);

    let out = Compositor::new(&fonts)
        .compose(&t, &UserRecord::default(), Backdrop::MainImage(&main), None)
        .unwrap();
    assert_eq!((out.frame.width, out.frame.height), (108, 192));
    assert_eq!(out.frame.data.len(), 108 * 192 * 4);
    assert_eq!(px(&out.frame, 54, 20), [255, 255, 255, 255]);
    assert_eq!(px(&out.frame, 54, 96), [255, 0, 0, 255]);
    assert_eq!(px(&out.frame, 54, 170), [255, 255, 255, 255]);
    assert!(out.report.painted(LayerKind::Background));
    assert!(out.report.painted(LayerKind::MainMedia));
}

fn profile_template(shape: ProfileShape, background: Option<Rgba8>) -> Template {
    let mut t = template(200, 200);
    t.profile_slot = Some(ProfileSlot {
        enabled: true,
        x_percent: 50.0,
        y_percent: 50.0,
        size_px: 40,
        shape,
        background,
    });
    t
}

fn user_with_photo() -> UserRecord {
    UserRecord {
        profile_photo_url: Some("mem://photo".to_string()),
        ..UserRecord::default()
    }
}

#[test]
fn circular_profile_with_padded_background() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let t = profile_template(ProfileShape::Circle, Some(Rgba8::opaque(255, 0, 0)));
    let white = solid(10, 10, [255, 255, 255, 255]);
    let photo = solid(64, 48, [0, 255, 0, 255]);

    let out = Compositor::new(&fonts)
        .compose(&t, &user_with_photo(), Backdrop::MainImage(&white), Some(Ok(photo)))
        .unwrap();
    assert!(out.report.painted(LayerKind::ProfilePhoto));
    assert_eq!(px(&out.frame, 100, 100), [0, 255, 0, 255]);
    assert_eq!(px(&out.frame, 100, 81), [0, 255, 0, 255]);
    // Square corner is outside the mask; the background circle shows through.
    let corner = px(&out.frame, 80, 80);
    assert!(corner[0] >= 250 && corner[1] <= 5, "{corner:?}");
    let above = px(&out.frame, 100, 72);
    assert!(above[0] >= 250 && above[1] <= 5, "{above:?}");
    assert_eq!(px(&out.frame, 71, 71), [255, 255, 255, 255]);
}

#[test]
fn square_profile_has_no_mask() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let t = profile_template(ProfileShape::Rect, Some(Rgba8::opaque(255, 0, 0)));
    let white = solid(10, 10, [255, 255, 255, 255]);
    let photo = solid(30, 90, [0, 0, 255, 255]);

    let out = Compositor::new(&fonts)
        .compose(&t, &user_with_photo(), Backdrop::MainImage(&white), Some(Ok(photo)))
        .unwrap();
    assert_eq!(px(&out.frame, 80, 80), [0, 0, 255, 255]);
    assert_eq!(px(&out.frame, 119, 119), [0, 0, 255, 255]);
    let pad = px(&out.frame, 72, 72);
    assert!(pad[0] >= 250 && pad[2] <= 5, "{pad:?}");
    assert_eq!(px(&out.frame, 69, 69), [255, 255, 255, 255]);
}

#[test]
fn failed_profile_fetch_omits_only_that_layer() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let mut t = profile_template(ProfileShape::Circle, None);
    t.name_slot = Some(text_slot(50.0, 20.0, 16.0));
    let white = solid(10, 10, [255, 255, 255, 255]);
    let user = UserRecord {
        name: Some("AB".to_string()),
        ..user_with_photo()
    };

    let out = Compositor::new(&fonts)
        .compose(
            &t,
            &user,
            Backdrop::MainImage(&white),
            Some(Err(ForgeError::asset_fetch("mem://photo", "HTTP status 404"))),
        )
        .unwrap();
    assert!(!out.report.painted(LayerKind::ProfilePhoto));
    assert_eq!(out.report.omitted.len(), 1);
    assert_eq!(out.report.omitted[0].0, LayerKind::ProfilePhoto);
    assert!(out.report.painted(LayerKind::Name));
    assert_eq!(px(&out.frame, 100, 100), [255, 255, 255, 255]);
}

#[test]
fn disabled_profile_slot_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let mut t = profile_template(ProfileShape::Circle, None);
    if let Some(p) = t.profile_slot.as_mut() {
        p.enabled = false;
    }
    let white = solid(10, 10, [255, 255, 255, 255]);
    let photo = solid(8, 8, [0, 0, 0, 255]);
    let out = Compositor::new(&fonts)
        .compose(&t, &user_with_photo(), Backdrop::MainImage(&white), Some(Ok(photo)))
        .unwrap();
    assert!(!out.report.painted(LayerKind::ProfilePhoto));
    assert!(out.report.omitted.is_empty());
}

#[test]
fn oversized_profile_slot_is_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let mut t = profile_template(ProfileShape::Circle, Some(Rgba8::opaque(255, 0, 0)));
    if let Some(p) = t.profile_slot.as_mut() {
        p.size_px = u32::MAX;
    }
    let white = solid(10, 10, [255, 255, 255, 255]);
    let photo = solid(8, 8, [0, 0, 0, 255]);
    let out = Compositor::new(&fonts)
        .compose(&t, &user_with_photo(), Backdrop::MainImage(&white), Some(Ok(photo)))
        .unwrap();
    assert!(!out.report.painted(LayerKind::ProfilePhoto));
    assert_eq!(out.report.omitted.len(), 1);
    assert_eq!(out.report.omitted[0].0, LayerKind::ProfilePhoto);
    assert_eq!(px(&out.frame, 100, 100), [255, 255, 255, 255]);
}

#[test]
fn name_background_uses_measured_box_and_padding() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let mut t = template(200, 200);
    t.name_slot = Some(TextSlot {
        background: Some(Rgba8::BLACK),
        ..text_slot(50.0, 50.0, 16.0)
    });
    let white = solid(10, 10, [255, 255, 255, 255]);
    let user = UserRecord {
        name: Some("AB".to_string()),
        ..UserRecord::default()
    };

    let out = Compositor::new(&fonts)
        .compose(&t, &user, Backdrop::MainImage(&white), None)
        .unwrap();
    // origin = (100 - 0.5 * 16 * 1, 100 - 20) = (92, 80); box 22x14; padding 10.
    assert_eq!(px(&out.frame, 82, 70), [0, 0, 0, 255]);
    assert_eq!(px(&out.frame, 123, 103), [0, 0, 0, 255]);
    assert_eq!(px(&out.frame, 81, 70), [255, 255, 255, 255]);
    assert_eq!(px(&out.frame, 124, 103), [255, 255, 255, 255]);
    // Left stem of `A` is not on row 0, but its top bar is.
    assert_eq!(px(&out.frame, 94, 80), [255, 255, 255, 255]);
}

fn business_template() -> Template {
    let mut t = template(200, 200);
    t.phone_slot = Some(TextSlot {
        background: Some(Rgba8::BLACK),
        ..text_slot(50.0, 60.0, 16.0)
    });
    t.address_slot = Some(text_slot(10.0, 10.0, 16.0));
    t
}

fn business_user(usage_type: UsageType) -> UserRecord {
    UserRecord {
        phone_number: Some("12345".to_string()),
        address: Some("123 Long Street Name Avenue".to_string()),
        usage_type,
        ..UserRecord::default()
    }
}

#[test]
fn personal_records_never_render_phone_or_address() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let white = solid(10, 10, [255, 255, 255, 255]);
    let out = Compositor::new(&fonts)
        .compose(
            &business_template(),
            &business_user(UsageType::Personal),
            Backdrop::MainImage(&white),
            None,
        )
        .unwrap();
    assert!(!out.report.painted(LayerKind::Phone));
    assert!(!out.report.painted(LayerKind::Address));
    assert!(out.frame.data.iter().all(|b| *b == 255));
}

#[test]
fn business_address_wraps_into_stacked_lines() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let out = Compositor::new(&fonts)
        .compose(
            &business_template(),
            &business_user(UsageType::Business),
            Backdrop::Transparent,
            None,
        )
        .unwrap();
    assert!(out.report.painted(LayerKind::Phone));
    assert!(out.report.painted(LayerKind::Address));
    assert!(!out.report.painted(LayerKind::MainMedia));

    // Anchor (20, 20), wrap width 160, 16px builtin face: lines at y = 20, 41, 62.
    let mut rows_with_ink = [false; 3];
    for y in 0..100u32 {
        for x in 0..200u32 {
            if px(&out.frame, x, y)[3] == 0 {
                continue;
            }
            if y < 90 && x < 20 {
                panic!("address ink left of anchor at {x},{y}");
            }
            if (20..34).contains(&y) {
                rows_with_ink[0] = true;
            } else if (41..55).contains(&y) {
                rows_with_ink[1] = true;
            } else if (62..76).contains(&y) {
                rows_with_ink[2] = true;
            }
            if y < 80 {
                assert!(x < 20 + 160, "ink beyond wrap width at {x},{y}");
            }
        }
    }
    assert_eq!(rows_with_ink, [true; 3]);
}

#[test]
fn overlay_backdrop_is_transparent_outside_layers() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = fonts(dir.path());
    let mut t = template(64, 64);
    t.name_slot = Some(text_slot(50.0, 90.0, 8.0));
    let user = UserRecord {
        name: Some("X".to_string()),
        ..UserRecord::default()
    };
    let out = Compositor::new(&fonts)
        .compose(&t, &user, Backdrop::Transparent, None)
        .unwrap();
    assert_eq!(px(&out.frame, 0, 0), [0, 0, 0, 0]);
    assert!(out.frame.data.chunks_exact(4).any(|p| p[3] > 0));
}

#[test]
fn prepared_profile_is_exactly_square() {
    for (w, h) in [(1, 1), (640, 480), (480, 640), (200, 200), (5, 40)] {
        let img = solid(w, h, [1, 2, 3, 255]);
        let out = prepare_profile_photo(&img, 200, ProfileShape::Rect).unwrap();
        assert_eq!(out.dimensions(), (200, 200), "{w}x{h}");
        let circ = prepare_profile_photo(&img, 200, ProfileShape::Circle).unwrap();
        assert_eq!(circ.get_pixel(0, 0).0[3], 0);
    }
}
