use super::*;

fn frame(w: u32, h: u32) -> FrameSize {
    FrameSize::new(w, h).unwrap()
}

#[test]
fn fit_square_into_portrait_frame() {
    let p = fit_within(500, 500, frame(1080, 1920)).unwrap();
    assert!((p.scale - 2.16).abs() < 1e-12);
    assert_eq!((p.width, p.height), (1080, 1080));
    assert_eq!((p.offset_x, p.offset_y), (0, 420));
}

#[test]
fn fit_never_exceeds_frame_and_is_centered() {
    for (sw, sh) in [(1, 1), (3000, 10), (10, 3000), (1079, 1921), (7, 13), (4000, 4000)] {
        let f = frame(1080, 1920);
        let p = fit_within(sw, sh, f).unwrap();
        assert!(p.width >= 1 && p.width <= f.width, "{sw}x{sh}: {p:?}");
        assert!(p.height >= 1 && p.height <= f.height, "{sw}x{sh}: {p:?}");
        assert!(p.width == f.width || p.height == f.height, "{sw}x{sh}: {p:?}");
        assert_eq!(p.offset_x, (f.width - p.width) / 2);
        assert_eq!(p.offset_y, (f.height - p.height) / 2);
    }
}

#[test]
fn fit_landscape_source_is_width_limited() {
    let p = fit_within(1920, 1080, frame(1080, 1920)).unwrap();
    assert_eq!((p.width, p.height), (1080, 607));
    assert_eq!(p.offset_y, (1920 - 607) / 2);
}

#[test]
fn fit_rejects_empty_source() {
    assert!(fit_within(0, 10, frame(10, 10)).is_err());
}

#[test]
fn cover_square_covers_then_crops_center() {
    let c = cover_square(400, 300, 200).unwrap();
    assert_eq!(c.scaled_height, 200);
    assert_eq!(c.scaled_width, 267);
    assert_eq!((c.crop_x, c.crop_y), (33, 0));

    let c = cover_square(300, 600, 200).unwrap();
    assert_eq!((c.scaled_width, c.scaled_height), (200, 400));
    assert_eq!((c.crop_x, c.crop_y), (0, 100));

    let c = cover_square(50, 50, 200).unwrap();
    assert_eq!((c.scaled_width, c.scaled_height, c.crop_x, c.crop_y), (200, 200, 0, 0));
    assert!(cover_square(10, 10, 0).is_err());
}

#[test]
fn profile_anchor_example() {
    let a = anchor(50.0, 50.0, frame(1080, 1920));
    assert_eq!((a.x, a.y), (540.0, 960.0));
    assert_eq!(centered_top_left(a, 200), (440, 860));
}

#[test]
fn anchors_truncate_to_pixels() {
    let a = anchor(12.5, 10.0, frame(1000, 999));
    assert_eq!((a.x, a.y), (125.0, 99.0));
    let edge = anchor(100.0, 0.0, frame(640, 480));
    assert_eq!((edge.x, edge.y), (640.0, 0.0));
}

#[test]
fn text_and_address_origins_differ() {
    let a = Point::new(500.0, 1000.0);
    let t = text_origin(a, 36.0, 10);
    assert_eq!((t.x, t.y), (500.0 - 90.0, 980.0));
    assert_eq!(address_origin(a), a);
    assert_eq!(address_max_width(a, frame(1080, 1920)), 560.0);
}

#[test]
fn profile_side_bound_follows_longer_edge() {
    assert_eq!(max_profile_side(FrameSize::new(1080, 1920).unwrap()), 3840);
    assert_eq!(max_profile_side(FrameSize::new(100, 60).unwrap()), 200);
}
