use crate::foundation::core::{FrameSize, Point};
use crate::foundation::error::{ForgeError, ForgeResult};

/// Vertical lift applied to single-line text origins.
pub(crate) const TEXT_RAISE_PX: f64 = 20.0;
/// Right-hand margin kept free by wrapped address text.
pub(crate) const ADDRESS_RIGHT_MARGIN_PX: f64 = 20.0;

/// Placement of a source raster scaled to fit inside the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitPlacement {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Scale `src` uniformly so it fits inside `frame`, centered. Never crops.
///
/// Scaled edges are `floor(edge * scale)`, clamped to `[1, frame]`. The computation is done in
/// integers so exact ratios (e.g. 500 -> 1080) do not lose a pixel to float rounding.
pub fn fit_within(src_w: u32, src_h: u32, frame: FrameSize) -> ForgeResult<FitPlacement> {
    if src_w == 0 || src_h == 0 {
        return Err(ForgeError::asset_fetch(
            "main media",
            format!("source has zero size ({src_w}x{src_h})"),
        ));
    }
    let (sw, sh) = (u64::from(src_w), u64::from(src_h));
    let (fw, fh) = (u64::from(frame.width), u64::from(frame.height));

    // Width-limited when fw/sw <= fh/sh.
    let (w, h, scale) = if fw * sh <= fh * sw {
        (fw, sh * fw / sw, fw as f64 / sw as f64)
    } else {
        (sw * fh / sh, fh, fh as f64 / sh as f64)
    };
    let width = w.clamp(1, fw) as u32;
    let height = h.clamp(1, fh) as u32;

    Ok(FitPlacement {
        scale,
        width,
        height,
        offset_x: (frame.width - width) / 2,
        offset_y: (frame.height - height) / 2,
    })
}

/// Resize-then-crop plan producing an exact `side x side` square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverCrop {
    pub side: u32,
    /// Size after the uniform resize; the smaller edge equals `side`.
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub crop_x: u32,
    pub crop_y: u32,
}

/// Plan a cover scale of `src` onto a square of `side`, cropping the longer edge symmetrically.
pub fn cover_square(src_w: u32, src_h: u32, side: u32) -> ForgeResult<CoverCrop> {
    if src_w == 0 || src_h == 0 || side == 0 {
        return Err(ForgeError::Other(anyhow::anyhow!(
            "cover_square needs non-zero sizes (source {src_w}x{src_h}, side {side})"
        )));
    }
    let (sw, sh, s) = (u64::from(src_w), u64::from(src_h), u64::from(side));
    let (scaled_w, scaled_h) = if sw <= sh {
        (s, ((sh * s + sw / 2) / sw).max(s))
    } else {
        (((sw * s + sh / 2) / sh).max(s), s)
    };
    let scaled_width = u32::try_from(scaled_w)
        .map_err(|_| ForgeError::Other(anyhow::anyhow!("cover scale overflow")))?;
    let scaled_height = u32::try_from(scaled_h)
        .map_err(|_| ForgeError::Other(anyhow::anyhow!("cover scale overflow")))?;

    Ok(CoverCrop {
        side,
        scaled_width,
        scaled_height,
        crop_x: (scaled_width - side) / 2,
        crop_y: (scaled_height - side) / 2,
    })
}

/// Percentage position inside the frame, truncated to whole pixels.
pub fn anchor(x_percent: f64, y_percent: f64, frame: FrameSize) -> Point {
    Point::new(
        (x_percent / 100.0 * f64::from(frame.width)).floor(),
        (y_percent / 100.0 * f64::from(frame.height)).floor(),
    )
}

/// Largest profile square drawn into `frame`: twice its longer edge.
pub fn max_profile_side(frame: FrameSize) -> u32 {
    frame.width.max(frame.height).saturating_mul(2)
}

/// Top-left of a square slot whose anchor is its center.
pub fn centered_top_left(anchor: Point, side: u32) -> (i64, i64) {
    let half = i64::from(side / 2);
    (anchor.x as i64 - half, anchor.y as i64 - half)
}

/// Origin of single-line name and phone text.
///
/// Shifted left by a quarter of the font size per character and raised by a fixed amount.
pub fn text_origin(anchor: Point, font_size_px: f32, char_count: usize) -> Point {
    let dx = -0.5 * f64::from(font_size_px) * (char_count as f64 / 2.0);
    Point::new(anchor.x + dx, anchor.y - TEXT_RAISE_PX)
}

/// Origin of wrapped address text: the raw anchor.
pub fn address_origin(anchor: Point) -> Point {
    anchor
}

/// Wrap width for address text starting at `anchor`.
pub fn address_max_width(anchor: Point, frame: FrameSize) -> f64 {
    f64::from(frame.width) - anchor.x - ADDRESS_RIGHT_MARGIN_PX
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
