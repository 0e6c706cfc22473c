use image::{GrayImage, Luma, RgbaImage};

use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::mul_div255_u8;

/// 8-bit mask of side `side`: 255 inside the inscribed circle, 0 outside.
///
/// A pixel is inside when its center lies within radius `side / 2` of the square's center.
pub fn circle_mask(side: u32) -> GrayImage {
    let r = f64::from(side) / 2.0;
    let r2 = r * r;
    GrayImage::from_fn(side, side, |x, y| {
        let dx = f64::from(x) + 0.5 - r;
        let dy = f64::from(y) + 0.5 - r;
        if dx * dx + dy * dy <= r2 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Multiply `img`'s straight alpha by `mask`.
pub fn apply_mask(img: &mut RgbaImage, mask: &GrayImage) -> ForgeResult<()> {
    if img.dimensions() != mask.dimensions() {
        return Err(ForgeError::Other(anyhow::anyhow!(
            "mask size {:?} does not match image size {:?}",
            mask.dimensions(),
            img.dimensions()
        )));
    }
    for (px, m) in img.pixels_mut().zip(mask.pixels()) {
        px.0[3] = mul_div255_u8(u16::from(px.0[3]), u16::from(m.0[0]));
    }
    Ok(())
}
