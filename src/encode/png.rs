use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::foundation::core::FrameRGBA;
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Convert a premultiplied frame to a straight-alpha image.
pub fn frame_to_image(frame: &FrameRGBA) -> ForgeResult<RgbaImage> {
    let mut data = frame.data.clone();
    unpremultiply_rgba8_in_place(&mut data);
    RgbaImage::from_raw(frame.width, frame.height, data).ok_or_else(|| {
        ForgeError::encoding(format!(
            "frame buffer does not match {}x{}",
            frame.width, frame.height
        ))
    })
}

/// Encode a straight-alpha image as PNG bytes.
pub fn encode_image_png(img: &RgbaImage) -> ForgeResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ForgeError::encoding(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

/// Encode a rendered frame as PNG bytes.
pub fn encode_png(frame: &FrameRGBA) -> ForgeResult<Vec<u8>> {
    encode_image_png(&frame_to_image(frame)?)
}

/// Write a rendered frame to `path` as PNG.
pub fn write_png(frame: &FrameRGBA, path: &Path) -> ForgeResult<()> {
    let bytes = encode_png(frame)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
