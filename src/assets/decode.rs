use image::RgbaImage;

use crate::foundation::error::{ForgeError, ForgeResult};

/// Decode an encoded raster (PNG, JPEG, WebP, ...) into straight-alpha RGBA8.
///
/// `source` only labels errors.
pub fn decode_image(source: &str, bytes: &[u8]) -> ForgeResult<RgbaImage> {
    if bytes.is_empty() {
        return Err(ForgeError::asset_fetch(source, "empty image payload"));
    }
    let format = image::guess_format(bytes)
        .map_err(|e| ForgeError::asset_fetch(source, format!("unrecognized image data: {e}")))?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ForgeError::asset_fetch(source, format!("decode {format:?}: {e}")))?
        .to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(ForgeError::asset_fetch(source, "decoded image has zero size"));
    }
    tracing::debug!(
        source,
        ?format,
        width = img.width(),
        height = img.height(),
        "decoded image"
    );
    Ok(img)
}
