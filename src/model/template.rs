use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::foundation::core::{FrameSize, Rgba8};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::layout::geometry;
use crate::model::color::parse_color;

pub(crate) const DEFAULT_FONT_NAME: &str = "Arial";
pub(crate) const DEFAULT_FONT_SIZE_PX: f32 = 24.0;
const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "webm", "mkv", "m4v"];

/// Kind of the template's main media.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Background media of a template.
#[derive(Clone, Debug, PartialEq)]
pub struct MainMedia {
    pub url: String,
    pub kind: MediaKind,
}

/// Shape of the profile-photo slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileShape {
    Circle,
    Rect,
}

/// Profile-photo slot. `size_px` is already the doubled render size.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileSlot {
    pub enabled: bool,
    pub x_percent: f64,
    pub y_percent: f64,
    pub size_px: u32,
    pub shape: ProfileShape,
    /// Fill painted behind the photo, when the slot has a background.
    pub background: Option<Rgba8>,
}

/// A text slot (name, phone or address).
#[derive(Clone, Debug, PartialEq)]
pub struct TextSlot {
    pub x_percent: f64,
    pub y_percent: f64,
    pub font_name: String,
    pub font_size_px: f32,
    pub color: Rgba8,
    pub background: Option<Rgba8>,
}

/// Strongly typed, validated template.
///
/// Every optional slot is an `Option`; an absent slot means the layer is skipped.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub frame_size: FrameSize,
    pub main_media: MainMedia,
    pub profile_slot: Option<ProfileSlot>,
    pub name_slot: Option<TextSlot>,
    pub phone_slot: Option<TextSlot>,
    pub address_slot: Option<TextSlot>,
}

impl Template {
    /// Parse and validate a template document from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> ForgeResult<Self> {
        let doc: TemplateDoc = serde_json::from_slice(bytes)
            .map_err(|e| ForgeError::invalid_template("document", format!("parse JSON: {e}")))?;
        Self::from_doc(doc)
    }

    /// Parse and validate a template document from a JSON value.
    pub fn from_json_value(value: serde_json::Value) -> ForgeResult<Self> {
        let doc: TemplateDoc = serde_json::from_value(value)
            .map_err(|e| ForgeError::invalid_template("document", format!("parse JSON: {e}")))?;
        Self::from_doc(doc)
    }

    /// Parse and validate a template document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ForgeResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ForgeError::invalid_template(
                "document",
                format!("read template '{}': {e}", path.display()),
            )
        })?;
        Self::from_json_slice(&bytes)
    }

    pub(crate) fn from_doc(doc: TemplateDoc) -> ForgeResult<Self> {
        let frame = doc
            .frame_size
            .as_ref()
            .ok_or_else(|| ForgeError::invalid_template("frameSize", "missing"))?;
        let width = positive_u32(frame.width, "frameSize.width")?;
        let height = positive_u32(frame.height, "frameSize.height")?;
        let frame_size = FrameSize::new(width, height)?;

        let main_media = main_media_from_doc(&doc)?;

        // A disabled profile slot is never read, so it may omit its geometry.
        let profile_slot = match doc.profile_slot {
            Some(p) if p.enabled == Some(true) => Some(profile_from_doc(p, frame_size)?),
            _ => None,
        };

        // The name slot has no `enabled` flag in older documents: present unless disabled.
        let name_slot = match doc.text_slots.name.or(doc.text_settings) {
            Some(t) if t.enabled != Some(false) => Some(text_from_doc(t, "textSettings")?),
            _ => None,
        };
        let phone_slot = match doc.text_slots.phone.or(doc.phone_settings) {
            Some(t) if t.enabled == Some(true) => Some(text_from_doc(t, "phoneSettings")?),
            _ => None,
        };
        let address_slot = match doc.text_slots.address.or(doc.address_settings) {
            Some(t) if t.enabled == Some(true) => Some(text_from_doc(t, "addressSettings")?),
            _ => None,
        };

        Ok(Self {
            frame_size,
            main_media,
            profile_slot,
            name_slot,
            phone_slot,
            address_slot,
        })
    }
}

/// Guess whether a media URL refers to a video when the document carries no media type.
pub fn infer_media_kind(url: &str) -> MediaKind {
    if url.starts_with("data:video/") {
        return MediaKind::Video;
    }
    if url.starts_with("http") && url.contains("video") {
        return MediaKind::Video;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

fn main_media_from_doc(doc: &TemplateDoc) -> ForgeResult<MainMedia> {
    let (url, media_type) = match &doc.main_media {
        Some(m) => (m.url.clone(), m.media_type.clone().or(doc.media_type.clone())),
        None => (doc.main_image.clone(), doc.media_type.clone()),
    };
    let url = url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ForgeError::invalid_template("mainImage", "missing main media URL"))?;

    let kind = match media_type.as_deref().map(str::trim) {
        None | Some("") => infer_media_kind(&url),
        Some(t) if t.eq_ignore_ascii_case("image") => MediaKind::Image,
        Some(t) if t.eq_ignore_ascii_case("video") => MediaKind::Video,
        Some(t) => {
            return Err(ForgeError::invalid_template(
                "mediaType",
                format!("expected \"image\" or \"video\", got \"{t}\""),
            ));
        }
    };
    Ok(MainMedia { url, kind })
}

fn profile_from_doc(p: ProfileDoc, frame: FrameSize) -> ForgeResult<ProfileSlot> {
    let x_percent = percent(p.x, "profileSettings.x")?;
    let y_percent = percent(p.y, "profileSettings.y")?;

    // Nominal authoring size is doubled at render resolution.
    let max_side = geometry::max_profile_side(frame);
    let size_px = match p.size.map(|s| (s * 2.0).round()) {
        Some(side) if side >= 1.0 && side <= f64::from(max_side) => side as u32,
        other => {
            return Err(ForgeError::invalid_template(
                "profileSettings.size",
                format!("doubled size must be within [1, {max_side}] px, got {other:?}"),
            ));
        }
    };

    let shape = match p.shape.as_deref().map(str::trim) {
        Some(s) if s.eq_ignore_ascii_case("circle") => ProfileShape::Circle,
        Some(s) if s.eq_ignore_ascii_case("square") || s.eq_ignore_ascii_case("rect") => {
            ProfileShape::Rect
        }
        None | Some("") => ProfileShape::Circle,
        Some(s) => {
            return Err(ForgeError::invalid_template(
                "profileSettings.shape",
                format!("expected \"circle\" or \"square\", got \"{s}\""),
            ));
        }
    };

    let background = if p.has_background.unwrap_or(false) {
        Some(color_or(
            p.background_color.as_deref(),
            Rgba8::BLACK,
            "profileSettings.backgroundColor",
        )?)
    } else {
        None
    };

    Ok(ProfileSlot {
        enabled: true,
        x_percent,
        y_percent,
        size_px,
        shape,
        background,
    })
}

fn text_from_doc(t: TextDoc, prefix: &str) -> ForgeResult<TextSlot> {
    let x_percent = percent(t.x, &format!("{prefix}.x"))?;
    let y_percent = percent(t.y, &format!("{prefix}.y"))?;
    let font_size_px = match t.font_size {
        None => DEFAULT_FONT_SIZE_PX,
        Some(s) if s.is_finite() && s > 0.0 => s as f32,
        Some(s) => {
            return Err(ForgeError::invalid_template(
                format!("{prefix}.fontSize"),
                format!("must be > 0, got {s}"),
            ));
        }
    };
    let font_name = t
        .font
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FONT_NAME.to_string());
    let color = color_or(t.color.as_deref(), Rgba8::WHITE, &format!("{prefix}.color"))?;
    let background = if t.has_background.unwrap_or(false) {
        Some(color_or(
            t.background_color.as_deref(),
            Rgba8::BLACK,
            &format!("{prefix}.backgroundColor"),
        )?)
    } else {
        None
    };
    Ok(TextSlot {
        x_percent,
        y_percent,
        font_name,
        font_size_px,
        color,
        background,
    })
}

fn percent(v: Option<f64>, field: &str) -> ForgeResult<f64> {
    let v = v.ok_or_else(|| ForgeError::invalid_template(field, "missing"))?;
    if !v.is_finite() || !(0.0..=100.0).contains(&v) {
        return Err(ForgeError::invalid_template(
            field,
            format!("percentage must be within [0, 100], got {v}"),
        ));
    }
    Ok(v)
}

fn positive_u32(v: Option<f64>, field: &str) -> ForgeResult<u32> {
    let v = v.ok_or_else(|| ForgeError::invalid_template(field, "missing"))?;
    if !v.is_finite() || v < 1.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(ForgeError::invalid_template(
            field,
            format!("must be a positive integer, got {v}"),
        ));
    }
    Ok(v as u32)
}

fn color_or(v: Option<&str>, default: Rgba8, field: &str) -> ForgeResult<Rgba8> {
    match v.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => parse_color(s).map_err(|e| ForgeError::invalid_template(field, e)),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TemplateDoc {
    #[serde(default)]
    frame_size: Option<FrameSizeDoc>,
    #[serde(default)]
    main_media: Option<MediaDoc>,
    #[serde(default)]
    main_image: Option<String>,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default, alias = "profileSettings")]
    profile_slot: Option<ProfileDoc>,
    #[serde(default)]
    text_slots: TextSlotsDoc,
    #[serde(default)]
    text_settings: Option<TextDoc>,
    #[serde(default)]
    phone_settings: Option<TextDoc>,
    #[serde(default)]
    address_settings: Option<TextDoc>,
}

#[derive(Debug, Deserialize)]
struct FrameSizeDoc {
    #[serde(default, deserialize_with = "loose_f64")]
    width: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    height: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaDoc {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    media_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TextSlotsDoc {
    #[serde(default)]
    name: Option<TextDoc>,
    #[serde(default)]
    phone: Option<TextDoc>,
    #[serde(default)]
    address: Option<TextDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileDoc {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default, alias = "xPercent", deserialize_with = "loose_f64")]
    x: Option<f64>,
    #[serde(default, alias = "yPercent", deserialize_with = "loose_f64")]
    y: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    size: Option<f64>,
    #[serde(default)]
    shape: Option<String>,
    #[serde(default)]
    has_background: Option<bool>,
    #[serde(default)]
    background_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDoc {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default, alias = "xPercent", deserialize_with = "loose_f64")]
    x: Option<f64>,
    #[serde(default, alias = "yPercent", deserialize_with = "loose_f64")]
    y: Option<f64>,
    #[serde(default, alias = "fontName")]
    font: Option<String>,
    #[serde(default, alias = "fontSizePx", deserialize_with = "loose_f64")]
    font_size: Option<f64>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    has_background: Option<bool>,
    #[serde(default)]
    background_color: Option<String>,
}

/// Accept numbers, numeric strings and `null` for numeric document fields.
fn loose_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Str(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Num(v)) => Ok(Some(v)),
        Some(Repr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Repr::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a number, got \"{s}\""))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/template.rs"]
mod tests;
