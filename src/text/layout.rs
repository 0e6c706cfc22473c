use std::collections::HashMap;

use smallvec::SmallVec;

use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::text::font::{
    BUILTIN_ADVANCE_CELLS, BUILTIN_GLYPH_ROWS, FontFace, OutlineFont, ResolvedFont,
    builtin_cell_px,
};

/// Extra leading between wrapped lines, in pixels.
pub(crate) const LINE_GAP_PX: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Measured ink box of a run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// Measures a single line of text in one face and size.
pub trait TextMeasure {
    fn measure(&mut self, text: &str) -> ForgeResult<TextExtent>;
}

/// Metrics of the built-in bitmap face.
#[derive(Clone, Copy, Debug)]
pub struct BuiltinMeasure {
    pub size_px: f32,
}

impl BuiltinMeasure {
    pub fn extent(size_px: f32, text: &str) -> TextExtent {
        let cell = builtin_cell_px(size_px);
        let n = text.chars().count() as f64;
        if n == 0.0 {
            return TextExtent::default();
        }
        TextExtent {
            width: n * f64::from(BUILTIN_ADVANCE_CELLS) * cell - cell,
            height: f64::from(BUILTIN_GLYPH_ROWS) * cell,
        }
    }
}

impl TextMeasure for BuiltinMeasure {
    fn measure(&mut self, text: &str) -> ForgeResult<TextExtent> {
        Ok(Self::extent(self.size_px, text))
    }
}

/// Stateful helper for building Parley text layouts from outline fonts.
///
/// Registered families are remembered per font key so each face is registered once.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<u64, String>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &OutlineFont) -> ForgeResult<String> {
        if let Some(name) = self.families.get(&font.key) {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::new(font.data.clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ForgeError::Other(anyhow::anyhow!("no font families registered from font bytes"))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ForgeError::Other(anyhow::anyhow!("registered font family has no name")))?
            .to_string();
        self.families.insert(font.key, family_name.clone());
        Ok(family_name)
    }

    /// Shape and lay out one unwrapped line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        font: &OutlineFont,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ForgeResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ForgeError::Other(anyhow::anyhow!(
                "text size_px must be finite and > 0"
            )));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl std::fmt::Debug for TextShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextShaper")
            .field("families", &self.families.len())
            .finish_non_exhaustive()
    }
}

/// [`TextMeasure`] for a resolved face: Parley for outline fonts, fixed metrics for the built-in.
pub struct FaceMeasure<'a> {
    pub shaper: &'a mut TextShaper,
    pub font: &'a ResolvedFont,
    pub size_px: f32,
}

impl TextMeasure for FaceMeasure<'_> {
    fn measure(&mut self, text: &str) -> ForgeResult<TextExtent> {
        match &self.font.face {
            FontFace::Builtin => Ok(BuiltinMeasure::extent(self.size_px, text)),
            FontFace::Outline(_) if text.is_empty() => Ok(TextExtent::default()),
            FontFace::Outline(font) => {
                let layout = self.shaper.layout_line(
                    text,
                    font,
                    self.size_px,
                    TextBrushRgba8::default(),
                )?;
                Ok(TextExtent {
                    width: f64::from(layout.width()),
                    height: f64::from(layout.height()),
                })
            }
        }
    }
}

/// Vertical distance between wrapped lines.
pub fn line_height(font_size_px: f32) -> f64 {
    f64::from(font_size_px) + LINE_GAP_PX
}

/// Greedy word wrap.
///
/// Words are appended while the joined line measures within `max_width`. An over-wide word that
/// starts a line stays alone on it.
pub fn wrap_words<M>(
    measure: &mut M,
    text: &str,
    max_width: f64,
) -> ForgeResult<SmallVec<[String; 4]>>
where
    M: TextMeasure + ?Sized,
{
    let mut lines: SmallVec<[String; 4]> = SmallVec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.measure(&candidate)?.width <= max_width {
            current = candidate;
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

/// One line of a laid-out text block, positioned in frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub origin: Point,
    pub extent: TextExtent,
}

/// Stack `lines` downward from `origin` by [`line_height`].
pub fn stack_lines<M>(
    measure: &mut M,
    lines: &[String],
    origin: Point,
    font_size_px: f32,
) -> ForgeResult<SmallVec<[PlacedLine; 4]>>
where
    M: TextMeasure + ?Sized,
{
    let step = line_height(font_size_px);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            Ok(PlacedLine {
                text: line.clone(),
                origin: Point::new(origin.x, origin.y + i as f64 * step),
                extent: measure.measure(line)?,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
