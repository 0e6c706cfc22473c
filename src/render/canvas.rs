use image::RgbaImage;
use vello_cpu::kurbo::Shape as _;

use crate::foundation::core::{FrameRGBA, FrameSize, Point, Rgba8, Rgba8Premul};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::foundation::math::{over, premul_over_in_place};
use crate::text::font::{
    BUILTIN_ADVANCE_CELLS, BUILTIN_GLYPH_COLS, FontFace, ResolvedFont, builtin_cell_px,
    builtin_glyph,
};
use crate::text::layout::{TextBrushRgba8, TextShaper};

/// Premultiplied RGBA8 output surface of exactly the template frame size.
#[derive(Clone, Debug)]
pub struct Canvas {
    size: FrameSize,
    data: Vec<u8>,
}

impl Canvas {
    /// Canvas filled with a solid color.
    pub fn filled(size: FrameSize, color: Rgba8) -> Self {
        let px = color.premultiplied().to_array();
        let mut data = Vec::with_capacity(size.byte_len());
        for _ in 0..size.pixel_count() {
            data.extend_from_slice(&px);
        }
        Self { size, data }
    }

    pub fn transparent(size: FrameSize) -> Self {
        Self {
            size,
            data: vec![0u8; size.byte_len()],
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Composite a straight-alpha image with its top-left at (`left`, `top`), clipped to the canvas.
    pub fn blit_straight(&mut self, img: &RgbaImage, left: i64, top: i64) {
        let (fw, fh) = (i64::from(self.size.width), i64::from(self.size.height));
        let (iw, ih) = (i64::from(img.width()), i64::from(img.height()));

        let x0 = left.max(0);
        let y0 = top.max(0);
        let x1 = (left + iw).min(fw);
        let y1 = (top + ih).min(fh);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        for y in y0..y1 {
            let sy = (y - top) as u32;
            let row = (y * fw) as usize * 4;
            for x in x0..x1 {
                let s = img.get_pixel((x - left) as u32, sy).0;
                let src = Rgba8Premul::from_straight_rgba(s[0], s[1], s[2], s[3]).to_array();
                let idx = row + x as usize * 4;
                let dst = [
                    self.data[idx],
                    self.data[idx + 1],
                    self.data[idx + 2],
                    self.data[idx + 3],
                ];
                self.data[idx..idx + 4].copy_from_slice(&over(dst, src));
            }
        }
    }

    /// Rasterize one vector layer with the CPU renderer and composite it over the canvas.
    pub fn paint_layer<F>(&mut self, draw: F) -> ForgeResult<()>
    where
        F: FnOnce(&mut vello_cpu::RenderContext) -> ForgeResult<()>,
    {
        let w: u16 = self
            .size
            .width
            .try_into()
            .map_err(|_| ForgeError::encoding("canvas width exceeds u16"))?;
        let h: u16 = self
            .size
            .height
            .try_into()
            .map_err(|_| ForgeError::encoding("canvas height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(w, h);
        draw(&mut ctx)?;
        ctx.flush();
        let mut layer = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut layer);
        premul_over_in_place(&mut self.data, layer.data_as_u8_slice())
    }

    pub fn into_frame(self) -> FrameRGBA {
        FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data: self.data,
        }
    }
}

pub(crate) fn set_color(ctx: &mut vello_cpu::RenderContext, c: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

pub(crate) fn fill_rect(ctx: &mut vello_cpu::RenderContext, x0: f64, y0: f64, x1: f64, y1: f64) {
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x0, y0, x1, y1));
}

/// Fill the ellipse inscribed in the given box.
pub(crate) fn fill_ellipse(ctx: &mut vello_cpu::RenderContext, x0: f64, y0: f64, x1: f64, y1: f64) {
    let e = vello_cpu::kurbo::Ellipse::from_rect(vello_cpu::kurbo::Rect::new(x0, y0, x1, y1));
    let mut p = vello_cpu::kurbo::BezPath::new();
    for el in e.path_elements(0.1) {
        p.push(el);
    }
    ctx.fill_path(&p);
}

/// Draw one line of text with its top-left at `origin`.
pub(crate) fn paint_text_line(
    ctx: &mut vello_cpu::RenderContext,
    shaper: &mut TextShaper,
    font: &ResolvedFont,
    text: &str,
    origin: Point,
    size_px: f32,
    color: Rgba8,
) -> ForgeResult<()> {
    match &font.face {
        FontFace::Builtin => {
            paint_builtin_line(ctx, text, origin, size_px, color);
            Ok(())
        }
        FontFace::Outline(outline) => {
            let layout = shaper.layout_line(text, outline, size_px, TextBrushRgba8::from(color))?;
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&outline.paint_font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            Ok(())
        }
    }
}

fn paint_builtin_line(
    ctx: &mut vello_cpu::RenderContext,
    text: &str,
    origin: Point,
    size_px: f32,
    color: Rgba8,
) {
    let cell = builtin_cell_px(size_px);
    set_color(ctx, color);
    for (i, ch) in text.chars().enumerate() {
        let gx = origin.x + (i as f64) * f64::from(BUILTIN_ADVANCE_CELLS) * cell;
        for (row, bits) in builtin_glyph(ch).into_iter().enumerate() {
            let y0 = origin.y + row as f64 * cell;
            // Merge horizontal runs of set bits into one rect.
            let mut col = 0u32;
            while col < BUILTIN_GLYPH_COLS {
                if !bit_set(bits, col) {
                    col += 1;
                    continue;
                }
                let start = col;
                while col < BUILTIN_GLYPH_COLS && bit_set(bits, col) {
                    col += 1;
                }
                fill_rect(
                    ctx,
                    gx + f64::from(start) * cell,
                    y0,
                    gx + f64::from(col) * cell,
                    y0 + cell,
                );
            }
        }
    }
}

fn bit_set(bits: u8, col: u32) -> bool {
    bits & (1u8 << (BUILTIN_GLYPH_COLS - 1 - col)) != 0
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
