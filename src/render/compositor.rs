use image::RgbaImage;
use image::imageops::{self, FilterType};
use smallvec::SmallVec;

use crate::foundation::core::{FrameRGBA, Point, Rgba8};
use crate::foundation::error::{ForgeError, ForgeResult};
use crate::layout::geometry;
use crate::model::template::{ProfileShape, ProfileSlot, Template, TextSlot};
use crate::model::user::UserRecord;
use crate::render::canvas::{self, Canvas};
use crate::render::mask;
use crate::text::font::{FontResolver, ResolvedFont};
use crate::text::layout::{FaceMeasure, TextMeasure as _, TextShaper, stack_lines, wrap_words};

/// Padding around the profile background shape.
pub(crate) const PROFILE_BG_PADDING_PX: f64 = 10.0;
/// Padding around the name background box.
pub(crate) const NAME_BG_PADDING_PX: f64 = 10.0;
/// Padding around phone and address background boxes.
pub(crate) const DETAIL_BG_PADDING_PX: f64 = 8.0;

/// Layers in paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Background,
    MainMedia,
    ProfilePhoto,
    Name,
    Phone,
    Address,
}

/// What sits under the personalized layers.
#[derive(Clone, Copy, Debug)]
pub enum Backdrop<'a> {
    /// White canvas with the fit-scaled main image.
    MainImage(&'a RgbaImage),
    /// Fully transparent canvas; the caller supplies the background later (video overlay).
    Transparent,
}

/// Layers painted and layers dropped during one composite.
#[derive(Clone, Debug, Default)]
pub struct CompositeReport {
    pub painted: SmallVec<[LayerKind; 6]>,
    pub omitted: SmallVec<[(LayerKind, String); 4]>,
}

impl CompositeReport {
    pub fn painted(&self, layer: LayerKind) -> bool {
        self.painted.contains(&layer)
    }

    fn omit(&mut self, layer: LayerKind, err: &ForgeError) {
        tracing::warn!(?layer, error = %err, "omitting layer");
        self.omitted.push((layer, err.to_string()));
    }
}

/// Finished raster plus its paint report.
#[derive(Clone, Debug)]
pub struct Composite {
    pub frame: FrameRGBA,
    pub report: CompositeReport,
}

/// Builds the output raster in a fixed layer order.
///
/// Optional layers that fail are logged and skipped; the main media layer is mandatory.
pub struct Compositor<'a> {
    fonts: &'a FontResolver,
    shaper: TextShaper,
}

impl<'a> Compositor<'a> {
    pub fn new(fonts: &'a FontResolver) -> Self {
        Self {
            fonts,
            shaper: TextShaper::new(),
        }
    }

    /// Compose `template` personalized with `user`.
    ///
    /// `profile_photo` is the outcome of fetching the user's photo, or `None` when nothing was
    /// fetched. Phone and address only render when `user` is a business record.
    #[tracing::instrument(level = "debug", skip_all, fields(frame = ?template.frame_size))]
    pub fn compose(
        &mut self,
        template: &Template,
        user: &UserRecord,
        backdrop: Backdrop<'_>,
        profile_photo: Option<ForgeResult<RgbaImage>>,
    ) -> ForgeResult<Composite> {
        let frame = template.frame_size;
        let mut report = CompositeReport::default();

        let mut canvas = match backdrop {
            Backdrop::MainImage(main) => {
                let mut canvas = Canvas::filled(frame, Rgba8::WHITE);
                report.painted.push(LayerKind::Background);
                paint_main(&mut canvas, main)?;
                report.painted.push(LayerKind::MainMedia);
                canvas
            }
            Backdrop::Transparent => Canvas::transparent(frame),
        };

        if let Some(slot) = template.profile_slot.as_ref().filter(|s| s.enabled)
            && user.profile_photo_url.is_some()
        {
            match profile_photo {
                Some(Ok(photo)) => match paint_profile(&mut canvas, slot, &photo) {
                    Ok(()) => report.painted.push(LayerKind::ProfilePhoto),
                    Err(e) => report.omit(LayerKind::ProfilePhoto, &e),
                },
                Some(Err(e)) => report.omit(LayerKind::ProfilePhoto, &e),
                None => tracing::debug!("profile photo not supplied"),
            }
        }

        if let (Some(slot), Some(name)) = (&template.name_slot, user.name.as_deref()) {
            let origin_of = |anchor: Point| {
                geometry::text_origin(anchor, slot.font_size_px, name.chars().count())
            };
            match self.paint_single_line(&mut canvas, slot, name, NAME_BG_PADDING_PX, origin_of) {
                Ok(()) => report.painted.push(LayerKind::Name),
                Err(e) => report.omit(LayerKind::Name, &e),
            }
        }

        if let (Some(slot), Some(phone)) = (&template.phone_slot, user.business_phone()) {
            let origin_of = |anchor: Point| {
                geometry::text_origin(anchor, slot.font_size_px, phone.chars().count())
            };
            match self.paint_single_line(&mut canvas, slot, phone, DETAIL_BG_PADDING_PX, origin_of)
            {
                Ok(()) => report.painted.push(LayerKind::Phone),
                Err(e) => report.omit(LayerKind::Phone, &e),
            }
        }

        if let (Some(slot), Some(address)) = (&template.address_slot, user.business_address()) {
            match self.paint_address(&mut canvas, slot, address) {
                Ok(()) => report.painted.push(LayerKind::Address),
                Err(e) => report.omit(LayerKind::Address, &e),
            }
        }

        Ok(Composite {
            frame: canvas.into_frame(),
            report,
        })
    }

    fn paint_single_line(
        &mut self,
        canvas: &mut Canvas,
        slot: &TextSlot,
        text: &str,
        padding: f64,
        origin_of: impl Fn(Point) -> Point,
    ) -> ForgeResult<()> {
        let font = self.fonts.resolve(&slot.font_name);
        let anchor = geometry::anchor(slot.x_percent, slot.y_percent, canvas.size());
        let origin = origin_of(anchor);
        let extent = FaceMeasure {
            shaper: &mut self.shaper,
            font: &font,
            size_px: slot.font_size_px,
        }
        .measure(text)?;
        tracing::debug!(?origin, width = extent.width, height = extent.height, "text layer");

        let shaper = &mut self.shaper;
        canvas.paint_layer(|ctx| {
            if let Some(bg) = slot.background {
                canvas::set_color(ctx, bg);
                canvas::fill_rect(
                    ctx,
                    origin.x - padding,
                    origin.y - padding,
                    origin.x + extent.width + padding,
                    origin.y + extent.height + padding,
                );
            }
            canvas::paint_text_line(ctx, shaper, &font, text, origin, slot.font_size_px, slot.color)
        })
    }

    fn paint_address(&mut self, canvas: &mut Canvas, slot: &TextSlot, text: &str) -> ForgeResult<()> {
        let font: ResolvedFont = self.fonts.resolve(&slot.font_name);
        let anchor = geometry::anchor(slot.x_percent, slot.y_percent, canvas.size());
        let origin = geometry::address_origin(anchor);
        let max_width = geometry::address_max_width(anchor, canvas.size());

        let mut measure = FaceMeasure {
            shaper: &mut self.shaper,
            font: &font,
            size_px: slot.font_size_px,
        };
        let lines = wrap_words(&mut measure, text, max_width)?;
        if lines.is_empty() {
            return Err(ForgeError::Other(anyhow::anyhow!("address has no words")));
        }
        let placed = stack_lines(&mut measure, &lines, origin, slot.font_size_px)?;
        tracing::debug!(lines = placed.len(), max_width, "address layer");

        let shaper = &mut self.shaper;
        canvas.paint_layer(|ctx| {
            for line in &placed {
                if let Some(bg) = slot.background {
                    canvas::set_color(ctx, bg);
                    canvas::fill_rect(
                        ctx,
                        line.origin.x - DETAIL_BG_PADDING_PX,
                        line.origin.y - DETAIL_BG_PADDING_PX,
                        line.origin.x + line.extent.width + DETAIL_BG_PADDING_PX,
                        line.origin.y + line.extent.height + DETAIL_BG_PADDING_PX,
                    );
                }
                canvas::paint_text_line(
                    ctx,
                    shaper,
                    &font,
                    &line.text,
                    line.origin,
                    slot.font_size_px,
                    slot.color,
                )?;
            }
            Ok(())
        })
    }
}

fn paint_main(canvas: &mut Canvas, main: &RgbaImage) -> ForgeResult<()> {
    let fit = geometry::fit_within(main.width(), main.height(), canvas.size())?;
    tracing::debug!(
        scale = fit.scale,
        width = fit.width,
        height = fit.height,
        offset_x = fit.offset_x,
        offset_y = fit.offset_y,
        "fit main media"
    );
    let resized;
    let scaled = if (fit.width, fit.height) == main.dimensions() {
        main
    } else {
        resized = imageops::resize(main, fit.width, fit.height, FilterType::Lanczos3);
        &resized
    };
    canvas.blit_straight(scaled, i64::from(fit.offset_x), i64::from(fit.offset_y));
    Ok(())
}

/// Cover-scale and crop a photo to `side x side`, masking it to a circle when requested.
pub(crate) fn prepare_profile_photo(
    photo: &RgbaImage,
    side: u32,
    shape: ProfileShape,
) -> ForgeResult<RgbaImage> {
    let plan = geometry::cover_square(photo.width(), photo.height(), side)?;
    let resized = imageops::resize(
        photo,
        plan.scaled_width,
        plan.scaled_height,
        FilterType::Lanczos3,
    );
    let mut square = imageops::crop_imm(&resized, plan.crop_x, plan.crop_y, side, side).to_image();
    if shape == ProfileShape::Circle {
        mask::apply_mask(&mut square, &mask::circle_mask(side))?;
    }
    Ok(square)
}

fn paint_profile(canvas: &mut Canvas, slot: &ProfileSlot, photo: &RgbaImage) -> ForgeResult<()> {
    let side = slot.size_px;
    let max_side = geometry::max_profile_side(canvas.size());
    if side > max_side {
        return Err(ForgeError::invalid_template(
            "profileSettings.size",
            format!("profile side {side} px exceeds {max_side} px for this frame"),
        ));
    }
    let square = prepare_profile_photo(photo, side, slot.shape)?;
    let anchor = geometry::anchor(slot.x_percent, slot.y_percent, canvas.size());
    let (left, top) = geometry::centered_top_left(anchor, side);
    tracing::debug!(side, left, top, "profile layer");

    if let Some(bg) = slot.background {
        let (x0, y0) = (left as f64 - PROFILE_BG_PADDING_PX, top as f64 - PROFILE_BG_PADDING_PX);
        let x1 = left as f64 + f64::from(side) + PROFILE_BG_PADDING_PX;
        let y1 = top as f64 + f64::from(side) + PROFILE_BG_PADDING_PX;
        canvas.paint_layer(|ctx| {
            canvas::set_color(ctx, bg);
            match slot.shape {
                ProfileShape::Circle => canvas::fill_ellipse(ctx, x0, y0, x1, y1),
                ProfileShape::Rect => canvas::fill_rect(ctx, x0, y0, x1, y1),
            }
            Ok(())
        })?;
    }
    canvas.blit_straight(&square, left, top);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
