pub mod mark;

pub use mark::{DisplaySurface, OverlayMark};

use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use glam::Vec2;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage, imageops::FilterType};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use snafu::ResultExt;
use tracing::*;

use crate::{
    analysis::{bbox::Bbox, detection::Detection},
    consts::*,
    error::*,
};

/// Burns hazard boxes and captions into a scaled copy of a road image.
///
/// The renderer holds only the parsed label font, every call allocates and
/// returns its own canvas.
pub struct OverlayRenderer {
    font: FontRef<'static>,
    scale: PxScale,
}

impl OverlayRenderer {
    pub fn new() -> Result<Self, RoadscanError> {
        let font = FontRef::try_from_slice(FONT).context(FontSnafu {})?;

        Ok(Self {
            font,
            scale: PxScale::from(LABEL_FONT_SIZE),
        })
    }

    pub fn font(&self) -> &FontRef<'static> {
        &self.font
    }

    /// Width in pixels of `text` set in the label font.
    pub fn measure(&self, text: &str) -> f32 {
        text_size(self.scale, &self.font, text).0 as f32
    }

    /// Computes where every drawable detection lands on a surface of
    /// `display` pixels, in input order.
    ///
    /// Detections whose box is inverted, empty or non-finite are skipped.
    pub fn plan(&self, display: Vec2, detections: &[Detection]) -> Vec<OverlayMark> {
        detections
            .iter()
            .enumerate()
            .filter_map(|(index, detection)| {
                let Some(bbox) = detection.bbox.project(display) else {
                    warn!(
                        "skip detection {index} with malformed box {:?}",
                        detection.bbox
                    );
                    return None;
                };
                let caption = detection.caption();
                let text_width = self.measure(&caption);

                Some(OverlayMark::new(
                    index,
                    bbox,
                    Rgba(detection.severity.color()),
                    caption,
                    text_width,
                ))
            })
            .collect()
    }

    /// Renders `source` at `display_width` pixels wide with `detections`
    /// drawn on top.
    ///
    /// The height follows the source aspect ratio. Later detections paint
    /// over earlier ones.
    #[tracing::instrument(skip_all, fields(display_width = display_width, detections = detections.len()))]
    pub fn render(
        &self,
        source: &DynamicImage,
        display_width: u32,
        detections: &[Detection],
    ) -> Result<RgbaImage, RoadscanError> {
        let (width, height) = source.dimensions();
        let surface = DisplaySurface::fit_width(width, height, display_width)?;

        let mut canvas = if (surface.width, surface.height) == (width, height) {
            source.to_rgba8()
        } else {
            source
                .resize_exact(surface.width, surface.height, FilterType::Triangle)
                .to_rgba8()
        };

        let marks = self.plan(surface.size(), detections);
        debug!(
            "draw {} of {} detections on {}x{}",
            marks.len(),
            detections.len(),
            surface.width,
            surface.height
        );

        for mark in &marks {
            self.draw_mark(&mut canvas, mark);
        }

        Ok(canvas)
    }

    fn draw_mark(&self, canvas: &mut RgbaImage, mark: &OverlayMark) {
        if let Some(rect) = mark.bbox.to_rect() {
            stroke_rect(canvas, rect, mark.color, STROKE_WIDTH);
        }

        if let Some(band) = mark.label_background.to_rect() {
            draw_filled_rect_mut(canvas, band, mark.color);
        }

        // imageproc positions text by its top edge, the caption is placed by baseline
        let ascent = self.font.as_scaled(self.scale).ascent();
        let top = mark.text_origin.y - ascent;
        draw_text_mut(
            canvas,
            Rgba(LABEL_TEXT_COLOR),
            mark.text_origin.x.round() as i32,
            top.round() as i32,
            self.scale,
            &self.font,
            &mark.caption,
        );
    }
}

/// Strokes `rect` with a line `width` pixels wide centered on its edges.
fn stroke_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>, width: u32) {
    let half = (width / 2) as i32;
    for offset in -half..=half {
        let w = rect.width() as i32 + offset * 2;
        let h = rect.height() as i32 + offset * 2;
        if w <= 0 || h <= 0 {
            continue;
        }
        let ring = Rect::at(rect.left() - offset, rect.top() - offset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, ring, color);
    }
}

/// Label band geometry for a caption `text_width` pixels wide over `bbox`.
pub(crate) fn label_background(bbox: &Bbox, text_width: f32) -> Bbox {
    Bbox::new_from_min_size(
        Vec2::new(bbox.min.x, bbox.min.y - LABEL_HEIGHT),
        Vec2::new(text_width + LABEL_PADDING, LABEL_HEIGHT),
    )
}
