use image::{Rgb, RgbImage, imageops};
use tracing::*;

use crate::{error::RoadscanError, paginate::Pagination};

use super::DocumentWriter;

/// Writes every page as its own raster, the sheet's native pixel density.
///
/// Page `i` shows source rows `[b(i), b(i + 1))` where `b(i)` is the page's
/// offset converted to pixels, so consecutive pages share an exact boundary.
/// Rows past the end of the content are left white.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRasterWriter;

impl PageRasterWriter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentWriter for PageRasterWriter {
    type Output = Vec<RgbImage>;

    #[tracing::instrument(skip_all, fields(pages = pagination.page_count()))]
    fn write(
        &self,
        sheet: &RgbImage,
        pagination: Pagination,
    ) -> Result<Self::Output, RoadscanError> {
        let (width, height) = sheet.dimensions();
        let spec = pagination.spec();
        let px_per_unit = width as f64 / spec.width;
        let page_height = (spec.height * px_per_unit).ceil().max(1.0) as u32;
        let last = pagination.page_count().saturating_sub(1);

        let boundary = |offset: f64| ((offset * px_per_unit).round().max(0.0) as u32).min(height);

        let pages = pagination
            .map(|placement| {
                let start = boundary(placement.source_offset);
                let end = if placement.page_index == last {
                    height
                } else {
                    boundary(placement.window(spec.height).end)
                };
                let rows = end.saturating_sub(start).min(page_height);

                let mut page = RgbImage::from_pixel(width, page_height, Rgb([255, 255, 255]));
                if rows > 0 {
                    let window = imageops::crop_imm(sheet, 0, start, width, rows).to_image();
                    imageops::replace(&mut page, &window, 0, 0);
                }
                debug!(
                    "page {} shows rows {start}..{}",
                    placement.page_index,
                    start + rows
                );
                page
            })
            .collect();

        Ok(pages)
    }
}
