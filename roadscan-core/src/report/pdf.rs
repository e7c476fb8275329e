use std::io::Cursor;

use image::{RgbImage, codecs::jpeg::JpegEncoder};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use snafu::ResultExt;
use tracing::*;

use crate::{
    consts::POINTS_PER_MM,
    error::{ImageEncodeSnafu, RoadscanError},
    paginate::Pagination,
};

use super::DocumentWriter;

const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// Writes a PDF whose pages all show the same embedded JPEG at the page's offset.
///
/// Page sizes are in millimeters. Each page clips to its own media box, so
/// the image is shifted up by the placement offset and the part above and
/// below the window is cut off.
#[derive(Debug, Clone, Copy)]
pub struct PdfDocumentWriter {
    jpeg_quality: u8,
}

impl PdfDocumentWriter {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    fn encode_jpeg(&self, sheet: &RgbImage) -> Result<Vec<u8>, RoadscanError> {
        let mut bytes = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
        sheet.write_with_encoder(encoder).context(ImageEncodeSnafu)?;
        Ok(bytes.into_inner())
    }
}

impl Default for PdfDocumentWriter {
    fn default() -> Self {
        Self::new(crate::consts::JPEG_QUALITY)
    }
}

impl DocumentWriter for PdfDocumentWriter {
    type Output = Vec<u8>;

    #[tracing::instrument(skip_all, fields(pages = pagination.page_count()))]
    fn write(
        &self,
        sheet: &RgbImage,
        pagination: Pagination,
    ) -> Result<Self::Output, RoadscanError> {
        let jpeg = self.encode_jpeg(sheet)?;
        debug!("encoded sheet as {} bytes of jpeg", jpeg.len());

        let spec = pagination.spec();
        let page_w = (spec.width * POINTS_PER_MM) as f32;
        let page_h = (spec.height * POINTS_PER_MM) as f32;
        let image_h = pagination.image_height();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let image_id = Ref::new(3);
        let mut next_id = 4;

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(pages_id);

        let mut image = pdf.image_xobject(image_id, &jpeg);
        image.filter(Filter::DctDecode);
        image.width(sheet.width() as i32);
        image.height(sheet.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let mut page_ids = Vec::with_capacity(pagination.page_count());
        for placement in pagination {
            let page_id = Ref::new(next_id);
            let content_id = Ref::new(next_id + 1);
            next_id += 2;

            // PDF space grows upward: the image bottom sits below the page top
            // by the image height, raised by how far down the window starts.
            let bottom = (spec.height + placement.source_offset - image_h) * POINTS_PER_MM;

            let mut content = Content::new();
            content.save_state();
            content.rect(0.0, 0.0, page_w, page_h);
            content.clip_nonzero();
            content.end_path();
            content.transform([
                page_w,
                0.0,
                0.0,
                (image_h * POINTS_PER_MM) as f32,
                0.0,
                bottom as f32,
            ]);
            content.x_object(IMAGE_NAME);
            content.restore_state();
            pdf.stream(content_id, &content.finish());

            let mut page = pdf.page(page_id);
            page.media_box(Rect::new(0.0, 0.0, page_w, page_h))
                .parent(pages_id)
                .contents(content_id);
            page.resources().x_objects().pair(IMAGE_NAME, image_id);
            page.finish();

            trace!("page {} draws image at {bottom:.2}pt", placement.page_index);
            page_ids.push(page_id);
        }

        let count = page_ids.len() as i32;
        pdf.pages(pages_id).kids(page_ids).count(count);
        info!("wrote pdf with {count} pages");

        Ok(pdf.finish())
    }
}
