pub mod pages;
pub mod pdf;
pub mod sheet;

pub use pages::PageRasterWriter;
pub use pdf::PdfDocumentWriter;
pub use sheet::SheetComposer;

use chrono::{DateTime, Local, Utc};
use derive_builder::Builder;
use image::{DynamicImage, RgbImage};
use tracing::*;
use uuid::Uuid;

use crate::{
    analysis::detection::DetectionResult,
    consts::*,
    error::RoadscanError,
    inference::LocationData,
    overlay::OverlayRenderer,
    paginate::{BoundaryPolicy, PageSpec, Pagination, paginate},
};

/// Turns one tall document raster plus its placements into an output document.
pub trait DocumentWriter {
    type Output;

    fn write(&self, sheet: &RgbImage, pagination: Pagination)
    -> Result<Self::Output, RoadscanError>;
}

#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct ReportOptions {
    pub page: PageSpec,
    pub boundary: BoundaryPolicy,
    /// device pixels per logical sheet pixel
    pub capture_scale: f32,
    /// logical width of the sheet
    pub sheet_width: u32,
    /// logical padding around the sheet content
    pub margin: u32,
    pub jpeg_quality: u8,
    pub title: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            page: PageSpec::A4,
            boundary: BoundaryPolicy::ExactFit,
            capture_scale: CAPTURE_SCALE,
            sheet_width: SHEET_WIDTH,
            margin: SHEET_MARGIN,
            jpeg_quality: JPEG_QUALITY,
            title: "Technical Road Inspection".to_string(),
        }
    }
}

impl ReportOptions {
    pub fn px(&self, logical: f32) -> f32 {
        logical * self.capture_scale
    }

    /// Device-pixel width available to the annotated photo.
    pub fn content_width_px(&self) -> u32 {
        let logical = self.sheet_width.saturating_sub(self.margin * 2).max(1);
        (self.px(logical as f32).round() as u32).max(1)
    }
}

/// Everything printed on one inspection report.
#[derive(Debug, Clone)]
pub struct InspectionReport {
    pub reference: String,
    pub generated_at: DateTime<Local>,
    pub result: DetectionResult,
    pub location: Option<LocationData>,
}

impl InspectionReport {
    pub fn new(result: DetectionResult, location: Option<LocationData>) -> Self {
        Self {
            reference: reference_id(),
            generated_at: Local::now(),
            result,
            location,
        }
    }
}

/// Nine upper-case characters identifying one report.
pub fn reference_id() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_uppercase()
}

/// `ROAD-SURFACE-ANALYSIS-<iso timestamp>.pdf` with `:` and `.` replaced by `-`.
pub fn report_file_name(at: DateTime<Utc>) -> String {
    let stamp = at
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-");
    format!("ROAD-SURFACE-ANALYSIS-{stamp}.pdf")
}

/// Renders an inspection report and hands it to document writers.
pub struct ReportBuilder {
    overlay: OverlayRenderer,
    sheet: SheetComposer,
    options: ReportOptions,
}

impl ReportBuilder {
    pub fn new(options: ReportOptions) -> Result<Self, RoadscanError> {
        options.page.validate()?;
        Ok(Self {
            overlay: OverlayRenderer::new()?,
            sheet: SheetComposer::new(options.clone())?,
            options,
        })
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Renders the full report as one tall raster.
    #[tracing::instrument(skip_all, fields(reference = %report.reference))]
    pub fn compose(
        &self,
        source: &DynamicImage,
        report: &InspectionReport,
    ) -> Result<RgbImage, RoadscanError> {
        let annotated = self.overlay.render(
            source,
            self.options.content_width_px(),
            &report.result.potholes,
        )?;
        let sheet = self.sheet.compose(&annotated, report);
        info!("composed report sheet {}x{}", sheet.width(), sheet.height());

        Ok(sheet)
    }

    pub fn paginate(&self, sheet: &RgbImage) -> Result<Pagination, RoadscanError> {
        paginate(
            sheet.width(),
            sheet.height(),
            self.options.page,
            self.options.boundary,
        )
    }

    /// Composes, paginates and writes the report with `writer`.
    pub fn build<W: DocumentWriter>(
        &self,
        source: &DynamicImage,
        report: &InspectionReport,
        writer: &W,
    ) -> Result<W::Output, RoadscanError> {
        let sheet = self.compose(source, report)?;
        let pagination = self.paginate(&sheet)?;
        info!("report spans {} pages", pagination.page_count());

        writer.write(&sheet, pagination)
    }
}
