pub mod analysis;
pub mod consts;
pub mod error;
pub mod inference;
pub mod intake;
pub mod overlay;
pub mod paginate;
pub mod report;

// Re-export commonly used types
pub use analysis::{
    detection::{Detection, DetectionResult},
    severity::Severity,
};
pub use inference::{GeminiClient, Geocoder, LocationData, VisionService};
pub use intake::SourceImage;
pub use overlay::OverlayRenderer;
pub use paginate::{BoundaryPolicy, PageSpec, Pagination, paginate};
pub use report::{
    DocumentWriter, InspectionReport, ReportBuilder, ReportOptions, ReportOptionsBuilder,
};
