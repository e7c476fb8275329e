use image::{DynamicImage, Rgb, RgbImage};
use roadscan_core::analysis::bbox::NormalizedBox;
use roadscan_core::report::{PageRasterWriter, PdfDocumentWriter, report_file_name};
use roadscan_core::{
    BoundaryPolicy, Detection, DetectionResult, InspectionReport, LocationData, ReportBuilder,
    ReportOptionsBuilder, Severity,
};

fn report() -> InspectionReport {
    let result: DetectionResult = serde_json::from_str(
        r#"{
            "potholes": [
                {"id": "a", "box_2d": [100, 100, 400, 500], "label": "pothole", "confidence": 0.91, "severity": "High"},
                {"box_2d": [600, 550, 800, 900], "label": "crack", "confidence": 0.4, "severity": "Low"}
            ],
            "summary": "Two hazards near the curb."
        }"#,
    )
    .expect("parse detections");
    assert_eq!(result.potholes[0].severity, Severity::High);

    InspectionReport::new(result, Some(LocationData::from_device(48.8566, 2.3522)))
}

fn photo() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(640, 480, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

#[test]
fn pdf_report_lands_on_disk() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let builder = ReportBuilder::new(Default::default()).expect("builder");

    let bytes = builder
        .build(&photo(), &report(), &PdfDocumentWriter::default())
        .expect("build pdf");
    let path = temp.path().join(report_file_name(chrono::Utc::now()));
    std::fs::write(&path, &bytes).expect("write pdf");

    let written = std::fs::read(&path).expect("read pdf");
    assert!(written.starts_with(b"%PDF-"));
    assert!(
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("ROAD-SURFACE-ANALYSIS-") && n.ends_with(".pdf"))
    );
}

#[test]
fn page_rasters_roundtrip_through_png() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let options = ReportOptionsBuilder::default()
        .capture_scale(1.0)
        .boundary(BoundaryPolicy::ExactFit)
        .build()
        .expect("options");
    let builder = ReportBuilder::new(options).expect("builder");

    let pages = builder
        .build(&photo(), &report(), &PageRasterWriter::new())
        .expect("build pages");
    assert!(!pages.is_empty());

    let first = &pages[0];
    for (index, page) in pages.iter().enumerate() {
        assert_eq!(page.dimensions(), first.dimensions());
        let path = temp.path().join(format!("page-{index}.png"));
        page.save(&path).expect("save page");

        let reread = image::open(&path).expect("open page").to_rgb8();
        assert_eq!(&reread, page);
    }
}

#[test]
fn skipped_detections_do_not_break_the_report() {
    let mut report = report();
    report.result.potholes.push(Detection {
        bbox: NormalizedBox::new(500.0, 500.0, 100.0, 100.0),
        label: "inverted".to_string(),
        confidence: 0.5,
        severity: Severity::Unrecognized("Extreme".to_string()),
    });

    let builder = ReportBuilder::new(Default::default()).expect("builder");
    let sheet = builder.compose(&photo(), &report).expect("compose");
    let pagination = builder.paginate(&sheet).expect("paginate");
    assert_eq!(pagination.len(), pagination.page_count());
}
