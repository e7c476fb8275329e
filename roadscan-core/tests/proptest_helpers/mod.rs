#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use roadscan_core::analysis::bbox::NormalizedBox;
use roadscan_core::{BoundaryPolicy, Detection, PageSpec, Severity};

pub const EPS_PX: f32 = 1e-3;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_policy() -> impl Strategy<Value = BoundaryPolicy> {
    prop_oneof![
        Just(BoundaryPolicy::ExactFit),
        Just(BoundaryPolicy::TrailingBlank)
    ]
}

pub fn arb_page_spec() -> impl Strategy<Value = PageSpec> {
    (50.0f64..500.0, 50.0f64..800.0).prop_map(|(width, height)| PageSpec { width, height })
}

pub fn arb_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        "[a-z]{1,8}".prop_map(Severity::Unrecognized),
    ]
}

/// Boxes that are well formed and inside the normalized grid.
pub fn arb_normalized_box() -> impl Strategy<Value = NormalizedBox> {
    (0.0f32..999.0, 0.0f32..999.0)
        .prop_flat_map(|(ymin, xmin)| {
            (
                Just(ymin),
                Just(xmin),
                (ymin + 0.5)..=1000.0f32,
                (xmin + 0.5)..=1000.0f32,
            )
        })
        .prop_map(|(ymin, xmin, ymax, xmax)| NormalizedBox::new(ymin, xmin, ymax, xmax))
}

/// Any four numbers, including inverted, out of range and non-finite boxes.
pub fn arb_any_box() -> impl Strategy<Value = NormalizedBox> {
    let component = prop_oneof![
        8 => -200.0f32..1200.0,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
    ];
    [
        component.clone(),
        component.clone(),
        component.clone(),
        component,
    ]
    .prop_map(NormalizedBox::from)
}

pub fn arb_detection(bbox: impl Strategy<Value = NormalizedBox>) -> impl Strategy<Value = Detection> {
    (bbox, 0.0f64..=1.0, arb_severity()).prop_map(|(bbox, confidence, severity)| Detection {
        bbox,
        label: "pothole".to_string(),
        confidence,
        severity,
    })
}
