use glam::Vec2;
use image::{DynamicImage, Rgba, RgbaImage};
use proptest::prelude::*;
use roadscan_core::OverlayRenderer;
use roadscan_core::overlay::DisplaySurface;

mod proptest_helpers;

use proptest_helpers::EPS_PX;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn render_keeps_aspect_ratio(
        width in 1u32..64,
        height in 1u32..64,
        display_width in 1u32..128,
        detections in prop::collection::vec(
            proptest_helpers::arb_detection(proptest_helpers::arb_any_box()),
            0..6,
        ),
    ) {
        let renderer = OverlayRenderer::new().unwrap();
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([40, 40, 40, 255]),
        ));

        let canvas = renderer.render(&source, display_width, &detections).unwrap();

        let exact = height as f32 * (display_width as f32 / width as f32);
        let expected_height = (exact.round() as u32).max(1);
        prop_assert_eq!(canvas.dimensions(), (display_width, expected_height));
    }

    #[test]
    fn marks_stay_on_the_surface(
        display in (1.0f32..4000.0, 1.0f32..4000.0),
        detections in prop::collection::vec(
            proptest_helpers::arb_detection(proptest_helpers::arb_any_box()),
            0..12,
        ),
    ) {
        let renderer = OverlayRenderer::new().unwrap();
        let display = Vec2::new(display.0, display.1);
        let marks = renderer.plan(display, &detections);

        prop_assert!(marks.len() <= detections.len());
        for pair in marks.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
        for mark in &marks {
            let source = &detections[mark.index];
            prop_assert!(source.bbox.is_valid());
            prop_assert_eq!(mark.color, Rgba(source.severity.color()));
            prop_assert_eq!(&mark.caption, &source.caption());

            prop_assert!(mark.bbox.min.x >= 0.0 && mark.bbox.min.y >= 0.0);
            prop_assert!(mark.bbox.max.x <= display.x + EPS_PX * display.x);
            prop_assert!(mark.bbox.max.y <= display.y + EPS_PX * display.y);
        }
    }

    #[test]
    fn valid_boxes_are_always_drawn(
        detections in prop::collection::vec(
            proptest_helpers::arb_detection(proptest_helpers::arb_normalized_box()),
            0..12,
        ),
    ) {
        let renderer = OverlayRenderer::new().unwrap();
        let marks = renderer.plan(Vec2::new(800.0, 400.0), &detections);
        prop_assert_eq!(marks.len(), detections.len());
    }

    #[test]
    fn boxes_scale_with_the_surface(
        bbox in proptest_helpers::arb_normalized_box(),
        width in 16u32..2000,
        height in 16u32..2000,
        factor in 1u32..5,
    ) {
        let small = DisplaySurface::fit_width(width, height, width).unwrap();
        let large = DisplaySurface::fit_width(width, height, width * factor).unwrap();

        let a = bbox.project(small.size()).unwrap();
        let b = bbox.project(large.size()).unwrap();

        let k = factor as f32;
        let tolerance = EPS_PX * k * width.max(height) as f32;
        prop_assert!((a.min * k - b.min).abs().max_element() <= tolerance);
        prop_assert!((a.max * k - b.max).abs().max_element() <= tolerance);
    }
}
