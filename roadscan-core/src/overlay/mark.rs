use glam::Vec2;
use image::Rgba;
use serde::Serialize;
use snafu::ensure;

use crate::{
    analysis::bbox::Bbox,
    consts::*,
    error::{InvalidDimensionsSnafu, RoadscanError},
};

use super::label_background;

/// Size of the surface an image is displayed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplaySurface {
    /// canvas width in device pixels
    pub width: u32,
    /// canvas height in device pixels
    pub height: u32,
    /// factor from source pixels to display pixels
    pub scale: f32,
    /// unrounded display height used for box projection
    pub exact_height: f32,
}

impl DisplaySurface {
    /// Scales a `source_width` x `source_height` image to exactly
    /// `display_width` pixels wide, keeping its aspect ratio.
    ///
    /// The canvas height is the exact height rounded to the nearest pixel
    /// and never less than one.
    pub fn fit_width(
        source_width: u32,
        source_height: u32,
        display_width: u32,
    ) -> Result<Self, RoadscanError> {
        ensure!(
            source_width > 0 && source_height > 0 && display_width > 0,
            InvalidDimensionsSnafu {
                stage: "fit-width",
                width: source_width as f64,
                height: source_height as f64,
            }
        );

        let scale = display_width as f32 / source_width as f32;
        let exact_height = source_height as f32 * scale;

        Ok(Self {
            width: display_width,
            height: (exact_height.round() as u32).max(1),
            scale,
            exact_height,
        })
    }

    /// Projection target for normalized boxes.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.exact_height)
    }
}

/// Everything drawn for one detection, in display pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMark {
    /// position of the detection in the input list
    pub index: usize,
    pub bbox: Bbox,
    pub color: Rgba<u8>,
    pub caption: String,
    pub label_background: Bbox,
    /// left end of the caption baseline
    pub text_origin: Vec2,
}

impl OverlayMark {
    pub fn new(
        index: usize,
        bbox: Bbox,
        color: Rgba<u8>,
        caption: String,
        text_width: f32,
    ) -> Self {
        let label_background = label_background(&bbox, text_width);
        let text_origin = Vec2::new(
            bbox.min.x + LABEL_TEXT_INSET_X,
            bbox.min.y - LABEL_TEXT_BASELINE_OFFSET,
        );

        Self {
            index,
            bbox,
            color,
            caption,
            label_background,
            text_origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{bbox::NormalizedBox, detection::Detection, severity::Severity},
        overlay::OverlayRenderer,
    };

    #[test]
    fn test_fit_width() {
        let surface = DisplaySurface::fit_width(2000, 1000, 800).unwrap();
        assert_eq!((surface.width, surface.height), (800, 400));
        assert_eq!(surface.scale, 0.4);

        // 333 * 100 / 1000 = 33.3
        let surface = DisplaySurface::fit_width(1000, 333, 100).unwrap();
        assert_eq!(surface.height, 33);
        assert!((surface.exact_height - 33.3).abs() < 1e-4);

        // very wide images keep at least one row
        let surface = DisplaySurface::fit_width(10_000, 1, 10).unwrap();
        assert_eq!(surface.height, 1);
    }

    #[test]
    fn test_fit_width_rejects_zero() {
        assert!(DisplaySurface::fit_width(0, 10, 10).is_err());
        assert!(DisplaySurface::fit_width(10, 0, 10).is_err());
        assert!(DisplaySurface::fit_width(10, 10, 0).is_err());
    }

    #[test]
    fn test_mark_geometry() {
        let bbox = Bbox::new(Vec2::new(100.0, 100.0), Vec2::new(200.0, 200.0));
        let mark = OverlayMark::new(0, bbox, Rgba([0, 0, 0, 255]), "x".to_string(), 42.0);

        assert_eq!(mark.label_background.min, Vec2::new(100.0, 80.0));
        assert_eq!(mark.label_background.size(), Vec2::new(52.0, 20.0));
        assert_eq!(mark.text_origin, Vec2::new(105.0, 94.0));
    }

    #[test]
    fn test_reference_box_on_square_display() {
        let renderer = OverlayRenderer::new().unwrap();
        let detections = [Detection {
            bbox: NormalizedBox::new(100.0, 100.0, 200.0, 200.0),
            label: "pothole".to_string(),
            confidence: 0.9,
            severity: Severity::High,
        }];
        let marks = renderer.plan(Vec2::new(1000.0, 1000.0), &detections);
        assert_eq!(marks.len(), 1);

        let rect = marks[0].bbox.to_rect().unwrap();
        assert_eq!((rect.left(), rect.top()), (100, 100));
        assert_eq!((rect.width(), rect.height()), (100, 100));

        let text_width = renderer.measure(&marks[0].caption);
        assert!(text_width > 0.0);
        assert_eq!(
            marks[0].label_background.size().x,
            text_width + LABEL_PADDING
        );
    }

    #[test]
    fn test_three_severities_on_wide_image() {
        let renderer = OverlayRenderer::new().unwrap();
        let surface = DisplaySurface::fit_width(2000, 1000, 800).unwrap();
        let detections = [
            ("High", 0.91, [100.0, 50.0, 300.0, 250.0]),
            ("Medium", 0.66, [400.0, 350.0, 600.0, 550.0]),
            ("Low", 0.305, [700.0, 650.0, 900.0, 950.0]),
        ]
        .into_iter()
        .map(|(severity, confidence, bbox)| Detection {
            bbox: NormalizedBox::from(bbox),
            label: "pothole".to_string(),
            confidence,
            severity: Severity::from(severity),
        })
        .collect::<Vec<_>>();

        let marks = renderer.plan(surface.size(), &detections);
        assert_eq!(marks.len(), 3);

        let colors = marks.iter().map(|m| m.color).collect::<Vec<_>>();
        assert_eq!(
            colors,
            vec![
                Rgba([239, 68, 68, 255]),
                Rgba([234, 179, 8, 255]),
                Rgba([34, 197, 94, 255]),
            ]
        );
        assert_eq!(marks[0].caption, "High Hazard (91%)");
        assert_eq!(marks[1].caption, "Medium Hazard (66%)");
        assert_eq!(marks[2].caption, "Low Hazard (30%)");

        for pair in marks.windows(2) {
            let a = pair[0].bbox;
            let b = pair[1].bbox;
            let disjoint = a.max.x <= b.min.x || a.max.y <= b.min.y;
            assert!(disjoint, "{a:?} overlaps {b:?}");
        }

        // first box: x = 0.05 * 800, y = 0.1 * 400
        assert_eq!(marks[0].bbox.min, Vec2::new(40.0, 40.0));
        assert_eq!(marks[0].bbox.size(), Vec2::new(160.0, 80.0));
    }
}
