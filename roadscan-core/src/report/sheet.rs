use ab_glyph::{FontRef, PxScale};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage, imageops};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use snafu::ResultExt;

use crate::{
    analysis::severity::Severity,
    consts::FONT,
    error::*,
};

use super::{InspectionReport, ReportOptions};

const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([17, 24, 39]);
const BODY: Rgb<u8> = Rgb([75, 85, 99]);
const MUTED: Rgb<u8> = Rgb([156, 163, 175]);
const RULE: Rgb<u8> = Rgb([229, 231, 235]);
const PANEL: Rgb<u8> = Rgb([249, 250, 251]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const ACCENT: Rgb<u8> = Rgb([250, 204, 21]);
const LINK: Rgb<u8> = Rgb([37, 99, 235]);

const DISCLAIMER: &str = "This report was generated automatically by an AI Vision System. \
Data is intended for preliminary road surface evaluation only. \
Final engineering decisions should be verified on-site by certified inspectors.";

/// One drawing instruction on the report sheet, in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetOp {
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb<u8>,
    },
    Text {
        x: f32,
        y: f32,
        size: f32,
        color: Rgb<u8>,
        text: String,
    },
    Photo {
        x: f32,
        y: f32,
    },
}

/// Laid-out sheet, ready to be painted.
#[derive(Debug, Clone)]
pub struct SheetPlan {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<SheetOp>,
}

impl SheetPlan {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            SheetOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Lays out the printable inspection report around an annotated photo.
pub struct SheetComposer {
    font: FontRef<'static>,
    options: ReportOptions,
}

impl SheetComposer {
    pub fn new(options: ReportOptions) -> Result<Self, RoadscanError> {
        let font = FontRef::try_from_slice(FONT).context(FontSnafu {})?;
        Ok(Self { font, options })
    }

    fn measure(&self, size: f32, text: &str) -> f32 {
        text_size(PxScale::from(size), &self.font, text).0 as f32
    }

    /// Greedy word wrap of `text` at `size` pixels into lines no wider than
    /// `max_width`. Words longer than a line get a line of their own.
    pub fn wrap(&self, size: f32, text: &str, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if current.is_empty() || self.measure(size, &candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }

        lines
    }

    pub fn plan(&self, photo: &RgbaImage, report: &InspectionReport) -> SheetPlan {
        let options = &self.options;
        let width = (options.px(options.sheet_width as f32).round() as u32).max(1);
        let margin = options.px(options.margin as f32);

        let mut layout = Layout {
            composer: self,
            ops: Vec::new(),
            left: margin,
            width: width as f32 - margin * 2.0,
            y: margin,
        };

        layout.ops.push(SheetOp::Photo {
            x: layout.left,
            y: layout.y,
        });
        layout.y += photo.height() as f32;
        layout.gap(40.0);

        layout.header(report);
        layout.gap(32.0);
        layout.overview(report);
        layout.gap(32.0);
        layout.location(report);
        layout.gap(32.0);
        layout.tiles(report);
        layout.gap(32.0);
        layout.inventory(report);
        layout.gap(32.0);
        layout.rule(1.0, RULE);
        layout.gap(16.0);
        layout.paragraph(9.0, MUTED, &DISCLAIMER.to_uppercase());

        let height = (layout.y + margin).ceil() as u32;
        SheetPlan {
            width,
            height,
            ops: layout.ops,
        }
    }

    /// Paints the report into one tall raster.
    pub fn compose(&self, photo: &RgbaImage, report: &InspectionReport) -> RgbImage {
        let plan = self.plan(photo, report);
        let photo = DynamicImage::ImageRgba8(photo.clone()).to_rgb8();
        let mut canvas = RgbImage::from_pixel(plan.width, plan.height, PAPER);

        for op in &plan.ops {
            match op {
                SheetOp::Fill {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    let rect = Rect::at(x.round() as i32, y.round() as i32).of_size(
                        width.round().max(1.0) as u32,
                        height.round().max(1.0) as u32,
                    );
                    draw_filled_rect_mut(&mut canvas, rect, *color);
                }
                SheetOp::Text {
                    x,
                    y,
                    size,
                    color,
                    text,
                } => {
                    draw_text_mut(
                        &mut canvas,
                        *color,
                        x.round() as i32,
                        y.round() as i32,
                        PxScale::from(*size),
                        &self.font,
                        text,
                    );
                }
                SheetOp::Photo { x, y } => {
                    imageops::replace(&mut canvas, &photo, x.round() as i64, y.round() as i64);
                }
            }
        }

        canvas
    }
}

/// Vertical cursor over the sheet. Sizes passed in are logical pixels.
struct Layout<'a> {
    composer: &'a SheetComposer,
    ops: Vec<SheetOp>,
    left: f32,
    width: f32,
    y: f32,
}

impl Layout<'_> {
    fn px(&self, logical: f32) -> f32 {
        self.composer.options.px(logical)
    }

    fn gap(&mut self, logical: f32) {
        self.y += self.px(logical);
    }

    fn line_height(&self, size: f32) -> f32 {
        self.px(size * 1.35)
    }

    fn fill(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb<u8>) {
        self.ops.push(SheetOp::Fill {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn text_at(&mut self, x: f32, y: f32, size: f32, color: Rgb<u8>, text: impl Into<String>) {
        let size = self.px(size);
        self.ops.push(SheetOp::Text {
            x,
            y,
            size,
            color,
            text: text.into(),
        });
    }

    fn line(&mut self, size: f32, color: Rgb<u8>, text: impl Into<String>) {
        self.text_at(self.left, self.y, size, color, text);
        self.y += self.line_height(size);
    }

    fn paragraph(&mut self, size: f32, color: Rgb<u8>, text: &str) {
        let lines = self.composer.wrap(self.px(size), text, self.width);
        for line in lines {
            self.line(size, color, line);
        }
    }

    fn rule(&mut self, thickness: f32, color: Rgb<u8>) {
        let thickness = self.px(thickness);
        self.fill(self.left, self.y, self.width, thickness, color);
        self.y += thickness;
    }

    fn heading(&mut self, text: &str) {
        self.line(12.0, MUTED, text.to_uppercase());
        self.rule(1.0, RULE);
        self.gap(8.0);
    }

    /// Runs `first` and `second` side by side, `split` of the width going to `first`.
    fn columns(
        &mut self,
        split: f32,
        first: impl FnOnce(&mut Self),
        second: impl FnOnce(&mut Self),
    ) {
        let (left, width, top) = (self.left, self.width, self.y);
        let gutter = self.px(24.0);
        let first_width = (width - gutter) * split;

        self.width = first_width;
        first(self);
        let first_end = self.y;

        self.y = top;
        self.left = left + first_width + gutter;
        self.width = width - first_width - gutter;
        second(self);
        let second_end = self.y;

        self.left = left;
        self.width = width;
        self.y = first_end.max(second_end);
    }

    fn header(&mut self, report: &InspectionReport) {
        let tag = "AUTOMATED AI ASSESSMENT";
        let tag_size = self.px(10.0);
        let pad = self.px(8.0);
        let tag_width = self.composer.measure(tag_size, tag) + pad * 2.0;
        let tag_height = self.px(20.0);
        let tag_x = self.left + self.width - tag_width;
        let tag_y = self.y + self.px(8.0);
        self.fill(tag_x, tag_y, tag_width, tag_height, ACCENT);
        self.text_at(tag_x + pad, tag_y + self.px(4.0), 10.0, BLACK, tag);

        let title = self.composer.options.title.to_uppercase();
        self.line(30.0, BLACK, title);
        self.line(14.0, MUTED, format!("REF: {}", report.reference));
        self.gap(8.0);
        self.rule(4.0, BLACK);
    }

    fn overview(&mut self, report: &InspectionReport) {
        let summary = format!("\"{}\"", report.result.summary);
        let stamp = report
            .generated_at
            .format("%A, %B %-d, %Y at %-I:%M:%S %p")
            .to_string();

        self.columns(
            2.0 / 3.0,
            |col| {
                col.heading("AI Condition Assessment");
                col.paragraph(18.0, INK, &summary);
            },
            |col| {
                col.heading("Inspection Timestamp");
                col.paragraph(14.0, INK, &stamp);
            },
        );
    }

    fn location(&mut self, report: &InspectionReport) {
        let location = report.location.as_ref();
        let address = location
            .and_then(|l| l.address.clone())
            .unwrap_or_else(|| "Geolocation Not Provided".to_string());
        let coordinate = |value: Option<f64>| {
            value
                .map(|v| format!("{v:.6}"))
                .unwrap_or_else(|| "N/A".to_string())
        };
        let latitude = coordinate(location.and_then(|l| l.latitude));
        let longitude = coordinate(location.and_then(|l| l.longitude));

        // panel background is patched once its height is known
        let panel = self.ops.len();
        let top = self.y;
        self.fill(self.left, top, self.width, 0.0, PANEL);

        let (left, width) = (self.left, self.width);
        let pad = self.px(24.0);
        self.left += pad;
        self.width -= pad * 2.0;
        self.y += pad;

        self.line(12.0, MUTED, "SITE LOCATION DATA");
        self.gap(8.0);
        self.columns(
            0.5,
            |col| {
                col.line(12.0, BODY, "TARGET ADDRESS / REFERENCE");
                col.paragraph(14.0, INK, &address);
            },
            |col| {
                col.columns(
                    0.5,
                    |c| {
                        c.line(10.0, MUTED, "LATITUDE");
                        c.line(14.0, INK, latitude);
                    },
                    |c| {
                        c.line(10.0, MUTED, "LONGITUDE");
                        c.line(14.0, INK, longitude);
                    },
                );
            },
        );
        self.y += pad;

        self.left = left;
        self.width = width;
        if let Some(SheetOp::Fill { height, .. }) = self.ops.get_mut(panel) {
            *height = self.y - top;
        }
    }

    fn tiles(&mut self, report: &InspectionReport) {
        let counts = report.result.counts();
        let tiles = [
            (Severity::High, counts.high, PAPER),
            (Severity::Medium, counts.medium, BLACK),
            (Severity::Low, counts.low, PAPER),
        ];

        let tile_width = self.width / tiles.len() as f32;
        let tile_height = self.px(110.0);
        let border = self.px(1.0);
        self.fill(self.left, self.y, self.width, tile_height, BLACK);

        for (i, (severity, count, ink)) in tiles.into_iter().enumerate() {
            let [r, g, b, _] = severity.color();
            let x = self.left + tile_width * i as f32;
            self.fill(
                x + border,
                self.y + border,
                tile_width - border * 2.0,
                tile_height - border * 2.0,
                Rgb([r, g, b]),
            );

            let label = severity.tier().to_uppercase();
            let label_width = self.composer.measure(self.px(10.0), &label);
            let count = count.to_string();
            let count_width = self.composer.measure(self.px(36.0), &count);
            let center = x + tile_width / 2.0;
            self.text_at(
                center - label_width / 2.0,
                self.y + self.px(16.0),
                10.0,
                ink,
                label,
            );
            self.text_at(
                center - count_width / 2.0,
                self.y + self.px(40.0),
                36.0,
                ink,
                count,
            );
        }

        self.y += tile_height;
    }

    fn inventory(&mut self, report: &InspectionReport) {
        self.heading("Detailed Hazard Inventory");

        let columns = [0.0, 0.14, 0.34, 0.58];
        let x = |i: usize, layout: &Self| layout.left + layout.width * columns[i];
        let headers = ["REF ID", "CONFIDENCE", "SEVERITY LEVEL", "RECOMMENDED ACTION"];
        for (i, header) in headers.into_iter().enumerate() {
            self.text_at(x(i, self), self.y, 10.0, MUTED, header);
        }
        self.y += self.line_height(10.0) + self.px(6.0);
        self.rule(1.0, MUTED);

        if report.result.potholes.is_empty() {
            self.gap(12.0);
            self.line(14.0, BODY, "No hazards detected.");
            return;
        }

        let action_width = self.width * (1.0 - columns[3]);
        for (idx, detection) in report.result.potholes.iter().enumerate() {
            self.gap(12.0);
            let top = self.y;
            let [r, g, b, _] = detection.severity.color();

            self.text_at(x(0, self), top, 14.0, INK, format!("P-{}", idx + 1));
            self.text_at(
                x(1, self),
                top,
                14.0,
                LINK,
                format!("{}% Match", detection.confidence_percent()),
            );
            self.text_at(
                x(2, self),
                top,
                12.0,
                Rgb([r, g, b]),
                format!("{} Priority", detection.severity.name()).to_uppercase(),
            );

            let action = detection.severity.recommended_action();
            let lines = self.composer.wrap(self.px(12.0), action, action_width);
            let mut line_y = top;
            for line in lines {
                self.text_at(x(3, self), line_y, 12.0, BODY, line);
                line_y += self.line_height(12.0);
            }

            self.y = line_y.max(top + self.line_height(14.0));
            self.gap(12.0);
            self.rule(1.0, RULE);
        }
    }
}
