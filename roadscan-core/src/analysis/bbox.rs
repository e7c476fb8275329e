use glam::Vec2;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::consts::NORMALIZED_SCALE;

/// A 2D axis-aligned bounding box in device pixels, represented by its
/// top-left (`min`) and bottom-right (`max`) corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    /// The top-left corner of the box.
    pub min: Vec2,
    /// The bottom-right corner of the box.
    pub max: Vec2,
}

impl Bbox {
    /// Creates a new bounding box from its two corners.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use roadscan_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 5.0));
    /// assert_eq!(bbox.size(), Vec2::new(10.0, 5.0));
    /// ```
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a new bounding box from its top-left corner and size.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use roadscan_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::new_from_min_size(Vec2::new(1.0, 2.0), Vec2::new(5.0, 3.0));
    /// assert_eq!(bbox.max, Vec2::new(6.0, 5.0));
    /// ```
    pub fn new_from_min_size(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    /// Width and height of the box.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Calculates the area of the bounding box.
    pub fn area(&self) -> f32 {
        let length = self.size();

        length.x * length.y
    }

    /// Snaps the box onto the pixel grid.
    ///
    /// Each edge is rounded independently so adjacent boxes share edges, and
    /// the result is never thinner than one pixel. Returns `None` for boxes
    /// with non-finite corners or a non-positive extent.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use roadscan_core::analysis::bbox::Bbox;
    /// let rect = Bbox::new(Vec2::new(99.6, 100.2), Vec2::new(199.7, 200.4))
    ///     .to_rect()
    ///     .unwrap();
    /// assert_eq!((rect.left(), rect.top()), (100, 100));
    /// assert_eq!((rect.width(), rect.height()), (100, 100));
    /// ```
    pub fn to_rect(&self) -> Option<Rect> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return None;
        }
        if self.max.x <= self.min.x || self.max.y <= self.min.y {
            return None;
        }

        let left = self.min.x.round() as i32;
        let top = self.min.y.round() as i32;
        let right = self.max.x.round() as i32;
        let bottom = self.max.y.round() as i32;

        let width = (right.saturating_sub(left)).max(1) as u32;
        let height = (bottom.saturating_sub(top)).max(1) as u32;

        Some(Rect::at(left, top).of_size(width, height))
    }
}

/// A box on the model's normalized 0..=1000 grid.
///
/// On the wire this is the `box_2d` array `[ymin, xmin, ymax, xmax]`. Any
/// other shape decodes to [`NormalizedBox::MALFORMED`] so one bad box does not
/// reject the whole response.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "[f32; 4]")]
pub struct NormalizedBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
}

impl From<[f32; 4]> for NormalizedBox {
    fn from([ymin, xmin, ymax, xmax]: [f32; 4]) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }
}

impl From<serde_json::Value> for NormalizedBox {
    fn from(value: serde_json::Value) -> Self {
        let components = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|v| v.as_f64().map(|v| v as f32))
                .collect::<Option<Vec<_>>>()
        });

        match components.as_deref() {
            Some(&[ymin, xmin, ymax, xmax]) => Self::new(ymin, xmin, ymax, xmax),
            _ => Self::MALFORMED,
        }
    }
}

impl From<NormalizedBox> for [f32; 4] {
    fn from(b: NormalizedBox) -> Self {
        [b.ymin, b.xmin, b.ymax, b.xmax]
    }
}

impl NormalizedBox {
    /// Placeholder for a box that could not be read, never valid.
    pub const MALFORMED: NormalizedBox = NormalizedBox {
        ymin: f32::NAN,
        xmin: f32::NAN,
        ymax: f32::NAN,
        xmax: f32::NAN,
    };

    pub fn new(ymin: f32, xmin: f32, ymax: f32, xmax: f32) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    /// True when every component is finite and both axes are strictly ordered.
    pub fn is_valid(&self) -> bool {
        let finite = [self.ymin, self.xmin, self.ymax, self.xmax]
            .iter()
            .all(|v| v.is_finite());

        finite && self.xmin < self.xmax && self.ymin < self.ymax
    }

    /// Clamps every component into `0..=1000`.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f32| v.clamp(0.0, NORMALIZED_SCALE);
        Self {
            ymin: clamp(self.ymin),
            xmin: clamp(self.xmin),
            ymax: clamp(self.ymax),
            xmax: clamp(self.xmax),
        }
    }

    /// Maps the box onto a display surface of `display` pixels.
    ///
    /// Inverted or non-finite boxes yield `None`. Boxes reaching outside the
    /// normalized grid are clamped to it first, and dropped if nothing is left.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use roadscan_core::analysis::bbox::NormalizedBox;
    /// let bbox = NormalizedBox::new(100.0, 100.0, 200.0, 200.0)
    ///     .project(Vec2::new(1000.0, 1000.0))
    ///     .unwrap();
    /// assert_eq!(bbox.min, Vec2::new(100.0, 100.0));
    /// assert_eq!(bbox.size(), Vec2::new(100.0, 100.0));
    /// ```
    pub fn project(&self, display: Vec2) -> Option<Bbox> {
        if !self.is_valid() {
            return None;
        }
        let b = self.clamped();
        if !b.is_valid() {
            return None;
        }

        let x = (b.xmin / NORMALIZED_SCALE) * display.x;
        let y = (b.ymin / NORMALIZED_SCALE) * display.y;
        let w = ((b.xmax - b.xmin) / NORMALIZED_SCALE) * display.x;
        let h = ((b.ymax - b.ymin) / NORMALIZED_SCALE) * display.y;

        Some(Bbox::new_from_min_size(Vec2::new(x, y), Vec2::new(w, h)))
    }
}
