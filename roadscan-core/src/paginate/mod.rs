use std::ops::Range;

use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ensure};

use crate::{
    consts::{A4_HEIGHT_MM, A4_WIDTH_MM, MAX_PAGES},
    error::{InvalidDimensionsSnafu, InvalidPageSpecSnafu, RoadscanError, TooManyPagesSnafu},
};

/// Fixed page size in document units (millimeters for the PDF writer).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width: f64,
    pub height: f64,
}

impl PageSpec {
    pub const A4: PageSpec = PageSpec {
        width: A4_WIDTH_MM,
        height: A4_HEIGHT_MM,
    };

    pub fn new(width: f64, height: f64) -> Result<Self, RoadscanError> {
        let spec = Self { width, height };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), RoadscanError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        ensure!(
            positive(self.width) && positive(self.height),
            InvalidPageSpecSnafu {
                width: self.width,
                height: self.height,
            }
        );
        Ok(())
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::A4
    }
}

/// What happens when the content ends exactly on a page boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum BoundaryPolicy {
    /// Stop as soon as a page window reaches the end of the content.
    #[default]
    ExactFit,
    /// Keep adding pages while the remaining height is non-negative, which
    /// appends one blank page when the content is an exact multiple of the
    /// page height.
    TrailingBlank,
}

/// Where one page's window sits on the scaled source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PagePlacement {
    pub page_index: usize,
    /// distance from the top of the scaled image to the top of this page
    pub source_offset: f64,
    pub image_width: f64,
    pub image_height: f64,
}

impl PagePlacement {
    /// Vertical position at which the full image is drawn on this page.
    pub fn image_y(&self) -> f64 {
        -self.source_offset
    }

    /// Span of the scaled image visible on a page `page_height` units tall.
    ///
    /// The end is the next page's offset, so adjacent windows share it exactly.
    pub fn window(&self, page_height: f64) -> Range<f64> {
        self.source_offset..(self.page_index + 1) as f64 * page_height
    }

    /// Part of the window that actually shows content.
    pub fn content_height(&self, page_height: f64) -> f64 {
        (self.image_height - self.source_offset).clamp(0.0, page_height)
    }
}

/// Lazily yields the placements of a document.
///
/// Offsets come from `index * page_height`, so the sequence can be cloned
/// and restarted or indexed directly without replaying earlier pages.
#[derive(Debug, Clone)]
pub struct Pagination {
    spec: PageSpec,
    image_width: f64,
    image_height: f64,
    pages: usize,
    next: usize,
}

impl Pagination {
    /// Paginates an image whose height has already been scaled to document units.
    pub fn for_scaled_height(
        image_width: f64,
        image_height: f64,
        spec: PageSpec,
        policy: BoundaryPolicy,
    ) -> Result<Self, RoadscanError> {
        spec.validate()?;
        ensure!(
            image_width.is_finite()
                && image_width > 0.0
                && image_height.is_finite()
                && image_height > 0.0,
            InvalidDimensionsSnafu {
                stage: "paginate",
                width: image_width,
                height: image_height,
            }
        );

        let pages = page_count(image_height, spec.height, policy).context(TooManyPagesSnafu {
            pages: image_height / spec.height,
            limit: MAX_PAGES,
        })?;

        Ok(Self {
            spec,
            image_width,
            image_height,
            pages,
            next: 0,
        })
    }

    pub fn spec(&self) -> PageSpec {
        self.spec
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn image_height(&self) -> f64 {
        self.image_height
    }

    /// Placement of page `index`, if the document has that many pages.
    pub fn placement(&self, index: usize) -> Option<PagePlacement> {
        (index < self.pages).then(|| PagePlacement {
            page_index: index,
            source_offset: index as f64 * self.spec.height,
            image_width: self.image_width,
            image_height: self.image_height,
        })
    }

    /// A fresh sequence starting again from the first page.
    pub fn restart(&self) -> Self {
        Self {
            next: 0,
            ..self.clone()
        }
    }
}

impl Iterator for Pagination {
    type Item = PagePlacement;

    fn next(&mut self) -> Option<Self::Item> {
        let placement = self.placement(self.next)?;
        self.next += 1;
        Some(placement)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.pages.saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Pagination {}

/// Splits a `source_width` x `source_height` raster into pages of `spec`.
///
/// The raster is scaled so its width equals the page width, then sliced into
/// consecutive windows of one page height each.
#[tracing::instrument(skip(spec))]
pub fn paginate(
    source_width: u32,
    source_height: u32,
    spec: PageSpec,
    policy: BoundaryPolicy,
) -> Result<Pagination, RoadscanError> {
    spec.validate()?;
    ensure!(
        source_width > 0 && source_height > 0,
        InvalidDimensionsSnafu {
            stage: "paginate-source",
            width: source_width as f64,
            height: source_height as f64,
        }
    );

    let scaled_height = source_height as f64 * (spec.width / source_width as f64);
    let pagination = Pagination::for_scaled_height(spec.width, scaled_height, spec, policy)?;

    tracing::debug!(
        "scaled height {scaled_height:.3} over page height {} gives {} pages",
        spec.height,
        pagination.page_count()
    );

    Ok(pagination)
}

/// Number of pages for content `content` units tall on pages `page` units tall,
/// or `None` past [`MAX_PAGES`].
///
/// The estimate from division is corrected against the offsets the pages will
/// actually use, so float rounding never leaves a gap or an extra page.
fn page_count(content: f64, page: f64, policy: BoundaryPolicy) -> Option<usize> {
    let offset = |i: usize| i as f64 * page;

    let estimate = match policy {
        BoundaryPolicy::ExactFit => (content / page).ceil(),
        BoundaryPolicy::TrailingBlank => (content / page).floor() + 1.0,
    };
    if !estimate.is_finite() || estimate > MAX_PAGES as f64 {
        return None;
    }
    let mut n = (estimate as usize).max(1);

    match policy {
        BoundaryPolicy::ExactFit => {
            // smallest n with offset(n) >= content
            while n > 1 && offset(n - 1) >= content {
                n -= 1;
            }
            while offset(n) < content {
                n = n.checked_add(1)?;
            }
        }
        BoundaryPolicy::TrailingBlank => {
            // smallest n with offset(n) > content
            while n > 1 && offset(n - 1) > content {
                n -= 1;
            }
            while offset(n) <= content {
                n = n.checked_add(1)?;
            }
        }
    }

    (n <= MAX_PAGES).then_some(n)
}
