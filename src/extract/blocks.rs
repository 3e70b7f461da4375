//! Page-block extraction.
//!
//! For each page the positioned text blocks are computed and reduced to the
//! ones intersecting a margin region, where document ids are usually
//! stamped. The region is a [`RegionFilter`] strategy so the heuristic can
//! be replaced without touching the extraction loop.

use crate::error::Result;
use crate::model::{Orientation, PageBlockRecord, Rect, TextBlock};
use crate::parser::{BlockBuilder, PageSource};

/// Progress callback receiving `(current, total)`.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(usize, usize);

/// Geometry of a page as seen by a [`RegionFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDims {
    /// Page width (MediaBox)
    pub width: f32,
    /// Page height (MediaBox)
    pub height: f32,
    /// Largest `x1` over all blocks on the page
    pub max_x: f32,
    /// Largest `y1` over all blocks on the page
    pub max_y: f32,
}

impl PageDims {
    /// Orientation derived from the page size.
    pub fn orientation(&self) -> Orientation {
        Orientation::of(self.width, self.height)
    }
}

/// Chooses the page region whose blocks are kept.
pub trait RegionFilter: Send + Sync {
    /// The region, in page space (top-left origin).
    fn filter_region(&self, page: &PageDims) -> Rect;
}

/// Right-hand strip on landscape pages, bottom band on portrait pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginRegion {
    /// Left edge of the landscape strip
    pub landscape_min_x: f32,
    /// Height of the portrait bottom band
    pub portrait_band: f32,
}

impl Default for MarginRegion {
    fn default() -> Self {
        Self {
            landscape_min_x: 500.0,
            portrait_band: 100.0,
        }
    }
}

impl RegionFilter for MarginRegion {
    fn filter_region(&self, page: &PageDims) -> Rect {
        match page.orientation() {
            Orientation::Landscape => Rect::new(self.landscape_min_x, 0.0, page.max_x, page.max_y),
            Orientation::Portrait => {
                Rect::new(0.0, page.max_y - self.portrait_band, page.max_x, page.max_y)
            }
        }
    }
}

/// Produces one [`PageBlockRecord`] per page that has text.
pub struct PageBlockExtractor {
    builder: BlockBuilder,
    region: Box<dyn RegionFilter>,
}

impl Default for PageBlockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageBlockExtractor {
    /// Create an extractor using [`MarginRegion`].
    pub fn new() -> Self {
        Self {
            builder: BlockBuilder::default(),
            region: Box::new(MarginRegion::default()),
        }
    }

    /// Replace the region heuristic.
    pub fn with_region_filter(mut self, region: impl RegionFilter + 'static) -> Self {
        self.region = Box::new(region);
        self
    }

    /// Replace the block builder.
    pub fn with_block_builder(mut self, builder: BlockBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Extract records for all pages, in page order.
    ///
    /// Pages without blocks are skipped. The callback receives the number of
    /// recorded pages and the document's page count after each recorded page.
    /// The first failing page stops the scan and the records collected so far
    /// are returned.
    pub fn extract<S: PageSource + ?Sized>(
        &self,
        source: &S,
        mut progress: Option<ProgressCallback<'_>>,
    ) -> Vec<PageBlockRecord> {
        let total = source.page_count();
        let mut records = Vec::with_capacity(total as usize);

        for page in 1..=total {
            match self.page_record(source, page) {
                Ok(Some(record)) => {
                    records.push(record);
                    if let Some(callback) = progress.as_mut() {
                        callback(records.len(), total as usize);
                    }
                }
                Ok(None) => log::debug!("Page {} has no text blocks", page),
                Err(e) => {
                    log::error!(
                        "Block extraction stopped at page {} of {}: {}",
                        page,
                        total,
                        e
                    );
                    break;
                }
            }
        }

        log::info!("Recorded blocks for {} of {} pages", records.len(), total);
        records
    }

    /// Build the record of a single page, or `None` if it has no blocks.
    pub fn page_record<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page: u32,
    ) -> Result<Option<PageBlockRecord>> {
        let page_box = source.page_box(page)?;
        let spans = source.page_spans(page)?;
        let blocks = self.builder.build(&spans, &page_box);
        if blocks.is_empty() {
            return Ok(None);
        }

        Ok(Some(self.record_from_blocks(page, page_box.width, page_box.height, blocks)))
    }

    /// Apply the region filter to the blocks of one page.
    pub fn record_from_blocks(
        &self,
        page_number: u32,
        width: f32,
        height: f32,
        blocks: Vec<TextBlock>,
    ) -> PageBlockRecord {
        let max_x = blocks.iter().map(|b| b.x1).fold(f32::MIN, f32::max);
        let max_y = blocks.iter().map(|b| b.y1).fold(f32::MIN, f32::max);
        let dims = PageDims {
            width,
            height,
            max_x,
            max_y,
        };
        let region = self.region.filter_region(&dims);
        let total = blocks.len();

        let filtered_blocks: Vec<TextBlock> = blocks
            .into_iter()
            .filter(|b| b.bbox().intersects(&region))
            .collect();

        log::debug!(
            "Page {} ({}): kept {} of {} blocks",
            page_number,
            dims.orientation(),
            filtered_blocks.len(),
            total
        );

        PageBlockRecord {
            page_number,
            orientation: dims.orientation(),
            max_x,
            max_y,
            filtered_blocks,
        }
    }
}
