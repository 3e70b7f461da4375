//! Section extraction: summary table, page blocks and range resolution.

pub mod blocks;
pub mod index;
pub mod pipeline;
pub mod resolve;

pub use blocks::{MarginRegion, PageBlockExtractor, PageDims, ProgressCallback, RegionFilter};
pub use index::{accept_row, is_valid_date, IndexExtractor, SUMMARY_MARKER};
pub use pipeline::Pipeline;
pub use resolve::{matching_pages, resolve, resolve_in_place};
