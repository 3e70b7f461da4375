//! # pdf-slicer
//!
//! Splits PDF case bundles into their sub-documents.
//!
//! A bundle carries a summary table ("Sumário") listing the documents it
//! contains, and every page is stamped with the id of the document it belongs
//! to. This library reads the summary, finds the stamped ids in the page
//! margins, resolves a page range for every listed document and exports any
//! range as a standalone PDF.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_slicer::{extract_range, run};
//!
//! fn main() -> pdf_slicer::Result<()> {
//!     let sections = run("bundle.pdf", None);
//!
//!     for section in &sections {
//!         if let Some((start, end)) = section.range() {
//!             let pdf = extract_range("bundle.pdf", start, end)?;
//!             std::fs::write(format!("{}.pdf", section.id), pdf)?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. [`extract_index`] locates the summary (searching backward from the last
//!    page) and turns table rows with a valid date into [`IndexEntry`] values.
//! 2. [`extract_blocks`] computes text blocks for every page and keeps the
//!    ones in the margin region where ids are stamped.
//! 3. [`resolve`] assigns each entry the first and last page mentioning its id.
//!
//! Extraction never fails: a document without a summary simply has no
//! sections. Export errors ([`Error::NotFound`], [`Error::InvalidRange`]) are
//! returned to the caller.

pub mod detect;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod options;
pub mod parser;
pub mod process_number;
pub mod render;
pub mod sanitize;

// Re-export commonly used types
pub use error::{Error, Result};
pub use export::{BundleExporter, BundleReport, RangeExporter};
pub use extract::{
    is_valid_date, resolve, IndexExtractor, MarginRegion, PageBlockExtractor, PageDims, Pipeline,
    ProgressCallback, RegionFilter,
};
pub use model::{IndexEntry, Orientation, PageBlockRecord, Rect, Section, TextBlock};
pub use options::SlicerOptions;
pub use parser::{PageSource, SourceDocument};
pub use process_number::ProcessNumberExtractor;
pub use render::JsonFormat;
pub use sanitize::{sanitize_filename, DEFAULT_FILENAME_LIMIT};

use std::path::Path;

/// Run the whole pipeline over a PDF file.
///
/// The callback receives `(current, total)` once for every page that has
/// text. An unreadable file yields an empty list.
///
/// # Example
///
/// ```no_run
/// let mut report = |current: usize, total: usize| eprintln!("{}/{}", current, total);
/// let sections = pdf_slicer::run("bundle.pdf", Some(&mut report));
/// println!("{} sections", sections.len());
/// ```
pub fn run<P: AsRef<Path>>(path: P, progress: Option<ProgressCallback<'_>>) -> Vec<Section> {
    Pipeline::new().run(path, progress)
}

/// Run the whole pipeline over an in-memory PDF.
pub fn run_bytes(data: &[u8], progress: Option<ProgressCallback<'_>>) -> Vec<Section> {
    Pipeline::new().run_bytes(data, progress)
}

/// Extract the summary entries of a PDF file, without page ranges.
pub fn extract_index<P: AsRef<Path>>(path: P) -> Vec<IndexEntry> {
    let path = path.as_ref();
    match SourceDocument::open(path) {
        Ok(source) => IndexExtractor::new().extract(&source),
        Err(e) => {
            log::error!("Cannot open {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Extract the summary entries of an in-memory PDF.
pub fn extract_index_bytes(data: &[u8]) -> Vec<IndexEntry> {
    match SourceDocument::from_bytes(data) {
        Ok(source) => IndexExtractor::new().extract(&source),
        Err(e) => {
            log::error!("Cannot open PDF data: {}", e);
            Vec::new()
        }
    }
}

/// Extract the filtered block records of a PDF file.
pub fn extract_blocks<P: AsRef<Path>>(
    path: P,
    progress: Option<ProgressCallback<'_>>,
) -> Vec<PageBlockRecord> {
    let path = path.as_ref();
    match SourceDocument::open(path) {
        Ok(source) => PageBlockExtractor::new().extract(&source, progress),
        Err(e) => {
            log::error!("Cannot open {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Extract the filtered block records of an in-memory PDF.
pub fn extract_blocks_bytes(
    data: &[u8],
    progress: Option<ProgressCallback<'_>>,
) -> Vec<PageBlockRecord> {
    match SourceDocument::from_bytes(data) {
        Ok(source) => PageBlockExtractor::new().extract(&source, progress),
        Err(e) => {
            log::error!("Cannot open PDF data: {}", e);
            Vec::new()
        }
    }
}

/// Export pages `start..=end` (1-based, inclusive) of a PDF file.
///
/// # Errors
///
/// [`Error::NotFound`] if `path` does not exist, [`Error::InvalidRange`] if
/// `start > end` or the range leaves `1..=page_count`.
pub fn extract_range<P: AsRef<Path>>(path: P, start: u32, end: u32) -> Result<Vec<u8>> {
    RangeExporter::new().export_path(path, start, end)
}

/// Export pages `start..=end` (1-based, inclusive) of an in-memory PDF.
pub fn extract_range_bytes(data: &[u8], start: u32, end: u32) -> Result<Vec<u8>> {
    RangeExporter::new().export_bytes(data, start, end)
}

/// Export several sections of a PDF file as a ZIP archive.
pub fn export_sections<P: AsRef<Path>>(
    path: P,
    sections: &[Section],
    options: &SlicerOptions,
) -> Result<BundleReport> {
    BundleExporter::new(options.clone()).export_path(path, sections)
}

/// Case number of a PDF: first page, then file name, then `"processo"`.
pub fn extract_process_number<P: AsRef<Path>>(path: P) -> String {
    ProcessNumberExtractor::new().extract(path)
}

/// Builder bundling a configured pipeline with export options.
///
/// # Example
///
/// ```no_run
/// use pdf_slicer::{Slicer, SlicerOptions};
///
/// let slicer = Slicer::new().with_options(SlicerOptions::new().with_max_threads(2));
/// let sections = slicer.sections("bundle.pdf", None);
/// let report = slicer.export("bundle.pdf", &sections)?;
/// std::fs::write(slicer.archive_name("bundle.pdf"), report.archive)?;
/// # Ok::<(), pdf_slicer::Error>(())
/// ```
pub struct Slicer {
    options: SlicerOptions,
    pipeline: Pipeline,
}

impl Slicer {
    /// Create a slicer with default options.
    pub fn new() -> Self {
        Self {
            options: SlicerOptions::default(),
            pipeline: Pipeline::new(),
        }
    }

    /// Set the export options.
    pub fn with_options(mut self, options: SlicerOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the margin region heuristic.
    pub fn with_region_filter(mut self, region: impl RegionFilter + 'static) -> Self {
        self.pipeline = self.pipeline.with_region_filter(region);
        self
    }

    /// The export options.
    pub fn options(&self) -> &SlicerOptions {
        &self.options
    }

    /// Resolve the sections of a PDF file.
    pub fn sections<P: AsRef<Path>>(
        &self,
        path: P,
        progress: Option<ProgressCallback<'_>>,
    ) -> Vec<Section> {
        self.pipeline.run(path, progress)
    }

    /// Export one page range.
    pub fn extract_range<P: AsRef<Path>>(&self, path: P, start: u32, end: u32) -> Result<Vec<u8>> {
        RangeExporter::from_options(&self.options).export_path(path, start, end)
    }

    /// Export several sections as a ZIP archive.
    pub fn export<P: AsRef<Path>>(&self, path: P, sections: &[Section]) -> Result<BundleReport> {
        BundleExporter::new(self.options.clone()).export_path(path, sections)
    }

    /// Suggested file name for the archive of a PDF.
    pub fn archive_name<P: AsRef<Path>>(&self, path: P) -> String {
        ProcessNumberExtractor::new().archive_name(path)
    }
}

impl Default for Slicer {
    fn default() -> Self {
        Self::new()
    }
}
