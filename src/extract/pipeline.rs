//! Index → blocks → resolution, in sequence.

use std::path::Path;

use crate::model::Section;
use crate::parser::{PageSource, SourceDocument};

use super::blocks::{PageBlockExtractor, ProgressCallback, RegionFilter};
use super::index::IndexExtractor;
use super::resolve::resolve;

/// Runs the three extraction stages over one document.
///
/// Each run opens its own document handle; a `Pipeline` holds no
/// per-document state and can be reused across files.
#[derive(Default)]
pub struct Pipeline {
    index: IndexExtractor,
    blocks: PageBlockExtractor,
}

impl Pipeline {
    /// Create a pipeline with default extractors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the margin region heuristic of the block stage.
    pub fn with_region_filter(mut self, region: impl RegionFilter + 'static) -> Self {
        self.blocks = self.blocks.with_region_filter(region);
        self
    }

    /// Replace the index extractor.
    pub fn with_index_extractor(mut self, index: IndexExtractor) -> Self {
        self.index = index;
        self
    }

    /// Run over a PDF file. An unreadable file yields no sections.
    pub fn run<P: AsRef<Path>>(
        &self,
        path: P,
        progress: Option<ProgressCallback<'_>>,
    ) -> Vec<Section> {
        let path = path.as_ref();
        match SourceDocument::open(path) {
            Ok(source) => self.run_source(&source, progress),
            Err(e) => {
                log::error!("Cannot open {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Run over an in-memory PDF. Unreadable data yields no sections.
    pub fn run_bytes(&self, data: &[u8], progress: Option<ProgressCallback<'_>>) -> Vec<Section> {
        match SourceDocument::from_bytes(data) {
            Ok(source) => self.run_source(&source, progress),
            Err(e) => {
                log::error!("Cannot open PDF data: {}", e);
                Vec::new()
            }
        }
    }

    /// Run over an already opened page source.
    pub fn run_source<S: PageSource + ?Sized>(
        &self,
        source: &S,
        progress: Option<ProgressCallback<'_>>,
    ) -> Vec<Section> {
        let entries = self.index.extract(source);
        let records = self.blocks.extract(source, progress);
        resolve(entries, &records)
    }
}
