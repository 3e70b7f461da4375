//! Case number lookup.
//!
//! Unified case numbers look like `0001234-56.2024.8.26.0100`. The first
//! page is searched first, then the file name.

use std::path::Path;

use regex::Regex;

use crate::parser::{PageSource, SourceDocument};

/// Value returned when no case number can be found.
pub const FALLBACK: &str = "processo";

/// Appended to the case number (or file stem) to name the section archive.
pub const ARCHIVE_SUFFIX: &str = "_fatiado.zip";

/// Finds case numbers in document text and file names.
pub struct ProcessNumberExtractor {
    pattern: Regex,
}

impl ProcessNumberExtractor {
    /// Create an extractor.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"\d{7}-\d{2}\.\d{4}\.\d\.\d{2}\.\d{4}").unwrap(),
        }
    }

    /// First case number in `text`.
    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern.find(text).map(|m| m.as_str().to_string())
    }

    /// Case number from the first page of a source, if any.
    pub fn from_source<S: PageSource + ?Sized>(&self, source: &S) -> Option<String> {
        if source.page_count() == 0 {
            return None;
        }
        match source.page_text(1) {
            Ok(text) => self.find(&text),
            Err(e) => {
                log::warn!("Cannot read first page: {}", e);
                None
            }
        }
    }

    /// Case number of the PDF at `path`: first page, then file name, then
    /// [`FALLBACK`].
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> String {
        let path = path.as_ref();

        let from_text = match SourceDocument::open(path) {
            Ok(source) => self.from_source(&source),
            Err(e) => {
                log::warn!("Cannot open {}: {}", path.display(), e);
                None
            }
        };

        from_text
            .or_else(|| {
                path.file_name()
                    .and_then(|name| self.find(&name.to_string_lossy()))
            })
            .unwrap_or_else(|| FALLBACK.to_string())
    }

    /// Suggested bundle name, `<case number>_fatiado.zip`.
    ///
    /// Falls back to the file stem when no case number is found.
    pub fn archive_name<P: AsRef<Path>>(&self, path: P) -> String {
        let path = path.as_ref();
        let number = self.extract(path);
        let stem = if number == FALLBACK {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(number)
        } else {
            number
        };
        format!("{}{}", stem, ARCHIVE_SUFFIX)
    }
}

impl Default for ProcessNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}
