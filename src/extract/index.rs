//! Summary (Sumário) table extraction.
//!
//! The summary is searched from the last page backward; every page from the
//! summary start to the end of the document is run through the table
//! detector and rows with a valid date and a non-empty id become index
//! entries. Column edges found on one page are reused on following pages
//! whose own rows are too few to show a column layout.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::IndexEntry;
use crate::parser::{BlockBuilder, PageSource, TableDetector};

/// Marker searched for (case-insensitively) in page text.
pub const SUMMARY_MARKER: &str = "SUMÁRIO";

/// Date formats accepted in the date column, tried in order.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%d/%m/%Y", false),
    ("%d/%m/%Y %H:%M", true),
    ("%Y-%m-%d", false),
    ("%Y-%m-%d %H:%M:%S", true),
];

/// Minimum number of columns a summary row must have.
const MIN_COLUMNS: usize = 4;

/// Digits and separators only; chrono alone accepts signs and padding.
fn date_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(
            r"^(\d{1,2}/\d{1,2}/\d{4}( \d{1,2}:\d{2})?|\d{4}-\d{1,2}-\d{1,2}( \d{1,2}:\d{2}:\d{2})?)$",
        )
        .unwrap()
    })
}

/// Whether `value` (after trimming) matches one of the accepted date formats.
pub fn is_valid_date(value: &str) -> bool {
    let value = value.trim();
    if !date_shape().is_match(value) {
        return false;
    }
    DATE_FORMATS.iter().any(|(format, with_time)| {
        if *with_time {
            NaiveDateTime::parse_from_str(value, format).is_ok()
        } else {
            NaiveDate::parse_from_str(value, format).is_ok()
        }
    })
}

/// Turn a table row into an index entry, if it qualifies.
///
/// Columns 0 to 3 are read as id, date, title and type; extra columns are
/// ignored.
pub fn accept_row<S: AsRef<str>>(cells: &[S]) -> Option<IndexEntry> {
    if cells.len() < MIN_COLUMNS {
        return None;
    }

    let id = cells[0].as_ref().trim();
    let date = cells[1].as_ref().trim();
    if !is_valid_date(date) || id.is_empty() {
        return None;
    }

    Some(IndexEntry::new(
        id,
        date,
        cells[2].as_ref().trim(),
        cells[3].as_ref().trim(),
    ))
}

/// Extracts index entries from the summary table of a document.
#[derive(Default)]
pub struct IndexExtractor {
    detector: TableDetector,
    segmenter: BlockBuilder,
}

impl IndexExtractor {
    /// Create an extractor with the default table detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with a custom table detector.
    pub fn with_detector(detector: TableDetector) -> Self {
        Self {
            detector,
            ..Self::default()
        }
    }

    /// Extract all index entries. Never fails; problems are logged.
    pub fn extract<S: PageSource + ?Sized>(&self, source: &S) -> Vec<IndexEntry> {
        let Some(start) = self.find_summary_page(source) else {
            log::info!("No summary page found");
            return Vec::new();
        };
        log::info!("Summary starts on page {}", start);

        let mut entries = Vec::new();
        let mut columns: Option<Vec<f32>> = None;
        for page in start..=source.page_count() {
            match self.rows_with_carry(source, page, &mut columns) {
                Ok(rows) => {
                    let before = entries.len();
                    entries.extend(rows.iter().filter_map(|row| accept_row(row)));
                    log::debug!(
                        "Page {}: {} rows, {} accepted",
                        page,
                        rows.len(),
                        entries.len() - before
                    );
                }
                Err(e) => log::warn!("Table extraction failed on page {}: {}", page, e),
            }
        }

        log::info!("Extracted {} index entries", entries.len());
        entries
    }

    /// Find the last page whose text contains the summary marker.
    pub fn find_summary_page<S: PageSource + ?Sized>(&self, source: &S) -> Option<u32> {
        (1..=source.page_count()).rev().find(|&page| match source.page_text(page) {
            Ok(text) => mentions_summary(&text),
            Err(e) => {
                log::warn!("Text extraction failed on page {}: {}", page, e);
                false
            }
        })
    }

    /// Cell strings of every table row on a page, read on its own.
    pub fn page_rows<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page: u32,
    ) -> Result<Vec<Vec<String>>> {
        self.rows_with_carry(source, page, &mut None)
    }

    /// Rows of a page, falling back to `columns` from an earlier page and
    /// then to one cell per text segment. Updates `columns` when the page
    /// has a table of its own.
    fn rows_with_carry<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page: u32,
        columns: &mut Option<Vec<f32>>,
    ) -> Result<Vec<Vec<String>>> {
        let spans = self.segmenter.merge_line_spans(&source.page_spans(page)?);

        let tables = self.detector.detect(&spans);
        if let Some(last) = tables.last() {
            *columns = Some(last.columns.clone());
            return Ok(tables
                .iter()
                .flat_map(|table| self.detector.to_rows(table))
                .collect());
        }

        if let Some(known) = columns.as_deref() {
            log::debug!("Page {}: reusing column edges {:?}", page, known);
            return Ok(self
                .detector
                .table_with_columns(&spans, known)
                .map(|table| self.detector.to_rows(&table))
                .unwrap_or_default());
        }

        Ok(self.detector.line_rows(&spans))
    }
}

fn mentions_summary(text: &str) -> bool {
    // Decomposed accents would otherwise hide the marker
    let composed: String = text.nfc().collect();
    composed.to_uppercase().contains(SUMMARY_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::{PageBox, TextSpan};

    struct FakePages {
        pages: Vec<Vec<TextSpan>>,
        broken: Vec<u32>,
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page_box(&self, _page: u32) -> Result<PageBox> {
            Ok(PageBox::new(0.0, 0.0, 595.0, 842.0))
        }

        fn page_text(&self, page: u32) -> Result<String> {
            let spans = self.page_spans(page)?;
            Ok(spans.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join(" "))
        }

        fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
            if self.broken.contains(&page) {
                return Err(Error::PdfParse("broken page".to_string()));
            }
            Ok(self.pages[page as usize - 1].clone())
        }
    }

    fn table_page(title: &str, rows: &[[&str; 4]]) -> Vec<TextSpan> {
        let mut spans = vec![TextSpan::new(title, 250.0, 800.0, 12.0)];
        let columns = [40.0, 110.0, 220.0, 420.0];
        for (i, row) in rows.iter().enumerate() {
            let y = 760.0 - i as f32 * 20.0;
            for (cell, x) in row.iter().zip(columns) {
                if !cell.is_empty() {
                    spans.push(TextSpan::new(*cell, x, y, 10.0));
                }
            }
        }
        spans
    }

    fn body_page(text: &str) -> Vec<TextSpan> {
        vec![TextSpan::new(text, 50.0, 700.0, 12.0)]
    }

    #[test]
    fn test_is_valid_date_formats() {
        assert!(is_valid_date("2024-01-15"));
        assert!(is_valid_date("15/01/2024"));
        assert!(is_valid_date("15/01/2024 10:30"));
        assert!(is_valid_date("2024-01-15 10:30:59"));
        assert!(is_valid_date("  15/01/2024 "));
    }

    #[test]
    fn test_is_valid_date_rejects_other_formats() {
        assert!(!is_valid_date("15-01-2024"));
        assert!(!is_valid_date("01/15/2024"));
        assert!(!is_valid_date("2024-01-15T10:30:00"));
        assert!(!is_valid_date("15/01/2024 10:30:59"));
        assert!(!is_valid_date("not-a-date"));
        assert!(!is_valid_date(""));
        assert!(!is_valid_date("+2024-01-15"));
        assert!(!is_valid_date("-2024-01-15"));
        assert!(!is_valid_date("15/ 1/2024"));
        assert!(!is_valid_date("15/01/+2024"));
        assert!(!is_valid_date("15/01/2024  10:30"));
    }

    #[test]
    fn test_accept_row() {
        assert!(accept_row(&["", "2024-01-01", "Doc", "Petição"]).is_none());
        assert!(accept_row(&["5", "not-a-date", "Doc", "Petição"]).is_none());
        assert!(accept_row(&["5", "2024-01-01", "Doc"]).is_none());

        let entry = accept_row(&["5", "2024-01-01", "Doc", "Petição"]).unwrap();
        assert_eq!(entry.id, "5");
        assert_eq!(entry.date, "2024-01-01");
        assert_eq!(entry.document_title, "Doc");
        assert_eq!(entry.doc_type, "Petição");
        assert_eq!(entry.page_start, None);
        assert_eq!(entry.page_end, None);
    }

    #[test]
    fn test_accept_row_trims_and_ignores_extra_columns() {
        let entry = accept_row(&[" 7 ", " 15/01/2024 ", " Doc ", " Tipo ", "extra"]).unwrap();
        assert_eq!(entry.id, "7");
        assert_eq!(entry.document_title, "Doc");
        assert_eq!(entry.doc_type, "Tipo");
    }

    #[test]
    fn test_mentions_summary_case_and_composition() {
        assert!(mentions_summary("Sumário"));
        assert!(mentions_summary("SUMÁRIO DO PROCESSO"));
        assert!(mentions_summary("Suma\u{301}rio"));
        assert!(!mentions_summary("Sumario"));
    }

    #[test]
    fn test_no_summary_yields_empty() {
        let source = FakePages {
            pages: vec![body_page("Petição"), body_page("Despacho")],
            broken: vec![],
        };
        assert!(IndexExtractor::new().extract(&source).is_empty());
    }

    #[test]
    fn test_extract_from_summary_pages() {
        let source = FakePages {
            pages: vec![
                body_page("Sumário mencionado no corpo"),
                body_page("Corpo"),
                table_page(
                    "Sumário",
                    &[
                        ["Id", "Data", "Documento", "Tipo"],
                        ["1001", "15/01/2024", "Inicial", "Petição"],
                        ["1002", "16/01/2024", "Procuração", "Documento"],
                    ],
                ),
                table_page(
                    "continuação",
                    &[
                        ["1003", "2024-01-20", "Despacho", "Despacho"],
                        ["", "2024-01-21", "Sem id", "Certidão"],
                        ["1005", "2024-01-22 09:00:00", "Decisão", "Decisão"],
                    ],
                ),
            ],
            broken: vec![],
        };

        let extractor = IndexExtractor::new();
        assert_eq!(extractor.find_summary_page(&source), Some(3));

        let entries = extractor.extract(&source);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "1002", "1003", "1005"]);
        assert!(entries.iter().all(|e| !e.has_range()));
    }

    #[test]
    fn test_broken_page_is_skipped() {
        let source = FakePages {
            pages: vec![
                table_page(
                    "Sumário",
                    &[
                        ["1001", "15/01/2024", "Inicial", "Petição"],
                        ["1002", "16/01/2024", "Procuração", "Documento"],
                    ],
                ),
                body_page("quebrada"),
                table_page(
                    "fim",
                    &[
                        ["1003", "17/01/2024", "Despacho", "Despacho"],
                        ["1004", "18/01/2024", "Decisão", "Decisão"],
                    ],
                ),
            ],
            broken: vec![2],
        };

        let entries = IndexExtractor::new().extract(&source);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "1002", "1003", "1004"]);
    }

    #[test]
    fn test_single_row_summary() {
        let source = FakePages {
            pages: vec![
                body_page("Despacho"),
                table_page("Sumário", &[["7002", "15/01/2024", "Despacho", "Despacho"]]),
            ],
            broken: vec![],
        };

        let entries = IndexExtractor::new().extract(&source);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "7002");
        assert_eq!(entries[0].document_title, "Despacho");
    }

    #[test]
    fn test_continuation_row_uses_earlier_columns() {
        let source = FakePages {
            pages: vec![
                table_page(
                    "Sumário",
                    &[
                        ["1001", "15/01/2024", "Inicial", "Petição"],
                        ["1002", "16/01/2024", "Procuração", "Documento"],
                    ],
                ),
                table_page("continuação", &[["1003", "17/01/2024", "", "Despacho"]]),
            ],
            broken: vec![],
        };

        let entries = IndexExtractor::new().extract(&source);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "1002", "1003"]);
        assert_eq!(entries[2].document_title, "");
        assert_eq!(entries[2].doc_type, "Despacho");
    }

    #[test]
    fn test_time_drawn_apart_from_date() {
        let mut spans = table_page(
            "Sumário",
            &[
                ["1001", "15/01/2024", "Inicial", "Petição"],
                ["1002", "16/01/2024", "Procuração", "Documento"],
            ],
        );
        spans.push(TextSpan::new("10:30", 165.0, 760.0, 10.0));
        spans.push(TextSpan::new("09:15", 165.0, 740.0, 10.0));
        let source = FakePages {
            pages: vec![spans],
            broken: vec![],
        };

        let entries = IndexExtractor::new().extract(&source);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "15/01/2024 10:30");
        assert_eq!(entries[0].document_title, "Inicial");
        assert_eq!(entries[1].date, "16/01/2024 09:15");
        assert_eq!(entries[1].doc_type, "Documento");
    }
}
