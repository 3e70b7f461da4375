//! PDF backend abstraction layer.
//!
//! The extractors only need a handful of page-level queries, collected in the
//! [`PageSource`] trait. [`SourceDocument`] implements it over lopdf; tests and
//! callers with pre-parsed content can supply their own implementation.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect;
use crate::error::{Error, Result};

use super::layout::{LayoutAnalyzer, TextSpan};

/// US Letter, used when a page tree carries no MediaBox at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];
/// Guard against cyclic Parent chains.
const MAX_TREE_DEPTH: usize = 32;

/// Visible page area in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    /// Lower-left x of the MediaBox
    pub x0: f32,
    /// Lower-left y of the MediaBox
    pub y0: f32,
    pub width: f32,
    pub height: f32,
}

impl PageBox {
    /// Create a page box from its origin and size.
    pub fn new(x0: f32, y0: f32, width: f32, height: f32) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    /// Build from a `[llx lly urx ury]` rectangle in any corner order.
    pub fn from_corners(rect: [f32; 4]) -> Self {
        let x0 = rect[0].min(rect[2]);
        let y0 = rect[1].min(rect[3]);
        Self::new(x0, y0, (rect[2] - rect[0]).abs(), (rect[3] - rect[1]).abs())
    }
}

/// Page-level queries needed by the extraction stages.
///
/// Page numbers are 1-based.
pub trait PageSource {
    /// Total number of pages.
    fn page_count(&self) -> u32;

    /// Visible area of a page.
    fn page_box(&self, page: u32) -> Result<PageBox>;

    /// Plain text of a page.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Positioned text spans of a page, in PDF user space.
    fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>>;
}

/// A source PDF opened with lopdf.
pub struct SourceDocument {
    doc: LopdfDocument,
    /// Page number to page object, built once at load
    pages: BTreeMap<u32, ObjectId>,
}

impl SourceDocument {
    /// Open a PDF from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        detect::sniff_path(path)?;

        let source = Self::from_document(LopdfDocument::load(path)?);
        log::debug!("Loaded {} ({} pages)", path.display(), source.pages.len());
        Ok(source)
    }

    /// Open a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect::sniff_bytes(data)?;
        Ok(Self::from_document(LopdfDocument::load_mem(data)?))
    }

    fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Consume the wrapper and return the lopdf document.
    pub fn into_inner(self) -> LopdfDocument {
        self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or_else(|| Error::range_outside(page, page, self.pages.len() as u32))
    }

    /// Walk the page tree upward until a MediaBox is found.
    fn media_box(&self, page_id: ObjectId) -> Result<[f32; 4]> {
        let mut current = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(obj) = current.get(b"MediaBox") {
                if let Some(rect) = rect_from(&self.doc, obj) {
                    return Ok(rect);
                }
            }
            match current.get(b"Parent") {
                Ok(Object::Reference(parent)) => {
                    current = self
                        .doc
                        .get_dictionary(*parent)
                        .map_err(|e| Error::PdfParse(e.to_string()))?;
                }
                _ => break,
            }
        }

        log::debug!("No MediaBox for page {:?}, assuming Letter", page_id);
        Ok(DEFAULT_MEDIA_BOX)
    }
}

impl PageSource for SourceDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_box(&self, page: u32) -> Result<PageBox> {
        let page_id = self.page_id(page)?;
        Ok(PageBox::from_corners(self.media_box(page_id)?))
    }

    fn page_text(&self, page: u32) -> Result<String> {
        match self.doc.extract_text(&[page]) {
            Ok(text) => Ok(text),
            Err(e) => {
                // lopdf gives up on some font setups; the span walker is more lenient
                log::debug!("extract_text failed on page {}: {}", page, e);
                let spans = self.page_spans(page)?;
                Ok(spans
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "))
            }
        }
    }

    fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(page)?;
        LayoutAnalyzer::new(&self.doc).extract_page_spans(page_id)
    }
}

/// Return the raw (decompressed) content stream bytes for a page.
pub(crate) fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        // A page without content is blank, not broken
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(r) => match doc.get_object(*r) {
            Ok(Object::Stream(s)) => stream_bytes(s),
            Ok(Object::Array(arr)) => Ok(concat_streams(doc, arr)),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        },
        Object::Array(arr) => Ok(concat_streams(doc, arr)),
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

fn concat_streams(doc: &LopdfDocument, arr: &[Object]) -> Vec<u8> {
    let mut content = Vec::new();
    for obj in arr {
        if let Object::Reference(r) = obj {
            if let Ok(Object::Stream(s)) = doc.get_object(*r) {
                match stream_bytes(s) {
                    Ok(data) => {
                        content.extend_from_slice(&data);
                        content.push(b' ');
                    }
                    Err(e) => log::warn!("Skipping content stream {:?}: {}", r, e),
                }
            }
        }
    }
    content
}

/// Decoded bytes of a stream; unfiltered streams are returned as stored.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        stream
            .decompressed_content()
            .map_err(|e| Error::PdfParse(e.to_string()))
    } else {
        Ok(stream.content.clone())
    }
}

fn rect_from(doc: &LopdfDocument, obj: &Object) -> Option<[f32; 4]> {
    let obj = match obj {
        Object::Reference(r) => doc.get_object(*r).ok()?,
        other => other,
    };
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }

    let mut rect = [0.0; 4];
    for (slot, value) in rect.iter_mut().zip(arr) {
        *slot = match value {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r,
            _ => return None,
        };
    }
    Some(rect)
}
