//! Single page-range export.

use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::options::SlicerOptions;
use crate::parser::SourceDocument;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Writes a page range of a source PDF as a new PDF, in memory.
#[derive(Debug, Clone, Copy)]
pub struct RangeExporter {
    compress: bool,
}

impl Default for RangeExporter {
    fn default() -> Self {
        Self { compress: true }
    }
}

impl RangeExporter {
    /// Create an exporter that compresses its output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an exporter configured from options.
    pub fn from_options(options: &SlicerOptions) -> Self {
        Self {
            compress: options.compress_output,
        }
    }

    /// Enable or disable stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Export pages `start..=end` (1-based) of the PDF at `path`.
    pub fn export_path<P: AsRef<Path>>(&self, path: P, start: u32, end: u32) -> Result<Vec<u8>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        check_order(start, end)?;

        let source = SourceDocument::open(path)?;
        self.export_document(source.into_inner(), start, end)
    }

    /// Export pages `start..=end` (1-based) of an in-memory PDF.
    pub fn export_bytes(&self, data: &[u8], start: u32, end: u32) -> Result<Vec<u8>> {
        check_order(start, end)?;
        let source = SourceDocument::from_bytes(data)?;
        self.export_document(source.into_inner(), start, end)
    }

    /// Cut a loaded document down to `start..=end` and serialize it.
    ///
    /// Takes ownership because pages are removed in place; callers that
    /// export several ranges clone the loaded document per range.
    pub fn export_document(&self, mut doc: LopdfDocument, start: u32, end: u32) -> Result<Vec<u8>> {
        check_order(start, end)?;

        let total = doc.get_pages().len() as u32;
        if start < 1 || end > total {
            return Err(Error::range_outside(start, end, total));
        }

        if start > 1 || end < total {
            let keep: Vec<ObjectId> = doc
                .get_pages()
                .range(start..=end)
                .map(|(_, id)| *id)
                .collect();
            retain_pages(&mut doc, &keep)?;
            doc.prune_objects();
            doc.renumber_objects();
        }
        if self.compress {
            doc.compress();
        }

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| Error::PdfParse(format!("failed to write PDF: {}", e)))?;

        log::debug!(
            "Exported pages {}-{} of {} ({} bytes)",
            start,
            end,
            total,
            out.len()
        );
        Ok(out)
    }
}

/// Rebuild the page tree as a flat list of `keep` under the root node.
///
/// Dropped pages become unreachable and are removed by `prune_objects`.
fn retain_pages(doc: &mut LopdfDocument, keep: &[ObjectId]) -> Result<()> {
    let pages_id = doc.catalog()?.get(b"Pages")?.as_reference()?;

    for &page_id in keep {
        let inherited = inherited_attributes(doc, page_id);
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in inherited {
            page.set(key, value);
        }
        page.set("Parent", pages_id);
    }

    let root = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    root.set(
        "Kids",
        keep.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
    );
    root.set("Count", keep.len() as i64);

    // Bookmarks would keep dropped pages reachable
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    if let Ok(catalog) = doc.get_object_mut(catalog_id).and_then(Object::as_dict_mut) {
        catalog.remove(b"Outlines");
    }
    Ok(())
}

/// Attributes the page lacks but an ancestor defines, nearest ancestor first.
fn inherited_attributes(doc: &LopdfDocument, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE.into_iter().filter(|k| !page.has(k)).collect();
    let mut found = Vec::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    // Bounded walk in case of a cyclic Parent chain
    for _ in 0..32 {
        let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    found
}

fn check_order(start: u32, end: u32) -> Result<()> {
    if start > end {
        return Err(Error::reversed_range(start, end));
    }
    Ok(())
}
