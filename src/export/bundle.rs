//! ZIP bundle of several exported sections.
//!
//! Each resolved section becomes one `<title>.pdf` entry. Sections without a
//! page range, or whose range cannot be exported, are skipped and reported
//! rather than failing the whole bundle.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use rayon::prelude::*;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::detect;
use crate::error::{Error, Result};
use crate::model::Section;
use crate::options::SlicerOptions;
use crate::sanitize::sanitize_filename;

use super::range::RangeExporter;

/// Result of a bundle export.
#[derive(Debug, Clone, Default)]
pub struct BundleReport {
    /// ZIP archive bytes
    pub archive: Vec<u8>,
    /// Entry names, in archive order
    pub written: Vec<String>,
    /// Ids of sections that were not exported, in selection order
    pub skipped: Vec<String>,
}

impl BundleReport {
    /// Whether every selected section made it into the archive.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Where section pages are read from.
enum Source<'a> {
    /// Read once, shared by all sections
    Bytes(&'a [u8]),
    /// Re-opened for every section
    Path(&'a Path),
}

/// A section ready to be rendered.
struct Job<'a> {
    position: usize,
    section: &'a Section,
    start: u32,
    end: u32,
}

/// Builds ZIP bundles of sections.
pub struct BundleExporter {
    options: SlicerOptions,
    exporter: RangeExporter,
}

impl BundleExporter {
    /// Create a bundle exporter.
    pub fn new(options: SlicerOptions) -> Self {
        Self {
            exporter: RangeExporter::from_options(&options),
            options,
        }
    }

    /// Export `sections` of the PDF at `path`.
    pub fn export_path<P: AsRef<Path>>(&self, path: P, sections: &[Section]) -> Result<BundleReport> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        if self.options.enable_cache {
            let data = std::fs::read(path)?;
            self.export_bytes(&data, sections)
        } else {
            detect::sniff_path(path)?;
            self.export_from(&Source::Path(path), sections)
        }
    }

    /// Export `sections` of an in-memory PDF.
    pub fn export_bytes(&self, data: &[u8], sections: &[Section]) -> Result<BundleReport> {
        detect::sniff_bytes(data)?;
        self.export_from(&Source::Bytes(data), sections)
    }

    fn export_from(&self, source: &Source<'_>, sections: &[Section]) -> Result<BundleReport> {
        let mut report = BundleReport::default();
        let mut jobs = Vec::with_capacity(sections.len());
        let mut skipped: Vec<(usize, &str)> = Vec::new();

        for (position, section) in sections.iter().enumerate() {
            match section.range() {
                Some((start, end)) => jobs.push(Job {
                    position,
                    section,
                    start,
                    end,
                }),
                None => {
                    log::warn!("Section {} has no page range, skipping", section.id);
                    skipped.push((position, section.id.as_str()));
                }
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.max_threads)
            .build()
            .map_err(|e| Error::Other(format!("failed to start export workers: {}", e)))?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let entry_options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut names = EntryNames::default();

        for batch in jobs.chunks(self.options.chunk_size.max(1)) {
            let rendered: Vec<Result<Vec<u8>>> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|job| self.render(source, job))
                    .collect()
            });

            for (job, result) in batch.iter().zip(rendered) {
                match result {
                    Ok(pdf) => {
                        let base = entry_stem(
                            &job.section.document_title,
                            job.position,
                            self.options.filename_limit,
                        );
                        let name = names.claim(&base);
                        zip.start_file(name.as_str(), entry_options)?;
                        zip.write_all(&pdf)?;
                        report.written.push(name);
                    }
                    Err(e) => {
                        log::warn!(
                            "Section {} (pages {}-{}) failed: {}",
                            job.section.id,
                            job.start,
                            job.end,
                            e
                        );
                        skipped.push((job.position, job.section.id.as_str()));
                    }
                }
            }
        }

        skipped.sort_by_key(|(position, _)| *position);
        report.skipped = skipped.into_iter().map(|(_, id)| id.to_string()).collect();
        report.archive = zip.finish()?.into_inner();
        log::info!(
            "Bundle written: {} sections, {} skipped",
            report.written.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn render(&self, source: &Source<'_>, job: &Job<'_>) -> Result<Vec<u8>> {
        match source {
            Source::Bytes(data) => self.exporter.export_bytes(data, job.start, job.end),
            Source::Path(path) => self.exporter.export_path(path, job.start, job.end),
        }
    }
}

/// Sanitized file stem for a section, `secao_<n>` when the title is empty.
pub fn entry_stem(title: &str, position: usize, limit: usize) -> String {
    let stem = sanitize_filename(title, limit);
    if stem.is_empty() {
        format!("secao_{}", position + 1)
    } else {
        stem
    }
}

/// Hands out unique `.pdf` entry names.
#[derive(Debug, Default)]
struct EntryNames {
    used: HashSet<String>,
}

impl EntryNames {
    /// `stem.pdf`, or `stem_<n>.pdf` with the smallest free `n >= 2`.
    fn claim(&mut self, stem: &str) -> String {
        let mut candidate = stem.to_string();
        let mut n = 1;
        while !self.used.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{}_{}", stem, n);
        }
        format!("{}.pdf", candidate)
    }
}
