//! Error types for pdf-slicer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pdf-slicer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while slicing PDF bundles.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The referenced PDF does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be read.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Caller-supplied page bounds are inconsistent with each other or the document.
    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    /// Error while writing a section archive.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during rendering (JSON, text).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Range error for a start page that comes after the end page.
    pub(crate) fn reversed_range(start: u32, end: u32) -> Self {
        Error::InvalidRange(format!(
            "start page {} is greater than end page {}",
            start, end
        ))
    }

    /// Range error for bounds outside `[1, total]`.
    pub(crate) fn range_outside(start: u32, end: u32, total: u32) -> Self {
        Error::InvalidRange(format!(
            "pages {}-{} are outside the document (document has {} pages)",
            start, end, total
        ))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
