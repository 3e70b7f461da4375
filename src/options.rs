//! Slicer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options controlling export and the command line front-end.
///
/// The extraction stages take no options; everything here affects how
/// resolved sections are written out. Unknown keys in a settings file are
/// ignored, so a settings file shared with other tools loads cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerOptions {
    /// Worker threads for bundle export (0 = rayon default)
    pub max_threads: usize,

    /// Sections rendered per batch during bundle export
    pub chunk_size: usize,

    /// Read the source PDF once and share the bytes between sections
    pub enable_cache: bool,

    /// Compress the streams of exported PDFs
    pub compress_output: bool,

    /// Maximum length of generated file names
    pub filename_limit: usize,

    /// Default log filter for the command line front-end
    pub log_level: String,
}

impl SlicerOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of export worker threads.
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Set the export batch size. Zero is treated as one.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Enable or disable sharing the source bytes between sections.
    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Enable or disable stream compression of exported PDFs.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress_output = compress;
        self
    }

    /// Set the file name length limit.
    pub fn with_filename_limit(mut self, limit: usize) -> Self {
        self.filename_limit = limit;
        self
    }

    /// Set the default log filter.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut options: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.chunk_size = options.chunk_size.max(1);
        Ok(options)
    }

    /// Load options from a JSON settings file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl Default for SlicerOptions {
    fn default() -> Self {
        Self {
            max_threads: 4,
            chunk_size: 1024,
            enable_cache: true,
            compress_output: true,
            filename_limit: 150,
            log_level: "info".to_string(),
        }
    }
}
