//! JSON rendering of sections and block records.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{PageBlockRecord, Section};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Render sections with their boundary field names.
pub fn sections_to_json(sections: &[Section], format: JsonFormat) -> Result<String> {
    to_json(sections, format)
}

/// Render per-page block records.
pub fn blocks_to_json(records: &[PageBlockRecord], format: JsonFormat) -> Result<String> {
    to_json(records, format)
}

/// Read sections back, e.g. a list saved by an earlier run.
pub fn sections_from_json(json: &str) -> Result<Vec<Section>> {
    serde_json::from_str(json).map_err(|e| Error::Render(format!("invalid sections JSON: {}", e)))
}
