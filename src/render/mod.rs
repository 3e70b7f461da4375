//! Rendering of extraction results.

mod json;
mod text;

pub use json::{blocks_to_json, sections_from_json, sections_to_json, JsonFormat};
pub use text::sections_to_text;
