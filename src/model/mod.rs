//! Data model shared by the extraction stages and the exporters.
//!
//! Index entries flow from the summary extractor through the resolver to the
//! exporters; block records are produced once per page and only read afterwards.

mod block;
mod section;

pub use block::{Orientation, PageBlockRecord, Rect, TextBlock};
pub use section::{IndexEntry, Section};
