//! Writing resolved sections back out as PDF files.

mod bundle;
mod range;

pub use bundle::{entry_stem, BundleExporter, BundleReport};
pub use range::RangeExporter;
