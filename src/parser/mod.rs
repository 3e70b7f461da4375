//! PDF parsing module.

mod backend;
mod layout;
mod table_detector;

pub use backend::{PageBox, PageSource, SourceDocument};
pub use layout::{estimate_width, BlockBuilder, LayoutAnalyzer, TextSpan};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
