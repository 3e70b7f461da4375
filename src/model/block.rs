//! Positioned text blocks and per-page block records.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in page space (top-left origin, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Closed-interval overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x1 >= other.x0 && self.x0 <= other.x1 && self.y1 >= other.y0 && self.y0 <= other.y1
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A rectangular text fragment on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Trimmed text content
    pub text: String,
}

impl TextBlock {
    /// Create a block, trimming its text.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32, text: impl AsRef<str>) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            text: text.as_ref().trim().to_string(),
        }
    }

    /// Bounding box of the block.
    pub fn bbox(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Page orientation, derived from `width > height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Orientation of a page with the given dimensions.
    pub fn of(width: f32, height: f32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    /// Lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Filtered text content of one physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlockRecord {
    /// Page number (1-indexed)
    pub page_number: u32,

    /// Page orientation
    pub orientation: Orientation,

    /// Largest `x1` over all blocks on the page
    pub max_x: f32,

    /// Largest `y1` over all blocks on the page
    pub max_y: f32,

    /// Blocks intersecting the margin region, in extraction order
    pub filtered_blocks: Vec<TextBlock>,
}

impl PageBlockRecord {
    /// Whether any filtered block contains `needle` as a substring.
    pub fn mentions(&self, needle: &str) -> bool {
        self.filtered_blocks.iter().any(|b| b.text.contains(needle))
    }
}
