//! Layout analysis for PDF pages.
//!
//! Decodes a page content stream into positioned text spans and groups the
//! spans into rectangular blocks in page space (top-left origin, y grows
//! downward), which is the coordinate system the margin heuristics are
//! expressed in.

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{Rect, TextBlock};

use super::backend::{page_content, PageBox};

/// Fraction of the font size used as the average glyph advance.
const AVG_CHAR_WIDTH: f32 = 0.5;
/// TJ adjustment (thousandths of text space) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position information, in PDF user space (y grows upward).
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position of the text origin
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Advance width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Unit vector of the writing direction
    pub dir: (f32, f32),
}

impl TextSpan {
    /// Create a horizontal span with an estimated width.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = estimate_width(&text, font_size);
        Self {
            text,
            x,
            y,
            width,
            font_size,
            dir: (1.0, 0.0),
        }
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    /// Bounding box in user space as `(min_x, min_y, max_x, max_y)`.
    ///
    /// Rotated spans extend along their writing direction.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        let (ux, uy) = self.dir;
        let (vx, vy) = (-uy, ux);
        let ascent = self.font_size * 0.8;
        let descent = self.font_size * 0.2;

        let corners = [
            (self.x - vx * descent, self.y - vy * descent),
            (self.x + vx * ascent, self.y + vy * ascent),
            (
                self.x + ux * self.width - vx * descent,
                self.y + uy * self.width - vy * descent,
            ),
            (
                self.x + ux * self.width + vx * ascent,
                self.y + uy * self.width + vy * ascent,
            ),
        ];

        corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        )
    }
}

/// Estimated advance width of `text` at `font_size`.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_CHAR_WIDTH
}

/// Extracts positioned spans from the pages of a lopdf document.
pub struct LayoutAnalyzer<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> LayoutAnalyzer<'a> {
    /// Create a new layout analyzer.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract text spans from a page with position information.
    /// Uses lopdf's font encoding support for proper text decoding.
    pub fn extract_page_spans(&self, page_id: ObjectId) -> Result<Vec<TextSpan>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let content = page_content(self.doc, page_id)?;
        let content =
            lopdf::content::Content::decode(&content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut state = SpanCollector::default();

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => state.save(),
                "Q" => state.restore(),
                "cm" => {
                    if let Some(m) = matrix_from(operands) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }
                "BT" => state.begin_text(),
                "ET" => state.in_text = false,
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(font_name) = &operands[0] {
                            state.font_name = font_name.clone();
                        }
                        state.font_size = get_number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(get_number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = get_number(&operands[0]).unwrap_or(0.0);
                        let ty = get_number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        state.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_from(operands) {
                        state.line_matrix = m;
                        state.text_matrix = m;
                    }
                }
                "T*" => state.next_line(),
                "Tj" | "TJ" | "'" | "\"" => {
                    if !state.in_text {
                        continue;
                    }
                    if op.operator == "'" || op.operator == "\"" {
                        state.next_line();
                    }

                    let encoding = lopdf_fonts
                        .get(&state.font_name)
                        .and_then(|f| f.get_font_encoding(self.doc).ok());
                    let decode = |bytes: &[u8]| -> String {
                        match encoding {
                            Some(ref enc) => LopdfDocument::decode_text(enc, bytes)
                                .unwrap_or_else(|_| decode_text_simple(bytes)),
                            None => decode_text_simple(bytes),
                        }
                    };

                    let text_idx = if op.operator == "\"" { 2 } else { 0 };
                    match operands.get(text_idx) {
                        Some(Object::String(bytes, _)) => {
                            let text = decode(bytes);
                            state.show(text, 0.0);
                        }
                        Some(Object::Array(arr)) if op.operator == "TJ" => {
                            // Numbers are kerning adjustments in 1/1000 text space
                            // units; large negative values usually mark word spaces.
                            let mut combined = String::new();
                            let mut adjust = 0.0;
                            for item in arr {
                                match item {
                                    Object::String(bytes, _) => combined.push_str(&decode(bytes)),
                                    Object::Integer(_) | Object::Real(_) => {
                                        let n = get_number(item).unwrap_or(0.0);
                                        adjust += -n / 1000.0 * state.font_size;
                                        if -n > TJ_SPACE_THRESHOLD
                                            && !combined.is_empty()
                                            && !combined.ends_with(' ')
                                            && !combined.ends_with('\u{00A0}')
                                        {
                                            combined.push(' ');
                                        }
                                    }
                                    _ => {}
                                }
                            }
                            state.show(combined, adjust);
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        Ok(state.spans)
    }
}

/// 2D affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl Matrix {
    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::default()
        }
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text and graphics state while walking a content stream.
#[derive(Debug)]
struct SpanCollector {
    ctm: Matrix,
    stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_name: Vec<u8>,
    font_size: f32,
    leading: f32,
    in_text: bool,
    spans: Vec<TextSpan>,
}

impl Default for SpanCollector {
    fn default() -> Self {
        Self {
            ctm: Matrix::default(),
            stack: Vec::new(),
            text_matrix: Matrix::default(),
            line_matrix: Matrix::default(),
            font_name: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            in_text: false,
            spans: Vec::new(),
        }
    }
}

impl SpanCollector {
    fn save(&mut self) {
        self.stack.push(self.ctm);
    }

    fn restore(&mut self) {
        if let Some(ctm) = self.stack.pop() {
            self.ctm = ctm;
        }
    }

    fn begin_text(&mut self) {
        self.in_text = true;
        self.text_matrix = Matrix::default();
        self.line_matrix = Matrix::default();
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        // Without a TL operator fall back to a 12pt leading
        let leading = if self.leading != 0.0 { self.leading } else { 12.0 };
        self.move_line(0.0, -leading);
    }

    /// Record a span at the current position and advance past it.
    fn show(&mut self, text: String, adjust: f32) {
        let advance = estimate_width(&text, self.font_size) + adjust;
        let rendering = self.text_matrix.multiply(&self.ctm);

        if !text.trim().is_empty() {
            let h_scale = rendering.horizontal_scale();
            let dir = if h_scale > 0.0 {
                (rendering.a / h_scale, rendering.b / h_scale)
            } else {
                (1.0, 0.0)
            };
            self.spans.push(TextSpan {
                width: estimate_width(&text, self.font_size) * h_scale,
                text,
                x: rendering.e,
                y: rendering.f,
                font_size: self.font_size * rendering.vertical_scale(),
                dir,
            });
        }

        self.text_matrix = Matrix::translation(advance, 0.0).multiply(&self.text_matrix);
    }
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let n: Vec<f32> = operands[..6]
        .iter()
        .map(|o| get_number(o).unwrap_or(0.0))
        .collect();
    Some(Matrix {
        a: n[0],
        b: n[1],
        c: n[2],
        d: n[3],
        e: n[4],
        f: n[5],
    })
}

/// A span placed in page space (top-left origin).
#[derive(Debug, Clone)]
struct PlacedSpan {
    rect: Rect,
    baseline: f32,
    font_size: f32,
    text: String,
}

/// A horizontal run of spans without large gaps.
#[derive(Debug, Clone)]
struct Segment {
    rect: Rect,
    baseline: f32,
    font_size: f32,
    text: String,
}

/// Groups spans into rectangular text blocks in page space.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    /// Gap (multiples of font size) that splits spans on one line into separate segments
    pub segment_gap_factor: f32,
    /// Maximum left-edge difference for segments to continue a block
    pub indent_tolerance: f32,
    /// Maximum baseline distance, as a multiple of the average line spacing
    pub spacing_factor: f32,
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self {
            segment_gap_factor: 2.0,
            indent_tolerance: 20.0,
            spacing_factor: 1.5,
        }
    }
}

impl BlockBuilder {
    /// Create a builder with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build blocks from user-space spans of a page with the given box.
    pub fn build(&self, spans: &[TextSpan], page: &PageBox) -> Vec<TextBlock> {
        let placed = place_spans(spans, page);
        let lines = group_into_lines(placed);
        let segments: Vec<Segment> = lines
            .into_iter()
            .flat_map(|line| self.split_line(line))
            .collect();
        let avg_spacing = average_spacing(&segments);

        let mut blocks: Vec<(Segment, Vec<String>)> = Vec::new();

        for seg in segments {
            let target = blocks.iter_mut().rev().find(|(block, _)| {
                (block.rect.x0 - seg.rect.x0).abs() <= self.indent_tolerance
                    && seg.baseline > block.baseline
                    && seg.baseline - block.baseline <= avg_spacing * self.spacing_factor
                    && (block.font_size - seg.font_size).abs() <= 1.0
            });

            match target {
                Some((block, lines)) => {
                    block.rect = union(&block.rect, &seg.rect);
                    block.baseline = seg.baseline;
                    lines.push(seg.text);
                }
                None => {
                    let text = seg.text.clone();
                    blocks.push((seg, vec![text]));
                }
            }
        }

        blocks
            .into_iter()
            .map(|(seg, lines)| {
                TextBlock::new(
                    seg.rect.x0,
                    seg.rect.y0,
                    seg.rect.x1,
                    seg.rect.y1,
                    lines.join("\n"),
                )
            })
            .filter(|b| !b.text.is_empty())
            .collect()
    }

    /// Join spans sharing a baseline into gap-separated segments.
    ///
    /// Works in user space, so the result can go straight to the table
    /// detector: a date and a time drawn as two text objects become one cell.
    /// Rotated spans are returned unchanged.
    pub fn merge_line_spans(&self, spans: &[TextSpan]) -> Vec<TextSpan> {
        let (horizontal, rotated): (Vec<TextSpan>, Vec<TextSpan>) = spans
            .iter()
            .cloned()
            .partition(|s| s.dir.1.abs() < 1e-3 && s.dir.0 > 0.0);

        // A zero-height box only flips y, which keeps the mapping reversible
        let flip = PageBox::new(0.0, 0.0, 0.0, 0.0);
        let mut merged: Vec<TextSpan> = group_into_lines(place_spans(&horizontal, &flip))
            .into_iter()
            .flat_map(|line| self.split_line(line))
            .map(|seg| TextSpan {
                width: seg.rect.width(),
                x: seg.rect.x0,
                y: -seg.baseline,
                font_size: seg.font_size,
                dir: (1.0, 0.0),
                text: seg.text,
            })
            .collect();

        merged.extend(rotated);
        merged
    }

    fn split_line(&self, line: Vec<PlacedSpan>) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();

        for span in line {
            match segments.last_mut() {
                Some(seg) if span.rect.x0 - seg.rect.x1 <= span.font_size * self.segment_gap_factor => {
                    let gap = span.rect.x0 - seg.rect.x1;
                    if gap > span.font_size * AVG_CHAR_WIDTH * 0.2
                        && !seg.text.ends_with(' ')
                        && !span.text.starts_with(' ')
                    {
                        seg.text.push(' ');
                    }
                    seg.text.push_str(&span.text);
                    seg.rect = union(&seg.rect, &span.rect);
                    seg.font_size = seg.font_size.max(span.font_size);
                }
                _ => segments.push(Segment {
                    rect: span.rect,
                    baseline: span.baseline,
                    font_size: span.font_size,
                    text: span.text,
                }),
            }
        }

        segments
    }
}

fn place_spans(spans: &[TextSpan], page: &PageBox) -> Vec<PlacedSpan> {
    spans
        .iter()
        .map(|span| {
            let (min_x, min_y, max_x, max_y) = span.bounds();
            PlacedSpan {
                rect: Rect::new(
                    min_x - page.x0,
                    page.height - (max_y - page.y0),
                    max_x - page.x0,
                    page.height - (min_y - page.y0),
                ),
                baseline: page.height - (span.y - page.y0),
                font_size: span.font_size,
                text: span.text.clone(),
            }
        })
        .collect()
}

/// Group spans sharing a baseline (within 30% of the font size), top to bottom.
fn group_into_lines(mut spans: Vec<PlacedSpan>) -> Vec<Vec<PlacedSpan>> {
    spans.sort_by(|a, b| {
        a.baseline
            .partial_cmp(&b.baseline)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.rect.x0.partial_cmp(&b.rect.x0).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<PlacedSpan>> = Vec::new();
    let mut current: Vec<PlacedSpan> = Vec::new();
    let mut current_baseline: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * 0.3;
        match current_baseline {
            Some(y) if (span.baseline - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current_baseline = Some(span.baseline);
                current.push(span);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.rect.x0.partial_cmp(&b.rect.x0).unwrap_or(std::cmp::Ordering::Equal));
    }
    lines
}

fn average_spacing(segments: &[Segment]) -> f32 {
    let mut baselines: Vec<f32> = segments.iter().map(|s| s.baseline).collect();
    baselines.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    baselines.dedup_by(|a, b| (*a - *b).abs() < 0.1);

    let spacings: Vec<f32> = baselines.windows(2).map(|w| w[1] - w[0]).collect();
    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn union(a: &Rect, b: &Rect) -> Rect {
    Rect::new(a.x0.min(b.x0), a.y0.min(b.y0), a.x1.max(b.x1), a.y1.max(b.y1))
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Simple text decoding fallback when no encoding is available.
fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = String::from_utf8(bytes.to_vec()) {
        return s;
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
