//! Table detection using text position analysis (Stream mode algorithm).
//!
//! Summary tables are usually drawn without ruling lines, so columns are
//! inferred from left edges that line up across rows.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::layout::TextSpan;

/// X positions are bucketed to this many points when looking for shared edges.
const BUCKET_SIZE: f32 = 5.0;
/// Tolerance for a span to count as aligned with a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Starting Y coordinate (top of table, in PDF coords)
    pub top_y: f32,
    /// Ending Y coordinate (bottom of table)
    pub bottom_y: f32,
    /// Left X boundary
    pub left_x: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Detected column boundaries (X coordinates)
    pub columns: Vec<f32>,
    /// Rows of text spans grouped by Y position, top to bottom
    pub rows: Vec<TableRowData>,
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Y position of this row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 8,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects tables in a list of text spans.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        log::debug!("TableDetector: starting with {} spans", spans.len());

        if spans.len() < self.config.min_rows * self.config.min_columns {
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            log::debug!("TableDetector: not enough rows ({})", rows.len());
            return vec![];
        }

        let columns = self.detect_columns(&rows);
        log::debug!("TableDetector: column edges {:?}", columns);
        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut detected = Vec::new();

        for (start_row, end_row) in self.find_table_regions(&rows, &columns) {
            let table_rows: Vec<TableRowData> = rows[start_row..=end_row].to_vec();

            // Re-detect columns for this specific table region
            let table_columns = self.detect_columns(&table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }

            detected.push(build_table(table_rows, table_columns));
        }

        log::debug!("TableDetector: found {} tables", detected.len());
        detected
    }

    /// Lay spans out on column edges found elsewhere, typically on the page
    /// where a table started.
    ///
    /// Every row is kept; callers decide which rows are real table rows.
    pub fn table_with_columns(&self, spans: &[TextSpan], columns: &[f32]) -> Option<DetectedTable> {
        if spans.is_empty() || columns.is_empty() {
            return None;
        }
        let rows = self.group_into_rows(spans);
        Some(build_table(rows, columns.to_vec()))
    }

    /// Rows of span texts, one cell per span, top to bottom.
    ///
    /// Used when no column edges are known, e.g. a table with a single row.
    pub fn line_rows(&self, spans: &[TextSpan]) -> Vec<Vec<String>> {
        self.group_into_rows(spans)
            .into_iter()
            .map(|row| {
                row.spans
                    .iter()
                    .map(|s| s.text.trim())
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    /// Group spans into rows by Y position.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        // Sort by Y (descending for PDF coords) then X
        let mut sorted_spans = spans.to_vec();
        sorted_spans.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current_row_spans: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted_spans {
            let y_tolerance = span.font_size * self.config.y_tolerance_factor;

            match current_y {
                Some(y) if (span.y - y).abs() <= y_tolerance => current_row_spans.push(span),
                _ => {
                    if !current_row_spans.is_empty() {
                        rows.push(finish_row(std::mem::take(&mut current_row_spans)));
                    }
                    current_y = Some(span.y);
                    current_row_spans.push(span);
                }
            }
        }

        if !current_row_spans.is_empty() {
            rows.push(finish_row(current_row_spans));
        }

        rows
    }

    /// Detect column boundaries from left edges shared by several rows.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi_span_rows: Vec<&TableRowData> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        // With few multi-span rows every row votes, each span separately
        let (voters, per_row_once): (Vec<&TableRowData>, bool) =
            if multi_span_rows.len() < self.config.min_rows {
                (rows.iter().collect(), false)
            } else {
                (multi_span_rows, true)
            };

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &voters {
            let buckets = row.spans.iter().map(|s| (s.x / BUCKET_SIZE).round() as i32);
            if per_row_once {
                for bucket in buckets.collect::<HashSet<_>>() {
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            } else {
                for bucket in buckets {
                    *edge_counts.entry(bucket).or_insert(0) += 1;
                }
            }
        }

        let min_occurrences =
            ((voters.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut column_edges: Vec<f32> = edge_counts
            .iter()
            .filter(|(_, count)| **count >= min_occurrences)
            .map(|(bucket, _)| *bucket as f32 * BUCKET_SIZE)
            .collect();
        column_edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        // Merge close edges
        let mut merged_edges: Vec<f32> = Vec::new();
        for edge in column_edges {
            match merged_edges.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged_edges.push(edge),
            }
        }
        merged_edges
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions: Vec<(usize, usize)> = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                current_start.get_or_insert(i);
            } else if let Some(start) = current_start.take() {
                if i - start >= self.config.min_rows {
                    regions.push((start, i - 1));
                }
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Convert a detected table into rows of trimmed cell strings.
    ///
    /// Every row has one cell per column; spans sharing a column are joined
    /// with a single space.
    pub fn to_rows(&self, detected: &DetectedTable) -> Vec<Vec<String>> {
        let columns = &detected.columns;

        detected
            .rows
            .iter()
            .map(|row| {
                let mut cell_contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for span in &row.spans {
                    let col_idx = find_column_for_span(span.x, columns, detected.right_x);
                    if let Some(cell) = cell_contents.get_mut(col_idx) {
                        let text = span.text.trim();
                        if !text.is_empty() {
                            cell.push(text);
                        }
                    }
                }
                cell_contents.into_iter().map(|c| c.join(" ")).collect()
            })
            .collect()
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn build_table(rows: Vec<TableRowData>, columns: Vec<f32>) -> DetectedTable {
    let all_spans = || rows.iter().flat_map(|r| r.spans.iter());
    let left_x = all_spans().map(|s| s.x).fold(f32::MAX, f32::min);
    let right_x = all_spans().map(|s| s.x + s.width).fold(f32::MIN, f32::max);

    DetectedTable {
        top_y: rows.first().map(|r| r.y).unwrap_or(0.0),
        bottom_y: rows.last().map(|r| r.y).unwrap_or(0.0),
        left_x,
        right_x,
        columns,
        rows,
    }
}

fn finish_row(spans: Vec<TextSpan>) -> TableRowData {
    let avg_y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    TableRowData { y: avg_y, spans }
}

/// Fraction of a row's spans that start on a column edge.
fn alignment_score(row: &TableRowData, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }

    let aligned_spans = row
        .spans
        .iter()
        .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= ALIGN_TOLERANCE))
        .count();

    aligned_spans as f32 / row.spans.len() as f32
}

/// Find which column a span belongs to based on its X position.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    // Allow 10pt for spans slightly before the column start
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - 10.0 && span_x < col_end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (span_x - **a)
                .abs()
                .partial_cmp(&(span_x - **b).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}
