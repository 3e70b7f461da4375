//! Page-range resolution.
//!
//! An entry's range spans the first through the last page whose filtered
//! blocks contain the entry id. Matching is plain substring containment, so
//! an id that is a substring of another id also matches the other id's pages.

use std::collections::BTreeSet;

use crate::model::{IndexEntry, PageBlockRecord};

/// Pages whose filtered blocks mention `id`, each page at most once.
pub fn matching_pages(id: &str, records: &[PageBlockRecord]) -> BTreeSet<u32> {
    records
        .iter()
        .filter(|record| record.mentions(id))
        .map(|record| record.page_number)
        .collect()
}

/// Resolve the page ranges of `entries` in place.
///
/// Entries without any matching page end up with both page fields unset.
/// An empty id never matches.
pub fn resolve_in_place(entries: &mut [IndexEntry], records: &[PageBlockRecord]) {
    let mut resolved = 0;

    for entry in entries.iter_mut() {
        let pages = if entry.id.is_empty() {
            BTreeSet::new()
        } else {
            matching_pages(&entry.id, records)
        };

        match (pages.first(), pages.last()) {
            (Some(&start), Some(&end)) => {
                entry.page_start = Some(start);
                entry.page_end = Some(end);
                resolved += 1;
            }
            _ => {
                log::debug!("No pages reference id {:?}", entry.id);
                entry.page_start = None;
                entry.page_end = None;
            }
        }
    }

    log::info!("Resolved {} of {} entries", resolved, entries.len());
}

/// Resolve the page ranges of `entries` and return them.
pub fn resolve(mut entries: Vec<IndexEntry>, records: &[PageBlockRecord]) -> Vec<IndexEntry> {
    resolve_in_place(&mut entries, records);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Orientation, TextBlock};

    fn record(page: u32, texts: &[&str]) -> PageBlockRecord {
        PageBlockRecord {
            page_number: page,
            orientation: Orientation::Portrait,
            max_x: 500.0,
            max_y: 800.0,
            filtered_blocks: texts
                .iter()
                .map(|t| TextBlock::new(0.0, 780.0, 200.0, 790.0, t))
                .collect(),
        }
    }

    #[test]
    fn test_resolves_min_and_max_page() {
        let records = vec![
            record(1, &["Num. 11"]),
            record(3, &["Num. 42 - Pág. 1"]),
            record(5, &["Num. 17"]),
            record(7, &["Num. 42 - Pág. 2"]),
        ];
        let entries = resolve(vec![IndexEntry::new("42", "2024-01-01", "", "")], &records);
        assert_eq!(entries[0].range(), Some((3, 7)));
    }

    #[test]
    fn test_no_match_leaves_pages_unset() {
        let records = vec![record(1, &["Num. 11"])];
        let entries = resolve(vec![IndexEntry::new("99", "2024-01-01", "", "")], &records);
        assert_eq!(entries[0].page_start, None);
        assert_eq!(entries[0].page_end, None);
    }

    #[test]
    fn test_page_counted_once() {
        let records = vec![record(4, &["42", "42 again", "still 42"])];
        assert_eq!(matching_pages("42", &records).len(), 1);
    }

    #[test]
    fn test_substring_matching_is_preserved() {
        let records = vec![record(2, &["Num. 142"]), record(6, &["Num. 42"])];
        let entries = resolve(
            vec![
                IndexEntry::new("42", "2024-01-01", "", ""),
                IndexEntry::new("142", "2024-01-01", "", ""),
            ],
            &records,
        );
        assert_eq!(entries[0].range(), Some((2, 6)));
        assert_eq!(entries[1].range(), Some((2, 2)));
    }

    #[test]
    fn test_empty_id_never_matches() {
        let records = vec![record(1, &["anything"])];
        let entries = resolve(vec![IndexEntry::new("", "2024-01-01", "", "")], &records);
        assert!(!entries[0].has_range());
    }

    #[test]
    fn test_stale_range_is_cleared() {
        let entry = IndexEntry::new("5", "2024-01-01", "", "").with_range(1, 2);
        let entries = resolve(vec![entry], &[record(1, &["nothing"])]);
        assert!(!entries[0].has_range());
    }
}
