//! Index entries (sections) of a summary table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One row of the summary table, optionally enriched with its page range.
///
/// The serialized field names (`id`, `date`, `documento`, `tipo`,
/// `pagina_inicial`, `pagina_final`) are the boundary contract consumed by
/// front-ends. Unset page fields serialize as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Identifier used to cross-reference pages (unique within one document)
    pub id: String,

    /// Date column, as printed in the summary
    pub date: String,

    /// Document title (may be empty)
    #[serde(rename = "documento")]
    pub document_title: String,

    /// Document type (may be empty)
    #[serde(rename = "tipo")]
    pub doc_type: String,

    /// First page of the sub-document (1-based), once resolved
    #[serde(
        rename = "pagina_inicial",
        default,
        serialize_with = "serialize_page",
        deserialize_with = "deserialize_page"
    )]
    pub page_start: Option<u32>,

    /// Last page of the sub-document (1-based, inclusive), once resolved
    #[serde(
        rename = "pagina_final",
        default,
        serialize_with = "serialize_page",
        deserialize_with = "deserialize_page"
    )]
    pub page_end: Option<u32>,
}

/// The unit presented for selection and export: an [`IndexEntry`] after resolution.
pub type Section = IndexEntry;

impl IndexEntry {
    /// Create an unresolved entry.
    pub fn new(
        id: impl Into<String>,
        date: impl Into<String>,
        document_title: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            document_title: document_title.into(),
            doc_type: doc_type.into(),
            page_start: None,
            page_end: None,
        }
    }

    /// Set the page range and return self.
    pub fn with_range(mut self, start: u32, end: u32) -> Self {
        self.page_start = Some(start);
        self.page_end = Some(end);
        self
    }

    /// The resolved range, if both ends are known.
    pub fn range(&self) -> Option<(u32, u32)> {
        match (self.page_start, self.page_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Whether the entry can be exported.
    pub fn has_range(&self) -> bool {
        self.range().is_some()
    }

    /// Number of pages covered by the resolved range.
    pub fn page_count(&self) -> Option<u32> {
        self.range().map(|(start, end)| end.saturating_sub(start) + 1)
    }
}

fn serialize_page<S: Serializer>(page: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
    match page {
        Some(n) => serializer.serialize_u32(*n),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_page<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPage {
        Number(u32),
        Text(String),
    }

    match Option::<RawPage>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPage::Number(n)) => Ok(Some(n)),
        Some(RawPage::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawPage::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid page number: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_unresolved() {
        let entry = IndexEntry::new("5", "2024-01-01", "Doc", "Petição");
        assert_eq!(entry.page_start, None);
        assert_eq!(entry.page_end, None);
        assert!(!entry.has_range());
        assert_eq!(entry.page_count(), None);
    }

    #[test]
    fn test_range_helpers() {
        let entry = IndexEntry::new("5", "2024-01-01", "Doc", "").with_range(3, 7);
        assert_eq!(entry.range(), Some((3, 7)));
        assert_eq!(entry.page_count(), Some(5));
    }

    #[test]
    fn test_boundary_field_names() {
        let entry = IndexEntry::new("42", "15/01/2024", "Inicial", "Petição").with_range(2, 4);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["date"], "15/01/2024");
        assert_eq!(json["documento"], "Inicial");
        assert_eq!(json["tipo"], "Petição");
        assert_eq!(json["pagina_inicial"], 2);
        assert_eq!(json["pagina_final"], 4);
    }

    #[test]
    fn test_unset_pages_serialize_as_empty() {
        let entry = IndexEntry::new("42", "15/01/2024", "", "");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["pagina_inicial"], "");
        assert_eq!(json["pagina_final"], "");
    }

    #[test]
    fn test_deserialize_accepts_empty_numbers_and_strings() {
        let json = r#"[
            {"id":"1","date":"2024-01-01","documento":"A","tipo":"B","pagina_inicial":"","pagina_final":""},
            {"id":"2","date":"2024-01-01","documento":"A","tipo":"B","pagina_inicial":3,"pagina_final":"5"},
            {"id":"3","date":"2024-01-01","documento":"A","tipo":"B"}
        ]"#;
        let entries: Vec<IndexEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].range(), None);
        assert_eq!(entries[1].range(), Some((3, 5)));
        assert_eq!(entries[2].range(), None);
    }

    #[test]
    fn test_deserialize_rejects_garbage_page() {
        let json = r#"{"id":"1","date":"d","documento":"","tipo":"","pagina_inicial":"abc","pagina_final":""}"#;
        assert!(serde_json::from_str::<IndexEntry>(json).is_err());
    }
}
