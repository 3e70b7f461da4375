//! Tab-separated rendering of sections.

use crate::model::Section;

const HEADER: [&str; 6] = ["id", "date", "documento", "tipo", "pagina_inicial", "pagina_final"];

/// One header line, then one line per section. Unset pages render empty.
pub fn sections_to_text(sections: &[Section]) -> String {
    let mut out = HEADER.join("\t");
    out.push('\n');

    for section in sections {
        let page = |p: Option<u32>| p.map(|n| n.to_string()).unwrap_or_default();
        let fields = [
            clean(&section.id),
            clean(&section.date),
            clean(&section.document_title),
            clean(&section.doc_type),
            page(section.page_start),
            page(section.page_end),
        ];
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }

    out
}

/// Tabs and newlines would break the column layout.
fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_to_text() {
        let sections = vec![
            Section::new("10", "15/01/2024", "Inicial", "Petição").with_range(1, 3),
            Section::new("11", "16/01/2024", "Two\nlines", ""),
        ];
        let text = sections_to_text(&sections);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id\tdate\tdocumento\ttipo\tpagina_inicial\tpagina_final");
        assert_eq!(lines[1], "10\t15/01/2024\tInicial\tPetição\t1\t3");
        assert_eq!(lines[2], "11\t16/01/2024\tTwo lines\t\t\t");
    }

    #[test]
    fn test_empty_list_has_header_only() {
        assert_eq!(sections_to_text(&[]).lines().count(), 1);
    }
}
