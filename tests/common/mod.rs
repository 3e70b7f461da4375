//! PDF fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

pub const PROCESS_NUMBER: &str = "0001234-56.2024.8.26.0100";

/// One line of text drawn at a PDF user-space position.
pub struct Line {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub text: String,
}

/// A page to be generated.
pub struct FixturePage {
    pub width: f32,
    pub height: f32,
    pub lines: Vec<Line>,
}

impl FixturePage {
    pub fn portrait() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            lines: Vec::new(),
        }
    }

    pub fn landscape() -> Self {
        Self {
            width: 842.0,
            height: 595.0,
            lines: Vec::new(),
        }
    }

    pub fn text(mut self, x: f32, y: f32, size: f32, text: impl Into<String>) -> Self {
        self.lines.push(Line {
            x,
            y,
            size,
            text: text.into(),
        });
        self
    }

    /// Id stamp where court systems print it: footer on portrait pages,
    /// right-hand strip on landscape pages.
    pub fn stamp(self, id: &str) -> Self {
        let text = format!("Num. {} - Pág. 1", id);
        if self.width > self.height {
            self.text(760.0, 300.0, 8.0, text)
        } else {
            self.text(40.0, 30.0, 8.0, text)
        }
    }
}

/// WinAnsi bytes for Latin-1 text.
pub fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

/// Build a PDF with one Helvetica text object per line.
pub fn build_pdf(pages: &[FixturePage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        for line in &page.lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), line.size.into()]));
            operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(latin1(&line.text))],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Summary page listing `(id, title, type)` rows, stamped with its own id.
pub fn summary_page(rows: &[(&str, &str, &str)]) -> FixturePage {
    index_page("SUMÁRIO", rows)
}

/// Index rows under a heading that does not name the summary.
pub fn continuation_page(rows: &[(&str, &str, &str)]) -> FixturePage {
    index_page("continuação", rows)
}

fn index_page(heading: &str, rows: &[(&str, &str, &str)]) -> FixturePage {
    let mut page = FixturePage::portrait().text(250.0, 800.0, 12.0, heading);
    for (i, (id, title, doc_type)) in rows.iter().enumerate() {
        let y = 760.0 - i as f32 * 20.0;
        page = page
            .text(40.0, y, 10.0, *id)
            .text(110.0, y, 10.0, "15/01/2024")
            .text(220.0, y, 10.0, *title)
            .text(420.0, y, 10.0, *doc_type);
    }
    page.stamp("9999")
}

/// Five-page bundle:
///
/// | page | content                        | stamp |
/// |------|--------------------------------|-------|
/// | 1    | petition, with the case number | 4501  |
/// | 2    | petition (cont.)               | 4501  |
/// | 3    | power of attorney              | 4502  |
/// | 4    | spreadsheet (landscape)        | 4503  |
/// | 5    | summary                        | 9999  |
///
/// The summary also lists 4504, which no page carries.
pub fn sample_bundle() -> Vec<u8> {
    build_pdf(&[
        FixturePage::portrait()
            .text(72.0, 800.0, 10.0, format!("Processo {}", PROCESS_NUMBER))
            .text(72.0, 740.0, 14.0, "Petição Inicial")
            .stamp("4501"),
        FixturePage::portrait()
            .text(72.0, 740.0, 12.0, "Dos fatos")
            .stamp("4501"),
        FixturePage::portrait()
            .text(72.0, 740.0, 14.0, "Procuração")
            .stamp("4502"),
        FixturePage::landscape()
            .text(72.0, 500.0, 12.0, "Planilha de cálculos")
            .stamp("4503"),
        summary_page(&[
            ("4501", "Petição Inicial", "Petição"),
            ("4502", "Procuração", "Procuração"),
            ("4503", "Planilha", "Documento"),
            ("4504", "Comprovante", "Documento"),
        ]),
    ])
}

/// The same document saved with Flate-compressed streams.
///
/// Streams that would not shrink stay unfiltered, so the result mixes both.
pub fn compressed(data: &[u8]) -> Vec<u8> {
    let mut doc = Document::load_mem(data).unwrap();
    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Whether any stream in the document declares a filter.
pub fn has_filtered_stream(data: &[u8]) -> bool {
    let doc = Document::load_mem(data).unwrap();
    doc.objects
        .values()
        .any(|obj| matches!(obj, Object::Stream(s) if s.dict.has(b"Filter")))
}

/// `pages` portrait pages reading "Page n".
pub fn numbered_pdf(pages: u32) -> Vec<u8> {
    let fixtures: Vec<FixturePage> = (1..=pages)
        .map(|n| FixturePage::portrait().text(72.0, 700.0, 12.0, format!("Page {}", n)))
        .collect();
    build_pdf(&fixtures)
}

/// Text of every page of a PDF, trimmed.
pub fn page_texts(data: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(data).unwrap();
    doc.get_pages()
        .keys()
        .map(|n| doc.extract_text(&[*n]).unwrap().trim().to_string())
        .collect()
}

pub fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}
