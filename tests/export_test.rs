//! Range export and ZIP bundles.

mod common;

use std::io::{Cursor, Read};

use common::{numbered_pdf, page_texts, sample_bundle, write_file};
use pdf_slicer::{
    export_sections, extract_range, extract_range_bytes, run_bytes, BundleExporter, Error,
    RangeExporter, Section, Slicer, SlicerOptions,
};

#[test]
fn test_extract_range_keeps_requested_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "ten.pdf", &numbered_pdf(10));

    let pdf = extract_range(&path, 2, 4).unwrap();
    assert_eq!(page_texts(&pdf), vec!["Page 2", "Page 3", "Page 4"]);
}

#[test]
fn test_extract_whole_document() {
    let pdf = extract_range_bytes(&numbered_pdf(3), 1, 3).unwrap();
    assert_eq!(page_texts(&pdf), vec!["Page 1", "Page 2", "Page 3"]);
}

#[test]
fn test_extract_is_deterministic() {
    let source = numbered_pdf(6);
    let first = extract_range_bytes(&source, 3, 5).unwrap();
    let second = extract_range_bytes(&source, 3, 5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_uncompressed_output() {
    let exporter = RangeExporter::new().with_compression(false);
    let pdf = exporter.export_bytes(&numbered_pdf(4), 4, 4).unwrap();
    assert_eq!(page_texts(&pdf), vec!["Page 4"]);
}

#[test]
fn test_range_errors() {
    let source = numbered_pdf(10);

    let err = extract_range_bytes(&source, 5, 3).unwrap_err();
    assert!(matches!(err, Error::InvalidRange(_)));

    let err = extract_range_bytes(&source, 9, 11).unwrap_err();
    assert!(matches!(err, Error::InvalidRange(_)));
    assert!(err.to_string().contains("10 pages"));

    let err = extract_range_bytes(&source, 0, 2).unwrap_err();
    assert!(matches!(err, Error::InvalidRange(_)));
}

#[test]
fn test_missing_file_is_not_found() {
    let err = extract_range("/definitely/not/here.pdf", 1, 1).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_bundle_contains_resolved_sections() {
    let dir = tempfile::tempdir().unwrap();
    let data = sample_bundle();
    let path = write_file(dir.path(), "bundle.pdf", &data);

    let sections = run_bytes(&data, None);
    let report = export_sections(&path, &sections, &SlicerOptions::default()).unwrap();

    assert_eq!(
        report.written,
        vec!["Peticao_Inicial.pdf", "Procuracao.pdf", "Planilha.pdf"]
    );
    assert_eq!(report.skipped, vec!["4504"]);
    assert!(!report.is_complete());

    let mut archive = zip::ZipArchive::new(Cursor::new(report.archive)).unwrap();
    assert_eq!(archive.len(), 3);

    let mut entry = archive.by_name("Peticao_Inicial.pdf").unwrap();
    let mut pdf = Vec::new();
    entry.read_to_end(&mut pdf).unwrap();
    let texts = page_texts(&pdf);
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("Dos fatos"));
}

#[test]
fn test_bundle_without_cache_matches() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "ten.pdf", &numbered_pdf(10));
    let sections = vec![
        Section::new("1", "15/01/2024", "Despacho", "").with_range(1, 2),
        Section::new("2", "15/01/2024", "Despacho", "").with_range(3, 3),
        Section::new("3", "15/01/2024", "", "").with_range(9, 10),
        Section::new("4", "15/01/2024", "Fora", "").with_range(10, 12),
    ];

    let cached = BundleExporter::new(SlicerOptions::default())
        .export_path(&path, &sections)
        .unwrap();
    let uncached = BundleExporter::new(
        SlicerOptions::default()
            .with_cache(false)
            .with_max_threads(1)
            .with_chunk_size(1),
    )
    .export_path(&path, &sections)
    .unwrap();

    for report in [&cached, &uncached] {
        assert_eq!(
            report.written,
            vec!["Despacho.pdf", "Despacho_2.pdf", "secao_3.pdf"]
        );
        assert_eq!(report.skipped, vec!["4"]);
    }
}

#[test]
fn test_skipped_follow_selection_order() {
    let sections = vec![
        Section::new("fora", "15/01/2024", "Fora", "").with_range(4, 6),
        Section::new("sem", "15/01/2024", "Sem páginas", ""),
        Section::new("ok", "15/01/2024", "Despacho", "").with_range(1, 1),
        Section::new("depois", "15/01/2024", "", "").with_range(2, 9),
    ];

    let report = BundleExporter::new(SlicerOptions::default())
        .export_bytes(&numbered_pdf(3), &sections)
        .unwrap();

    assert_eq!(report.written, vec!["Despacho.pdf"]);
    assert_eq!(report.skipped, vec!["fora", "sem", "depois"]);
}

#[test]
fn test_slicer_archive_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "bundle.pdf", &sample_bundle());

    let slicer = Slicer::new();
    assert_eq!(
        slicer.archive_name(&path),
        format!("{}_fatiado.zip", common::PROCESS_NUMBER)
    );

    let plain = write_file(dir.path(), "autos.pdf", &numbered_pdf(1));
    assert_eq!(slicer.archive_name(&plain), "autos_fatiado.zip");
}

#[test]
fn test_bundle_rejects_non_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.pdf", b"just some text");

    let result = export_sections(&path, &[], &SlicerOptions::default());
    assert!(matches!(result, Err(Error::UnknownFormat)));
}
