use std::fs::write;
use std::path::Path;

use taxonomy_import_core::input::{read_records, InputError};
use tempfile::NamedTempFile;

#[test]
fn reads_csv_export_from_disk() {
    let file = NamedTempFile::new().expect("temp file");
    write(
        file.path(),
        "Merk,Modellijn,Sub-modellijn,Opmerking\nAcme,Pro,Pro X,\n,,,\nGlobex,Max,,let op\n",
    )
    .unwrap();

    let records = read_records(file.path(), b',').expect("file should parse");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].brand_name, "Acme");
    assert_eq!(records[1].row, 4);
    assert!(records[1].validate().is_err());
}

#[test]
fn semicolon_separated_sheets_are_supported() {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), "merk;modellijn;sub-modellijn\nŠkoda;Octavia;Octavia RS\n").unwrap();

    let records = read_records(file.path(), b';').unwrap();

    assert_eq!(records[0].brand_name, "Škoda");
    assert_eq!(records[0].sub_model_line_name, "Octavia RS");
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let err = read_records(Path::new("/definitely/not/here.csv"), b',').unwrap_err();
    assert!(matches!(err, InputError::NotFound(_)));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn excel_workbooks_are_read_by_extension() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/taxonomy.xlsx");

    // The delimiter is irrelevant for workbooks.
    let records = read_records(&path, b';').expect("workbook should parse");

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].row, 2);
    assert_eq!(records[0].brand_name, "Acme");
    assert_eq!(records[0].sub_model_line_name, "Pro X");
    assert_eq!(records[1].row, 4);
    assert!(records[1].validate().is_err());
    assert_eq!(records[2].row, 5);
    assert_eq!(records[2].model_line_name, "208");
    assert_eq!(records[2].label(), "Peugeot > 208 > 208 GTi");
}

#[test]
fn header_without_data_rows_is_an_error() {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), "merk,modellijn,sub-modellijn\n,,\n").unwrap();

    let err = read_records(file.path(), b',').unwrap_err();

    assert!(matches!(err, InputError::NoDataRows(_)));
}

#[test]
fn unreadable_workbook_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.xlsx");
    write(&path, "merk,modellijn,sub-modellijn\nAcme,Pro,Pro X\n").unwrap();

    let err = read_records(&path, b',').unwrap_err();

    assert!(matches!(err, InputError::Workbook(_)));
}
