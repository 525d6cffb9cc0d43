//! Reads the taxonomy sheet into [`ImportRecord`]s.
//!
//! The format follows the file extension: `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and
//! `.ods` are read as workbooks (first worksheet), anything else as CSV.
//!
//! Both formats share the same rules. Header names are matched
//! case-insensitively after trimming. Unknown columns are ignored and short
//! rows are padded with empty cells. Rows with all three recognised fields
//! empty are dropped here; rows missing only some of them are kept so the
//! driver can count them as skipped.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::import::ImportRecord;

pub const BRAND_COLUMN: &str = "merk";
pub const MODEL_LINE_COLUMN: &str = "modellijn";
pub const SUB_MODEL_LINE_COLUMN: &str = "sub-modellijn";

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to open input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse input: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook {0} has no worksheets")]
    NoWorksheet(PathBuf),
    #[error("none of the columns merk, modellijn, sub-modellijn found in header {found:?}")]
    NoRecognisedColumns { found: Vec<String> },
    #[error("no data rows found in {0}")]
    NoDataRows(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_workbook = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)));
        if is_workbook {
            SheetFormat::Workbook
        } else {
            SheetFormat::Csv
        }
    }
}

/// Opens `path` and parses it as a workbook or CSV, depending on its extension.
/// `delimiter` only applies to CSV.
///
/// A sheet with a header but no data rows is an error.
pub fn read_records(path: &Path, delimiter: u8) -> Result<Vec<ImportRecord>, InputError> {
    if !path.is_file() {
        error!(path = %path.display(), "Input file not found");
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let format = SheetFormat::from_path(path);
    info!(path = %path.display(), ?format, "Reading input file");

    let records = match format {
        SheetFormat::Workbook => read_workbook(path)?,
        SheetFormat::Csv => {
            let file = File::open(path).map_err(|source| {
                error!(path = %path.display(), error = %source, "Failed to open input file");
                InputError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            parse_records(file, delimiter)?
        }
    };

    if records.is_empty() {
        error!(path = %path.display(), "No data rows found in input file");
        return Err(InputError::NoDataRows(path.to_path_buf()));
    }
    Ok(records)
}

/// Column positions of the three recognised headers.
struct Columns {
    brand: Option<usize>,
    model_line: Option<usize>,
    sub_model_line: Option<usize>,
}

impl Columns {
    fn from_headers<I, S>(raw: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = raw
            .into_iter()
            .map(|h| h.as_ref().trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        info!(headers = ?headers, "Header row found");

        let column = |name: &str| headers.iter().position(|h| h == name);
        let columns = Self {
            brand: column(BRAND_COLUMN),
            model_line: column(MODEL_LINE_COLUMN),
            sub_model_line: column(SUB_MODEL_LINE_COLUMN),
        };
        if columns.brand.is_none() && columns.model_line.is_none() && columns.sub_model_line.is_none() {
            error!(headers = ?headers, "No recognised columns in header row");
            return Err(InputError::NoRecognisedColumns { found: headers });
        }
        Ok(columns)
    }

    /// `cell` returns the raw value at a column index, if the row has one.
    fn record<F>(&self, row: usize, cell: F) -> ImportRecord
    where
        F: Fn(usize) -> Option<String>,
    {
        let get = |idx: Option<usize>| idx.and_then(&cell).unwrap_or_default();
        ImportRecord::new(
            row,
            get(self.brand),
            get(self.model_line),
            get(self.sub_model_line),
        )
    }
}

fn finish(records: Vec<ImportRecord>, dropped: usize) -> Vec<ImportRecord> {
    debug!(dropped, "Dropped empty rows");
    info!(rows = records.len(), "Parsed input rows");
    records
}

pub fn parse_records<R: io::Read>(
    reader: R,
    delimiter: u8,
) -> Result<Vec<ImportRecord>, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(rdr.headers()?.iter())?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (index, row) in rdr.records().enumerate() {
        let row = row?;
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);
        let record = columns.record(line, |i| row.get(i).map(str::to_string));
        if record.is_blank() {
            dropped += 1;
            continue;
        }
        records.push(record);
    }
    Ok(finish(records, dropped))
}

/// Reads the first worksheet. Row numbers are the sheet's own 1-based rows.
fn read_workbook(path: &Path) -> Result<Vec<ImportRecord>, InputError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Failed to open workbook");
        InputError::Workbook(e)
    })?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => {
            error!(path = %path.display(), "Workbook has no worksheets");
            return Err(InputError::NoWorksheet(path.to_path_buf()));
        }
    };

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => Columns::from_headers(header.iter().map(cell_text))?,
        None => Columns::from_headers(Vec::<String>::new())?,
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for (index, row) in rows.enumerate() {
        let record = columns.record(first_row + index + 2, |i| row.get(i).map(cell_text));
        if record.is_blank() {
            dropped += 1;
            continue;
        }
        records.push(record);
    }
    Ok(finish(records, dropped))
}

/// Numbers keep their shortest form, so a model line typed as `208` stays `"208"`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
