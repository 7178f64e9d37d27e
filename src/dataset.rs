//! Tabular ingestion: CSV and Excel files into a polars `DataFrame`
//!
//! The transport of the dataset (upload form, shared folder) is a collaborator
//! concern; this module only turns a file on disk into a frame the cleaner can
//! validate.

use crate::error::{Result, SegmentasiError};
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::path::Path;

/// Load a tabular file, dispatching on the extension.
///
/// Supports `.csv` (polars reader) and `.xls` / `.xlsx` (calamine, first
/// worksheet). Anything else is a `DataError`.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let df = match ext.as_str() {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "xls" | "xlsx" => load_spreadsheet(path)?,
        other => {
            return Err(SegmentasiError::DataError(format!(
                "unsupported file format: '{other}' (expected csv, xls or xlsx)"
            )))
        }
    };

    tracing::info!(rows = df.height(), cols = df.width(), path = %path.display(), "dataset loaded");
    Ok(df)
}

/// Read the first worksheet of an Excel workbook into a `DataFrame`.
///
/// The first row is taken as the header. A column whose non-empty cells are all
/// numeric becomes `Float64` (empty cells stay null for the cleaner to impute);
/// every other column is read as strings.
fn load_spreadsheet(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SegmentasiError::DataError(format!("cannot open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SegmentasiError::DataError("workbook has no sheets".to_string()))?
        .map_err(|e| SegmentasiError::DataError(format!("cannot read sheet: {e}")))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| SegmentasiError::DataError("worksheet is empty".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

    let body: Vec<&[Data]> = rows.collect();
    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| build_column(name, idx, &body))
        .collect();

    DataFrame::new(columns).map_err(Into::into)
}

fn build_column(name: &str, idx: usize, body: &[&[Data]]) -> Column {
    let cells: Vec<&Data> = body
        .iter()
        .map(|row| row.get(idx).unwrap_or(&Data::Empty))
        .collect();

    let numeric = cells
        .iter()
        .all(|c| matches!(c, Data::Empty | Data::Float(_) | Data::Int(_)));
    if numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Data::Float(f) => Some(*f),
                Data::Int(i) => Some(*i as f64),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<String> = cells.iter().map(|c| cell_to_string(c)).collect();
        Column::new(name.into(), values)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole floats print without a trailing ".0" so flag columns survive
        // the round-trip as "0"/"1".
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => other.to_string(),
    }
}
