//! Schema validation and cleaning
//!
//! Cleaning operates on a copy; the caller keeps the original frame for
//! display and reporting. The transform is idempotent, so re-cleaning an
//! already cleaned frame changes nothing.

use crate::error::{Result, SegmentasiError};
use crate::schema::{CATEGORICAL_COLUMNS, FLAG_ACTIVE, FLAG_INACTIVE, NUMERIC_COLUMNS};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One mean-imputation event, reported back to the caller rather than applied
/// silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillNotice {
    pub column: String,
    /// Number of cells that were filled.
    pub filled: usize,
    /// The column mean used as the fill value.
    pub mean: f64,
}

/// Result of a successful cleaning pass.
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub frame: DataFrame,
    pub fills: Vec<FillNotice>,
}

/// Validate the schema and clean a raw table.
///
/// Header names are whitespace-trimmed before matching. All required columns
/// must be present or `MissingColumns` names every absent one and nothing
/// downstream runs. Categorical flags become canonical `"0"`/`"1"` strings;
/// numeric gaps are filled with the column mean and reported in the notices.
pub fn clean(raw: &DataFrame) -> Result<CleanReport> {
    let mut frame = trim_column_names(raw)?;

    let required: Vec<&str> = NUMERIC_COLUMNS
        .iter()
        .chain(CATEGORICAL_COLUMNS.iter())
        .copied()
        .collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| frame.column(name).is_err())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SegmentasiError::MissingColumns(missing));
    }

    for name in CATEGORICAL_COLUMNS {
        let canonical = canonicalize_flags(frame.column(name)?)?;
        frame.with_column(canonical)?;
    }

    let mut fills = Vec::new();
    for name in NUMERIC_COLUMNS {
        let (filled, notice) = impute_mean(frame.column(name)?)?;
        frame.with_column(filled)?;
        if let Some(notice) = notice {
            tracing::warn!(
                column = %notice.column,
                filled = notice.filled,
                mean = notice.mean,
                "missing numeric values filled with column mean"
            );
            fills.push(notice);
        }
    }

    Ok(CleanReport { frame, fills })
}

fn trim_column_names(raw: &DataFrame) -> Result<DataFrame> {
    let mut frame = raw.clone();
    let trimmed: Vec<String> = raw
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    frame.set_column_names(trimmed)?;
    Ok(frame)
}

/// Coerce a participation flag column to canonical `"0"`/`"1"` strings.
///
/// Nulls count as 0. Any cell parsing to a nonzero number (or a literal
/// "true") is active; everything else is inactive. Later stages compare these
/// values by string equality only.
fn canonicalize_flags(column: &Column) -> Result<Column> {
    let as_str = column.cast(&DataType::String)?;
    let values: Vec<&str> = as_str
        .str()?
        .into_iter()
        .map(|cell| {
            let trimmed = cell.unwrap_or("").trim();
            let active = match trimmed.parse::<f64>() {
                Ok(v) => v != 0.0,
                Err(_) => trimmed.eq_ignore_ascii_case("true"),
            };
            if active {
                FLAG_ACTIVE
            } else {
                FLAG_INACTIVE
            }
        })
        .collect();
    Ok(Column::new(column.name().clone(), values))
}

/// Fill missing values of a numeric column with the mean of the present ones.
fn impute_mean(column: &Column) -> Result<(Column, Option<FillNotice>)> {
    let name = column.name().clone();
    let as_f64 = column.cast(&DataType::Float64)?;
    let values: Vec<Option<f64>> = as_f64
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();

    let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if present.is_empty() {
        return Err(SegmentasiError::DataError(format!(
            "column '{name}' has no usable numeric values"
        )));
    }

    let missing = values.len() - present.len();
    if missing == 0 {
        return Ok((Column::new(name, present), None));
    }

    let mean = present.iter().sum::<f64>() / present.len() as f64;
    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(mean)).collect();
    let notice = FillNotice {
        column: name.to_string(),
        filled: missing,
        mean,
    };
    Ok((Column::new(name, filled), Some(notice)))
}
