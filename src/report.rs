//! Per-student report triple
//!
//! The stable shape handed to external renderers: one record, its cluster
//! assignment and the cluster description. Rendering beyond plain text (PDF,
//! HTML) is a consumer's concern.

use crate::error::{Result, SegmentasiError};
use crate::schema::CATEGORICAL_COLUMNS;
use polars::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub number: String,
    pub name: String,
    pub sex: String,
    pub class: String,
    pub score: f64,
    pub attendance: f64,
    /// Names of the activities the student participates in, in column order.
    pub activities: Vec<String>,
    pub cluster: usize,
    pub description: String,
    /// Other students assigned to the same cluster.
    pub peers: Vec<String>,
}

impl StudentReport {
    /// Assemble the report from one row of the cleaned frame. Identity cells
    /// that are absent or null render as "-"; the numeric features must be
    /// present after cleaning.
    pub fn from_row(
        frame: &DataFrame,
        row: usize,
        cluster: usize,
        description: String,
        peers: Vec<String>,
    ) -> Result<Self> {
        let activities: Vec<String> = CATEGORICAL_COLUMNS
            .iter()
            .filter(|col| {
                frame
                    .column(col)
                    .ok()
                    .and_then(|c| c.str().ok())
                    .and_then(|c| c.get(row))
                    == Some(crate::schema::FLAG_ACTIVE)
            })
            .map(|col| col.to_string())
            .collect();

        Ok(Self {
            number: cell_text(frame, "No", row),
            name: cell_text(frame, "Name", row),
            sex: cell_text(frame, "Sex", row),
            class: cell_text(frame, "Class", row),
            score: cell_f64(frame, "Average Academic Score", row)?,
            attendance: cell_f64(frame, "Attendance Ratio", row)?,
            activities,
            cluster,
            description,
            peers,
        })
    }

    /// Plain-text rendering: score to two decimals, attendance as a
    /// percentage.
    pub fn render_text(&self) -> String {
        let activities = if self.activities.is_empty() {
            "none".to_string()
        } else {
            self.activities.join(", ")
        };
        let peers = if self.peers.is_empty() {
            "none".to_string()
        } else {
            self.peers.join(", ")
        };
        format!(
            "No: {}\nName: {}\nSex: {}\nClass: {}\n\
             Academic average: {:.2}\nAttendance: {:.2}%\n\
             Activities: {}\nCluster: {}\n{}\nCluster peers: {}",
            self.number,
            self.name,
            self.sex,
            self.class,
            self.score,
            self.attendance * 100.0,
            activities,
            self.cluster,
            self.description,
            peers,
        )
    }
}

fn cell_text(frame: &DataFrame, column: &str, row: usize) -> String {
    let Ok(col) = frame.column(column) else {
        return "-".to_string();
    };
    match col.get(row) {
        Ok(AnyValue::String(s)) => s.trim().to_string(),
        Ok(AnyValue::StringOwned(s)) => s.trim().to_string(),
        Ok(AnyValue::Float64(v)) if v.is_finite() && v.fract() == 0.0 => {
            format!("{}", v as i64)
        }
        Ok(AnyValue::Null) | Err(_) => "-".to_string(),
        Ok(other) => other.to_string(),
    }
}

fn cell_f64(frame: &DataFrame, column: &str, row: usize) -> Result<f64> {
    frame
        .column(column)?
        .f64()?
        .get(row)
        .ok_or_else(|| {
            SegmentasiError::DataError(format!("'{column}' is missing at row {row}"))
        })
}
