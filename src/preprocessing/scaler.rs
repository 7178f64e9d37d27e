//! Standard (z-score) feature scaling
//!
//! Fitted once per dataset version; the stored parameters are reused for every
//! later single-record transform so predictions stay comparable to the trained
//! cluster prototypes.

use crate::error::{Result, SegmentasiError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-column mean and standard deviation (population, ddof = 0).
///
/// A zero-variance column stores `std = 1.0` so scaling is the identity on it
/// and the inverse transform stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub mean: f64,
    pub std: f64,
}

/// Z-score scaler over a fixed set of numeric columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    params: HashMap<String, ScalingParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit per-column parameters. Columns must be numeric and gap-free (the
    /// cleaner runs first).
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.params.clear();

        for name in columns {
            let values = column_values(df, name)?;
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            let std = if std == 0.0 { 1.0 } else { std };
            self.params.insert(name.to_string(), ScalingParams { mean, std });
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Standardize the fitted columns, passing every other column through.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| (v - p.mean) / p.std)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Undo the standardization with the stored parameters.
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.apply(df, |v, p| v * p.std + p.mean)
    }

    /// Scale one new record (values in fit column order) with the stored
    /// parameters. Never refits.
    pub fn transform_record(&self, record: &[f64]) -> Result<Vec<f64>> {
        if !self.is_fitted {
            return Err(SegmentasiError::StaleModel);
        }
        if record.len() != self.columns.len() {
            return Err(SegmentasiError::invalid_parameter(
                "record",
                record.len(),
                format!("expected {} numeric features", self.columns.len()),
            ));
        }
        Ok(record
            .iter()
            .zip(self.columns.iter())
            .map(|(v, name)| {
                let p = &self.params[name];
                (v - p.mean) / p.std
            })
            .collect())
    }

    /// Parameters for one fitted column.
    pub fn params(&self, column: &str) -> Option<&ScalingParams> {
        self.params.get(column)
    }

    /// Fitted column names, in fit order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn apply(&self, df: &DataFrame, op: impl Fn(f64, &ScalingParams) -> f64) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(SegmentasiError::StaleModel);
        }
        let mut result = df.clone();
        for name in &self.columns {
            let params = &self.params[name];
            let values: Vec<f64> = column_values(df, name)?
                .iter()
                .map(|v| op(*v, params))
                .collect();
            result.with_column(Column::new(name.as_str().into(), values))?;
        }
        Ok(result)
    }
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values: Vec<f64> = column.f64()?.into_no_null_iter().collect();
    if values.len() != df.height() {
        return Err(SegmentasiError::DataError(format!(
            "column '{name}' still has missing values; clean the table first"
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "Average Academic Score" => &[60.0, 70.0, 80.0, 90.0],
            "Attendance Ratio" => &[0.6, 0.7, 0.8, 0.9],
            "Computer Club" => &["1", "0", "1", "0"],
        )
        .unwrap()
    }

    const COLS: [&str; 2] = ["Average Academic Score", "Attendance Ratio"];

    #[test]
    fn test_fit_transform_standardizes() {
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&sample_df(), &COLS).unwrap();

        let values: Vec<f64> = scaled
            .column("Average Academic Score")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
        assert!(mean.abs() < 1e-12);

        let var: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_categorical_columns_pass_through() {
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&sample_df(), &COLS).unwrap();
        let flags: Vec<&str> = scaled
            .column("Computer Club")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(flags, vec!["1", "0", "1", "0"]);
    }

    #[test]
    fn test_round_trip() {
        let df = sample_df();
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&df, &COLS).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for name in COLS {
            let original: Vec<f64> =
                df.column(name).unwrap().f64().unwrap().into_no_null_iter().collect();
            let back: Vec<f64> = restored
                .column(name)
                .unwrap()
                .f64()
                .unwrap()
                .into_no_null_iter()
                .collect();
            for (a, b) in original.iter().zip(back.iter()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_transform_record_uses_stored_params() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&sample_df(), &COLS).unwrap();
        let before = *scaler.params("Average Academic Score").unwrap();

        let scaled = scaler.transform_record(&[75.0, 0.75]).unwrap();
        // mean 75, population std sqrt(125)
        assert!((scaled[0] - 0.0).abs() < 1e-12);
        assert!((scaled[1] - 0.0).abs() < 1e-12);

        // Scaling a record must not refit.
        assert_eq!(*scaler.params("Average Academic Score").unwrap(), before);
    }

    #[test]
    fn test_zero_variance_column_scales_as_identity() {
        let df = df!(
            "Average Academic Score" => &[80.0, 80.0, 80.0],
            "Attendance Ratio" => &[0.5, 0.7, 0.9],
        )
        .unwrap();
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&df, &COLS).unwrap();

        let params = scaler.params("Average Academic Score").unwrap();
        assert_eq!(params.std, 1.0);

        let values: Vec<f64> = scaled
            .column("Average Academic Score")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        // (80 - 80) / 1 = 0 for every row
        assert!(values.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_unfitted_scaler_is_stale() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&sample_df()),
            Err(SegmentasiError::StaleModel)
        ));
        assert!(matches!(
            scaler.transform_record(&[80.0, 0.9]),
            Err(SegmentasiError::StaleModel)
        ));
    }
}
