//! Mixed-type clustering: the adapter seam and the K-Prototypes engine
//!
//! The pipeline only depends on the [`MixedClusterer`] / [`ClusterModel`]
//! traits, so the concrete algorithm is swappable and tests can substitute a
//! deterministic stub. [`KPrototypes`] is the shipped implementation.

mod kprototypes;

pub use kprototypes::{KPrototypes, KPrototypesModel};

use crate::error::{Result, SegmentasiError};
use ndarray::Array2;
use polars::prelude::DataFrame;

/// Feature matrix for mixed-type clustering: scaled numeric features side by
/// side with canonical `"0"`/`"1"` categorical flags.
#[derive(Debug, Clone)]
pub struct MixedData {
    /// n × p scaled numeric block.
    pub numeric: Array2<f64>,
    /// n rows of q categorical values.
    pub categorical: Vec<Vec<String>>,
}

impl MixedData {
    /// Extract the configured columns from a cleaned and scaled frame.
    pub fn from_frame(
        df: &DataFrame,
        numeric_cols: &[&str],
        categorical_cols: &[&str],
    ) -> Result<Self> {
        let n = df.height();

        let mut numeric = Array2::zeros((n, numeric_cols.len()));
        for (j, name) in numeric_cols.iter().enumerate() {
            let values: Vec<f64> = df
                .column(name)?
                .f64()?
                .into_no_null_iter()
                .collect();
            if values.len() != n {
                return Err(SegmentasiError::DataError(format!(
                    "numeric column '{name}' has missing values"
                )));
            }
            for (i, v) in values.into_iter().enumerate() {
                numeric[[i, j]] = v;
            }
        }

        let mut categorical = vec![Vec::with_capacity(categorical_cols.len()); n];
        for name in categorical_cols {
            let values = df.column(name)?.str()?;
            for (i, cell) in values.into_iter().enumerate() {
                let cell = cell.ok_or_else(|| {
                    SegmentasiError::DataError(format!(
                        "categorical column '{name}' has missing values"
                    ))
                })?;
                categorical[i].push(cell.to_string());
            }
        }

        Ok(Self { numeric, categorical })
    }

    pub fn n_records(&self) -> usize {
        self.numeric.nrows()
    }

    /// Number of distinct (numeric, categorical) rows; the engine refuses to
    /// form more clusters than this.
    pub fn n_distinct(&self) -> usize {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for i in 0..self.n_records() {
            let bits: Vec<u64> = self.numeric.row(i).iter().map(|v| v.to_bits()).collect();
            seen.insert((bits, self.categorical[i].clone()));
        }
        seen.len()
    }
}

/// A fitted clustering model able to classify single records against its
/// prototypes, with the same distance used at fit time and no retraining.
pub trait ClusterModel: Send + Sync + std::fmt::Debug {
    fn predict(&self, numeric: &[f64], categorical: &[String]) -> Result<usize>;
    fn n_clusters(&self) -> usize;
}

/// The abstract partitioning capability the pipeline delegates to.
pub trait MixedClusterer: Send + Sync {
    /// Partition the data into `k` groups, returning one label in `[0, k)` per
    /// record plus the fitted model.
    fn fit_predict(&self, data: &MixedData, k: usize)
        -> Result<(Vec<usize>, Box<dyn ClusterModel>)>;
}
