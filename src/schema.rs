//! Dataset schema: required columns and the new-student input type
//!
//! Column matching is exact after whitespace-trimming the incoming header
//! names. Identity columns are optional passthrough; numeric and categorical
//! columns are required for the pipeline to run.

use crate::error::{Result, SegmentasiError};
use serde::{Deserialize, Serialize};

/// Identity columns carried through unmodified when present.
pub const ID_COLUMNS: [&str; 4] = ["No", "Name", "Sex", "Class"];

/// Numeric feature columns: academic average in [0, 100], attendance in [0, 1].
pub const NUMERIC_COLUMNS: [&str; 2] = ["Average Academic Score", "Attendance Ratio"];

/// Binary participation flags for the four extracurricular activities.
pub const CATEGORICAL_COLUMNS: [&str; 4] =
    ["Computer Club", "Agriculture Club", "Sewing Club", "Scouts"];

/// Canonical categorical values downstream of the cleaner.
pub const FLAG_ACTIVE: &str = "1";
pub const FLAG_INACTIVE: &str = "0";

/// Inclusive range of supported cluster counts.
pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 6;

/// Reject a cluster count outside [2, 6] before any computation.
pub fn validate_k(k: usize) -> Result<()> {
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
        return Err(SegmentasiError::invalid_parameter(
            "k",
            k,
            format!("cluster count must be between {MIN_CLUSTERS} and {MAX_CLUSTERS}"),
        ));
    }
    Ok(())
}

/// Input for a single-record cluster prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    /// Academic average score in [0, 100].
    pub score: f64,
    /// Attendance ratio in [0, 1].
    pub attendance: f64,
    /// Participation flags, ordered as [`CATEGORICAL_COLUMNS`].
    pub flags: [bool; 4],
}

impl NewStudent {
    pub fn new(score: f64, attendance: f64, flags: [bool; 4]) -> Self {
        Self { score, attendance, flags }
    }

    /// Check declared domains; rejected inputs never reach the scaler.
    pub fn validate(&self) -> Result<()> {
        if !self.score.is_finite() || !(0.0..=100.0).contains(&self.score) {
            return Err(SegmentasiError::invalid_parameter(
                "score",
                self.score,
                "academic average must be between 0 and 100",
            ));
        }
        if !self.attendance.is_finite() || !(0.0..=1.0).contains(&self.attendance) {
            return Err(SegmentasiError::invalid_parameter(
                "attendance",
                self.attendance,
                "attendance ratio must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// Numeric features in [`NUMERIC_COLUMNS`] order.
    pub fn numeric_features(&self) -> Vec<f64> {
        vec![self.score, self.attendance]
    }

    /// Flags in the canonical "0"/"1" string form.
    pub fn categorical_features(&self) -> Vec<String> {
        self.flags
            .iter()
            .map(|&f| if f { FLAG_ACTIVE } else { FLAG_INACTIVE }.to_string())
            .collect()
    }

    /// Names of the activities this student participates in.
    pub fn active_clubs(&self) -> Vec<String> {
        CATEGORICAL_COLUMNS
            .iter()
            .zip(self.flags.iter())
            .filter(|(_, &f)| f)
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_k_range() {
        assert!(validate_k(1).is_err());
        for k in 2..=6 {
            assert!(validate_k(k).is_ok());
        }
        assert!(validate_k(7).is_err());
    }

    #[test]
    fn test_new_student_domains() {
        assert!(NewStudent::new(85.0, 0.95, [true, false, false, true]).validate().is_ok());
        assert!(NewStudent::new(101.0, 0.95, [false; 4]).validate().is_err());
        assert!(NewStudent::new(85.0, 1.2, [false; 4]).validate().is_err());
        assert!(NewStudent::new(f64::NAN, 0.5, [false; 4]).validate().is_err());
    }

    #[test]
    fn test_categorical_features_are_canonical() {
        let s = NewStudent::new(70.0, 0.8, [true, false, true, false]);
        assert_eq!(s.categorical_features(), vec!["1", "0", "1", "0"]);
        assert_eq!(s.active_clubs(), vec!["Computer Club", "Sewing Club"]);
    }
}
