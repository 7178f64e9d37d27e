//! Cluster characterization
//!
//! Aggregates each cluster (numeric means, categorical modes) and renders a
//! deterministic description. The wording comes from an ordered threshold
//! table evaluated top to bottom, so the ladder is data rather than branches.

use crate::clustering::MixedData;
use crate::error::{Result, SegmentasiError};
use serde::Serialize;
use std::collections::BTreeMap;

/// One row of the ladder: `(threshold, inclusive, phrase)`. A standardized
/// mean matches the first row it clears; anything below the last row is
/// "very low".
const LADDER: [(f64, bool, &str); 4] = [
    (0.75, false, "a very high"),
    (0.25, false, "an above-average"),
    (-0.25, true, "an average"),
    (-0.75, true, "a below-average"),
];
const FLOOR_PHRASE: &str = "a very low";

const EMPTY_CLUSTER_TEXT: &str = "This cluster has insufficient data to characterize.";
const NO_ACTIVITY_TEXT: &str =
    "Students in this cluster show little extracurricular involvement.";

/// Aggregate view of one cluster plus its rendered description.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    /// Mean of each standardized numeric column, in column order.
    pub numeric_means: Vec<(String, f64)>,
    /// Mode of each categorical column; ties resolve to the lexicographically
    /// smaller value.
    pub categorical_modes: Vec<(String, String)>,
    pub description: String,
}

/// Classify a standardized mean. Exactly 0.75 is "above-average" and exactly
/// -0.25 is "average"; the upper bound of each band is exclusive.
pub fn intensity_phrase(value: f64) -> &'static str {
    for (threshold, inclusive, phrase) in LADDER {
        let matched = if inclusive {
            value >= threshold
        } else {
            value > threshold
        };
        if matched {
            return phrase;
        }
    }
    FLOOR_PHRASE
}

/// Build one profile per cluster id in `[0, k)` from standardized data and an
/// assignment. Empty clusters get a fixed placeholder description instead of
/// an error.
pub fn describe(
    data: &MixedData,
    labels: &[usize],
    k: usize,
    numeric_cols: &[&str],
    categorical_cols: &[&str],
) -> Result<BTreeMap<usize, ClusterProfile>> {
    if labels.len() != data.n_records() {
        return Err(SegmentasiError::DataError(format!(
            "assignment covers {} records but the data has {}",
            labels.len(),
            data.n_records()
        )));
    }
    if numeric_cols.len() != data.numeric.ncols() {
        return Err(SegmentasiError::DataError(format!(
            "{} numeric column names for {} columns",
            numeric_cols.len(),
            data.numeric.ncols()
        )));
    }

    let mut profiles = BTreeMap::new();
    for cluster in 0..k {
        let members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect();

        if members.is_empty() {
            profiles.insert(
                cluster,
                ClusterProfile {
                    cluster,
                    size: 0,
                    numeric_means: Vec::new(),
                    categorical_modes: Vec::new(),
                    description: EMPTY_CLUSTER_TEXT.to_string(),
                },
            );
            continue;
        }

        let numeric_means: Vec<(String, f64)> = numeric_cols
            .iter()
            .enumerate()
            .map(|(j, col)| {
                let sum: f64 = members.iter().map(|&i| data.numeric[[i, j]]).sum();
                (col.to_string(), sum / members.len() as f64)
            })
            .collect();

        let categorical_modes: Vec<(String, String)> = categorical_cols
            .iter()
            .enumerate()
            .map(|(q, col)| {
                let mode = member_mode(members.iter().map(|&i| data.categorical[i][q].as_str()));
                (col.to_string(), mode)
            })
            .collect();

        let description = render_description(&numeric_means, &categorical_modes);
        profiles.insert(
            cluster,
            ClusterProfile {
                cluster,
                size: members.len(),
                numeric_means,
                categorical_modes,
                description,
            },
        );
    }
    Ok(profiles)
}

fn render_description(
    numeric_means: &[(String, f64)],
    categorical_modes: &[(String, String)],
) -> String {
    let mut sentences: Vec<String> = numeric_means
        .iter()
        .map(|(col, mean)| {
            format!(
                "Students in this cluster tend to have {} {}.",
                intensity_phrase(*mean),
                feature_phrase(col)
            )
        })
        .collect();

    let active: Vec<&str> = categorical_modes
        .iter()
        .filter(|(_, mode)| mode == crate::schema::FLAG_ACTIVE)
        .map(|(col, _)| col.as_str())
        .collect();
    if active.is_empty() {
        sentences.push(NO_ACTIVITY_TEXT.to_string());
    } else {
        sentences.push(format!(
            "Students in this cluster are active in: {}.",
            active.join(", ")
        ));
    }

    sentences.join(" ")
}

fn feature_phrase(column: &str) -> String {
    match column {
        "Average Academic Score" => "academic average".to_string(),
        "Attendance Ratio" => "attendance ratio".to_string(),
        other => other.to_lowercase(),
    }
}

fn member_mode<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
    use ndarray::arr2;

    fn two_cluster_data() -> (MixedData, Vec<usize>) {
        let data = MixedData {
            numeric: arr2(&[
                [1.0, 0.9],
                [1.1, 1.0],
                [-1.0, -0.9],
                [-1.1, -1.0],
            ]),
            categorical: vec![
                vec!["1".into(), "0".into(), "0".into(), "1".into()],
                vec!["1".into(), "0".into(), "0".into(), "1".into()],
                vec!["0".into(), "0".into(), "0".into(), "0".into()],
                vec!["0".into(), "0".into(), "0".into(), "0".into()],
            ],
        };
        (data, vec![0, 0, 1, 1])
    }

    #[test]
    fn test_ladder_boundaries_are_exact() {
        assert_eq!(intensity_phrase(0.76), "a very high");
        assert_eq!(intensity_phrase(0.75), "an above-average");
        assert_eq!(intensity_phrase(0.25), "an average");
        assert_eq!(intensity_phrase(-0.25), "an average");
        assert_eq!(intensity_phrase(-0.75), "a below-average");
        assert_eq!(intensity_phrase(-0.750001), "a very low");
    }

    #[test]
    fn test_describe_aggregates_per_cluster() {
        let (data, labels) = two_cluster_data();
        let profiles =
            describe(&data, &labels, 2, &NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS).unwrap();

        let high = &profiles[&0];
        assert_eq!(high.size, 2);
        assert!((high.numeric_means[0].1 - 1.05).abs() < 1e-12);
        assert_eq!(high.categorical_modes[0].1, "1");
        assert!(high.description.contains("a very high academic average"));
        assert!(high
            .description
            .contains("active in: Computer Club, Scouts."));

        let low = &profiles[&1];
        assert!(low.description.contains("a very low academic average"));
        assert!(low
            .description
            .contains("little extracurricular involvement"));
    }

    #[test]
    fn test_empty_cluster_gets_placeholder() {
        let (data, labels) = two_cluster_data();
        let profiles =
            describe(&data, &labels, 3, &NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS).unwrap();
        assert_eq!(profiles[&2].size, 0);
        assert_eq!(profiles[&2].description, EMPTY_CLUSTER_TEXT);
    }

    #[test]
    fn test_mismatched_labels_rejected() {
        let (data, _) = two_cluster_data();
        let err = describe(&data, &[0, 1], 2, &NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS)
            .unwrap_err();
        assert!(matches!(err, SegmentasiError::DataError(_)));
    }
}
