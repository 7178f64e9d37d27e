//! K-Prototypes clustering (Huang 1998)
//!
//! Partitions records with a mixed objective: squared Euclidean distance over
//! the numeric block plus `gamma` times the categorical mismatch count. Runs
//! `n_init` seeded restarts and keeps the lowest-cost run, so the result is
//! deterministic for identical input and seed.

use super::{ClusterModel, MixedClusterer, MixedData};
use crate::error::{Result, SegmentasiError};
use crate::schema;
use ndarray::{Array2, ArrayView1};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// K-Prototypes configuration.
#[derive(Debug, Clone)]
pub struct KPrototypes {
    /// Number of random restarts; the lowest-cost run wins.
    pub n_init: usize,
    pub max_iter: usize,
    /// Weight of categorical mismatches against numeric distance. Defaults to
    /// half the mean per-column standard deviation of the numeric block (0.5
    /// for standardized input).
    pub gamma: Option<f64>,
    pub random_state: u64,
}

impl Default for KPrototypes {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iter: 100,
            gamma: None,
            random_state: 42,
        }
    }
}

impl KPrototypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

/// Fitted prototypes: one numeric centroid and one categorical mode vector per
/// cluster.
#[derive(Debug, Clone)]
pub struct KPrototypesModel {
    centroids: Array2<f64>,
    modes: Vec<Vec<String>>,
    gamma: f64,
    cost: f64,
}

impl KPrototypesModel {
    /// Total within-cluster cost of the winning run.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }
}

impl ClusterModel for KPrototypesModel {
    fn predict(&self, numeric: &[f64], categorical: &[String]) -> Result<usize> {
        if numeric.len() != self.centroids.ncols() {
            return Err(SegmentasiError::invalid_parameter(
                "numeric",
                numeric.len(),
                format!("expected {} numeric features", self.centroids.ncols()),
            ));
        }
        if categorical.len() != self.modes[0].len() {
            return Err(SegmentasiError::invalid_parameter(
                "categorical",
                categorical.len(),
                format!("expected {} categorical features", self.modes[0].len()),
            ));
        }

        let numeric = ndarray::ArrayView1::from(numeric);
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for c in 0..self.n_clusters() {
            let d = mixed_distance(
                numeric,
                categorical,
                self.centroids.row(c),
                &self.modes[c],
                self.gamma,
            );
            if d < best_dist {
                best_dist = d;
                best = c;
            }
        }
        Ok(best)
    }

    fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }
}

impl MixedClusterer for KPrototypes {
    fn fit_predict(
        &self,
        data: &MixedData,
        k: usize,
    ) -> Result<(Vec<usize>, Box<dyn ClusterModel>)> {
        schema::validate_k(k)?;

        let n = data.n_records();
        if n == 0 {
            return Err(SegmentasiError::ClusteringFailed(
                "the dataset is empty".to_string(),
            ));
        }
        let distinct = data.n_distinct();
        if distinct < k {
            return Err(SegmentasiError::ClusteringFailed(format!(
                "only {distinct} distinct records for {k} clusters; \
                 the data does not vary enough"
            )));
        }

        let gamma = self.gamma.unwrap_or_else(|| default_gamma(&data.numeric));

        let runs: Vec<Run> = (0..self.n_init)
            .into_par_iter()
            .map(|restart| {
                let seed = self.random_state.wrapping_add(restart as u64);
                self.single_run(data, k, gamma, seed)
            })
            .collect::<Result<Vec<_>>>()?;

        // Equal costs resolve to the lowest restart index so parallel restarts
        // stay deterministic.
        let (best_idx, best) = runs
            .iter()
            .enumerate()
            .min_by(|(ia, a), (ib, b)| {
                a.cost
                    .partial_cmp(&b.cost)
                    .unwrap_or(Ordering::Equal)
                    .then(ia.cmp(ib))
            })
            .ok_or_else(|| {
                SegmentasiError::ClusteringFailed("no restart produced a result".to_string())
            })?;
        tracing::debug!(restart = best_idx, cost = best.cost, k, "selected lowest-cost run");

        let model = KPrototypesModel {
            centroids: best.centroids.clone(),
            modes: best.modes.clone(),
            gamma,
            cost: best.cost,
        };
        Ok((best.labels.clone(), Box::new(model)))
    }
}

struct Run {
    labels: Vec<usize>,
    centroids: Array2<f64>,
    modes: Vec<Vec<String>>,
    cost: f64,
}

impl KPrototypes {
    fn single_run(&self, data: &MixedData, k: usize, gamma: f64, seed: u64) -> Result<Run> {
        let n = data.n_records();
        let p = data.numeric.ncols();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // D²-weighted initialization over the mixed distance: prototypes start
        // as actual records spread apart, duplicates are never picked while a
        // positive-distance candidate exists.
        let mut centroids = Array2::zeros((k, p));
        let mut modes: Vec<Vec<String>> = Vec::with_capacity(k);

        let first = (rng.next_u64() as usize) % n;
        centroids.row_mut(0).assign(&data.numeric.row(first));
        modes.push(data.categorical[first].clone());

        for c in 1..k {
            let dists: Vec<f64> = (0..n)
                .map(|i| {
                    (0..c)
                        .map(|j| {
                            mixed_distance(
                                data.numeric.row(i),
                                &data.categorical[i],
                                centroids.row(j),
                                &modes[j],
                                gamma,
                            )
                        })
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = dists.iter().sum();
            let chosen = if total <= 0.0 {
                (rng.next_u64() as usize) % n
            } else {
                let r = (rng.next_u64() as f64 / u64::MAX as f64) * total;
                let mut cumulative = 0.0;
                let mut chosen = n - 1;
                for (i, &d) in dists.iter().enumerate() {
                    cumulative += d;
                    if cumulative >= r {
                        chosen = i;
                        break;
                    }
                }
                chosen
            };
            centroids.row_mut(c).assign(&data.numeric.row(chosen));
            modes.push(data.categorical[chosen].clone());
        }

        let mut labels = vec![0usize; n];
        for _iter in 0..self.max_iter {
            // Assignment step: nearest prototype, ties to the lower cluster id.
            let new_labels: Vec<usize> = (0..n)
                .map(|i| {
                    let mut best = 0;
                    let mut best_dist = f64::MAX;
                    for c in 0..k {
                        let d = mixed_distance(
                            data.numeric.row(i),
                            &data.categorical[i],
                            centroids.row(c),
                            &modes[c],
                            gamma,
                        );
                        if d < best_dist {
                            best_dist = d;
                            best = c;
                        }
                    }
                    best
                })
                .collect();

            let mut labels_now = new_labels;

            // An emptied cluster takes the record farthest from its assigned
            // prototype, keeping every label in [0, k).
            for c in 0..k {
                if labels_now.iter().any(|&l| l == c) {
                    continue;
                }
                let farthest = (0..n)
                    .max_by(|&a, &b| {
                        let da = assigned_distance(data, &centroids, &modes, &labels_now, a, gamma);
                        let db = assigned_distance(data, &centroids, &modes, &labels_now, b, gamma);
                        da.partial_cmp(&db).unwrap_or(Ordering::Equal).then(b.cmp(&a))
                    })
                    .unwrap_or(0);
                centroids.row_mut(c).assign(&data.numeric.row(farthest));
                modes[c] = data.categorical[farthest].clone();
                labels_now[farthest] = c;
            }

            let converged = labels_now == labels;
            labels = labels_now;
            if converged {
                break;
            }

            // Update step: per-cluster numeric mean and categorical mode.
            for c in 0..k {
                let members: Vec<usize> =
                    (0..n).filter(|&i| labels[i] == c).collect();
                if members.is_empty() {
                    continue;
                }
                for j in 0..p {
                    let sum: f64 = members.iter().map(|&i| data.numeric[[i, j]]).sum();
                    centroids[[c, j]] = sum / members.len() as f64;
                }
                for q in 0..data.categorical[0].len() {
                    modes[c][q] = column_mode(
                        members.iter().map(|&i| data.categorical[i][q].as_str()),
                    );
                }
            }
        }

        let cost: f64 = (0..n)
            .map(|i| assigned_distance(data, &centroids, &modes, &labels, i, gamma))
            .sum();

        Ok(Run { labels, centroids, modes, cost })
    }
}

fn assigned_distance(
    data: &MixedData,
    centroids: &Array2<f64>,
    modes: &[Vec<String>],
    labels: &[usize],
    i: usize,
    gamma: f64,
) -> f64 {
    let c = labels[i];
    mixed_distance(
        data.numeric.row(i),
        &data.categorical[i],
        centroids.row(c),
        &modes[c],
        gamma,
    )
}

/// Squared Euclidean distance over the numeric block plus `gamma` per
/// categorical mismatch.
fn mixed_distance(
    numeric: ArrayView1<f64>,
    categorical: &[String],
    centroid: ArrayView1<f64>,
    modes: &[String],
    gamma: f64,
) -> f64 {
    let num: f64 = numeric
        .iter()
        .zip(centroid.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum();
    let mismatches = categorical
        .iter()
        .zip(modes.iter())
        .filter(|(a, b)| a != b)
        .count();
    num + gamma * mismatches as f64
}

/// Huang's heuristic: half the mean per-column population std of the numeric
/// block.
fn default_gamma(numeric: &Array2<f64>) -> f64 {
    let n = numeric.nrows() as f64;
    if n == 0.0 || numeric.ncols() == 0 {
        return 0.5;
    }
    let mean_std = (0..numeric.ncols())
        .map(|j| {
            let col = numeric.column(j);
            let mean = col.sum() / n;
            (col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
        })
        .sum::<f64>()
        / numeric.ncols() as f64;
    if mean_std > 0.0 {
        0.5 * mean_std
    } else {
        0.5
    }
}

/// Most frequent value; ties resolve to the lexicographically smaller one.
fn column_mode<'a>(values: impl Iterator<Item = &'a str>) -> String {
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

    /// Two well-separated groups: strong students in every club, weak students
    /// in none.
    fn split_data() -> MixedData {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for i in 0..6 {
            let jitter = i as f64 * 0.01;
            numeric.push([1.0 + jitter, 1.0 - jitter]);
            categorical.push(vec!["1".to_string(); 4]);
        }
        for i in 0..6 {
            let jitter = i as f64 * 0.01;
            numeric.push([-1.0 - jitter, -1.0 + jitter]);
            categorical.push(vec!["0".to_string(); 4]);
        }
        MixedData {
            numeric: Array2::from_shape_vec(
                (12, 2),
                numeric.into_iter().flatten().collect(),
            )
            .unwrap(),
            categorical,
        }
    }

    #[test]
    fn test_fit_predict_labels_in_range() {
        let (labels, model) = KPrototypes::new().fit_predict(&split_data(), 2).unwrap();
        assert_eq!(labels.len(), 12);
        assert!(labels.iter().all(|&l| l < 2));
        assert_eq!(model.n_clusters(), 2);
    }

    #[test]
    fn test_fit_predict_recovers_separated_groups() {
        let (labels, _) = KPrototypes::new().fit_predict(&split_data(), 2).unwrap();
        let first = labels[0];
        assert!(labels[..6].iter().all(|&l| l == first));
        assert!(labels[6..].iter().all(|&l| l != first));
    }

    #[test]
    fn test_fit_predict_is_deterministic() {
        let data = split_data();
        let engine = KPrototypes::new().with_random_state(7);
        let (a, _) = engine.fit_predict(&data, 3).unwrap();
        let (b, _) = engine.fit_predict(&data, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_matches_training_assignment() {
        let data = split_data();
        let (labels, model) = KPrototypes::new().fit_predict(&data, 2).unwrap();
        for i in 0..data.n_records() {
            let numeric: Vec<f64> = data.numeric.row(i).to_vec();
            let predicted = model.predict(&numeric, &data.categorical[i]).unwrap();
            assert_eq!(predicted, labels[i]);
        }
    }

    #[test]
    fn test_identical_records_fail_cleanly() {
        let data = MixedData {
            numeric: Array2::zeros((10, 2)),
            categorical: vec![vec!["1".to_string(); 4]; 10],
        };
        let err = KPrototypes::new().fit_predict(&data, 2).unwrap_err();
        assert!(matches!(err, SegmentasiError::ClusteringFailed(_)));
    }

    #[test]
    fn test_k_out_of_range_rejected_before_work() {
        let data = split_data();
        assert!(matches!(
            KPrototypes::new().fit_predict(&data, 1),
            Err(SegmentasiError::InvalidParameter { .. })
        ));
        assert!(matches!(
            KPrototypes::new().fit_predict(&data, 7),
            Err(SegmentasiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_predict_rejects_wrong_arity() {
        let (_, model) = KPrototypes::new().fit_predict(&split_data(), 2).unwrap();
        let err = model.predict(&[0.0], &vec!["1".to_string(); 4]).unwrap_err();
        assert!(matches!(err, SegmentasiError::InvalidParameter { .. }));
    }

    #[test]
    fn test_default_gamma_on_standardized_data() {
        // Unit-variance columns give Huang's 0.5.
        let numeric = ndarray::arr2(&[[1.0, -1.0], [-1.0, 1.0]]);
        assert!((default_gamma(&numeric) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_column_mode_tie_breaks_low() {
        let values = ["1", "0", "1", "0"];
        assert_eq!(column_mode(values.into_iter()), "0");
        let values = ["1", "0", "1"];
        assert_eq!(column_mode(values.into_iter()), "1");
    }
}
