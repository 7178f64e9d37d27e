//! Session state for one dataset version
//!
//! The session is the only mutable state in the pipeline. Every stage computes
//! its results on the side and replaces the stored artifacts only after the
//! whole stage succeeded, so a failed re-run never clobbers the last good
//! assignment.

use crate::clustering::{ClusterModel, KPrototypes, MixedClusterer, MixedData};
use crate::describe::{self, ClusterProfile};
use crate::error::{Result, SegmentasiError};
use crate::preprocessing::{clean, FillNotice, StandardScaler};
use crate::report::StudentReport;
use crate::schema::{self, NewStudent, CATEGORICAL_COLUMNS, ID_COLUMNS, NUMERIC_COLUMNS};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Classification of one new record against the fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub cluster: usize,
    pub description: String,
    /// The standardized numeric features the model actually saw.
    pub scaled: Vec<f64>,
}

/// Summary returned by a successful clustering run.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringOutcome {
    pub n_clusters: usize,
    /// `(cluster id, member count)` for every id in `[0, k)`.
    pub sizes: Vec<(usize, usize)>,
}

/// Owns the current dataset and every artifact fitted from it.
pub struct Session {
    clusterer: Box<dyn MixedClusterer>,
    original: Option<DataFrame>,
    cleaned: Option<DataFrame>,
    fills: Vec<FillNotice>,
    scaler: Option<StandardScaler>,
    scaled: Option<DataFrame>,
    model: Option<Box<dyn ClusterModel>>,
    labels: Option<Vec<usize>>,
    labeled: Option<DataFrame>,
    profiles: BTreeMap<usize, ClusterProfile>,
    n_clusters: Option<usize>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_clusterer(Box::new(KPrototypes::new()))
    }

    /// Swap in another clustering engine (tests use a deterministic stub).
    pub fn with_clusterer(clusterer: Box<dyn MixedClusterer>) -> Self {
        Self {
            clusterer,
            original: None,
            cleaned: None,
            fills: Vec::new(),
            scaler: None,
            scaled: None,
            model: None,
            labels: None,
            labeled: None,
            profiles: BTreeMap::new(),
            n_clusters: None,
        }
    }

    /// Replace the dataset and drop every artifact fitted from the old one.
    pub fn load_dataset(&mut self, frame: DataFrame) {
        self.original = Some(frame);
        self.cleaned = None;
        self.fills.clear();
        self.scaler = None;
        self.scaled = None;
        self.invalidate_assignment();
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let frame = crate::dataset::load_table(path)?;
        self.load_dataset(frame);
        Ok(())
    }

    fn invalidate_assignment(&mut self) {
        self.model = None;
        self.labels = None;
        self.labeled = None;
        self.profiles.clear();
        self.n_clusters = None;
    }

    /// Clean the loaded dataset and fit the scaler. The cleaned frame, scaler
    /// and fill notices replace the session state together; a refit scaler
    /// invalidates any previous assignment.
    pub fn preprocess(&mut self) -> Result<&[FillNotice]> {
        let original = self.original.as_ref().ok_or_else(|| {
            SegmentasiError::DataError("no dataset loaded".to_string())
        })?;

        let report = clean(original)?;
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&report.frame, &NUMERIC_COLUMNS)?;

        self.cleaned = Some(report.frame);
        self.fills = report.fills;
        self.scaler = Some(scaler);
        self.scaled = Some(scaled);
        self.invalidate_assignment();
        Ok(&self.fills)
    }

    /// Cluster the preprocessed data into `k` groups and commit the new
    /// assignment. Preprocesses first when needed. On any failure the
    /// previous assignment stays in place.
    pub fn run_clustering(&mut self, k: usize) -> Result<ClusteringOutcome> {
        schema::validate_k(k)?;
        if self.scaled.is_none() {
            self.preprocess()?;
        }
        let scaled = self.scaled.as_ref().ok_or(SegmentasiError::StaleModel)?;

        let data = MixedData::from_frame(scaled, &NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS)?;
        let (labels, model) = self.clusterer.fit_predict(&data, k)?;
        let profiles = describe::describe(&data, &labels, k, &NUMERIC_COLUMNS, &CATEGORICAL_COLUMNS)?;

        let cleaned = self.cleaned.as_ref().ok_or(SegmentasiError::StaleModel)?;
        let mut labeled = cleaned.clone();
        let ids: Vec<u32> = labels.iter().map(|&l| l as u32).collect();
        labeled.with_column(Column::new("Cluster".into(), ids))?;

        tracing::info!(k, records = labels.len(), "clustering committed");

        self.model = Some(model);
        self.labels = Some(labels);
        self.labeled = Some(labeled);
        self.profiles = profiles;
        self.n_clusters = Some(k);

        Ok(ClusteringOutcome {
            n_clusters: k,
            sizes: self.count_sizes(),
        })
    }

    /// Classify one new student with the stored scaler and fitted model.
    /// Never refits anything.
    pub fn predict(&self, student: &NewStudent) -> Result<Prediction> {
        student.validate()?;
        let scaler = self.scaler.as_ref().ok_or(SegmentasiError::StaleModel)?;
        let model = self.model.as_ref().ok_or(SegmentasiError::StaleModel)?;

        let scaled = scaler.transform_record(&student.numeric_features())?;
        let cluster = model.predict(&scaled, &student.categorical_features())?;
        let description = self
            .profiles
            .get(&cluster)
            .map(|p| p.description.clone())
            .unwrap_or_default();

        Ok(Prediction {
            cluster,
            description,
            scaled,
        })
    }

    /// Cleaned frame with a `Cluster` column appended.
    pub fn labeled_frame(&self) -> Result<&DataFrame> {
        self.labeled.as_ref().ok_or(SegmentasiError::StaleModel)
    }

    pub fn profiles(&self) -> Result<&BTreeMap<usize, ClusterProfile>> {
        if self.n_clusters.is_none() {
            return Err(SegmentasiError::StaleModel);
        }
        Ok(&self.profiles)
    }

    pub fn cluster_sizes(&self) -> Result<Vec<(usize, usize)>> {
        if self.labels.is_none() {
            return Err(SegmentasiError::StaleModel);
        }
        Ok(self.count_sizes())
    }

    pub fn fill_notices(&self) -> &[FillNotice] {
        &self.fills
    }

    fn count_sizes(&self) -> Vec<(usize, usize)> {
        let labels = self.labels.as_deref().unwrap_or(&[]);
        let k = self.n_clusters.unwrap_or(0);
        (0..k)
            .map(|c| (c, labels.iter().filter(|&&l| l == c).count()))
            .collect()
    }

    /// Report triple for the first student matching `name`. Names are not
    /// unique; the earliest row wins, as in the source table.
    pub fn student_report(&self, name: &str) -> Result<StudentReport> {
        let labels = self.labels.as_deref().ok_or(SegmentasiError::StaleModel)?;
        let cleaned = self.cleaned.as_ref().ok_or(SegmentasiError::StaleModel)?;

        let names = cleaned
            .column(ID_COLUMNS[1])
            .map_err(|_| {
                SegmentasiError::DataError(format!(
                    "the dataset has no '{}' column",
                    ID_COLUMNS[1]
                ))
            })?
            .str()?;
        let row = names
            .into_iter()
            .position(|cell| cell.map(str::trim) == Some(name.trim()))
            .ok_or_else(|| {
                SegmentasiError::DataError(format!("no student named '{name}' in the dataset"))
            })?;

        let cluster = labels[row];
        let description = self
            .profiles
            .get(&cluster)
            .map(|p| p.description.clone())
            .unwrap_or_default();
        let peers: Vec<String> = names
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != row && labels[*i] == cluster)
            .filter_map(|(_, cell)| cell.map(|n| n.trim().to_string()))
            .collect();

        StudentReport::from_row(cleaned, row, cluster, description, peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::ClusterModel;

    fn sample_df() -> DataFrame {
        df!(
            "No" => [1i64, 2, 3, 4, 5, 6],
            "Name" => ["Alya", "Bima", "Citra", "Dewi", "Eka", "Fajar"],
            "Sex" => ["F", "M", "F", "F", "F", "M"],
            "Class" => ["7A", "7A", "7B", "7B", "7C", "7C"],
            "Average Academic Score" => [92.0, 90.5, 91.0, 55.0, 52.5, 50.0],
            "Attendance Ratio" => [0.98, 0.97, 0.99, 0.70, 0.65, 0.60],
            "Computer Club" => [1i64, 1, 1, 0, 0, 0],
            "Agriculture Club" => [1i64, 1, 1, 0, 0, 0],
            "Sewing Club" => [1i64, 1, 1, 0, 0, 0],
            "Scouts" => [1i64, 1, 1, 0, 0, 0],
        )
        .unwrap()
    }

    /// Always errors; used to prove a failed run changes nothing.
    struct FailingClusterer;

    impl MixedClusterer for FailingClusterer {
        fn fit_predict(
            &self,
            _data: &MixedData,
            _k: usize,
        ) -> Result<(Vec<usize>, Box<dyn ClusterModel>)> {
            Err(SegmentasiError::ClusteringFailed("stub failure".to_string()))
        }
    }

    #[test]
    fn test_views_are_stale_before_clustering() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        assert!(matches!(
            session.labeled_frame(),
            Err(SegmentasiError::StaleModel)
        ));
        assert!(matches!(
            session.cluster_sizes(),
            Err(SegmentasiError::StaleModel)
        ));
        assert!(matches!(
            session.predict(&NewStudent {
                score: 80.0,
                attendance: 0.9,
                flags: [true; 4],
            }),
            Err(SegmentasiError::StaleModel)
        ));
    }

    #[test]
    fn test_run_clustering_commits_everything() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        let outcome = session.run_clustering(2).unwrap();

        assert_eq!(outcome.n_clusters, 2);
        let total: usize = outcome.sizes.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 6);

        let labeled = session.labeled_frame().unwrap();
        assert!(labeled.column("Cluster").is_ok());
        assert_eq!(session.profiles().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_run_preserves_previous_assignment() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        session.run_clustering(2).unwrap();
        let before = session.labeled_frame().unwrap().clone();

        session.clusterer = Box::new(FailingClusterer);
        assert!(session.run_clustering(3).is_err());

        assert!(session.labeled_frame().unwrap().equals(&before));
        assert_eq!(session.cluster_sizes().unwrap().len(), 2);
    }

    #[test]
    fn test_load_dataset_invalidates_assignment() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        session.run_clustering(2).unwrap();

        session.load_dataset(sample_df());
        assert!(matches!(
            session.labeled_frame(),
            Err(SegmentasiError::StaleModel)
        ));
    }

    #[test]
    fn test_predict_places_high_performer_with_peers() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        session.run_clustering(2).unwrap();

        let strong = session
            .predict(&NewStudent {
                score: 91.0,
                attendance: 0.98,
                flags: [true; 4],
            })
            .unwrap();
        let report = session.student_report("Alya").unwrap();
        assert_eq!(strong.cluster, report.cluster);
        assert!(!strong.description.is_empty());
    }

    #[test]
    fn test_student_report_lists_cluster_peers() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        session.run_clustering(2).unwrap();

        let report = session.student_report("Bima").unwrap();
        assert_eq!(report.name, "Bima");
        assert!(report.peers.contains(&"Alya".to_string()));
        assert!(report.peers.contains(&"Citra".to_string()));
        assert!(!report.peers.contains(&"Bima".to_string()));
    }

    #[test]
    fn test_unknown_student_is_a_data_error() {
        let mut session = Session::new();
        session.load_dataset(sample_df());
        session.run_clustering(2).unwrap();
        assert!(matches!(
            session.student_report("Zulkifli"),
            Err(SegmentasiError::DataError(_))
        ));
    }
}
