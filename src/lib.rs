//! Segmentasi - Student segmentation over mixed-type features
//!
//! This crate provides the core pipeline behind a student segmentation
//! dashboard:
//! - Data cleaning, mean imputation, categorical canonicalization
//! - Z-score standardization of the numeric features
//! - Native K-Prototypes clustering with seeded restarts
//! - Deterministic per-cluster descriptions and student reports
//!
//! # Modules
//!
//! ## Pipeline
//! - [`preprocessing`] - Cleaning, imputation, standardization
//! - [`clustering`] - Mixed-type data container and K-Prototypes
//! - [`describe`] - Per-cluster aggregates and descriptions
//!
//! ## State & views
//! - [`session`] - Session state with atomic commit semantics
//! - [`report`] - Per-student report triple for external renderers
//!
//! ## Interfaces
//! - [`dataset`] - CSV/XLSX table loading
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Domain schema
pub mod schema;

// Pipeline
pub mod dataset;
pub mod preprocessing;
pub mod clustering;
pub mod describe;

// State & views
pub mod session;
pub mod report;

// Services
pub mod cli;

pub use clustering::{ClusterModel, KPrototypes, MixedClusterer, MixedData};
pub use describe::ClusterProfile;
pub use error::{Result, SegmentasiError};
pub use preprocessing::{CleanReport, FillNotice, StandardScaler};
pub use report::StudentReport;
pub use schema::NewStudent;
pub use session::{ClusteringOutcome, Prediction, Session};
