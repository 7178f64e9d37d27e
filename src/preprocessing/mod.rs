//! Data preprocessing: schema validation, cleaning and feature scaling
//!
//! The two stages feeding the clustering adapter:
//! - [`clean`] validates the required columns, imputes missing numeric values
//!   with the column mean and coerces the participation flags to canonical
//!   "0"/"1" strings.
//! - [`StandardScaler`] standardizes the numeric features and keeps the fitted
//!   parameters for reuse on single-record predictions.

mod cleaner;
mod scaler;

pub use cleaner::{clean, CleanReport, FillNotice};
pub use scaler::{ScalingParams, StandardScaler};
