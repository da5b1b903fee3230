//! Random Forest Classifier
//!
//! An ensemble of decision trees trained on bootstrapped, feature-subsampled slices of the data.
mod algorithm;
mod hyperparams;

pub use algorithm::*;
pub use hyperparams::*;
