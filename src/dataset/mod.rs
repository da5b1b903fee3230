//! Datasets
//!
//! This module implements the dataset struct handed to the learning algorithms, together with
//! the incident records it is usually built from.
use ndarray::{Array1, Array2, Axis, NdFloat};
use num_traits::{FromPrimitive, NumCast};
use rand::distributions::uniform::SampleUniform;

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::AddAssign;

mod incident;

pub use incident::{Incident, IncidentTable, FEATURE_NAMES};

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a dataset.
pub trait Float:
    NdFloat + FromPrimitive + Default + Sum + SampleUniform + for<'a> AddAssign<&'a Self>
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap_or_else(Self::nan)
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Dataset
///
/// The fundamental structure handed to `Fit` implementations. It contains a two-dimensional
/// matrix of records with dimensionality `(nsamples, nfeatures)`, one target per record and
/// optional descriptive feature names.
///
/// Unsupervised algorithms use `()` as target type.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset<F, T> {
    pub records: Array2<F>,
    pub targets: Array1<T>,

    feature_names: Vec<String>,
}

impl<F, T> Dataset<F, T> {
    /// Create a new dataset from records and targets
    ///
    /// The number of targets is expected to match the number of rows in `records`.
    pub fn new(records: Array2<F>, targets: Array1<T>) -> Self {
        Dataset {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    pub fn records(&self) -> &Array2<F> {
        &self.records
    }

    pub fn targets(&self) -> &Array1<T> {
        &self.targets
    }

    pub fn nsamples(&self) -> usize {
        self.records.nrows()
    }

    pub fn nfeatures(&self) -> usize {
        self.records.ncols()
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// Unnamed features are reported as `feature-{idx}`.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Updates the feature names of a dataset
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> Self {
        self.feature_names = names.into_iter().map(Into::into).collect();
        self
    }
}

impl<F: Clone, T: Clone> Dataset<F, T> {
    /// Selects rows by index, repeating rows which appear multiple times in `indices`
    pub fn select(&self, indices: &[usize]) -> Self {
        Dataset {
            records: self.records.select(Axis(0), indices),
            targets: self.targets.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Keeps only the given feature columns, in the given order
    pub fn select_features(&self, features: &[usize]) -> Self {
        let names = self.feature_names();
        Dataset {
            records: self.records.select(Axis(1), features),
            targets: self.targets.clone(),
            feature_names: features.iter().map(|&idx| names[idx].clone()).collect(),
        }
    }
}

impl<F> Dataset<F, usize> {
    /// Number of classes, assuming codes are dense in `[0, n_classes)`
    pub fn n_classes(&self) -> usize {
        self.targets.iter().max().map_or(0, |max| max + 1)
    }

    /// Counts every class among the rows where `mask` is true
    ///
    /// The map is ordered by class code, so iterating it is deterministic.
    pub fn class_frequencies_with_mask(&self, mask: &[bool]) -> BTreeMap<usize, f32> {
        let mut freqs = BTreeMap::new();
        for (&class, &visible) in self.targets.iter().zip(mask.iter()) {
            if visible {
                *freqs.entry(class).or_insert(0.0) += 1.0;
            }
        }
        freqs
    }
}

impl<F> From<Array2<F>> for Dataset<F, ()> {
    fn from(records: Array2<F>) -> Self {
        let targets = Array1::from_elem(records.nrows(), ());
        Dataset::new(records, targets)
    }
}
