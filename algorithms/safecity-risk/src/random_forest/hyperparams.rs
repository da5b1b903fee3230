use std::marker::PhantomData;

use safecity::{
    error::{Error, Result},
    Float, ParamGuard,
};
use serde_crate::{Deserialize, Serialize};

use crate::{RandomForestClassifier, SplitQuality};

/// Number of trees grown when the caller has no better idea
pub const DEFAULT_N_TREES: usize = 100;
/// Seed of the bootstrap and feature sampling generator
pub const DEFAULT_SEED: u64 = 42;

/// Checked hyperparameters of a [random forest](RandomForestClassifier)
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomForestValidParams<F> {
    n_trees: usize,
    max_depth: Option<usize>,
    feature_subsample: f32,
    split_quality: SplitQuality,
    seed: u64,
    #[serde(skip)]
    _phantom: PhantomData<F>,
}

impl<F: Float> RandomForestValidParams<F> {
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Fraction of the features every tree is trained on
    pub fn feature_subsample(&self) -> f32 {
        self.feature_subsample
    }

    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Builder for the hyperparameters of a [random forest](RandomForestClassifier)
///
/// Trees grow without a depth limit on every feature with Gini impurity, and bootstrap rows are
/// drawn from a generator seeded with `42` unless [`seed`](Self::seed) says otherwise.
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomForestParams<F>(RandomForestValidParams<F>);

impl<F: Float> RandomForestParams<F> {
    pub fn new(n_trees: usize) -> Self {
        Self(RandomForestValidParams {
            n_trees,
            max_depth: None,
            feature_subsample: 1.0,
            split_quality: SplitQuality::Gini,
            seed: DEFAULT_SEED,
            _phantom: PhantomData,
        })
    }

    /// Sets the optional depth limit of every tree
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.0.max_depth = depth;
        self
    }

    /// Sets the fraction of features, in `(0, 1]`, sampled without replacement for every tree
    pub fn feature_subsample(mut self, ratio: f32) -> Self {
        self.0.feature_subsample = ratio;
        self
    }

    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    /// Sets the seed of the bootstrap generator, equal seeds grow equal forests
    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }
}

impl<F: Float> Default for RandomForestParams<F> {
    fn default() -> Self {
        Self::new(DEFAULT_N_TREES)
    }
}

impl<F: Float> RandomForestClassifier<F> {
    /// Hyperparameters growing [`DEFAULT_N_TREES`] trees
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> RandomForestParams<F> {
        RandomForestParams::default()
    }
}

impl<F: Float> ParamGuard for RandomForestParams<F> {
    type Checked = RandomForestValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.n_trees == 0 {
            Err(Error::Parameters("n_trees must be > 0".into()))
        } else if !(self.0.feature_subsample > 0.0 && self.0.feature_subsample <= 1.0) {
            Err(Error::Parameters(format!(
                "feature_subsample must be in (0, 1], but was {}",
                self.0.feature_subsample
            )))
        } else if self.0.max_depth == Some(0) {
            Err(Error::Parameters("max_depth must be at least one".into()))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<RandomForestParams<f64>>();
        has_autotraits::<RandomForestValidParams<f64>>();
    }

    #[test]
    fn defaults() {
        let params = RandomForestClassifier::<f64>::params().check().unwrap();
        assert_eq!(params.n_trees(), DEFAULT_N_TREES);
        assert_eq!(params.seed(), 42);
        assert_eq!(params.feature_subsample(), 1.0);
        assert_eq!(params.max_depth(), None);
    }

    #[test]
    fn zero_trees_is_rejected() {
        let res = RandomForestParams::<f64>::new(0).check();
        assert!(matches!(res, Err(Error::Parameters(_))));
    }

    #[test]
    fn feature_subsample_must_be_a_fraction() {
        for ratio in &[0.0, -0.5, 1.5, f32::NAN] {
            let res = RandomForestParams::<f64>::new(10)
                .feature_subsample(*ratio)
                .check();
            assert!(matches!(res, Err(Error::Parameters(_))));
        }
        assert!(RandomForestParams::<f64>::new(10)
            .feature_subsample(0.3)
            .check()
            .is_ok());
    }
}
