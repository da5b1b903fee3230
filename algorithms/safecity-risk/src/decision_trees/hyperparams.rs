use safecity::{
    error::{Error, Result},
    Float, ParamGuard,
};
use serde_crate::{Deserialize, Serialize};

use crate::DecisionTree;

/// Impurity measure minimised when choosing a split
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitQuality {
    /// `1 - sum(p_i^2)` over the crime-type shares `p_i` of a node
    Gini,
    /// `-sum(p_i * log2(p_i))` over the crime-type shares `p_i` of a node
    Entropy,
}

/// Checked settings for growing a [`DecisionTree`]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeValidParams<F> {
    split_quality: SplitQuality,
    max_depth: Option<usize>,
    min_weight_split: f32,
    min_weight_leaf: f32,
    min_impurity_decrease: F,
}

impl<F: Float> DecisionTreeValidParams<F> {
    pub fn split_quality(&self) -> SplitQuality {
        self.split_quality
    }

    /// Depth at which nodes become leaves, unlimited when `None`
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Nodes with fewer incidents are not split
    pub fn min_weight_split(&self) -> f32 {
        self.min_weight_split
    }

    /// Smallest number of incidents a split may leave on either side
    pub fn min_weight_leaf(&self) -> f32 {
        self.min_weight_leaf
    }

    /// Splits lowering the impurity by less than this are dropped
    pub fn min_impurity_decrease(&self) -> F {
        self.min_impurity_decrease
    }
}

/// Unchecked tree settings, see [`DecisionTree::params`]
///
/// ```rust
/// use safecity_risk::{DecisionTree, SplitQuality};
/// use safecity::prelude::*;
/// use ndarray::array;
///
/// // night robberies up town, day thefts down town
/// let records = array![[40.75, -73.98, 22.], [40.76, -73.99, 23.], [40.65, -73.95, 14.], [40.66, -73.94, 11.]];
/// let incidents = Dataset::new(records.clone(), array![0, 0, 1, 1]);
///
/// let tree = DecisionTree::params()
///     .split_quality(SplitQuality::Entropy)
///     .max_depth(Some(3))
///     .fit(&incidents)?;
/// assert_eq!(tree.predict(&records), array![0, 0, 1, 1]);
/// # Ok::<(), Error>(())
/// ```
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecisionTreeParams<F>(DecisionTreeValidParams<F>);

impl<F: Float> DecisionTreeParams<F> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            split_quality: SplitQuality::Gini,
            max_depth: None,
            min_weight_split: 2.0,
            min_weight_leaf: 1.0,
            min_impurity_decrease: F::cast(1e-5),
        })
    }

    pub fn split_quality(mut self, split_quality: SplitQuality) -> Self {
        self.0.split_quality = split_quality;
        self
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    pub fn min_weight_split(mut self, min_weight_split: f32) -> Self {
        self.0.min_weight_split = min_weight_split;
        self
    }

    pub fn min_weight_leaf(mut self, min_weight_leaf: f32) -> Self {
        self.0.min_weight_leaf = min_weight_leaf;
        self
    }

    pub fn min_impurity_decrease(mut self, min_impurity_decrease: F) -> Self {
        self.0.min_impurity_decrease = min_impurity_decrease;
        self
    }
}

impl<F: Float> Default for DecisionTreeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> DecisionTree<F> {
    /// Gini impurity, unlimited depth, nodes of at least two incidents split into leaves of at
    /// least one, and a minimum impurity decrease of `1e-5`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F> {
        DecisionTreeParams::new()
    }
}

impl<F: Float> ParamGuard for DecisionTreeParams<F> {
    type Checked = DecisionTreeValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        if params.min_impurity_decrease.is_nan()
            || params.min_impurity_decrease < F::epsilon()
        {
            return Err(Error::Parameters(format!(
                "min_impurity_decrease must be positive, got {}",
                params.min_impurity_decrease
            )));
        }
        if params.max_depth == Some(0) {
            return Err(Error::Parameters(
                "max_depth must be at least 1, a tree needs a root".to_string(),
            ));
        }
        if params.min_weight_leaf.is_nan() || params.min_weight_leaf < 0.0 {
            return Err(Error::Parameters(format!(
                "min_weight_leaf must not be negative, got {}",
                params.min_weight_leaf
            )));
        }
        Ok(params)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
