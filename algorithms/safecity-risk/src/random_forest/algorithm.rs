use log::{debug, trace};
use ndarray::{Array1, ArrayBase, ArrayView1, Axis, Data, Ix2};
use rand::{seq::index::sample, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use serde_crate::{Deserialize, Serialize};

use safecity::{
    error::{Error, Result},
    traits::*,
    Dataset, Float,
};

use super::RandomForestValidParams;
use crate::DecisionTree;

/// A fitted random forest
///
/// Every tree is grown on a bootstrap sample of the training rows, optionally restricted to a
/// random subset of the features. A prediction is the majority vote of all trees, ties going to
/// the lowest class code.
///
/// ```
/// use safecity::prelude::*;
/// use safecity_risk::RandomForestParams;
/// use ndarray::array;
///
/// let records = array![[40.75, -73.98, 22.], [40.76, -73.99, 23.], [40.65, -73.95, 14.], [40.66, -73.94, 11.]];
/// let dataset = Dataset::new(records, array![0, 0, 1, 1]);
///
/// let forest = RandomForestParams::new(25).fit(&dataset).unwrap();
/// assert_eq!(forest.classify(array![40.755, -73.985, 22.].view()), 0);
/// ```
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForestClassifier<F> {
    trees: Vec<DecisionTree<F>>,
    feature_indices: Vec<Vec<usize>>,
    n_classes: usize,
    n_features: usize,
}

/// Bootstrap rows with replacement.
fn bootstrap<F: Float>(dataset: &Dataset<F, usize>, rng: &mut impl Rng) -> Dataset<F, usize> {
    let n = dataset.nsamples();
    let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    dataset.select(&indices)
}

impl<F: Float> Fit<F, usize, Error> for RandomForestValidParams<F> {
    type Object = RandomForestClassifier<F>;

    fn fit(&self, dataset: &Dataset<F, usize>) -> Result<Self::Object> {
        if dataset.nsamples() == 0 {
            return Err(Error::NotEnoughSamples);
        }

        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed());
        let mut trees = Vec::with_capacity(self.n_trees());
        let mut feats_list = Vec::with_capacity(self.n_trees());

        let n_features = dataset.nfeatures();
        let n_sub = ((n_features as f32 * self.feature_subsample()).ceil() as usize)
            .max(1)
            .min(n_features);
        let tree_params = DecisionTree::params()
            .split_quality(self.split_quality())
            .max_depth(self.max_depth());

        for tree_idx in 0..self.n_trees() {
            // 1) bootstrap rows
            let sample_set = bootstrap(dataset, &mut rng);

            // 2) choose feature subset, kept in column order
            let mut feats = sample(&mut rng, n_features, n_sub).into_vec();
            feats.sort_unstable();

            // 3) train on those features
            let tree = tree_params.fit(&sample_set.select_features(&feats))?;
            trace!(
                "tree {} grown on features {:?} with {} leaves",
                tree_idx,
                feats,
                tree.num_leaves()
            );
            trees.push(tree);
            feats_list.push(feats);
        }
        debug!(
            "random forest of {} trees fitted on {} samples",
            trees.len(),
            dataset.nsamples()
        );

        Ok(RandomForestClassifier {
            trees,
            feature_indices: feats_list,
            n_classes: dataset.n_classes(),
            n_features,
        })
    }
}

impl<F: Float> RandomForestClassifier<F> {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree<F>] {
        &self.trees
    }

    /// Feature columns seen by every tree, in tree order
    pub fn feature_indices(&self) -> &[Vec<usize>] {
        &self.feature_indices
    }

    /// Number of votes every class code receives for `observation`
    pub fn votes(&self, observation: ArrayView1<F>) -> Vec<usize> {
        let mut votes = vec![0; self.n_classes];
        for (tree, feats) in self.trees.iter().zip(&self.feature_indices) {
            let sub = observation.select(Axis(0), feats);
            votes[tree.classify(sub.view())] += 1;
        }
        votes
    }

    /// Feature importance averaged over all trees, in the columns of the training records
    pub fn feature_importance(&self) -> Vec<F> {
        let mut importance = vec![F::zero(); self.n_features];
        for (tree, feats) in self.trees.iter().zip(&self.feature_indices) {
            for (&feat, value) in feats.iter().zip(tree.feature_importance()) {
                importance[feat] += value;
            }
        }

        let n_trees = F::cast(self.trees.len().max(1));
        importance.into_iter().map(|x| x / n_trees).collect()
    }
}

impl<F: Float> Classifier<F> for RandomForestClassifier<F> {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classify(&self, observation: ArrayView1<F>) -> usize {
        let votes = self.votes(observation);
        votes
            .iter()
            .enumerate()
            .fold((0, 0), |(best, best_votes), (class, &n)| {
                if n > best_votes {
                    (class, n)
                } else {
                    (best, best_votes)
                }
            })
            .0
    }
}

impl<F: Float, D: Data<Elem = F>> Predict<&ArrayBase<D, Ix2>, Array1<usize>>
    for RandomForestClassifier<F>
{
    fn predict(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        x.rows().into_iter().map(|row| self.classify(row)).collect()
    }
}
