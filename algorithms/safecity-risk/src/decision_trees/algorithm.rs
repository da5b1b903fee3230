//! Axis-aligned classification trees over crime-type codes
//!
use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array1, ArrayBase, ArrayView1, Axis, Data, Ix1, Ix2};
use serde_crate::{Deserialize, Serialize};

use super::NodeIter;
use super::{DecisionTreeValidParams, SplitQuality};
use safecity::{
    error::{Error, Result},
    traits::*,
    Dataset, Float,
};

/// Training rows that reached the node being grown
struct NodeRows {
    visible: Vec<bool>,
    count: usize,
}

impl NodeRows {
    fn root(nsamples: usize) -> Self {
        NodeRows {
            visible: vec![true; nsamples],
            count: nsamples,
        }
    }

    fn empty(nsamples: usize) -> Self {
        NodeRows {
            visible: vec![false; nsamples],
            count: 0,
        }
    }

    fn insert(&mut self, row: usize) {
        self.visible[row] = true;
        self.count += 1;
    }
}

/// Row order of a single feature column, computed once per tree
struct SortedColumn<'a, F> {
    name: &'a str,
    /// `(row, value)` by ascending value, rows with equal values keep their table order
    order: Vec<(usize, F)>,
}

impl<'a, F: Float> SortedColumn<'a, F> {
    fn new(x: &ArrayBase<impl Data<Elem = F>, Ix2>, feature_idx: usize, name: &'a str) -> Self {
        let mut order: Vec<(usize, F)> = x
            .index_axis(Axis(1), feature_idx)
            .iter()
            .copied()
            .enumerate()
            .collect();
        order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Greater));

        SortedColumn { name, order }
    }

    /// The part of the column belonging to `rows`, still in value order
    fn restrict(&self, rows: &NodeRows) -> Vec<(usize, F)> {
        self.order
            .iter()
            .copied()
            .filter(|&(row, _)| rows.visible[row])
            .collect()
    }
}

/// Best threshold found while scanning a node
struct Split<F> {
    feature_idx: usize,
    threshold: F,
    score: f32,
}

#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Debug, Clone, PartialEq)]
/// A node of a fitted [`DecisionTree`]
///
/// Internal nodes send an observation left when its `feature_idx` value is at most
/// `split_value`. Every node also remembers the majority code of the rows that reached it.
pub struct TreeNode<F> {
    feature_idx: usize,
    feature_name: String,
    split_value: F,
    impurity_decrease: F,
    left_child: Option<Box<TreeNode<F>>>,
    right_child: Option<Box<TreeNode<F>>>,
    leaf_node: bool,
    prediction: usize,
    depth: usize,
}

impl<F: Float> TreeNode<F> {
    fn leaf(prediction: usize, depth: usize) -> Self {
        TreeNode {
            feature_idx: 0,
            feature_name: String::new(),
            split_value: F::zero(),
            impurity_decrease: F::zero(),
            left_child: None,
            right_child: None,
            leaf_node: true,
            prediction,
            depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf_node
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Crime-type code predicted by a leaf, `None` for internal nodes
    pub fn prediction(&self) -> Option<usize> {
        if self.is_leaf() {
            Some(self.prediction)
        } else {
            None
        }
    }

    /// Feature index, threshold and impurity decrease of the split
    pub fn split(&self) -> (usize, F, F) {
        (self.feature_idx, self.split_value, self.impurity_decrease)
    }

    /// Name of the feature an internal node splits on
    pub fn feature_name(&self) -> Option<&str> {
        if self.leaf_node {
            None
        } else {
            Some(&self.feature_name)
        }
    }

    fn grow(
        data: &Dataset<F, usize>,
        rows: &NodeRows,
        params: &DecisionTreeValidParams<F>,
        columns: &[SortedColumn<F>],
        depth: usize,
    ) -> Result<Self> {
        let class_freq = data.class_frequencies_with_mask(&rows.visible);
        let prediction = find_modal_class(&class_freq).ok_or(Error::NotEnoughSamples)?;

        let depth_reached = params.max_depth().map_or(false, |max| depth >= max);
        if depth_reached || (rows.count as f32) < params.min_weight_split() {
            return Ok(Self::leaf(prediction, depth));
        }

        let split = match best_split(data, rows, params, columns, &class_freq) {
            Some(split) => split,
            None => return Ok(Self::leaf(prediction, depth)),
        };
        let parent_score = impurity(params.split_quality(), &class_freq);
        let impurity_decrease = F::cast(parent_score) - F::cast(split.score);
        if impurity_decrease < params.min_impurity_decrease() {
            return Ok(Self::leaf(prediction, depth));
        }

        let mut left_rows = NodeRows::empty(data.nsamples());
        let mut right_rows = NodeRows::empty(data.nsamples());
        for (row, record) in data.records().rows().into_iter().enumerate() {
            if !rows.visible[row] {
                continue;
            }
            if record[split.feature_idx] <= split.threshold {
                left_rows.insert(row);
            } else {
                right_rows.insert(row);
            }
        }

        let child = |rows: &NodeRows| -> Result<Option<Box<TreeNode<F>>>> {
            if rows.count == 0 {
                return Ok(None);
            }
            Ok(Some(Box::new(TreeNode::grow(
                data,
                rows,
                params,
                columns,
                depth + 1,
            )?)))
        };
        let left_child = child(&left_rows)?;
        let right_child = child(&right_rows)?;
        let leaf_node = left_child.is_none() || right_child.is_none();

        Ok(TreeNode {
            feature_idx: split.feature_idx,
            feature_name: columns[split.feature_idx].name.to_owned(),
            split_value: split.threshold,
            impurity_decrease,
            left_child,
            right_child,
            leaf_node,
            prediction,
            depth,
        })
    }

    /// Collapses internal nodes whose subtrees all predict the same code
    fn prune(&mut self) -> Option<usize> {
        if self.is_leaf() {
            return Some(self.prediction);
        }

        let left = self.left_child.as_mut().and_then(|x| x.prune());
        let right = self.right_child.as_mut().and_then(|x| x.prune());

        match (left, right) {
            (Some(x), Some(y)) if x == y => {
                self.prediction = x;
                self.right_child = None;
                self.left_child = None;
                self.leaf_node = true;

                Some(x)
            }
            _ => None,
        }
    }
}

impl<F> TreeNode<F> {
    /// Existing children, left before right
    pub fn children(&self) -> Vec<&TreeNode<F>> {
        self.left_child
            .as_deref()
            .into_iter()
            .chain(self.right_child.as_deref())
            .collect()
    }
}

/// Scans every feature of the rows reaching a node for the threshold with the lowest weighted
/// child impurity. Earlier features and lower thresholds win ties.
fn best_split<F: Float>(
    data: &Dataset<F, usize>,
    rows: &NodeRows,
    params: &DecisionTreeValidParams<F>,
    columns: &[SortedColumn<F>],
    class_freq: &BTreeMap<usize, f32>,
) -> Option<Split<F>> {
    let targets = data.targets();
    let total = rows.count as f32;
    let mut best: Option<Split<F>> = None;

    for (feature_idx, column) in columns.iter().enumerate() {
        let visible = column.restrict(rows);
        let mut left_freq = BTreeMap::new();
        let mut right_freq = class_freq.clone();
        let mut n_left = 0.0;

        // move rows to the left child in value order, a threshold may only sit between two
        // different values of rows inside this node
        for pair in visible.windows(2) {
            let (row, value) = pair[0];
            let next_value = pair[1].1;
            let class = targets[row];

            if let Some(freq) = right_freq.get_mut(&class) {
                *freq -= 1.0;
            }
            *left_freq.entry(class).or_insert(0.0) += 1.0;
            n_left += 1.0;

            if value == next_value {
                continue;
            }
            let n_right = total - n_left;
            if n_right < params.min_weight_leaf().max(f32::EPSILON)
                || n_left < params.min_weight_leaf()
            {
                continue;
            }

            let w = n_left / total;
            let score = w * impurity(params.split_quality(), &left_freq)
                + (1.0 - w) * impurity(params.split_quality(), &right_freq);
            if best.as_ref().map_or(true, |best| score < best.score) {
                best = Some(Split {
                    feature_idx,
                    threshold: (value + next_value) / F::cast(2.0),
                    score,
                });
            }
        }
    }

    best
}

/// A fitted CART classifier predicting crime-type codes
///
/// Every internal node compares one feature against a threshold, values at or below it go
/// left. Growing a node picks the feature and threshold whose children have the lowest
/// weighted [impurity](super::SplitQuality), and stops when the node is pure, too small, too
/// deep, or no split lowers the impurity by at least `min_impurity_decrease`. A leaf predicts
/// the most frequent code of its rows, the lowest code on ties.
///
/// Once grown, sibling leaves that agree are merged, so the stored tree only keeps splits
/// that change a prediction.
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F> {
    root_node: TreeNode<F>,
    num_features: usize,
    num_classes: usize,
}

impl<F: Float> Fit<F, usize, Error> for DecisionTreeValidParams<F> {
    type Object = DecisionTree<F>;

    fn fit(&self, dataset: &Dataset<F, usize>) -> Result<Self::Object> {
        if dataset.nsamples() == 0 {
            return Err(Error::NotEnoughSamples);
        }
        let x = dataset.records();
        let names = dataset.feature_names();
        let columns: Vec<_> = (0..x.ncols())
            .map(|feature_idx| SortedColumn::new(x, feature_idx, &names[feature_idx]))
            .collect();

        let mut root_node =
            TreeNode::grow(dataset, &NodeRows::root(x.nrows()), self, &columns, 0)?;
        root_node.prune();

        Ok(DecisionTree {
            root_node,
            num_features: dataset.nfeatures(),
            num_classes: dataset.n_classes(),
        })
    }
}

impl<F: Float, D: Data<Elem = F>> Predict<&ArrayBase<D, Ix2>, Array1<usize>> for DecisionTree<F> {
    fn predict(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        x.rows()
            .into_iter()
            .map(|row| descend(&row, &self.root_node))
            .collect()
    }
}

impl<F: Float> Classifier<F> for DecisionTree<F> {
    fn n_classes(&self) -> usize {
        self.num_classes
    }

    fn n_features(&self) -> usize {
        self.num_features
    }

    fn classify(&self, observation: ArrayView1<F>) -> usize {
        descend(&observation, &self.root_node)
    }
}

impl<F: Float> DecisionTree<F> {
    /// Visits every node, parents before children
    pub fn iter_nodes(&self) -> NodeIter<F> {
        NodeIter::new(vec![&self.root_node])
    }

    /// Features used by at least one split, ascending
    pub fn features(&self) -> Vec<usize> {
        self.iter_nodes()
            .filter(|node| !node.is_leaf())
            .map(|node| node.feature_idx)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Impurity decrease per feature, averaged over the splits using it
    pub fn mean_impurity_decrease(&self) -> Vec<F> {
        let mut total = vec![F::zero(); self.num_features];
        let mut splits = vec![0usize; self.num_features];

        for node in self.iter_nodes().filter(|node| !node.leaf_node) {
            total[node.feature_idx] += node.impurity_decrease;
            splits[node.feature_idx] += 1;
        }

        total
            .into_iter()
            .zip(splits)
            .map(|(sum, n)| if n == 0 { F::zero() } else { sum / F::cast(n) })
            .collect()
    }

    /// Mean impurity decrease normalised to sum to one, all zeros for a single leaf
    pub fn feature_importance(&self) -> Vec<F> {
        let decrease = self.mean_impurity_decrease();
        let sum: F = decrease.iter().cloned().sum();
        if sum <= F::zero() {
            return decrease;
        }

        decrease.into_iter().map(|x| x / sum).collect()
    }

    pub fn root_node(&self) -> &TreeNode<F> {
        &self.root_node
    }

    /// Depth of the deepest node, the root being at depth zero
    pub fn max_depth(&self) -> usize {
        self.iter_nodes().map(|node| node.depth).max().unwrap_or(0)
    }

    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }
}

fn descend<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix1>, root: &TreeNode<F>) -> usize {
    let mut node = root;
    while !node.leaf_node {
        let next = if x[node.feature_idx] <= node.split_value {
            node.left_child.as_deref()
        } else {
            node.right_child.as_deref()
        };
        match next {
            Some(child) => node = child,
            None => break,
        }
    }
    node.prediction
}

/// Most frequent code, the lowest one on ties
fn find_modal_class(class_freq: &BTreeMap<usize, f32>) -> Option<usize> {
    class_freq
        .iter()
        .fold(None, |acc: Option<(usize, f32)>, (&class, &freq)| match acc {
            Some((_, best_freq)) if best_freq >= freq => acc,
            _ => Some((class, freq)),
        })
        .map(|(class, _)| class)
}

fn impurity(quality: SplitQuality, class_freq: &BTreeMap<usize, f32>) -> f32 {
    match quality {
        SplitQuality::Gini => gini_impurity(class_freq),
        SplitQuality::Entropy => entropy(class_freq),
    }
}

fn gini_impurity(class_freq: &BTreeMap<usize, f32>) -> f32 {
    let n = class_freq.values().sum::<f32>();
    if n <= 0.0 {
        return 0.0;
    }

    1.0 - class_freq.values().map(|x| (x / n) * (x / n)).sum::<f32>()
}

fn entropy(class_freq: &BTreeMap<usize, f32>) -> f32 {
    let n = class_freq.values().sum::<f32>();
    if n <= 0.0 {
        return 0.0;
    }

    class_freq
        .values()
        .map(|x| x / n)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::DecisionTree;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array1, Array2};
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use rand_xoshiro::Xoshiro256Plus;
    use safecity::ParamGuard;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<DecisionTree<f64>>();
        has_autotraits::<TreeNode<f64>>();
    }

    #[test]
    fn majority_code_wins() {
        let dataset = Dataset::new(Array2::<f64>::zeros((5, 1)), array![1, 0, 1, 1, 0]);
        let class_freq = dataset.class_frequencies_with_mask(&NodeRows::root(5).visible);
        assert_eq!(find_modal_class(&class_freq), Some(1));

        let tied = vec![(3, 2.0), (1, 2.0), (2, 1.0)].into_iter().collect();
        assert_eq!(find_modal_class(&tied), Some(1));
        assert_eq!(find_modal_class(&BTreeMap::new()), None);
    }

    #[test]
    fn impurity_of_a_mixed_node() {
        // three robberies and one theft
        let class_freq = vec![(0, 3.0), (1, 1.0), (2, 0.0)].into_iter().collect();

        assert_abs_diff_eq!(gini_impurity(&class_freq), 0.375, epsilon = 1e-6);
        assert_abs_diff_eq!(entropy(&class_freq), 0.811_278, epsilon = 1e-5);

        let pure = vec![(0, 4.0), (1, 0.0)].into_iter().collect();
        assert_abs_diff_eq!(gini_impurity(&pure), 0.0);
        assert_abs_diff_eq!(entropy(&pure), 0.0);
        assert_abs_diff_eq!(gini_impurity(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn hidden_rows_do_not_block_splits() -> Result<()> {
        // after the root split, row 2 is outside the left node but shares its hour with row 0
        let data = array![[0., 1.], [0., 2.], [1., 1.]];
        let dataset = Dataset::new(data.clone(), array![0, 1, 2]);

        let tree = DecisionTree::params().fit(&dataset)?;
        assert_eq!(tree.predict(&data), array![0, 1, 2]);
        assert_eq!(tree.num_leaves(), 3);

        Ok(())
    }

    #[test]
    fn only_the_informative_column_is_used() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        // latitude and longitude are noise, night (22h) incidents are code 1
        let mut data = Array::random_using((40, 3), Uniform::new(40.6, 40.8), &mut rng);
        for (i, mut row) in data.rows_mut().into_iter().enumerate() {
            row[2] = if i < 20 { 12. } else { 22. };
        }
        let targets = (0..40).map(|i| (i >= 20) as usize).collect::<Array1<_>>();
        let dataset = Dataset::new(data.clone(), targets.clone());

        let tree = DecisionTree::params().max_depth(Some(2)).fit(&dataset)?;

        assert_eq!(tree.features(), vec![2]);
        assert_eq!(tree.feature_importance(), vec![0., 0., 1.]);
        assert_abs_diff_eq!(tree.root_node().split().1, 17.);
        assert_eq!(tree.predict(&data), targets);

        Ok(())
    }

    #[test]
    fn depth_limit_is_honoured() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        // every incident its own crime type, so only the depth limit stops growth
        let data = Array::random_using((30, 3), Uniform::new(0., 1.), &mut rng);
        let dataset = Dataset::new(data, (0..30).collect::<Array1<usize>>());

        for &max_depth in &[1, 2, 4] {
            let tree = DecisionTree::params()
                .max_depth(Some(max_depth))
                .min_impurity_decrease(1e-10f64)
                .min_weight_split(1e-10)
                .fit(&dataset)?;
            assert_eq!(tree.max_depth(), max_depth);
        }

        Ok(())
    }

    #[test]
    fn stump_separates_on_longitude() -> Result<()> {
        let data = array![[40.7, -73.9, 22.], [40.7, -73.9, 23.], [40.7, -74.1, 22.5]];
        let dataset = Dataset::new(data.clone(), array![0, 0, 1]);

        let tree = DecisionTree::params().max_depth(Some(1)).fit(&dataset)?;
        assert_eq!(tree.predict(&data), array![0, 0, 1]);
        assert_eq!(tree.root_node().feature_name(), Some("feature-1"));

        Ok(())
    }

    #[test]
    fn threshold_value_goes_left() -> Result<()> {
        let dataset = Dataset::new(array![[0.], [2.]], array![0, 1]);
        let tree = DecisionTree::params().fit(&dataset)?;

        let (feature, threshold, _) = tree.root_node().split();
        assert_eq!(feature, 0);
        assert_abs_diff_eq!(threshold, 1.0);
        assert_eq!(tree.classify(array![1.].view()), 0);
        assert_eq!(tree.classify(array![1.0001].view()), 1);

        Ok(())
    }

    #[test]
    fn four_districts_four_codes() -> Result<()> {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let mut data = Array2::random_using((40, 2), Uniform::new(-0.01, 0.01), &mut rng);
        let centers = [[40.70, -74.00], [40.70, -73.90], [40.80, -74.00], [40.80, -73.90]];
        for (i, mut row) in data.rows_mut().into_iter().enumerate() {
            row += &ndarray::aview1(&centers[i / 10]);
        }
        let targets = (0..40).map(|i| i / 10).collect::<Array1<usize>>();
        let dataset = Dataset::new(data.clone(), targets.clone());

        let tree = DecisionTree::params()
            .split_quality(SplitQuality::Entropy)
            .fit(&dataset)?;
        assert_eq!(tree.predict(&data), targets);
        assert_eq!(tree.n_classes(), 4);
        assert_eq!(tree.n_features(), 2);
        assert_eq!(tree.num_leaves(), 4);

        Ok(())
    }

    #[test]
    fn single_crime_type_is_a_single_leaf() -> Result<()> {
        let dataset = Dataset::new(array![[0., 1.], [2., 3.], [4., 5.]], array![2, 2, 2]);
        let tree = DecisionTree::params().fit(&dataset)?;

        assert_eq!(tree.num_leaves(), 1);
        assert_eq!(tree.root_node().prediction(), Some(2));
        assert_eq!(tree.classify(array![100., -100.].view()), 2);
        assert_eq!(tree.feature_importance(), vec![0., 0.]);

        Ok(())
    }

    #[test]
    fn duplicated_incidents_predict_the_majority() -> Result<()> {
        let dataset = Dataset::new(array![[1., 1.], [1., 1.], [1., 1.]], array![1, 0, 1]);
        let tree = DecisionTree::params().fit(&dataset)?;

        assert_eq!(tree.classify(array![1., 1.].view()), 1);

        Ok(())
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let dataset = Dataset::new(Array2::<f64>::zeros((0, 3)), Array1::<usize>::zeros(0));
        let res = DecisionTree::params().check().unwrap().fit(&dataset);
        assert!(matches!(res, Err(Error::NotEnoughSamples)));
    }
}
