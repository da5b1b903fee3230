use crate::k_means::{KMeansError, KMeansInit, KMeansParams, KMeansParamsError, KMeansValidParams};
use crate::DEFAULT_SEED;
use log::{debug, trace, warn};
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, DataMut, Ix1, Ix2, Zip};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use safecity::prelude::*;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// Hotspot centroids found by Lloyd's k-means over incident coordinates
///
/// Every run starts from centroids picked by a [`KMeansInit`] strategy, then alternates two
/// steps. Each incident joins the centroid at the smallest squared euclidean distance, ties
/// going to the lower index. Each centroid then moves to the mean of its incidents, and one
/// that lost all of them stays where it was. A run stops once the centroids move less than
/// `tolerance` in total, or after `max_n_iterations`, which only logs a warning.
///
/// Of the `n_runs` runs the one with the smallest inertia is kept, so a poor local minimum in a
/// single run does not decide the hotspots.
///
/// ```
/// use safecity::prelude::*;
/// use safecity_hotspots::KMeans;
/// use ndarray::array;
///
/// // two incidents in Times Square, one in Brooklyn
/// let coordinates = array![
///     [40.7580, -73.9855],
///     [40.7590, -73.9850],
///     [40.6500, -73.9500],
/// ];
/// let model = KMeans::params(2).fit(&Dataset::from(coordinates.clone()))?;
///
/// let hotspots = model.predict(&coordinates);
/// assert_eq!(hotspots[0], hotspots[1]);
/// assert_ne!(hotspots[0], hotspots[2]);
/// # Ok::<(), safecity_hotspots::KMeansError>(())
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cluster_count: Array1<F>,
    inertia: F,
}

impl<F: Float> KMeans<F> {
    /// Hyperparameters with a generator seeded by [`DEFAULT_SEED`], so identical incidents always
    /// produce identical hotspots.
    pub fn params(n_clusters: usize) -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(n_clusters, Xoshiro256Plus::seed_from_u64(DEFAULT_SEED))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(n_clusters, rng)
    }

    /// One row per hotspot
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Incidents assigned to each hotspot by the final centroids
    pub fn cluster_count(&self) -> &Array1<F> {
        &self.cluster_count
    }

    /// Mean squared distance of the fitted incidents to their hotspot
    pub fn inertia(&self) -> F {
        self.inertia
    }
}

impl<F: Float, R: Rng + Clone> KMeansValidParams<F, R> {
    fn fit_observations(&self, observations: ArrayView2<F>) -> Result<KMeans<F>, KMeansError> {
        let (n_samples, n_features) = observations.dim();
        if n_samples < self.n_clusters() {
            return Err(KMeansError::TooManyClusters {
                n_clusters: self.n_clusters(),
                n_samples,
            });
        }
        if let KMeansInit::Precomputed(centroids) = self.init_method() {
            if centroids.ncols() != n_features {
                return Err(KMeansError::FeatureMismatch {
                    expected: n_features,
                    found: centroids.ncols(),
                });
            }
        }

        let mut rng = self.rng().clone();
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);
        let mut best: Option<(Array2<F>, F)> = None;

        for run in 0..self.n_runs() {
            let mut centroids = self
                .init_method()
                .run(self.n_clusters(), observations, &mut rng);
            let mut converged_iter = None;
            for n_iter in 0..self.max_n_iterations() {
                update_cluster_memberships(&centroids, &observations, &mut memberships);
                let new_centroids = compute_centroids(&centroids, &observations, &memberships);
                let shift = squared_shift(&centroids, &new_centroids);
                centroids = new_centroids;
                trace!("run {} iteration {}: centroid shift {:?}", run, n_iter, shift);
                if shift <= self.tolerance() {
                    converged_iter = Some(n_iter);
                    break;
                }
            }

            // inertia of the final centroids, not of the ones before the last update
            update_min_dists(&centroids, &observations, &mut dists);
            let inertia = dists.sum();
            match converged_iter {
                Some(n_iter) => debug!(
                    "k-means run {} converged after {} iterations, inertia {:?}",
                    run,
                    n_iter + 1,
                    inertia
                ),
                None => warn!(
                    "k-means run {} did not converge within {} iterations, inertia {:?}",
                    run,
                    self.max_n_iterations(),
                    inertia
                ),
            }

            let improves = match &best {
                Some((_, min_inertia)) => inertia < *min_inertia,
                None => true,
            };
            if improves {
                best = Some((centroids, inertia));
            }
        }

        let (centroids, min_inertia) = best.ok_or(KMeansParamsError::NRuns)?;

        update_cluster_memberships(&centroids, &observations, &mut memberships);
        let mut cluster_count = Array1::zeros(self.n_clusters());
        memberships
            .iter()
            .for_each(|&c| cluster_count[c] += F::one());

        Ok(KMeans {
            centroids,
            cluster_count,
            inertia: min_inertia / F::cast(n_samples),
        })
    }
}

impl<F: Float, R: Rng + Clone, T> Fit<F, T, KMeansError> for KMeansValidParams<F, R> {
    type Object = KMeans<F>;

    /// Clusters the dataset records, targets play no part
    fn fit(&self, dataset: &Dataset<F, T>) -> Result<Self::Object, KMeansError> {
        self.fit_observations(dataset.records().view())
    }
}

impl<F: Float, R: Rng + Clone> Clusterer<F> for KMeansValidParams<F, R> {
    type Error = KMeansError;

    fn cluster(&self, observations: ArrayView2<F>) -> Result<Clustering<F>, Self::Error> {
        let model = self.fit_observations(observations)?;
        let memberships = model.predict(&observations);

        Ok(Clustering {
            memberships,
            centroids: model.centroids,
        })
    }
}

impl<F: Float, R: Rng + Clone> Clusterer<F> for KMeansParams<F, R> {
    type Error = KMeansError;

    fn cluster(&self, observations: ArrayView2<F>) -> Result<Clustering<F>, Self::Error> {
        self.check_ref()?.cluster(observations)
    }
}

impl<F: Float, DA: Data<Elem = F>> Predict<&ArrayBase<DA, Ix2>, Array1<usize>> for KMeans<F> {
    /// Hotspot index of every row, an index into [`KMeans::centroids`]
    fn predict(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        let mut memberships = Array1::zeros(observations.nrows());
        update_cluster_memberships(&self.centroids, observations, &mut memberships);
        memberships
    }
}

impl<F: Float, DA: Data<Elem = F>> Predict<&ArrayBase<DA, Ix1>, usize> for KMeans<F> {
    /// Hotspot index of a single incident
    fn predict(&self, observation: &ArrayBase<DA, Ix1>) -> usize {
        closest_centroid(&self.centroids, observation).0
    }
}

/// Mean position of every cluster, empty clusters keep their row of `old_centroids`
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(old_centroids.rows())
        .and(&counts)
        .for_each(|mut centroid, old_centroid, &cnt| {
            if cnt == 0 {
                centroid.assign(&old_centroid);
            } else {
                centroid /= F::cast(cnt);
            }
        });
    centroids
}

/// Sum over all clusters of the squared distance each centroid moved
fn squared_shift<F: Float>(old_centroids: &Array2<F>, new_centroids: &Array2<F>) -> F {
    Zip::from(old_centroids)
        .and(new_centroids)
        .fold(F::zero(), |acc, &a, &b| acc + (a - b) * (a - b))
}

pub(crate) fn update_cluster_memberships<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .for_each(|observation, cluster_membership| {
            *cluster_membership = closest_centroid(centroids, &observation).0
        });
}

// squared distance of every observation to its nearest centroid
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(dists)
        .for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

/// Row of the nearest centroid and its squared distance, the first row wins a tie
pub(crate) fn closest_centroid<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut closest_index = 0;
    let mut minimum_distance = F::infinity();

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = Zip::from(&centroid)
            .and(observation)
            .fold(F::zero(), |acc, &c, &o| acc + (c - o) * (c - o));
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array, Array1, Array2, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    macro_rules! calc_memberships {
        ($centroids:expr, $obs:expr) => {{
            let mut memberships = Array1::zeros($obs.nrows());
            update_cluster_memberships(&$centroids, &$obs, &mut memberships);
            memberships
        }};
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<KMeans<f64>>();
        has_autotraits::<KMeansError>();
    }

    #[test]
    fn test_min_dists() {
        let centroids = array![[0.0, 1.0], [40.0, 10.0]];
        let observations = array![[3.0, 4.0], [1.0, 3.0], [25.0, 15.0]];
        let mut dists = Array1::zeros(observations.nrows());

        update_min_dists(&centroids, &observations, &mut dists);
        assert_abs_diff_eq!(dists, array![18.0, 5.0, 250.0]);
    }

    #[test]
    fn compute_centroids_works() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let cluster_size = 100;
        let n_features = 4;

        // two clusters with known means
        let cluster_1: Array2<f64> = Array::random_using(
            (cluster_size, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );
        let memberships_1 = Array1::zeros(cluster_size);
        let expected_centroid_1 = cluster_1.sum_axis(Axis(0)) / cluster_size as f64;

        let cluster_2: Array2<f64> = Array::random_using(
            (cluster_size, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );
        let memberships_2 = Array1::ones(cluster_size);
        let expected_centroid_2 = cluster_2.sum_axis(Axis(0)) / cluster_size as f64;

        let observations = concatenate(Axis(0), &[cluster_1.view(), cluster_2.view()]).unwrap();
        let memberships =
            concatenate(Axis(0), &[memberships_1.view(), memberships_2.view()]).unwrap();

        let old_centroids = Array2::zeros((2, n_features));
        let centroids = compute_centroids(&old_centroids, &observations, &memberships);
        assert_abs_diff_eq!(centroids.row(0), expected_centroid_1, epsilon = 1e-5);
        assert_abs_diff_eq!(centroids.row(1), expected_centroid_2, epsilon = 1e-5);
        assert_eq!(centroids.nrows(), 2);
    }

    #[test]
    fn empty_cluster_keeps_previous_centroid() {
        let observations = array![[1.0, 2.0]];
        let memberships = array![0];
        let old_centroids = array![[0.0, 0.0], [7.0, 7.0]];
        let centroids = compute_centroids(&old_centroids, &observations, &memberships);
        assert_abs_diff_eq!(centroids, array![[1.0, 2.0], [7.0, 7.0]]);
    }

    #[test]
    fn nothing_is_closer_than_self() {
        let n_centroids = 20;
        let n_features = 5;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let centroids: Array2<f64> = Array::random_using(
            (n_centroids, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );

        let expected_memberships = (0..n_centroids).collect::<Array1<_>>();
        assert_eq!(calc_memberships!(centroids, centroids), expected_memberships);
    }

    #[test]
    fn incidents_join_the_nearest_hotspot() {
        let centroids = array![[0., 0.], [1., 2.], [20., 0.], [0., 20.],];
        let observations = array![[1., 0.6], [20., 2.], [20., 0.], [7., 20.],];

        assert_eq!(
            calc_memberships!(centroids, observations),
            array![0, 2, 2, 3]
        );
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let centroids = array![[0., 0.], [2., 0.]];
        assert_eq!(closest_centroid(&centroids, &array![1., 0.]), (0, 1.));
    }

    #[test]
    fn separated_blobs_are_recovered() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let blob = |center: f64, rng: &mut Xoshiro256Plus| {
            Array::random_using((30, 2), Uniform::new(-0.5, 0.5), rng) + center
        };
        let a = blob(0., &mut rng);
        let b = blob(10., &mut rng);
        let c = blob(20., &mut rng);
        let data = concatenate(Axis(0), &[a.view(), b.view(), c.view()]).unwrap();

        for init in &[KMeansInit::Random, KMeansInit::KMeansPlusPlus] {
            let model = KMeans::params(3)
                .init_method(init.clone())
                .fit(&Dataset::from(data.clone()))
                .unwrap();
            let memberships = model.predict(&data);

            for chunk in memberships.as_slice().unwrap().chunks(30) {
                assert!(chunk.iter().all(|&m| m == chunk[0]));
            }
            assert_eq!(model.cluster_count(), &array![30., 30., 30.]);

            let single: usize = model.predict(&data.row(45));
            assert_eq!(single, memberships[45]);
        }
    }

    #[test]
    fn more_runs_never_increase_inertia() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let data: Array2<f64> = Array::random_using((100, 2), Uniform::new(0., 1.), &mut rng);
        let dataset = Dataset::from(data);

        let single = KMeans::params(4)
            .init_method(KMeansInit::Random)
            .n_runs(1)
            .fit(&dataset)
            .unwrap();
        let many = KMeans::params(4)
            .init_method(KMeansInit::Random)
            .n_runs(10)
            .fit(&dataset)
            .unwrap();

        // the first of the ten runs is the single run
        assert!(many.inertia() <= single.inertia());
    }

    #[test]
    fn same_seed_same_centroids() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let data: Array2<f64> = Array::random_using((60, 2), Uniform::new(0., 1.), &mut rng);
        let dataset = Dataset::from(data);

        let first = KMeans::params(3).fit(&dataset).unwrap();
        let second = KMeans::params(3).fit(&dataset).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn hitting_max_iterations_is_not_an_error() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let data: Array2<f64> = Array::random_using((50, 2), Uniform::new(0., 1.), &mut rng);

        let model = KMeans::params(5)
            .max_n_iterations(1)
            .n_runs(1)
            .fit(&Dataset::from(data));
        assert!(model.is_ok());
    }

    #[test]
    fn too_many_clusters() {
        let data = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(3).fit(&Dataset::from(data));
        assert!(matches!(
            res,
            Err(KMeansError::TooManyClusters {
                n_clusters: 3,
                n_samples: 2
            })
        ));
    }

    #[test]
    fn precomputed_feature_mismatch() {
        let data = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(1)
            .init_method(KMeansInit::Precomputed(array![[0., 0., 0.]]))
            .fit(&Dataset::from(data));
        assert!(matches!(
            res,
            Err(KMeansError::FeatureMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn clusterer_labels_every_observation() {
        let data = array![[0., 0.], [0.1, 0.], [5., 5.], [5.1, 5.]];
        let clustering = KMeans::params(2).cluster(data.view()).unwrap();

        assert_eq!(clustering.n_clusters(), 2);
        assert_eq!(clustering.memberships.len(), 4);
        assert_eq!(clustering.memberships[0], clustering.memberships[1]);
        assert_eq!(clustering.memberships[2], clustering.memberships[3]);
        assert_ne!(clustering.memberships[0], clustering.memberships[2]);
    }

    #[test]
    fn clusterer_checks_params() {
        let data = array![[0., 0.]];
        let res = KMeans::params(0).cluster(data.view());
        assert!(matches!(
            res,
            Err(KMeansError::InvalidParams(KMeansParamsError::NClusters))
        ));
    }
}
