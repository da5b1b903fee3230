use crate::KMeansParamsError;

use super::init::KMeansInit;
use rand::Rng;
use safecity::{Float, ParamGuard};

/// Seed used by [`KMeans::params`](crate::KMeans::params), so repeated runs on the same
/// incidents produce the same hotspots.
pub const DEFAULT_SEED: u64 = 42;
/// Restarts from fresh initial centroids, the lowest-inertia restart is kept
pub const DEFAULT_N_RUNS: usize = 10;
/// Iteration cap of a single restart
pub const DEFAULT_MAX_N_ITERATIONS: u64 = 300;
/// Squared centroid shift below which a restart has converged. Coordinates are degrees, one
/// metre is roughly 1e-5, so the default only stops once the centroids have settled.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Checked settings for locating hotspots with [k-means](crate::KMeans)
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansValidParams<F: Float, R: Rng> {
    n_clusters: usize,
    n_runs: usize,
    tolerance: F,
    max_n_iterations: u64,
    init: KMeansInit<F>,
    rng: R,
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// Number of hotspots
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn init_method(&self) -> &KMeansInit<F> {
        &self.init
    }

    /// Generator every fit starts from, cloned so that fitting twice gives the same result
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// Unchecked k-means settings
///
/// Built by [`KMeans::params`](crate::KMeans::params) with the `DEFAULT_*` constants of this
/// crate, then adjusted through the setters:
///
/// ```
/// use safecity::ParamGuard;
/// use safecity_hotspots::{KMeans, KMeansInit, KMeansParamsError};
///
/// let params = KMeans::<f64>::params(4).n_runs(3).init_method(KMeansInit::Random);
/// assert_eq!(params.check_ref().unwrap().n_runs(), 3);
///
/// let none = KMeans::<f64>::params(0).check();
/// assert!(matches!(none, Err(KMeansParamsError::NClusters)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansParams<F: Float, R: Rng>(KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    /// Looks for `n_clusters` hotspots, drawing initial centroids from `rng`
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(KMeansValidParams {
            n_clusters,
            n_runs: DEFAULT_N_RUNS,
            tolerance: F::cast(DEFAULT_TOLERANCE),
            max_n_iterations: DEFAULT_MAX_N_ITERATIONS,
            init: KMeansInit::KMeansPlusPlus,
            rng,
        })
    }

    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    pub fn init_method(mut self, init: KMeansInit<F>) -> Self {
        self.0.init = init;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let params = &self.0;
        if params.n_clusters == 0 {
            return Err(KMeansParamsError::NClusters);
        }
        if params.n_runs == 0 {
            return Err(KMeansParamsError::NRuns);
        }
        if params.tolerance.is_nan() || params.tolerance <= F::zero() {
            return Err(KMeansParamsError::Tolerance);
        }
        if params.max_n_iterations == 0 {
            return Err(KMeansParamsError::MaxIterations);
        }
        match &params.init {
            KMeansInit::Precomputed(centroids) if centroids.nrows() != params.n_clusters => {
                Err(KMeansParamsError::PrecomputedShape(params.n_clusters))
            }
            _ => Ok(params),
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KMeans;
    use ndarray::array;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<KMeansParams<f64, Xoshiro256Plus>>();
        has_autotraits::<KMeansValidParams<f64, Xoshiro256Plus>>();
    }

    #[test]
    fn defaults() {
        let params = KMeans::<f64>::params(3).check().unwrap();
        assert_eq!(params.n_clusters(), 3);
        assert_eq!(params.n_runs(), DEFAULT_N_RUNS);
        assert_eq!(params.max_n_iterations(), DEFAULT_MAX_N_ITERATIONS);
        assert_eq!(params.tolerance(), DEFAULT_TOLERANCE);
        assert_eq!(params.init_method(), &KMeansInit::KMeansPlusPlus);
    }

    #[test]
    fn zero_hotspots_are_rejected() {
        let res = KMeans::<f32>::params(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NClusters)))
    }

    #[test]
    fn tolerance_must_be_positive() {
        for &tolerance in &[-1., 0., f64::NAN] {
            let res = KMeans::params(1).tolerance(tolerance).check();
            assert!(matches!(res, Err(KMeansParamsError::Tolerance)))
        }
    }

    #[test]
    fn iteration_and_run_counts_must_be_positive() {
        let res = KMeans::<f64>::params(1).max_n_iterations(0).check();
        assert!(matches!(res, Err(KMeansParamsError::MaxIterations)));

        let res = KMeans::<f64>::params(1).n_runs(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NRuns)))
    }

    #[test]
    fn hotspot_count_is_checked_first() {
        let res = KMeans::<f64>::params(0).n_runs(0).tolerance(0.).check();
        assert!(matches!(res, Err(KMeansParamsError::NClusters)))
    }

    #[test]
    fn precomputed_needs_one_row_per_hotspot() {
        let res = KMeans::params(3)
            .init_method(KMeansInit::Precomputed(array![[40.7, -74.0], [40.8, -73.9]]))
            .check();
        assert!(matches!(res, Err(KMeansParamsError::PrecomputedShape(3))))
    }
}
