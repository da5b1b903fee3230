use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("tolerance must be greater than 0")]
    Tolerance,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
    #[error("precomputed centroids must have shape ({0}, n_features)")]
    PrecomputedShape(usize),
}

/// An error when modeling a KMeans algorithm
#[derive(Error, Debug)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When more clusters are requested than there are observations
    #[error("Invalid hyperparameter: cannot find {n_clusters} clusters in {n_samples} observations")]
    TooManyClusters { n_clusters: usize, n_samples: usize },
    /// When precomputed centroids do not match the dimensionality of the observations
    #[error("Precomputed centroids have {found} features, observations have {expected}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error(transparent)]
    SafecityError(#[from] safecity::error::Error),
}

impl KMeansError {
    /// True for every error caused by the requested hyperparameters rather than the data
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            KMeansError::InvalidParams(_)
                | KMeansError::TooManyClusters { .. }
                | KMeansError::SafecityError(safecity::error::Error::Parameters(_))
        )
    }
}
