use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = RiskError> = std::result::Result<T, E>;

/// An error when training, persisting or querying a risk classifier
#[derive(Error, Debug)]
pub enum RiskError {
    /// No classifier has been persisted at the store location yet
    #[error("no trained classifier found at {0}, train one first")]
    ArtifactNotFound(PathBuf),
    /// The persisted classifier is corrupt or was written by an incompatible version
    #[error("invalid classifier artifact: {0}")]
    Artifact(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Query outside of the domain the classifier was trained on
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// The classifier produced a code the crime-type mapping does not know
    #[error("crime-type code {0} is not part of the mapping")]
    UnknownCode(usize),
    #[error(transparent)]
    Safecity(#[from] safecity::error::Error),
}
