//! Error types in SafeCity
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Missing, malformed or empty incident data
    #[error("invalid data: {0}")]
    Data(String),
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("not enough samples to fit a model")]
    NotEnoughSamples,
}
