//!
//! # Risk classification
//!
//! `safecity-risk` predicts how dangerous a place is at a given hour. It answers in two steps:
//!
//! 1. a [random forest](RandomForestClassifier) of [CART trees](DecisionTree) predicts the most
//!    likely crime type from `[latitude, longitude, hour]`;
//! 2. a [rule table](RiskRules) turns the crime type into a [`RiskTier`](safecity::RiskTier).
//!    Violent crimes are always HIGH, thefts and accidents are MEDIUM unless fewer than three
//!    historical incidents happened within 0.01 degrees of the query, everything else is LOW.
//!
//! The forest is trained once with [`train`] and persisted together with its
//! [crime-type mapping](CrimeTypeMapping) through an [`ArtifactStore`]. Queries are served by a
//! [`RiskPredictor`], which never trains implicitly.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use safecity::{Incident, IncidentTable, RiskTier};
//! use safecity_risk::{train, ArtifactStore, RiskPredictor};
//!
//! let incidents = Arc::new(IncidentTable::new(vec![
//!     Incident::new("1", 40.75, -73.98, "Robbery", 22),
//!     Incident::new("2", 40.65, -73.95, "Theft", 14),
//! ])?);
//!
//! let dir = tempfile::tempdir()?;
//! let store = ArtifactStore::new(dir.path().join("classifier.json"));
//! store.save(&train(&incidents)?)?;
//!
//! let predictor: RiskPredictor = RiskPredictor::open(&store, incidents)?;
//! assert_eq!(predictor.predict_risk(40.75, -73.98, 22)?, RiskTier::High);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod artifact;
mod decision_trees;
mod error;
mod mapping;
mod predictor;
mod random_forest;
mod rules;
mod train;

pub use artifact::*;
pub use decision_trees::*;
pub use error::{Result, RiskError};
pub use mapping::CrimeTypeMapping;
pub use predictor::*;
pub use random_forest::*;
pub use rules::*;
pub use train::*;
