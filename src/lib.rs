//! `safecity` is the core of a small predictive-policing toolkit: it clusters historical
//! crime incidents into geographic hotspots and classifies the expected risk at an
//! arbitrary location and hour.
//!
//! ## The big picture
//!
//! The workspace is split the same way the analysis is:
//!
//! * this crate holds the shared vocabulary: the validated [`IncidentTable`], the
//!   [`RiskTier`] scale, the [`Dataset`] container handed to learning algorithms, the
//!   hyperparameter [`ParamGuard`] and the [`Fit`](traits::Fit)/[`Predict`](traits::Predict)
//!   traits;
//! * `safecity-hotspots` runs k-means over incident coordinates and turns every cluster
//!   into a hotspot with a night-time risk tier and a patrol intensity;
//! * `safecity-risk` trains a random forest that predicts a crime type from location and
//!   hour, persists it together with its crime-type mapping, and maps predictions onto a
//!   risk tier through a rule table refined by local incident density;
//! * `safecity-datasets` loads incident tables from CSV and generates synthetic cities for
//!   tests and benchmarks.
//!
//! Both statistical engines sit behind the [`Clusterer`](traits::Clusterer) and
//! [`Classifier`](traits::Classifier) capabilities, so either one can be swapped without
//! touching the surrounding pipeline.
//!

pub mod dataset;
pub mod error;
mod param_guard;
pub mod prelude;
pub mod risk;
pub mod traits;

pub use dataset::{Dataset, Float, Incident, IncidentTable};
pub use param_guard::ParamGuard;
pub use risk::RiskTier;
