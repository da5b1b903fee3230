//! `safecity-hotspots` finds the places where crime concentrates.
//!
//! ## The big picture
//!
//! Historical incidents are clustered on their `(latitude, longitude)` coordinates with
//! [K-Means](KMeans). Every cluster becomes a hotspot, and the share of its incidents that
//! happened at night decides how dangerous the hotspot is:
//!
//! * night ratio above 0.6: [`RiskTier::High`](safecity::RiskTier::High), drawn red, 3 patrols
//!   per hour;
//! * night ratio above 0.35: [`RiskTier::Medium`](safecity::RiskTier::Medium), drawn yellow,
//!   1 to 2 patrols per hour;
//! * otherwise [`RiskTier::Low`](safecity::RiskTier::Low), drawn green, passive monitoring.
//!
//! [`cluster`] runs the whole pipeline with fixed-seed defaults, [`cluster_with`] accepts any
//! [`Clusterer`](safecity::traits::Clusterer).
//!
//! ```
//! use safecity::{Incident, IncidentTable, RiskTier};
//!
//! let incidents = IncidentTable::new(vec![
//!     Incident::new("1", 40.0, -73.0, "Robbery", 22),
//!     Incident::new("2", 40.001, -73.001, "Robbery", 23),
//!     Incident::new("3", 41.0, -74.0, "Jaywalking", 9),
//! ])?;
//!
//! let hotspots = safecity_hotspots::cluster(&incidents, 2)?;
//! let night = hotspots.memberships()[0];
//! assert_eq!(hotspots.risk(night), RiskTier::High);
//! assert_eq!(hotspots.risk(hotspots.memberships()[2]), RiskTier::Low);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod hotspot;
#[allow(clippy::new_ret_no_self)]
mod k_means;
pub mod zone;

pub use hotspot::*;
pub use k_means::*;

/// Number of hotspots looked for when the caller has no better idea
pub const DEFAULT_N_CLUSTERS: usize = 3;
