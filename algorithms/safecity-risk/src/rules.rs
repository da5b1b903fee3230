//! Mapping of predicted crime types onto risk tiers
use std::collections::BTreeSet;

use serde_crate::{Deserialize, Serialize};

use safecity::RiskTier;

/// Half-width in degrees of the box counted around a query point
pub const DEFAULT_DENSITY_WINDOW: f64 = 0.01;
/// Local incident counts up to and including this value downgrade a density-refined type to LOW
pub const DEFAULT_SPARSE_THRESHOLD: usize = 2;

/// Crime types that always map onto [`RiskTier::High`]
pub const HIGH_RISK_TYPES: [&str; 3] = ["Robbery", "Assault", "Burglary"];
/// Crime types that map onto [`RiskTier::Medium`] unless the neighbourhood is sparse
pub const DENSITY_REFINED_TYPES: [&str; 2] = ["Theft", "Accident"];

/// How the tier of a crime type is decided
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// The tier does not depend on where the query is
    Fixed(RiskTier),
    /// The tier depends on the number of historical incidents around the query
    DensityRefined,
}

/// Rule table turning a crime-type label into a [`RiskTier`]
///
/// Labels are matched exactly, any label in neither set is LOW.
///
/// ```
/// use safecity::RiskTier;
/// use safecity_risk::{Rule, RiskRules};
///
/// let rules = RiskRules::default().sparse_threshold(0);
/// assert_eq!(rules.rule("Robbery"), Rule::Fixed(RiskTier::High));
/// assert_eq!(rules.rule("Theft"), Rule::DensityRefined);
/// assert_eq!(rules.refine(1), RiskTier::Medium);
/// ```
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", default)]
#[derive(Clone, Debug, PartialEq)]
pub struct RiskRules {
    high: BTreeSet<String>,
    density_refined: BTreeSet<String>,
    density_window: f64,
    sparse_threshold: usize,
}

impl Default for RiskRules {
    fn default() -> Self {
        RiskRules {
            high: HIGH_RISK_TYPES.iter().map(|s| s.to_string()).collect(),
            density_refined: DENSITY_REFINED_TYPES.iter().map(|s| s.to_string()).collect(),
            density_window: DEFAULT_DENSITY_WINDOW,
            sparse_threshold: DEFAULT_SPARSE_THRESHOLD,
        }
    }
}

impl RiskRules {
    /// Replaces the crime types mapped onto HIGH
    pub fn high_risk_types<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.high = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the crime types refined by local density
    pub fn density_refined_types<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.density_refined = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn density_window(mut self, window: f64) -> Self {
        self.density_window = window;
        self
    }

    pub fn sparse_threshold(mut self, threshold: usize) -> Self {
        self.sparse_threshold = threshold;
        self
    }

    pub fn window(&self) -> f64 {
        self.density_window
    }

    pub fn threshold(&self) -> usize {
        self.sparse_threshold
    }

    pub fn rule(&self, crime_type: &str) -> Rule {
        if self.high.contains(crime_type) {
            Rule::Fixed(RiskTier::High)
        } else if self.density_refined.contains(crime_type) {
            Rule::DensityRefined
        } else {
            Rule::Fixed(RiskTier::Low)
        }
    }

    /// Tier of a density-refined crime type given the number of nearby incidents
    pub fn refine(&self, local_count: usize) -> RiskTier {
        if local_count <= self.sparse_threshold {
            RiskTier::Low
        } else {
            RiskTier::Medium
        }
    }
}

/// Patrol advice for a predicted tier
pub fn patrol_recommendation(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "High patrol frequency needed",
        RiskTier::Medium => "Moderate patrol suggested",
        RiskTier::Low => "Routine patrol sufficient",
    }
}
