//! Point risk queries against a trained classifier
use std::sync::Arc;

use log::trace;
use ndarray::array;
use serde_crate::de::DeserializeOwned;

use safecity::{traits::Classifier, IncidentTable, RiskTier};

use crate::artifact::{ArtifactStore, ClassifierArtifact};
use crate::error::{Result, RiskError};
use crate::rules::{patrol_recommendation, RiskRules, Rule};
use crate::RandomForestClassifier;

/// Everything a single query resolved to
#[derive(Clone, Debug, PartialEq)]
pub struct RiskAssessment {
    /// Crime type the classifier predicted
    pub crime_type: String,
    pub tier: RiskTier,
    /// Historical incidents around the query, only counted for density-refined crime types
    pub local_count: Option<usize>,
    pub recommendation: &'static str,
}

/// Answers risk queries from a loaded classifier and the incident history
///
/// The predictor is immutable after construction, so a single instance can serve concurrent
/// readers. The history is shared through an [`Arc`] and never copied.
#[derive(Clone, Debug)]
pub struct RiskPredictor<C = RandomForestClassifier<f64>> {
    artifact: ClassifierArtifact<C>,
    history: Arc<IncidentTable>,
    rules: RiskRules,
}

impl<C: Classifier<f64>> RiskPredictor<C> {
    pub fn new(artifact: ClassifierArtifact<C>, history: Arc<IncidentTable>) -> Self {
        RiskPredictor {
            artifact,
            history,
            rules: RiskRules::default(),
        }
    }

    /// Loads the persisted classifier
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::ArtifactNotFound`] when the store is empty.
    pub fn open(store: &ArtifactStore, history: Arc<IncidentTable>) -> Result<Self>
    where
        C: DeserializeOwned,
    {
        Ok(Self::new(store.load()?, history))
    }

    pub fn with_rules(mut self, rules: RiskRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn artifact(&self) -> &ClassifierArtifact<C> {
        &self.artifact
    }

    pub fn rules(&self) -> &RiskRules {
        &self.rules
    }

    pub fn history(&self) -> &IncidentTable {
        &self.history
    }

    fn check_query(latitude: f64, longitude: f64, hour: u8) -> Result<()> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(RiskError::InvalidQuery(format!(
                "position ({}, {}) is not finite",
                latitude, longitude
            )));
        }
        if hour > 23 {
            return Err(RiskError::InvalidQuery(format!(
                "hour {} is outside of [0, 23]",
                hour
            )));
        }
        Ok(())
    }

    /// Most likely crime type at the given position and hour
    pub fn predict_crime_type(&self, latitude: f64, longitude: f64, hour: u8) -> Result<&str> {
        Self::check_query(latitude, longitude, hour)?;

        let observation = array![latitude, longitude, f64::from(hour)];
        let code = self.artifact.model().classify(observation.view());
        self.artifact.mapping().decode(code)
    }

    /// Risk tier at the given position and hour
    pub fn predict_risk(&self, latitude: f64, longitude: f64, hour: u8) -> Result<RiskTier> {
        Ok(self.assess(latitude, longitude, hour)?.tier)
    }

    /// Like [`predict_risk`](Self::predict_risk) but keeps the intermediate results
    pub fn assess(&self, latitude: f64, longitude: f64, hour: u8) -> Result<RiskAssessment> {
        let crime_type = self.predict_crime_type(latitude, longitude, hour)?;

        let (tier, local_count) = match self.rules.rule(crime_type) {
            Rule::Fixed(tier) => (tier, None),
            Rule::DensityRefined => {
                let count = self
                    .history
                    .count_within(latitude, longitude, self.rules.window());
                (self.rules.refine(count), Some(count))
            }
        };
        trace!(
            "({}, {}) at {}h: {} -> {} (local count {:?})",
            latitude,
            longitude,
            hour,
            crime_type,
            tier,
            local_count
        );

        Ok(RiskAssessment {
            crime_type: crime_type.to_string(),
            tier,
            local_count,
            recommendation: patrol_recommendation(tier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CrimeTypeMapping;
    use ndarray::ArrayView1;
    use safecity::Incident;

    /// Always predicts the same code
    #[derive(Debug)]
    struct Constant(usize);

    impl Classifier<f64> for Constant {
        fn n_classes(&self) -> usize {
            self.0 + 1
        }

        fn n_features(&self) -> usize {
            3
        }

        fn classify(&self, _observation: ArrayView1<f64>) -> usize {
            self.0
        }
    }

    fn predictor(code: usize) -> RiskPredictor<Constant> {
        let mapping = CrimeTypeMapping::fit(vec!["Robbery", "Theft", "Vandalism"]);
        let history = IncidentTable::new(vec![
            Incident::new("1", 40.700, -74.000, "Theft", 13),
            Incident::new("2", 40.705, -74.005, "Theft", 14),
            Incident::new("3", 40.709, -73.991, "Theft", 15),
            Incident::new("4", 41.000, -73.000, "Theft", 16),
        ])
        .unwrap();
        let artifact = ClassifierArtifact::new(mapping, Constant(code)).unwrap();
        RiskPredictor::new(artifact, Arc::new(history))
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<RiskPredictor>();
        has_autotraits::<RiskAssessment>();
    }

    #[test]
    fn fixed_rule_skips_density() {
        let assessment = predictor(0).assess(0., 0., 2).unwrap();
        assert_eq!(assessment.crime_type, "Robbery");
        assert_eq!(assessment.tier, RiskTier::High);
        assert_eq!(assessment.local_count, None);
        assert_eq!(assessment.recommendation, "High patrol frequency needed");
    }

    #[test]
    fn dense_neighbourhood_stays_medium() {
        let assessment = predictor(1).assess(40.7, -74.0, 14).unwrap();
        assert_eq!(assessment.local_count, Some(3));
        assert_eq!(assessment.tier, RiskTier::Medium);
    }

    #[test]
    fn sparse_neighbourhood_is_low() {
        let predictor = predictor(1);
        assert_eq!(predictor.predict_risk(41.0, -73.0, 14).unwrap(), RiskTier::Low);
        assert_eq!(predictor.predict_risk(0.0, 0.0, 14).unwrap(), RiskTier::Low);
    }

    #[test]
    fn custom_rules_apply() {
        let predictor = predictor(1).with_rules(RiskRules::default().sparse_threshold(0));
        assert_eq!(predictor.predict_risk(41.0, -73.0, 14).unwrap(), RiskTier::Medium);
    }

    #[test]
    fn unlisted_type_is_low() {
        let assessment = predictor(2).assess(40.7, -74.0, 14).unwrap();
        assert_eq!(assessment.crime_type, "Vandalism");
        assert_eq!(assessment.tier, RiskTier::Low);
        assert_eq!(assessment.recommendation, "Routine patrol sufficient");
    }

    #[test]
    fn invalid_queries_are_rejected() {
        let predictor = predictor(0);
        assert!(matches!(
            predictor.predict_risk(40.7, -74.0, 24),
            Err(RiskError::InvalidQuery(_))
        ));
        assert!(matches!(
            predictor.predict_risk(f64::NAN, -74.0, 3),
            Err(RiskError::InvalidQuery(_))
        ));
        assert!(matches!(
            predictor.predict_risk(40.7, f64::INFINITY, 3),
            Err(RiskError::InvalidQuery(_))
        ));
    }

    #[test]
    fn out_of_range_coordinates_are_accepted() {
        assert_eq!(
            predictor(0).predict_risk(123.0, 456.0, 0).unwrap(),
            RiskTier::High
        );
    }
}
