use log::info;

use safecity::{dataset::FEATURE_NAMES, prelude::*};

use crate::artifact::ClassifierArtifact;
use crate::error::Result;
use crate::{CrimeTypeMapping, RandomForestParams};

/// Trains the default forest, see [`train_with`]
pub fn train(incidents: &IncidentTable) -> Result<ClassifierArtifact> {
    train_with(incidents, RandomForestParams::default())
}

/// Trains a random forest predicting the crime type from `[latitude, longitude, hour]`
///
/// The returned artifact owns the crime-type mapping built from `incidents`, codes being
/// assigned in first-seen order.
pub fn train_with(
    incidents: &IncidentTable,
    params: RandomForestParams<f64>,
) -> Result<ClassifierArtifact> {
    let mapping = CrimeTypeMapping::fit(incidents.crime_types());
    let codes = incidents
        .crime_types()
        .map(|label| {
            mapping
                .encode(label)
                .ok_or_else(|| Error::Data(format!("crime type {} was not mapped", label)))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let dataset = Dataset::new(incidents.features(), codes.into())
        .with_feature_names(FEATURE_NAMES.to_vec());
    let model = params.fit(&dataset)?;
    info!(
        "trained {} trees on {} incidents of {} crime types",
        model.n_trees(),
        dataset.nsamples(),
        mapping.len()
    );

    ClassifierArtifact::new(mapping, model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incidents() -> IncidentTable {
        IncidentTable::new(vec![
            Incident::new("1", 40.75, -73.98, "Robbery", 22),
            Incident::new("2", 40.76, -73.99, "Robbery", 23),
            Incident::new("3", 40.65, -73.95, "Theft", 14),
            Incident::new("4", 40.66, -73.94, "Theft", 11),
            Incident::new("5", 40.55, -74.10, "Vandalism", 3),
        ])
        .unwrap()
    }

    #[test]
    fn training_builds_mapping_in_first_seen_order() -> Result<()> {
        let artifact = train_with(&incidents(), RandomForestParams::new(10))?;

        assert_eq!(
            artifact.mapping().labels(),
            &["Robbery", "Theft", "Vandalism"]
        );
        assert_eq!(artifact.model().n_classes(), 3);
        assert_eq!(artifact.model().n_features(), 3);
        assert_eq!(artifact.model().n_trees(), 10);

        Ok(())
    }

    #[test]
    fn default_training_uses_the_default_forest() -> Result<()> {
        let artifact = train(&incidents())?;
        assert_eq!(artifact.model().n_trees(), crate::DEFAULT_N_TREES);
        Ok(())
    }

    #[test]
    fn invalid_params_are_reported() {
        let res = train_with(&incidents(), RandomForestParams::new(0));
        assert!(matches!(
            res,
            Err(crate::RiskError::Safecity(Error::Parameters(_)))
        ));
    }
}
