//! Historical crime incidents
//!
use ndarray::Array2;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Names of the columns produced by [`IncidentTable::features`]
pub const FEATURE_NAMES: [&str; 3] = ["latitude", "longitude", "hour"];

/// A single reported crime
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Incident {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub crime_type: String,
    /// Hour of day in `[0, 23]`
    pub hour: u8,
}

impl Incident {
    pub fn new<I: Into<String>, C: Into<String>>(
        id: I,
        latitude: f64,
        longitude: f64,
        crime_type: C,
        hour: u8,
    ) -> Self {
        Incident {
            id: id.into(),
            latitude,
            longitude,
            crime_type: crime_type.into(),
            hour,
        }
    }

    /// Returns true if the incident lies within `window` degrees of the given point on both axes
    pub fn is_within(&self, latitude: f64, longitude: f64, window: f64) -> bool {
        (self.latitude - latitude).abs() <= window && (self.longitude - longitude).abs() <= window
    }

    fn validate(&self, row: usize) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(Error::Data(format!(
                "incident {} (row {}) has a non-finite position ({}, {})",
                self.id, row, self.latitude, self.longitude
            )));
        }
        if self.hour > 23 {
            return Err(Error::Data(format!(
                "incident {} (row {}) has hour {} outside of [0, 23]",
                self.id, row, self.hour
            )));
        }
        Ok(())
    }
}

/// The validated, read-only incident table shared by clustering and classification
///
/// A table is never empty and every incident has a finite position and a valid hour. It is
/// loaded once per pipeline run and only read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct IncidentTable {
    incidents: Vec<Incident>,
}

impl IncidentTable {
    /// Validates and wraps `incidents`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Data`] if the list is empty or any incident is malformed.
    pub fn new(incidents: Vec<Incident>) -> Result<Self> {
        if incidents.is_empty() {
            return Err(Error::Data("incident table is empty".to_string()));
        }
        for (row, incident) in incidents.iter().enumerate() {
            incident.validate(row)?;
        }

        Ok(IncidentTable { incidents })
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Incident> {
        self.incidents.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Incident> {
        self.incidents.iter()
    }

    pub fn as_slice(&self) -> &[Incident] {
        &self.incidents
    }

    /// Positions as a matrix with shape `(n_incidents, 2)`: latitude, longitude
    pub fn coordinates(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 2), |(row, col)| {
            let incident = &self.incidents[row];
            if col == 0 {
                incident.latitude
            } else {
                incident.longitude
            }
        })
    }

    /// Classifier features as a matrix with shape `(n_incidents, 3)`, see [`FEATURE_NAMES`]
    pub fn features(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), 3), |(row, col)| {
            let incident = &self.incidents[row];
            match col {
                0 => incident.latitude,
                1 => incident.longitude,
                _ => f64::from(incident.hour),
            }
        })
    }

    /// Number of incidents inside the box of +-`window` degrees around the given point
    pub fn count_within(&self, latitude: f64, longitude: f64, window: f64) -> usize {
        self.incidents
            .iter()
            .filter(|incident| incident.is_within(latitude, longitude, window))
            .count()
    }

    /// Mean latitude and longitude of all incidents
    pub fn mean_position(&self) -> (f64, f64) {
        let n = self.len() as f64;
        let (lat, lon) = self.incidents.iter().fold((0., 0.), |(lat, lon), incident| {
            (lat + incident.latitude, lon + incident.longitude)
        });
        (lat / n, lon / n)
    }

    /// Crime-type label of every incident, in table order
    pub fn crime_types(&self) -> impl Iterator<Item = &str> {
        self.incidents.iter().map(|incident| incident.crime_type.as_str())
    }
}

impl<'a> IntoIterator for &'a IncidentTable {
    type Item = &'a Incident;
    type IntoIter = std::slice::Iter<'a, Incident>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
