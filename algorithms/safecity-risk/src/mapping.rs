//! Bidirectional mapping between crime-type labels and the integer codes a classifier predicts
use std::collections::HashMap;

use serde_crate::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Crime-type labels and their dense integer codes
///
/// Codes are assigned in the order labels are first seen, starting at zero. The mapping is
/// persisted as the ordered list of labels, so decoding after a reload yields exactly the labels
/// the classifier was trained with.
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", from = "Vec<String>", into = "Vec<String>")]
#[derive(Clone, Debug, Default)]
pub struct CrimeTypeMapping {
    labels: Vec<String>,
    codes: HashMap<String, usize>,
}

impl CrimeTypeMapping {
    /// Builds the mapping of every distinct label, in first-seen order
    pub fn fit<'a, I: IntoIterator<Item = &'a str>>(labels: I) -> Self {
        let mut mapping = CrimeTypeMapping::default();
        for label in labels {
            mapping.insert(label);
        }
        mapping
    }

    /// Returns the code of `label`, assigning the next free code to unseen labels
    fn insert(&mut self, label: &str) -> usize {
        if let Some(&code) = self.codes.get(label) {
            return code;
        }
        let code = self.labels.len();
        self.labels.push(label.to_string());
        self.codes.insert(label.to_string(), code);
        code
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.codes.get(label).copied()
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.labels
            .get(code)
            .map(String::as_str)
            .ok_or(RiskError::UnknownCode(code))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels ordered by code
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl PartialEq for CrimeTypeMapping {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl From<Vec<String>> for CrimeTypeMapping {
    fn from(labels: Vec<String>) -> Self {
        CrimeTypeMapping::fit(labels.iter().map(String::as_str))
    }
}

impl From<CrimeTypeMapping> for Vec<String> {
    fn from(mapping: CrimeTypeMapping) -> Self {
        mapping.labels
    }
}
