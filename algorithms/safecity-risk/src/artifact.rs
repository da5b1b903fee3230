//! Persisted classifiers
//!
//! A trained classifier is only meaningful together with the crime-type mapping it was trained
//! with, so both are stored as a single JSON document and always loaded together.
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_crate::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;

use safecity::{dataset::FEATURE_NAMES, traits::Classifier};

use crate::error::{Result, RiskError};
use crate::{CrimeTypeMapping, RandomForestClassifier};

/// Version of the on-disk layout written by [`ArtifactStore::save`]
pub const FORMAT_VERSION: u32 = 1;

/// A fitted classifier bundled with everything needed to interpret its output
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierArtifact<C = RandomForestClassifier<f64>> {
    format_version: u32,
    feature_names: Vec<String>,
    mapping: CrimeTypeMapping,
    model: C,
}

impl<C: Classifier<f64>> ClassifierArtifact<C> {
    /// Bundles a model trained on `[latitude, longitude, hour]` records with its mapping
    pub fn new(mapping: CrimeTypeMapping, model: C) -> Result<Self> {
        let artifact = ClassifierArtifact {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|name| name.to_string()).collect(),
            mapping,
            model,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(RiskError::Artifact(format!(
                "format version {} is not supported, expected {}",
                self.format_version, FORMAT_VERSION
            )));
        }
        if self.feature_names.len() != self.model.n_features() {
            return Err(RiskError::Artifact(format!(
                "model expects {} features but {} feature names are stored",
                self.model.n_features(),
                self.feature_names.len()
            )));
        }
        if self.model.n_classes() > self.mapping.len() {
            return Err(RiskError::Artifact(format!(
                "model predicts {} classes but the mapping only knows {}",
                self.model.n_classes(),
                self.mapping.len()
            )));
        }
        Ok(())
    }
}

impl<C> ClassifierArtifact<C> {
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn mapping(&self) -> &CrimeTypeMapping {
        &self.mapping
    }

    pub fn model(&self) -> &C {
        &self.model
    }
}

/// Location of a persisted [`ClassifierArtifact`]
///
/// Saving writes a uniquely named temporary file next to the artifact and renames it over the
/// artifact, so readers see either the previous artifact or the new one. Concurrent saves do not
/// share a temporary file, the last rename wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ArtifactStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persists `artifact`, replacing any previous one
    pub fn save<C: Serialize>(&self, artifact: &ClassifierArtifact<C>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // a uniquely named sibling, removed on drop unless persisted
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, artifact)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        info!("saved classifier artifact to {}", self.path.display());
        Ok(())
    }

    /// Loads the persisted artifact
    ///
    /// Fails with [`RiskError::ArtifactNotFound`] when nothing has been saved yet, training is
    /// never triggered implicitly.
    pub fn load<C>(&self) -> Result<ClassifierArtifact<C>>
    where
        C: DeserializeOwned + Classifier<f64>,
    {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RiskError::ArtifactNotFound(self.path.clone()))
            }
            Err(err) => return Err(err.into()),
        };

        // trees nest one JSON object per level, deeper than the default limit allows
        let mut de = serde_json::Deserializer::from_reader(BufReader::new(file));
        de.disable_recursion_limit();
        let artifact = ClassifierArtifact::<C>::deserialize(&mut de)?;
        de.end()?;

        artifact.validate()?;
        debug!(
            "loaded classifier artifact with {} crime types from {}",
            artifact.mapping.len(),
            self.path.display()
        );
        Ok(artifact)
    }
}
