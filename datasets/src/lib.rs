//! `safecity-datasets` loads incident tables and generates synthetic ones.
//!
//! ## The Big Picture
//!
//! `safecity-datasets` is a crate in the SafeCity workspace. Hotspot clustering and risk
//! classification both consume the same validated [`IncidentTable`]; this crate is where such
//! tables come from.
//!
//! ## Input format
//!
//! Incidents are read from a CSV file with a header row and at least the columns
//! `crime_id` (or `id`), `latitude`, `longitude`, `crime_type` and `hour`. Extra columns are
//! ignored. Any malformed row aborts the whole load with [`Error::Data`]:
//!
//! ```ignore
//! let incidents = safecity_datasets::load_incidents("data/crime_data.csv")?;
//! ```
//!
//! Synthetic cities for tests and benchmarks live in [`generate`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use safecity::error::{Error, Result};
use safecity::{Incident, IncidentTable};
use serde_crate::Deserialize;

pub mod generate;

/// One CSV row, before validation
#[derive(Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct IncidentRow {
    #[serde(alias = "id")]
    crime_id: String,
    latitude: f64,
    longitude: f64,
    crime_type: String,
    hour: u8,
}

impl From<IncidentRow> for Incident {
    fn from(row: IncidentRow) -> Self {
        Incident::new(
            row.crime_id,
            row.latitude,
            row.longitude,
            row.crime_type,
            row.hour,
        )
    }
}

/// Parses CSV incident data from any reader
///
/// # Errors
///
/// Returns [`Error::Data`] if a column is missing, a value cannot be parsed, or the resulting
/// table is empty or invalid.
pub fn incidents_from_reader<R: Read>(reader: R) -> Result<IncidentTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut incidents = Vec::new();
    for (row, record) in reader.deserialize::<IncidentRow>().enumerate() {
        // row numbers are 1-based and exclude the header
        let record = record.map_err(|err| Error::Data(format!("row {}: {}", row + 1, err)))?;
        incidents.push(Incident::from(record));
    }
    log::debug!("Parsed {} incident rows", incidents.len());

    IncidentTable::new(incidents)
}

/// Loads the incident table stored at `path`
///
/// # Errors
///
/// Returns [`Error::Data`] if the file cannot be opened or its content is malformed.
pub fn load_incidents<P: AsRef<Path>>(path: P) -> Result<IncidentTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|err| Error::Data(format!("cannot open {}: {}", path.display(), err)))?;
    let incidents = incidents_from_reader(file)?;
    log::info!("Loaded {} incidents from {}", incidents.len(), path.display());

    Ok(incidents)
}
