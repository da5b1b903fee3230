//! Utility functions for randomly generating incident tables

use ndarray_rand::{
    rand::Rng,
    rand_distr::{Distribution, Normal},
};
use safecity::error::{Error, Result};
use safecity::{Incident, IncidentTable};

/// Hours counted as night-time by the hotspot zoning
pub const NIGHT_HOURS: [u8; 10] = [20, 21, 22, 23, 0, 1, 2, 3, 4, 5];

/// A neighbourhood profile for [`district_incidents`]
#[derive(Clone, Debug)]
pub struct District<'a> {
    /// Latitude and longitude the incidents are scattered around
    pub center: (f64, f64),
    /// Standard deviation of the scatter, in degrees
    pub spread: f64,
    /// Crime types drawn uniformly for every incident
    pub crime_types: &'a [&'a str],
    /// Probability that an incident happens at night
    pub night_share: f64,
}

/// Generates `per_district` incidents for every district, numbered from 1 in district order
pub fn district_incidents(
    districts: &[District],
    per_district: usize,
    rng: &mut impl Rng,
) -> Result<IncidentTable> {
    let mut incidents = Vec::with_capacity(districts.len() * per_district);

    for district in districts {
        if district.crime_types.is_empty() {
            return Err(Error::Parameters(
                "a district needs at least one crime type".to_string(),
            ));
        }
        let noise = normal(district.spread)?;
        let night_share = district.night_share.max(0.0).min(1.0);

        for _ in 0..per_district {
            let latitude = district.center.0 + noise.sample(rng);
            let longitude = district.center.1 + noise.sample(rng);
            let crime_type = district.crime_types[rng.gen_range(0..district.crime_types.len())];
            let hour = if rng.gen_bool(night_share) {
                NIGHT_HOURS[rng.gen_range(0..NIGHT_HOURS.len())]
            } else {
                rng.gen_range(6..20)
            };

            let id = (incidents.len() + 1).to_string();
            incidents.push(Incident::new(id, latitude, longitude, crime_type, hour));
        }
    }

    IncidentTable::new(incidents)
}

/// A three-district city with a violent nightlife area, a busy market and a quiet suburb
pub fn city(per_district: usize, rng: &mut impl Rng) -> Result<IncidentTable> {
    district_incidents(
        &[
            District {
                center: (40.758, -73.985),
                spread: 0.003,
                crime_types: &["Robbery", "Assault"],
                night_share: 0.9,
            },
            District {
                center: (40.715, -74.002),
                spread: 0.003,
                crime_types: &["Theft", "Accident"],
                night_share: 0.45,
            },
            District {
                center: (40.650, -73.950),
                spread: 0.003,
                crime_types: &["Vandalism", "Noise"],
                night_share: 0.1,
            },
        ],
        per_district,
        rng,
    )
}

fn normal(spread: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, spread)
        .map_err(|err| Error::Parameters(format!("invalid spread {}: {}", spread, err)))
}
