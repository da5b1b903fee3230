use log::debug;
use ndarray::{Array1, Array2};
use safecity::prelude::*;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::zone::{classify_night_ratio, night_crime_ratio, patrol_intensity, zone_color};
use crate::{KMeans, KMeansError};

/// Groups the incidents into `n_clusters` geographic hotspots
///
/// Runs k-means with the default, fixed-seed hyperparameters over the `(latitude, longitude)`
/// coordinates of every incident. Calling it twice with the same table and `n_clusters` returns
/// the same hotspots.
///
/// Fails with an invalid parameter error when `n_clusters` is zero or exceeds the number of
/// incidents.
pub fn cluster(incidents: &IncidentTable, n_clusters: usize) -> Result<Hotspots<'_>, KMeansError> {
    cluster_with(incidents, &KMeans::params(n_clusters))
}

/// Groups the incidents with any clustering algorithm
pub fn cluster_with<'a, C: Clusterer<f64>>(
    incidents: &'a IncidentTable,
    clusterer: &C,
) -> Result<Hotspots<'a>, C::Error> {
    let Clustering {
        memberships,
        centroids,
    } = clusterer.cluster(incidents.coordinates().view())?;
    debug!(
        "partitioned {} incidents into {} hotspots",
        incidents.len(),
        centroids.nrows()
    );

    Ok(Hotspots {
        incidents,
        memberships,
        centroids,
    })
}

/// Geographic center of a hotspot
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterCenter {
    pub latitude: f64,
    pub longitude: f64,
}

/// Everything a map layer needs to draw one hotspot
#[cfg_attr(
    feature = "serde",
    derive(Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct HotspotSummary {
    pub cluster_id: usize,
    pub center: ClusterCenter,
    /// Number of incidents in the hotspot
    pub size: usize,
    /// Fraction of the incidents that happened between 20:00 and 05:59
    pub night_ratio: f64,
    pub risk: RiskTier,
    pub color: &'static str,
    pub patrol: &'static str,
}

/// Incidents partitioned into hotspots
///
/// Borrows the incident table, the cluster of incident `i` is `memberships()[i]`.
#[derive(Clone, Debug)]
pub struct Hotspots<'a> {
    incidents: &'a IncidentTable,
    memberships: Array1<usize>,
    centroids: Array2<f64>,
}

impl<'a> Hotspots<'a> {
    pub fn incidents(&self) -> &'a IncidentTable {
        self.incidents
    }

    /// Every incident paired with its cluster id, in table order
    pub fn labeled(&self) -> impl Iterator<Item = (&'a Incident, usize)> + '_ {
        self.incidents.iter().zip(self.memberships.iter().copied())
    }

    pub fn memberships(&self) -> &Array1<usize> {
        &self.memberships
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Cluster centers as `(n_clusters, 2)` latitude/longitude rows
    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    pub fn centers(&self) -> Vec<ClusterCenter> {
        self.centroids
            .rows()
            .into_iter()
            .map(|row| ClusterCenter {
                latitude: row[0],
                longitude: row[1],
            })
            .collect()
    }

    /// Incidents assigned to `cluster`
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = &'a Incident> + '_ {
        self.labeled()
            .filter(move |&(_, c)| c == cluster)
            .map(|(incident, _)| incident)
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters()];
        for &c in self.memberships.iter() {
            sizes[c] += 1;
        }
        sizes
    }

    /// Night-crime ratio of `cluster`, zero for an empty cluster
    pub fn night_crime_ratio(&self, cluster: usize) -> f64 {
        night_crime_ratio(self.members(cluster).map(|incident| incident.hour))
    }

    pub fn risk(&self, cluster: usize) -> RiskTier {
        classify_night_ratio(self.night_crime_ratio(cluster))
    }

    /// One summary per cluster, ordered by cluster id
    pub fn summaries(&self) -> Vec<HotspotSummary> {
        let sizes = self.cluster_sizes();
        self.centers()
            .into_iter()
            .zip(sizes)
            .enumerate()
            .map(|(cluster_id, (center, size))| {
                let night_ratio = self.night_crime_ratio(cluster_id);
                let risk = classify_night_ratio(night_ratio);
                HotspotSummary {
                    cluster_id,
                    center,
                    size,
                    night_ratio,
                    risk,
                    color: zone_color(risk),
                    patrol: patrol_intensity(risk),
                }
            })
            .collect()
    }
}
