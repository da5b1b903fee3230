//! Night-time risk zoning of a cluster
//!
//! A hotspot is considered dangerous when most of its incidents happen at night. The ratio of
//! night-time incidents is thresholded into a [`RiskTier`], which in turn fixes the colour of the
//! zone on a map and how often it should be patrolled.

use safecity::RiskTier;

/// First hour (inclusive) counted as night
pub const NIGHT_START_HOUR: u8 = 20;
/// Last hour (inclusive) counted as night
pub const NIGHT_END_HOUR: u8 = 5;
/// Night ratios strictly above this are [`RiskTier::High`]
pub const HIGH_NIGHT_RATIO: f64 = 0.6;
/// Night ratios strictly above this are at least [`RiskTier::Medium`]
pub const MEDIUM_NIGHT_RATIO: f64 = 0.35;

/// Whether `hour` falls between 20:00 and 05:59
pub fn is_night_hour(hour: u8) -> bool {
    hour >= NIGHT_START_HOUR || hour <= NIGHT_END_HOUR
}

/// Fraction of `hours` that are night hours
///
/// The denominator is floored at one, so an empty cluster has a ratio of zero.
pub fn night_crime_ratio<I: IntoIterator<Item = u8>>(hours: I) -> f64 {
    let (night, total) = hours.into_iter().fold((0usize, 0usize), |(night, total), hour| {
        (night + is_night_hour(hour) as usize, total + 1)
    });

    night as f64 / total.max(1) as f64
}

/// Maps a night-crime ratio onto a tier, both thresholds are exclusive
pub fn classify_night_ratio(ratio: f64) -> RiskTier {
    if ratio > HIGH_NIGHT_RATIO {
        RiskTier::High
    } else if ratio > MEDIUM_NIGHT_RATIO {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Patrol intensity assigned to a hotspot of the given tier
pub fn patrol_intensity(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "3 patrols/hour",
        RiskTier::Medium => "1–2 patrols/hour",
        RiskTier::Low => "passive monitoring",
    }
}

/// Map colour of a hotspot of the given tier
pub fn zone_color(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => "red",
        RiskTier::Medium => "yellow",
        RiskTier::Low => "green",
    }
}
