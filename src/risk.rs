//! Risk tiers shared by hotspot zoning and point predictions
//!
use std::convert::TryFrom;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Error;

/// Escalating patrol urgency, ordered `Low < Medium < High`
///
/// Externally a tier is represented by its integer code: 0, 1 and 2 respectively.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[repr(u8)]
pub enum RiskTier {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl RiskTier {
    /// Integer code of the tier
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RiskTier::Low),
            1 => Some(RiskTier::Medium),
            2 => Some(RiskTier::High),
            _ => None,
        }
    }
}

impl From<RiskTier> for u8 {
    fn from(tier: RiskTier) -> u8 {
        tier.code()
    }
}

impl TryFrom<u8> for RiskTier {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Error> {
        RiskTier::from_code(code)
            .ok_or_else(|| Error::Parameters(format!("risk tier code {} is not in [0, 2]", code)))
    }
}
