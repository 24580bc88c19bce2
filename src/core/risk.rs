//! Lymphedema screening bands for arm-volume asymmetry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Differences up to and including this value are normal.
pub const NORMAL_MAX_ML: f64 = 150.0;

/// Differences above [`NORMAL_MAX_ML`] and up to this value call for a
/// check-up; anything larger is urgent.
pub const MONITOR_MAX_ML: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Normal,
    Monitor,
    Urgent,
}

impl RiskBand {
    /// Maps a left/right volume difference in millilitres to its band.
    /// Each boundary belongs to the lower band. NaN falls through to
    /// `Urgent`.
    pub fn classify(difference_ml: f64) -> Self {
        if difference_ml <= NORMAL_MAX_ML {
            RiskBand::Normal
        } else if difference_ml <= MONITOR_MAX_ML {
            RiskBand::Monitor
        } else {
            RiskBand::Urgent
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RiskBand::Normal => "Normalidad",
            RiskBand::Monitor => "Se sugiere consultar con kinesiólogo",
            RiskBand::Urgent => "Consultar de forma precoz con kinesiólogo",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RiskBand::Normal => "0-150 ml: normalidad",
            RiskBand::Monitor => ">150 ml: se sugiere consultar con kinesiólogo",
            RiskBand::Urgent => ">200 ml: consultar de forma precoz con kinesiólogo",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskBand::Normal => "normal",
            RiskBand::Monitor => "monitor",
            RiskBand::Urgent => "urgent",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
