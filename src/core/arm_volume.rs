//! Arm volume from circumference tape measurements.
//!
//! Each arm is measured at six points spaced a fixed distance apart. The
//! limb between two consecutive points is treated as a frustum of a cone
//! whose faces have the measured circumferences, and the five frustums are
//! summed. Centimetres in, millilitres out (1 cm³ = 1 mL).

use crate::core::input::parse_measurement;
use crate::core::risk::RiskBand;
use crate::domain::model::EvaluationResults;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_positive_finite;
use std::collections::BTreeMap;
use std::f64::consts::PI;

pub const POINTS_PER_ARM: usize = 6;
pub const SEGMENTS_PER_ARM: usize = POINTS_PER_ARM - 1;

pub const LEFT_VOLUME_KEY: &str = "leftVolume";
pub const RIGHT_VOLUME_KEY: &str = "rightVolume";
pub const DIFFERENCE_KEY: &str = "difference";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmSide {
    Left,
    Right,
}

impl ArmSide {
    pub const BOTH: [ArmSide; 2] = [ArmSide::Left, ArmSide::Right];

    /// Form key for a 1-based measurement point, e.g. `left_3`.
    pub fn field_key(self, point: usize) -> String {
        let prefix = match self {
            ArmSide::Left => "left",
            ArmSide::Right => "right",
        };
        format!("{}_{}", prefix, point)
    }

    pub fn label(self) -> &'static str {
        match self {
            ArmSide::Left => "Brazo Izquierdo",
            ArmSide::Right => "Brazo Derecho",
        }
    }

    /// All twelve form keys, left arm first.
    pub fn all_field_keys() -> Vec<String> {
        Self::BOTH
            .iter()
            .flat_map(|side| (1..=POINTS_PER_ARM).map(move |p| side.field_key(p)))
            .collect()
    }
}

/// Six circumferences for one arm, ordered from the anatomical start point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmMeasurements([f64; POINTS_PER_ARM]);

impl ArmMeasurements {
    pub fn new(circumferences_cm: [f64; POINTS_PER_ARM]) -> Result<Self> {
        for (idx, c) in circumferences_cm.iter().enumerate() {
            if !c.is_finite() || *c < 0.0 {
                return Err(AppError::InvalidMeasurement {
                    field: format!("point_{}", idx + 1),
                    value: c.to_string(),
                    reason: "circumference must be a non-negative number".to_string(),
                });
            }
        }
        Ok(Self(circumferences_cm))
    }

    pub fn circumferences(&self) -> &[f64; POINTS_PER_ARM] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSet {
    pub left: ArmMeasurements,
    pub right: ArmMeasurements,
}

impl MeasurementSet {
    /// Builds the set from raw form entries keyed `left_1..left_6` and
    /// `right_1..right_6`. Every field must be present and valid.
    pub fn from_inputs(inputs: &BTreeMap<String, String>) -> Result<Self> {
        let read_arm = |side: ArmSide| -> Result<ArmMeasurements> {
            let mut values = [0.0; POINTS_PER_ARM];
            for (idx, slot) in values.iter_mut().enumerate() {
                let key = side.field_key(idx + 1);
                let raw = inputs.get(&key).map(String::as_str).unwrap_or("");
                *slot = parse_measurement(&key, raw)?;
            }
            ArmMeasurements::new(values)
        };

        Ok(Self {
            left: read_arm(ArmSide::Left)?,
            right: read_arm(ArmSide::Right)?,
        })
    }

    pub fn swapped(&self) -> Self {
        Self {
            left: self.right,
            right: self.left,
        }
    }
}

/// Volume of a right circular frustum given the circumferences of its two
/// faces and its height.
pub fn frustum_volume(c1: f64, c2: f64, height: f64) -> f64 {
    let r1 = c1 / (2.0 * PI);
    let r2 = c2 / (2.0 * PI);
    (height / 3.0) * PI * (r1 * r1 + r1 * r2 + r2 * r2)
}

/// Computes arm volumes for a fixed spacing between measurement points.
///
/// The spacing comes from the clinical protocol, so it is injected rather
/// than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmVolumeEstimator {
    segment_length_cm: f64,
}

impl ArmVolumeEstimator {
    pub fn new(segment_length_cm: f64) -> Result<Self> {
        validate_positive_finite("arm_volume.segment_length_cm", segment_length_cm)?;
        Ok(Self { segment_length_cm })
    }

    pub fn segment_length_cm(&self) -> f64 {
        self.segment_length_cm
    }

    /// Length of limb covered by the five segments.
    pub fn modeled_length_cm(&self) -> f64 {
        self.segment_length_cm * SEGMENTS_PER_ARM as f64
    }

    pub fn arm_volume_ml(&self, arm: &ArmMeasurements) -> f64 {
        arm.circumferences()
            .windows(2)
            .map(|pair| frustum_volume(pair[0], pair[1], self.segment_length_cm))
            .sum()
    }

    pub fn estimate(&self, set: &MeasurementSet) -> ArmVolumeReport {
        let left_volume_ml = self.arm_volume_ml(&set.left);
        let right_volume_ml = self.arm_volume_ml(&set.right);
        let report = ArmVolumeReport {
            left_volume_ml,
            right_volume_ml,
            difference_ml: (left_volume_ml - right_volume_ml).abs(),
        };
        tracing::debug!(
            left_ml = report.left_volume_ml,
            right_ml = report.right_volume_ml,
            difference_ml = report.difference_ml,
            "Estimated arm volumes"
        );
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmVolumeReport {
    pub left_volume_ml: f64,
    pub right_volume_ml: f64,
    pub difference_ml: f64,
}

impl ArmVolumeReport {
    pub fn risk(&self) -> RiskBand {
        RiskBand::classify(self.difference_ml)
    }

    /// The three derived values sent to the backend. Raw circumferences are
    /// not part of the payload.
    pub fn to_results(&self) -> EvaluationResults {
        let mut results = EvaluationResults::new();
        results.insert(
            LEFT_VOLUME_KEY.to_string(),
            format!("{:.2}", self.left_volume_ml),
        );
        results.insert(
            RIGHT_VOLUME_KEY.to_string(),
            format!("{:.2}", self.right_volume_ml),
        );
        results.insert(
            DIFFERENCE_KEY.to_string(),
            format!("{:.2}", self.difference_ml),
        );
        results
    }
}
