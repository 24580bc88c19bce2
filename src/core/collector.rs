//! Result collection, one strategy per evaluation type.
//!
//! A collector owns the in-progress form for a single evaluation attempt.
//! It knows when the form is complete and turns it into the result map the
//! backend expects.

use crate::core::arm_volume::{ArmSide, ArmVolumeEstimator, ArmVolumeReport, MeasurementSet};
use crate::core::input::{is_filled, normalize_decimal_input};
use crate::core::timer::CountdownTimer;
use crate::domain::model::{Evaluation, EvaluationResults, EvaluationType};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::validate_required_field;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum ResultCollector {
    /// Timed test: the countdown must run out, then one numeric entry per
    /// expected result key.
    Time {
        timer: CountdownTimer,
        expected: BTreeMap<String, String>,
        inputs: BTreeMap<String, String>,
    },
    /// Range of motion: one option picked for every expected key. The
    /// stored value is the option label.
    MovementRange {
        expected: BTreeMap<String, String>,
        selections: BTreeMap<String, String>,
    },
    /// Twelve circumferences, submitted as derived volumes.
    ArmMeasurement {
        estimator: ArmVolumeEstimator,
        inputs: BTreeMap<String, String>,
    },
}

impl ResultCollector {
    /// Picks the strategy for the evaluation's type. Arm measurements need
    /// an estimator, which in turn needs the configured segment length.
    pub fn for_evaluation(
        evaluation: &Evaluation,
        estimator: Option<ArmVolumeEstimator>,
    ) -> Result<Self> {
        let collector = match evaluation.evaluation_type {
            EvaluationType::Time => ResultCollector::Time {
                timer: CountdownTimer::new(evaluation.seconds, true),
                expected: evaluation.expected_results.clone(),
                inputs: evaluation
                    .expected_results
                    .keys()
                    .map(|k| (k.clone(), String::new()))
                    .collect(),
            },
            EvaluationType::MovementRange => ResultCollector::MovementRange {
                expected: evaluation.expected_results.clone(),
                selections: BTreeMap::new(),
            },
            EvaluationType::ArmMeasurement => {
                let estimator =
                    *validate_required_field("arm_volume.segment_length_cm", &estimator)?;
                ResultCollector::ArmMeasurement {
                    estimator,
                    inputs: ArmSide::all_field_keys()
                        .into_iter()
                        .map(|k| (k, String::new()))
                        .collect(),
                }
            }
        };
        Ok(collector)
    }

    pub fn evaluation_type(&self) -> EvaluationType {
        match self {
            ResultCollector::Time { .. } => EvaluationType::Time,
            ResultCollector::MovementRange { .. } => EvaluationType::MovementRange,
            ResultCollector::ArmMeasurement { .. } => EvaluationType::ArmMeasurement,
        }
    }

    /// Keys the form asks for, in display order.
    pub fn required_keys(&self) -> Vec<String> {
        match self {
            ResultCollector::Time { expected, .. }
            | ResultCollector::MovementRange { expected, .. } => {
                expected.keys().cloned().collect()
            }
            ResultCollector::ArmMeasurement { .. } => ArmSide::all_field_keys(),
        }
    }

    /// Records a typed value. Numeric fields are normalised on entry; for
    /// range of motion the key is the chosen option and the value is
    /// ignored.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        match self {
            ResultCollector::Time {
                expected, inputs, ..
            } => {
                if !expected.contains_key(key) {
                    return Err(unknown_key(key));
                }
                inputs.insert(key.to_string(), normalize_decimal_input(raw));
            }
            ResultCollector::MovementRange {
                expected,
                selections,
            } => {
                let label = expected.get(key).ok_or_else(|| unknown_key(key))?;
                selections.insert(key.to_string(), label.clone());
            }
            ResultCollector::ArmMeasurement { inputs, .. } => {
                let slot = inputs.get_mut(key).ok_or_else(|| unknown_key(key))?;
                *slot = normalize_decimal_input(raw);
            }
        }
        Ok(())
    }

    pub fn timer_mut(&mut self) -> Option<&mut CountdownTimer> {
        match self {
            ResultCollector::Time { timer, .. } => Some(timer),
            _ => None,
        }
    }

    /// Whether the submit action is available.
    pub fn is_ready(&self) -> bool {
        match self {
            ResultCollector::Time {
                timer,
                expected,
                inputs,
            } => {
                timer.is_finished() && expected.keys().all(|k| is_filled(inputs.get(k)))
            }
            ResultCollector::MovementRange {
                expected,
                selections,
            } => expected.keys().all(|k| is_filled(selections.get(k))),
            ResultCollector::ArmMeasurement { inputs, .. } => {
                ArmSide::all_field_keys()
                    .iter()
                    .all(|k| is_filled(inputs.get(k)))
            }
        }
    }

    /// The arm-volume estimate, once all twelve fields hold valid numbers.
    pub fn arm_report(&self) -> Option<ArmVolumeReport> {
        match self {
            ResultCollector::ArmMeasurement { estimator, inputs } => MeasurementSet::from_inputs(inputs)
                .ok()
                .map(|set| estimator.estimate(&set)),
            _ => None,
        }
    }

    /// Produces the payload results, or explains why the form cannot be
    /// submitted yet.
    pub fn build_results(&self) -> Result<EvaluationResults> {
        if !self.is_ready() {
            return Err(AppError::validation(self.pending_reason()));
        }

        match self {
            ResultCollector::Time {
                expected, inputs, ..
            } => Ok(expected
                .keys()
                .map(|k| (k.clone(), inputs[k].trim().to_string()))
                .collect()),
            ResultCollector::MovementRange { selections, .. } => Ok(selections.clone()),
            ResultCollector::ArmMeasurement { estimator, inputs } => {
                let set = MeasurementSet::from_inputs(inputs)?;
                Ok(estimator.estimate(&set).to_results())
            }
        }
    }

    fn pending_reason(&self) -> String {
        match self {
            ResultCollector::Time { timer, .. } => {
                if !timer.is_finished() {
                    "El tiempo de la evaluación aún no ha terminado.".to_string()
                } else {
                    "Ingresa todos los valores solicitados.".to_string()
                }
            }
            ResultCollector::MovementRange { .. } => {
                "Selecciona una opción para cada resultado.".to_string()
            }
            ResultCollector::ArmMeasurement { .. } => {
                "Ingresa las medidas de los 12 puntos.".to_string()
            }
        }
    }
}

fn unknown_key(key: &str) -> AppError {
    AppError::validation(format!("Campo desconocido: {}", key))
}
