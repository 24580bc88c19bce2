//! Read-only summary of an evaluation the patient already completed.

use crate::core::arm_volume::{DIFFERENCE_KEY, LEFT_VOLUME_KEY, RIGHT_VOLUME_KEY};
use crate::core::risk::RiskBand;
use crate::domain::model::{EvaluationType, UserEvaluation};
use crate::utils::format::format_display_number;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedView {
    pub name: String,
    pub lines: Vec<ResultLine>,
    /// Only set for stored arm volumes.
    pub risk: Option<RiskBand>,
}

/// Builds the summary from the stored results. `None` while the evaluation
/// is still pending.
///
/// Arm volumes are recognised by the presence of both stored volumes on a
/// non-timed evaluation. Everything else lists each stored key, labelled
/// from `expectedResults` when the evaluation defines one.
pub fn completed_view(user_evaluation: &UserEvaluation) -> Option<CompletedView> {
    if !user_evaluation.completed {
        return None;
    }
    let evaluation = &user_evaluation.evaluation;
    let is_time = evaluation.evaluation_type == EvaluationType::Time;
    let label = |key: &str, fallback: &str| {
        evaluation
            .expected_results
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    };

    let volumes = (
        user_evaluation.numeric_result(LEFT_VOLUME_KEY),
        user_evaluation.numeric_result(RIGHT_VOLUME_KEY),
    );
    if let (false, (Some(left), Some(right))) = (is_time, volumes) {
        let difference = user_evaluation
            .numeric_result(DIFFERENCE_KEY)
            .unwrap_or_else(|| (left - right).abs());
        let ml = |v: f64| format!("{} ml", format_display_number(v, None));

        return Some(CompletedView {
            name: evaluation.name.clone(),
            lines: vec![
                ResultLine {
                    label: label(LEFT_VOLUME_KEY, "Brazo Izquierdo"),
                    value: ml(left),
                },
                ResultLine {
                    label: label(RIGHT_VOLUME_KEY, "Brazo Derecho"),
                    value: ml(right),
                },
                ResultLine {
                    label: label(DIFFERENCE_KEY, "Diferencia"),
                    value: ml(difference),
                },
            ],
            risk: Some(RiskBand::classify(difference)),
        });
    }

    let mut entries: Vec<(&String, &Value)> = user_evaluation
        .results
        .iter()
        .flatten()
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let lines = entries
        .into_iter()
        .map(|(key, value)| ResultLine {
            label: label(key.as_str(), &key.replace('_', " ")),
            value: render_value(value, is_time),
        })
        .collect();

    Some(CompletedView {
        name: evaluation.name.clone(),
        lines,
        risk: None,
    })
}

/// Timed results print as stored. Other numeric results are volumes with
/// one decimal; labels chosen from a list print as they are.
fn render_value(value: &Value, is_time: bool) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if is_time {
        return raw;
    }
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => format!("{:.1} ml", n),
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Evaluation;
    use serde_json::json;
    use std::collections::HashMap;

    fn user_evaluation(
        kind: EvaluationType,
        expected: &[(&str, &str)],
        results: Option<Value>,
    ) -> UserEvaluation {
        UserEvaluation {
            evaluation: Evaluation {
                id: "ev-1".to_string(),
                name: "Evaluación".to_string(),
                description: String::new(),
                how_to_do: String::new(),
                image_url: String::new(),
                logo_url: String::new(),
                video_url: String::new(),
                is_time: kind == EvaluationType::Time,
                evaluation_type: kind,
                seconds: 0,
                order: 1,
                expected_results: expected
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                created_at: None,
                updated_at: None,
            },
            completed: results.is_some(),
            done_at: None,
            results: results.map(|v| {
                serde_json::from_value::<HashMap<String, Value>>(v).unwrap()
            }),
            progress_point: None,
        }
    }

    #[test]
    fn pending_evaluations_have_no_view() {
        let ue = user_evaluation(EvaluationType::Time, &[], None);
        assert!(completed_view(&ue).is_none());
    }

    #[test]
    fn stored_arm_volumes_show_band() {
        let ue = user_evaluation(
            EvaluationType::ArmMeasurement,
            &[("difference", "Diferencia de volumen")],
            Some(json!({
                "leftVolume": "2512.34",
                "rightVolume": 2340,
                "difference": "172.34"
            })),
        );

        let view = completed_view(&ue).unwrap();
        assert_eq!(view.risk, Some(RiskBand::Monitor));
        assert_eq!(view.lines[0].label, "Brazo Izquierdo");
        assert_eq!(view.lines[0].value, "2512,3 ml");
        assert_eq!(view.lines[1].value, "2340 ml");
        assert_eq!(view.lines[2].label, "Diferencia de volumen");
        assert_eq!(view.lines[2].value, "172,3 ml");
    }

    #[test]
    fn missing_difference_is_derived_from_volumes() {
        let ue = user_evaluation(
            EvaluationType::ArmMeasurement,
            &[],
            Some(json!({"leftVolume": "2000", "rightVolume": "2250"})),
        );
        let view = completed_view(&ue).unwrap();
        assert_eq!(view.risk, Some(RiskBand::Urgent));
        assert_eq!(view.lines[2].value, "250 ml");
    }

    #[test]
    fn other_types_list_stored_results() {
        let timed = user_evaluation(
            EvaluationType::Time,
            &[("reps", "Repeticiones")],
            Some(json!({"reps": "12", "extra_note": "ok"})),
        );
        let view = completed_view(&timed).unwrap();
        assert!(view.risk.is_none());
        assert_eq!(
            view.lines,
            vec![
                ResultLine {
                    label: "extra note".to_string(),
                    value: "ok".to_string(),
                },
                ResultLine {
                    label: "Repeticiones".to_string(),
                    value: "12".to_string(),
                },
            ]
        );

        let range = user_evaluation(
            EvaluationType::MovementRange,
            &[("full", "Completo")],
            Some(json!({"full": "Completo"})),
        );
        let view = completed_view(&range).unwrap();
        assert_eq!(view.lines[0].value, "Completo");
    }
}
