use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Result keys mapped to the string values entered or derived for them.
pub type EvaluationResults = BTreeMap<String, String>;

/// The backend sends `null` for unset optional columns. Treats it like an
/// absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treatment stage. Gates which evaluations a patient sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Pre,
    Post,
}

impl Phase {
    pub fn title(self) -> &'static str {
        match self {
            Phase::Pre => "Mi plan Pre - Cirugía",
            Phase::Post => "Mi plan Post - Cirugía",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre" | "pre_plan" => Ok(Phase::Pre),
            "post" | "post_plan" => Ok(Phase::Post),
            other => Err(format!("unknown phase '{}', expected 'pre' or 'post'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationType {
    Time,
    MovementRange,
    ArmMeasurement,
}

impl EvaluationType {
    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationType::Time => "time",
            EvaluationType::MovementRange => "movement_range",
            EvaluationType::ArmMeasurement => "arm_measurement",
        }
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub how_to_do: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub logo_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_time: bool,
    #[serde(rename = "type")]
    pub evaluation_type: EvaluationType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seconds: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_results: BTreeMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEvaluation {
    pub evaluation: Evaluation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default)]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub progress_point: Option<String>,
}

impl UserEvaluation {
    /// Reads a stored result as a number. The backend may store either a
    /// JSON number or a numeric string.
    pub fn numeric_result(&self, key: &str) -> Option<f64> {
        match self.results.as_ref()?.get(key)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedUserEvaluations {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pre_plan: Vec<UserEvaluation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub post_plan: Vec<UserEvaluation>,
}

impl GroupedUserEvaluations {
    pub fn for_phase(&self, phase: Phase) -> &[UserEvaluation] {
        match phase {
            Phase::Pre => &self.pre_plan,
            Phase::Post => &self.post_plan,
        }
    }

    pub fn find(&self, phase: Phase, evaluation_id: &str) -> Option<&UserEvaluation> {
        self.for_phase(phase)
            .iter()
            .find(|ue| ue.evaluation.id == evaluation_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEvaluationDto {
    pub evaluation_id: String,
    pub phase: Phase,
    pub results: EvaluationResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedUserEvaluation {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    pub evaluation_id: String,
    #[serde(default)]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Session object as reported by the server. Capability checks are made
/// against this, never against locally decoded token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phase_parses_both_spellings() {
        assert_eq!("pre".parse::<Phase>().unwrap(), Phase::Pre);
        assert_eq!("POST".parse::<Phase>().unwrap(), Phase::Post);
        assert_eq!("post_plan".parse::<Phase>().unwrap(), Phase::Post);
        assert!("during".parse::<Phase>().is_err());
        assert_eq!(Phase::default().title(), "Mi plan Pre - Cirugía");
    }

    #[test]
    fn grouped_evaluations_deserialize_from_backend_shape() {
        let payload = json!({
            "pre_plan": [{
                "evaluation": {
                    "id": "ev-1",
                    "name": "Volumen de brazo",
                    "type": "arm_measurement",
                    "expectedResults": {},
                    "createdAt": "2024-03-01T10:00:00.000Z"
                },
                "completed": true,
                "doneAt": "2024-03-02T10:00:00Z",
                "results": {"difference": "120.50", "leftVolume": 2100}
            }],
            "post_plan": []
        });

        let grouped: GroupedUserEvaluations = serde_json::from_value(payload).unwrap();
        let ue = grouped.find(Phase::Pre, "ev-1").unwrap();
        assert_eq!(ue.evaluation.evaluation_type, EvaluationType::ArmMeasurement);
        assert!(ue.completed);
        assert_eq!(ue.numeric_result("difference"), Some(120.5));
        assert_eq!(ue.numeric_result("leftVolume"), Some(2100.0));
        assert_eq!(ue.numeric_result("rightVolume"), None);
        assert!(grouped.find(Phase::Post, "ev-1").is_none());
    }

    #[test]
    fn null_columns_read_as_defaults() {
        let payload = json!({
            "pre_plan": [{
                "evaluation": {
                    "id": "ev-2",
                    "name": "Flexión de hombro",
                    "type": "time",
                    "description": null,
                    "videoUrl": null,
                    "isTime": null,
                    "seconds": null,
                    "order": null,
                    "expectedResults": null
                },
                "completed": null,
                "doneAt": null,
                "results": null
            }],
            "post_plan": null
        });

        let grouped: GroupedUserEvaluations = serde_json::from_value(payload).unwrap();
        let ue = &grouped.pre_plan[0];
        assert_eq!(ue.evaluation.seconds, 0);
        assert!(ue.evaluation.video_url.is_empty());
        assert!(ue.evaluation.expected_results.is_empty());
        assert!(!ue.completed);
        assert!(grouped.post_plan.is_empty());
    }

    #[test]
    fn complete_dto_uses_camel_case_keys() {
        let mut results = EvaluationResults::new();
        results.insert("difference".to_string(), "0.00".to_string());
        let dto = CompleteEvaluationDto {
            evaluation_id: "ev-9".to_string(),
            phase: Phase::Post,
            results,
        };
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["evaluationId"], "ev-9");
        assert_eq!(value["phase"], "post");
        assert_eq!(value["results"]["difference"], "0.00");
    }
}
