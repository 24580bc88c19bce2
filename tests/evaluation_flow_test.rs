use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use httpmock::prelude::*;
use rehab_eval::core::arm_volume::{ArmSide, DIFFERENCE_KEY, LEFT_VOLUME_KEY, RIGHT_VOLUME_KEY};
use rehab_eval::domain::model::Phase;
use rehab_eval::core::completed_view;
use rehab_eval::{
    AppError, ArmVolumeEstimator, EvaluationService, FileTokenStore, HttpApiClient,
    ResultCollector, RiskBand, SessionManager,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

fn token_with(payload: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

fn valid_token() -> String {
    token_with(json!({
        "sub": "user-1",
        "exp": chrono::Utc::now().timestamp() + 3600,
        "email": "ana@example.com",
        "user_metadata": {"fullName": "Ana Pérez"}
    }))
}

fn evaluation_list(completed: bool) -> serde_json::Value {
    json!({
        "pre_plan": [{
            "evaluation": {
                "id": "arm-1",
                "name": "Volumen de brazo",
                "type": "arm_measurement",
                "order": 3
            },
            "completed": completed
        }],
        "post_plan": []
    })
}

/// Login, list, measure, submit, and the refetch that follows.
#[tokio::test]
async fn test_arm_measurement_flow_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start_async().await;

    let store = FileTokenStore::new(temp_dir.path().join("session/auth_token"));
    let mut manager = SessionManager::init(store.clone()).await?;
    assert!(!manager.is_authenticated());
    let token = valid_token();
    manager.login(token.clone()).await?;

    // a new process picks the token up from disk
    let manager = SessionManager::init(store).await?;
    let session = manager.require()?;
    assert_eq!(session.display_name(), Some("Ana Pérez"));

    let list_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/evaluation/user")
                .header("authorization", format!("Bearer {}", token));
            then.status(200).json_body(evaluation_list(false));
        })
        .await;

    let client = HttpApiClient::new(&server.base_url(), Duration::from_secs(5))?;
    let mut service = EvaluationService::new(client);
    let evaluation = service
        .refresh(session)
        .await?
        .find(Phase::Pre, "arm-1")
        .map(|ue| ue.evaluation.clone())
        .expect("arm evaluation listed");

    let estimator = ArmVolumeEstimator::new(4.0)?;
    let mut collector = ResultCollector::for_evaluation(&evaluation, Some(estimator))?;
    let left = ["31", "29,5", "27", "25", "23", "21"];
    let right = ["30", "28", "26", "24", "22", "20"];
    for (side, values) in ArmSide::BOTH.into_iter().zip([left, right]) {
        for (idx, raw) in values.iter().enumerate() {
            collector.set_value(&side.field_key(idx + 1), raw)?;
        }
    }
    assert!(collector.is_ready());

    let report = collector.arm_report().expect("all twelve fields valid");
    assert!(report.left_volume_ml > report.right_volume_ml);
    assert_eq!(report.risk(), RiskBand::classify(report.difference_ml));

    let expected = collector.build_results()?;
    assert_eq!(expected.len(), 3);
    assert_eq!(expected[LEFT_VOLUME_KEY], format!("{:.2}", report.left_volume_ml));
    assert_eq!(expected[RIGHT_VOLUME_KEY], format!("{:.2}", report.right_volume_ml));
    assert_eq!(expected[DIFFERENCE_KEY], format!("{:.2}", report.difference_ml));

    let complete_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/evaluation/complete")
                .json_body(json!({
                    "evaluationId": "arm-1",
                    "phase": "pre",
                    "results": expected
                }));
            then.status(201).json_body(json!({
                "id": "ue-1",
                "userId": "user-1",
                "evaluationId": "arm-1",
                "results": {}
            }));
        })
        .await;

    let completed = service
        .submit_collected(session, "arm-1", Phase::Pre, &collector)
        .await?;

    assert_eq!(completed.evaluation_id, "arm-1");
    complete_mock.assert_async().await;
    // initial load plus the refetch after completing
    list_mock.assert_hits_async(2).await;
    assert!(service.last_error().is_none());

    Ok(())
}

#[tokio::test]
async fn test_failed_submission_is_reported_once() -> Result<()> {
    let server = MockServer::start_async().await;
    let token = valid_token();

    let list_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/evaluation/user");
            then.status(200).json_body(evaluation_list(false));
        })
        .await;
    let complete_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/evaluation/complete");
            then.status(503);
        })
        .await;

    let session = rehab_eval::Session::new(token);
    let mut service = EvaluationService::new(HttpApiClient::new(
        &server.base_url(),
        Duration::from_secs(5),
    )?);
    service.refresh(&session).await?;

    let results = [("leftVolume".to_string(), "1000.00".to_string())]
        .into_iter()
        .collect();
    let err = service
        .submit(&session, "arm-1", Phase::Pre, results)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ApiError { status: 503, .. }));
    assert_eq!(
        service.last_error(),
        Some("No se pudo completar la evaluación.")
    );
    complete_mock.assert_hits_async(1).await;
    list_mock.assert_hits_async(1).await;
    assert!(!service.evaluations().unwrap().pre_plan[0].completed);

    Ok(())
}

#[tokio::test]
async fn test_completed_evaluation_shows_stored_volumes() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/evaluation/user");
            then.status(200).json_body(json!({
                "pre_plan": [{
                    "evaluation": {
                        "id": "arm-1",
                        "name": "Volumen de brazo",
                        "type": "arm_measurement",
                        "expectedResults": null
                    },
                    "completed": true,
                    "results": {
                        "leftVolume": "2512.34",
                        "rightVolume": "2300.00",
                        "difference": "212.34"
                    }
                }],
                "post_plan": null
            }));
        })
        .await;

    let session = rehab_eval::Session::new(valid_token());
    let mut service = EvaluationService::new(HttpApiClient::new(
        &server.base_url(),
        Duration::from_secs(5),
    )?);
    let grouped = service.refresh(&session).await?;
    let listed = grouped.find(Phase::Pre, "arm-1").expect("listed");

    let view = completed_view(listed).expect("completed");
    assert_eq!(view.risk, Some(RiskBand::Urgent));
    let values: Vec<&str> = view.lines.iter().map(|l| l.value.as_str()).collect();
    assert_eq!(values, ["2512,3 ml", "2300 ml", "212,3 ml"]);
    assert!(grouped.post_plan.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_expired_session_makes_no_requests() -> Result<()> {
    let server = MockServer::start_async().await;
    let list_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/evaluation/user");
            then.status(200).json_body(evaluation_list(false));
        })
        .await;

    let session = rehab_eval::Session::new(token_with(json!({"sub": "user-1", "exp": 1_000})));
    let mut service = EvaluationService::new(HttpApiClient::new(
        &server.base_url(),
        Duration::from_secs(5),
    )?);

    let err = service.refresh(&session).await.unwrap_err();
    assert!(matches!(err, AppError::SessionError { .. }));
    list_mock.assert_hits_async(0).await;

    Ok(())
}

#[tokio::test]
async fn test_logout_removes_stored_token() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("auth_token");

    let mut manager = SessionManager::init(FileTokenStore::new(&path)).await?;
    manager.login(valid_token()).await?;
    assert!(path.exists());

    manager.logout().await?;
    assert!(!path.exists());
    assert!(!manager.is_authenticated());

    let restored = SessionManager::init(FileTokenStore::new(&path)).await?;
    assert!(restored.current().is_none());

    Ok(())
}
