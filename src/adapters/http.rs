use crate::domain::model::{
    AuthSession, CompleteEvaluationDto, CompletedUserEvaluation, GroupedUserEvaluations,
    SessionProfile, SignInDto,
};
use crate::domain::ports::{AuthApi, ConfigProvider, EvaluationApi};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

pub mod endpoints {
    pub const SIGNIN: &str = "/api/v1/auth/signin";
    pub const SESSION: &str = "/api/v1/auth/session";
    pub const EVALUATIONS_USER_LIST: &str = "/api/v1/evaluation/user";
    pub const EVALUATIONS_COMPLETE: &str = "/api/v1/evaluation/complete";
}

/// Which call failed. Each one has its own wording for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    SignIn,
    FetchSession,
    ListEvaluations,
    CompleteEvaluation,
}

impl ApiOperation {
    pub fn failure_message(self, status: Option<StatusCode>) -> &'static str {
        match self {
            ApiOperation::SignIn => match status.map(|s| s.as_u16()) {
                Some(400) => "Solicitud inválida. Revisa tus datos.",
                Some(401) => "Correo o contraseña incorrectos.",
                Some(403) => "No tienes permiso para acceder.",
                Some(404) => "Usuario no encontrado.",
                Some(500) => "Error inesperado. Intenta nuevamente.",
                _ => "No se pudo iniciar sesión.",
            },
            ApiOperation::FetchSession => "No se pudo verificar tu sesión.",
            ApiOperation::ListEvaluations => "No se pudieron obtener tus evaluaciones.",
            ApiOperation::CompleteEvaluation => "No se pudo completar la evaluación.",
        }
    }
}

/// reqwest-backed client for the rehabilitation backend.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        crate::utils::validation::validate_url("api.base_url", base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.timeout_seconds()),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: ApiOperation,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(?operation, "Request failed before a response: {}", e);
            e
        })?;
        let response = Self::check_status(operation, response).await?;
        let status = response.status();
        let body = response.bytes().await?;

        // undecodable 2xx bodies surface as the operation failure
        serde_json::from_slice::<T>(&body).map_err(|e| {
            tracing::error!(?operation, %status, "Unexpected response body: {}", e);
            AppError::ApiError {
                status: status.as_u16(),
                message: operation.failure_message(Some(status)).to_string(),
            }
        })
    }

    async fn check_status(operation: ApiOperation, response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!(?operation, %status, "API response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(?operation, %status, body = %body, "API error");
        Err(AppError::ApiError {
            status: status.as_u16(),
            message: operation.failure_message(Some(status)).to_string(),
        })
    }
}

#[async_trait]
impl EvaluationApi for HttpApiClient {
    async fn list_user_evaluations(&self, token: &str) -> Result<GroupedUserEvaluations> {
        let request = self
            .client
            .get(self.url(endpoints::EVALUATIONS_USER_LIST))
            .bearer_auth(token);
        self.send(ApiOperation::ListEvaluations, request).await
    }

    async fn complete_evaluation(
        &self,
        token: &str,
        dto: &CompleteEvaluationDto,
    ) -> Result<CompletedUserEvaluation> {
        let request = self
            .client
            .post(self.url(endpoints::EVALUATIONS_COMPLETE))
            .bearer_auth(token)
            .json(dto);
        self.send(ApiOperation::CompleteEvaluation, request).await
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn sign_in(&self, credentials: &SignInDto) -> Result<AuthSession> {
        let request = self.client.post(self.url(endpoints::SIGNIN)).json(credentials);
        self.send(ApiOperation::SignIn, request).await
    }

    async fn fetch_session_profile(&self, token: &str) -> Result<SessionProfile> {
        let request = self
            .client
            .get(self.url(endpoints::SESSION))
            .bearer_auth(token);
        self.send(ApiOperation::FetchSession, request).await
    }
}
