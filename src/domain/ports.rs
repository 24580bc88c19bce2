use crate::domain::model::{
    AuthSession, CompleteEvaluationDto, CompletedUserEvaluation, GroupedUserEvaluations,
    SessionProfile, SignInDto,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Persistence for the single session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn save(&self, token: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn clear(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn token_path(&self) -> &str;
    fn segment_length_cm(&self) -> Option<f64>;
}

/// Remote evaluation backend. Every call carries the bearer token passed
/// in by the caller.
#[async_trait]
pub trait EvaluationApi: Send + Sync {
    async fn list_user_evaluations(&self, token: &str) -> Result<GroupedUserEvaluations>;
    async fn complete_evaluation(
        &self,
        token: &str,
        dto: &CompleteEvaluationDto,
    ) -> Result<CompletedUserEvaluation>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, credentials: &SignInDto) -> Result<AuthSession>;
    async fn fetch_session_profile(&self, token: &str) -> Result<SessionProfile>;
}
