use crate::core::collector::ResultCollector;
use crate::domain::model::{
    CompleteEvaluationDto, CompletedUserEvaluation, EvaluationResults, GroupedUserEvaluations,
    Phase,
};
use crate::domain::ports::EvaluationApi;
use crate::session::Session;
use crate::utils::error::{AppError, Result};

/// Holds the patient's evaluation list and completes evaluations against
/// the backend.
///
/// The local list is only ever replaced by a fresh copy from the server.
/// A failed submission leaves it untouched and is never retried here.
pub struct EvaluationService<A: EvaluationApi> {
    api: A,
    evaluations: Option<GroupedUserEvaluations>,
    last_error: Option<String>,
}

impl<A: EvaluationApi> EvaluationService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            evaluations: None,
            last_error: None,
        }
    }

    pub fn evaluations(&self) -> Option<&GroupedUserEvaluations> {
        self.evaluations.as_ref()
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn refresh(&mut self, session: &Session) -> Result<&GroupedUserEvaluations> {
        let token = session.bearer()?;
        tracing::debug!("Fetching user evaluations");

        match self.api.list_user_evaluations(token).await {
            Ok(grouped) => {
                tracing::info!(
                    pre = grouped.pre_plan.len(),
                    post = grouped.post_plan.len(),
                    "Loaded evaluations"
                );
                self.last_error = None;
                Ok(self.evaluations.insert(grouped))
            }
            Err(e) => {
                tracing::warn!("Failed to load evaluations: {}", e);
                self.last_error = Some(e.user_friendly_message());
                Err(e)
            }
        }
    }

    /// Sends one completed evaluation. On success the list is refetched so
    /// callers see the server's "completed" state; a failed refetch is
    /// logged and does not turn the submission into an error.
    pub async fn submit(
        &mut self,
        session: &Session,
        evaluation_id: &str,
        phase: Phase,
        results: EvaluationResults,
    ) -> Result<CompletedUserEvaluation> {
        if evaluation_id.trim().is_empty() {
            return Err(AppError::validation("Falta el identificador de la evaluación."));
        }
        let token = session.bearer()?;

        let dto = CompleteEvaluationDto {
            evaluation_id: evaluation_id.to_string(),
            phase,
            results,
        };

        tracing::info!(
            evaluation_id = %dto.evaluation_id,
            phase = %dto.phase,
            keys = dto.results.len(),
            "Submitting evaluation results"
        );

        let completed = match self.api.complete_evaluation(token, &dto).await {
            Ok(completed) => completed,
            Err(e) => {
                tracing::error!("Evaluation submission failed: {}", e);
                self.last_error = Some(e.user_friendly_message());
                return Err(e);
            }
        };
        self.last_error = None;

        if let Err(e) = self.refresh(session).await {
            tracing::warn!("Submitted, but refreshing the list failed: {}", e);
        }

        Ok(completed)
    }

    /// Submits whatever the collector holds, provided its form is complete.
    pub async fn submit_collected(
        &mut self,
        session: &Session,
        evaluation_id: &str,
        phase: Phase,
        collector: &ResultCollector,
    ) -> Result<CompletedUserEvaluation> {
        let results = collector.build_results()?;
        self.submit(session, evaluation_id, phase, results).await
    }
}
