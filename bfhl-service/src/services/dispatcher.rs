//! Routes a validated [`BfhlRequest`] to its computation.

use crate::models::{BfhlRequest, FunctionalKey, ResultData};
use crate::services::math::{self, MathError};
use crate::services::providers::{ProviderError, TextProvider};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Instruction appended to every `AI` question.
const ONE_WORD_SUFFIX: &str = ". Answer in exactly one word.";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{key}: {source}")]
    Math {
        key: FunctionalKey,
        #[source]
        source: MathError,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("computation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Math { .. } => AppError::ValidationError(err.to_string()),
            DispatchError::Provider(e) => AppError::InternalError(anyhow::Error::new(e)),
            DispatchError::Task(e) => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}

/// Executes requests. Holds the text provider injected at startup.
#[derive(Clone)]
pub struct Dispatcher {
    text_provider: Arc<dyn TextProvider>,
    provider_timeout: Duration,
}

impl Dispatcher {
    pub fn new(text_provider: Arc<dyn TextProvider>, provider_timeout: Duration) -> Self {
        Self {
            text_provider,
            provider_timeout,
        }
    }

    pub fn text_provider(&self) -> &Arc<dyn TextProvider> {
        &self.text_provider
    }

    #[tracing::instrument(skip_all, fields(key = %request.key()))]
    pub async fn dispatch(&self, request: BfhlRequest) -> Result<ResultData, DispatchError> {
        match request {
            BfhlRequest::Ai(question) => self.one_word_answer(&question).await.map(ResultData::Word),
            // Trial division is CPU-bound; keep it off the async workers.
            numeric => {
                let key = numeric.key();
                tokio::task::spawn_blocking(move || compute(numeric))
                    .await?
                    .map_err(|source| DispatchError::Math { key, source })
            }
        }
    }

    async fn one_word_answer(&self, question: &str) -> Result<String, DispatchError> {
        let prompt = format!("{}{}", question, ONE_WORD_SUFFIX);

        let response =
            tokio::time::timeout(self.provider_timeout, self.text_provider.generate(&prompt))
                .await
                .map_err(|_| ProviderError::Timeout(self.provider_timeout))??;

        tracing::debug!(
            model = %self.text_provider.model(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Provider answered"
        );

        Ok(first_word(&response.text))
    }
}

/// Runs a numeric request synchronously. `AI` never reaches here.
fn compute(request: BfhlRequest) -> Result<ResultData, MathError> {
    match request {
        BfhlRequest::Fibonacci(n) => math::fibonacci(n).map(ResultData::Sequence),
        BfhlRequest::Prime(values) => Ok(ResultData::Sequence(math::filter_primes(&values))),
        BfhlRequest::Lcm(values) => math::lcm_of(&values).map(ResultData::Number),
        BfhlRequest::Hcf(values) => math::hcf_of(&values).map(ResultData::Number),
        BfhlRequest::Ai(_) => Ok(ResultData::Word(String::new())),
    }
}

/// First whitespace-delimited token, keeping only word characters
/// (ASCII alphanumerics and `_`).
pub fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::MockTextProvider;

    fn dispatcher(provider: MockTextProvider) -> Dispatcher {
        Dispatcher::new(Arc::new(provider), Duration::from_secs(5))
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word("  Paris.\nIt is the capital"), "Paris");
        assert_eq!(first_word("**Mumbai**"), "Mumbai");
        assert_eq!(first_word("snake_case! rest"), "snake_case");
        assert_eq!(first_word("   "), "");
        assert_eq!(first_word("?!"), "");
    }

    #[tokio::test]
    async fn test_dispatch_numeric_keys() {
        let d = dispatcher(MockTextProvider::new(true));

        assert_eq!(
            d.dispatch(BfhlRequest::Fibonacci(5)).await.unwrap(),
            ResultData::Sequence(vec![0, 1, 1, 2, 3])
        );
        assert_eq!(
            d.dispatch(BfhlRequest::Prime(vec![2, 3, 4, 5, 6])).await.unwrap(),
            ResultData::Sequence(vec![2, 3, 5])
        );
        assert_eq!(
            d.dispatch(BfhlRequest::Lcm(vec![4, 6])).await.unwrap(),
            ResultData::Number(12)
        );
        assert_eq!(
            d.dispatch(BfhlRequest::Hcf(vec![12, 18, 24])).await.unwrap(),
            ResultData::Number(6)
        );
    }

    #[tokio::test]
    async fn test_dispatch_ai_uses_first_word_of_reply() {
        let d = dispatcher(MockTextProvider::new(true));
        // The mock echoes "Mock response for: <prompt>".
        assert_eq!(
            d.dispatch(BfhlRequest::Ai("Capital of France?".into())).await.unwrap(),
            ResultData::Word("Mock".to_string())
        );

        let d = dispatcher(MockTextProvider::new(true).with_reply("Paris.\n"));
        assert_eq!(
            d.dispatch(BfhlRequest::Ai("Capital of France?".into())).await.unwrap(),
            ResultData::Word("Paris".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_fold_is_a_validation_error() {
        let d = dispatcher(MockTextProvider::new(true));
        let err = d.dispatch(BfhlRequest::Lcm(vec![])).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Math {
                key: FunctionalKey::Lcm,
                source: MathError::EmptyInput
            }
        ));

        let app_err = AppError::from(err);
        assert!(matches!(app_err, AppError::ValidationError(_)));
        assert_eq!(
            app_err.to_string(),
            "Validation error: lcm: at least one number is required"
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_internal() {
        let d = dispatcher(MockTextProvider::new(false));
        let err = d.dispatch(BfhlRequest::Ai("anything".into())).await.unwrap_err();
        assert!(matches!(err, DispatchError::Provider(ProviderError::NotConfigured(_))));
        assert!(matches!(AppError::from(err), AppError::InternalError(_)));
    }

    #[tokio::test]
    async fn test_provider_timeout() {
        let provider = MockTextProvider::new(true).with_delay(Duration::from_secs(60));
        let d = Dispatcher::new(Arc::new(provider), Duration::from_millis(20));

        let err = d.dispatch(BfhlRequest::Ai("slow?".into())).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Provider(ProviderError::Timeout(t)) if t == Duration::from_millis(20)
        ));
        assert_eq!(err.to_string(), "Provider did not answer within 20ms");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_numeric_work_runs_off_the_runtime() {
        let d = dispatcher(MockTextProvider::new(true));
        // 2^53 - 111, the largest prime a list may carry.
        let big_prime = 9_007_199_254_740_881;
        let work = tokio::spawn(async move { d.dispatch(BfhlRequest::Prime(vec![big_prime])).await });

        // Single-threaded runtime: the timer only fires before the work is
        // done if the trial division runs on another thread.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(!work.is_finished());

        assert_eq!(
            work.await.unwrap().unwrap(),
            ResultData::Sequence(vec![big_prime as u64])
        );
    }
}
