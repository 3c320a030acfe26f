use solalm_llm::LlmError;
use solalm_store::StoreError;
use thiserror::Error;

use crate::amount::AmountError;

/// Failure of one donation pipeline run. Either variant means nothing was
/// recorded.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch a Bible verse. The AI may be resting.")]
    FragmentFetch(#[source] LlmError),
    #[error("Failed to generate an image. The AI artist might be on a break.")]
    ImageGeneration(#[source] LlmError),
}

impl PipelineError {
    /// The underlying provider error.
    pub fn provider_error(&self) -> &LlmError {
        match self {
            PipelineError::FragmentFetch(err) | PipelineError::ImageGeneration(err) => err,
        }
    }

    /// Whether re-invoking the pipeline has a reasonable chance to succeed.
    pub fn retryable(&self) -> bool {
        self.provider_error().retryable()
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("donation not recorded: {0}")]
    Amount(#[from] AmountError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}
