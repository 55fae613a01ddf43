use thiserror::Error;

pub const EMPTY_PROMPT: &str = "Please enter a prompt first.";
pub const MISSING_BASE_IMAGE: &str = "Upload a base image before generating.";
pub const MISSING_RENDER: &str = "Generate a full render before requesting extra views.";
pub const GENERIC_FAILURE: &str = "Generation failed. Please try again.";

/// Which rate-limit tier rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    Global,
    PerClient,
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(&'static str),
    /// The endpoint refused the request with a rate-limit code.
    #[error("{message}")]
    RateLimited { scope: LimitScope, retry_after_secs: Option<u64>, message: String },
    /// Network failure or a non-OK response without a rate-limit code.
    #[error("{0}")]
    Request(String),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited { .. })
    }
}
