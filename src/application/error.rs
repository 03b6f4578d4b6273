//! Application-level error taxonomy.
//!
//! Missing items and foreign owners are not errors: every operation returns
//! `Ok(None)` for them, which callers map to a 404-equivalent. Content
//! generation failures never surface here either; they degrade to the
//! fallback manifest inside the builder.

use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller mistake, rejected before any provider call. Non-retryable.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Renderer or publisher collaborator failure; gateway-style, retryable.
    #[error("provider `{provider}` failed: {message}")]
    Provider { provider: String, message: String },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] RepoError),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Distinguishes provider failures from caller mistakes for transport
    /// layers that map them to 502 vs 400.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}
