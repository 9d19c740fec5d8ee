//! Error types for generation failures and configuration validation.

use thiserror::Error;

/// Errors raised while generating values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A constrained generator exhausted its retry budget.
    #[error("gave up after {retries} retries at size {size}: {reason}")]
    GaveUp {
        reason: String,
        retries: usize,
        size: usize,
    },

    /// `ranged` was called with `hi < lo`.
    #[error("invalid range [{lo}, {hi})")]
    InvalidRange { lo: String, hi: String },

    /// A domain error raised from inside a user generator. This is the kind
    /// that `rescue` handlers can intercept and replace with a value.
    #[error("{0}")]
    Domain(String),
}

impl GenerationError {
    /// Raise a domain error from a user generator.
    pub fn domain(message: impl Into<String>) -> Self {
        GenerationError::Domain(message.into())
    }

    pub(crate) fn gave_up(reason: impl Into<String>, retries: usize, size: usize) -> Self {
        GenerationError::GaveUp {
            reason: reason.into(),
            retries,
            size,
        }
    }

    pub(crate) fn invalid_range(lo: impl ToString, hi: impl ToString) -> Self {
        GenerationError::InvalidRange {
            lo: lo.to_string(),
            hi: hi.to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid number of trials (must be > 0).
    #[error("invalid trial count: {0} (must be > 0)")]
    InvalidTrials(usize),

    /// Invalid shrink-step limit (must be > 0).
    #[error("invalid shrink limit: {0} (must be > 0)")]
    InvalidShrinkLimit(usize),
}
