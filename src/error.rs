//! Error taxonomy for the scoring pipeline.
//!
//! Every failure surfaced by the library maps onto one of these variants so
//! the orchestrator can decide between skip-and-fall-back (per component)
//! and failing the whole request.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Malformed location, unknown crop id, or bad input level.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No map unit, no components, or every horizon fetch failed.
    #[error("no soil data available: {0}")]
    DataUnavailable(String),

    /// A requirement table is missing rows/columns, or a constraint curve
    /// has fewer than 2 points or a non-strictly-increasing x axis.
    #[error("invalid requirement table: {0}")]
    InvalidRequirement(String),

    /// A component ended up with no horizons (after overlay/truncation).
    #[error("component has no horizons")]
    EmptyProfile,

    /// An external service timed out or returned 5xx; already retried.
    #[error("upstream service unavailable: {0}")]
    TransientUpstream(String),

    /// Anything unexpected. Never retried.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ScoringError {
    /// Transient failures are the only ones the retry layer re-issues.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScoringError::TransientUpstream(_))
    }
}

impl From<reqwest::Error> for ScoringError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            ScoringError::TransientUpstream(err.to_string())
        } else {
            ScoringError::Internal(err.to_string())
        }
    }
}

impl From<polars::error::PolarsError> for ScoringError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScoringError::InvalidRequirement(err.to_string())
    }
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        ScoringError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
