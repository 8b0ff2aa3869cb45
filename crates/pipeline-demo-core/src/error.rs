//! Shared error type across pipeline-demo crates.

use thiserror::Error;

/// Stable error codes surfaced in JSON error bodies and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration file or environment override is invalid.
    BadConfig,
    /// Metric or label name, or histogram layout, is invalid.
    InvalidMetric,
    /// Two collectors claim the same metric family name.
    DuplicateMetric,
    /// Wrong number of label values for an instrument.
    LabelCardinality,
    /// Exposition text could not be produced.
    Encode,
    /// Internal server error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::InvalidMetric => "INVALID_METRIC",
            ErrorCode::DuplicateMetric => "DUPLICATE_METRIC",
            ErrorCode::LabelCardinality => "LABEL_CARDINALITY",
            ErrorCode::Encode => "ENCODE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("invalid metric: {0}")]
    InvalidMetric(String),
    #[error("duplicate metric family: {0}")]
    DuplicateMetric(String),
    #[error("metric {metric} expects {expected} label values, got {got}")]
    LabelCardinality {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::BadConfig(_) => ErrorCode::BadConfig,
            PipelineError::InvalidMetric(_) => ErrorCode::InvalidMetric,
            PipelineError::DuplicateMetric(_) => ErrorCode::DuplicateMetric,
            PipelineError::LabelCardinality { .. } => ErrorCode::LabelCardinality,
            PipelineError::Encode(_) => ErrorCode::Encode,
            PipelineError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<std::fmt::Error> for PipelineError {
    fn from(e: std::fmt::Error) -> Self {
        PipelineError::Encode(e.to_string())
    }
}
