use thiserror::Error;

/// Failures surfaced by collaborators. Short or empty series are never
/// reported through this type; they resolve to neutral defaults instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
