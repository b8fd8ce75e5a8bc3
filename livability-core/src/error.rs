use thiserror::Error;

/// Hard failures of a report or advice request.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The request itself is unusable (missing city, malformed date, empty prompt).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The weather provider could not be reached or returned an unusable payload.
    #[error("weather provider unavailable: {0:#}")]
    UpstreamUnavailable(#[source] anyhow::Error),

    /// Text generation failed on a path where it is the whole answer.
    #[error("text generation failed: {0:#}")]
    GenerationFailure(#[source] anyhow::Error),
}

/// A best-effort lookup produced nothing usable.
///
/// Callers treat this as "unknown" and carry on without the data.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no data found for {0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}
