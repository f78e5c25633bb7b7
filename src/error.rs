use thiserror::Error;

/// Failure kinds the compliance engine reports to its callers.
///
/// Zero scans in a range is not an error: it yields an empty report or a
/// zeroed batch outcome. Per-record write-back failures are counted in
/// `RecomputeOutcome::failed_count` rather than raised.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid report date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("no factory registered under code {0}")]
    FactoryNotFound(String),
}
