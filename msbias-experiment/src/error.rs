use msbias_core::DomainError;
use thiserror::Error;

/// Everything that can end a block or trial early. All variants surface to
/// the orchestrator's caller; nothing is caught and retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(
        "expected number of trials to be divisible by 8, otherwise perfect factorial combinations are not possible (got {0})"
    )]
    InvalidTrialCount(usize),
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Cooperative cancellation, honoured only at phase boundaries and at
    /// the top of response polling iterations.
    #[error("trial aborted by quit request")]
    Aborted,
    #[error("input source exhausted before a response was made")]
    NoResponse,
}
