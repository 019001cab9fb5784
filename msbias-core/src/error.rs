use thiserror::Error;

/// Validation failures for externally supplied trial parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("expected 'left' or 'right', but received {0:?}")]
    InvalidPosition(String),
    #[error("expected item 1 or 2, but received {0}")]
    InvalidItem(u8),
}
