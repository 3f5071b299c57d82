use thiserror::Error;

pub type ShapingResult<T> = std::result::Result<T, ShapingError>;

/// Failures detected while validating request parameters, before any byte of the
/// response is written. Messages are safe to show to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapingError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("range not satisfiable for resource of {total} bytes")]
    RangeNotSatisfiable { total: u64 },

    #[error("precondition failed")]
    PreconditionFailed,
}

impl ShapingError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
