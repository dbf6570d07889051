//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type CoreResult<T> = Result<T, CoreError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// state conflicts, authorization). Transport concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A monetary amount failed validation (zero where a movement is
    /// required, non-positive where a credit is required, or unparseable).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Proof was submitted while the user has no PENDING ticket.
    #[error("no active ticket")]
    NoActiveTicket,

    /// The conditional PENDING transition matched zero rows: the ticket was
    /// already decided.
    #[error("ticket already decided")]
    AlreadyDecided,

    /// The audit gate rejected the actor.
    #[error("unauthorized")]
    Unauthorized,

    /// A referenced user or ticket does not exist.
    #[error("not found")]
    NotFound,

    /// A durable-store operation failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
