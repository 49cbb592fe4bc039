use crate::Error;
use thiserror::Error;

/// Failure classes of a statement relation.
///
/// They travel inside [`crate::Error`] like every other error of the crate, so
/// callers can still attach context. Host bindings recover the class with
/// [`StatementError::of`] to pick the result code they report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// Malformed declaration text.
    #[error("{0}")]
    Argument(String),
    /// The statement would modify the database.
    #[error("Statement must be read only.")]
    NotReadOnly,
    /// A result column has no retrievable name.
    #[error("Result column {column} of the statement has no name")]
    SchemaDerivation { column: usize },
    /// A constraint on a hidden input column cannot be consumed.
    #[error("Constraint on input column {column} cannot be used: {reason}")]
    PlanInfeasible { column: usize, reason: &'static str },
    /// Failure reported by the prepared statement service, message verbatim.
    #[error("{message}")]
    Execution { code: i32, message: String },
    #[error("Out of memory")]
    OutOfMemory,
    /// Broken internal contract between planner and cursor.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl StatementError {
    /// The taxonomy value carried by `error`, if any.
    pub fn of(error: &Error) -> Option<&StatementError> {
        error.downcast_ref::<StatementError>()
    }

    pub fn argument(message: impl Into<String>) -> Error {
        StatementError::Argument(message.into()).into()
    }

    pub fn execution(code: i32, message: impl Into<String>) -> Error {
        StatementError::Execution {
            code,
            message: message.into(),
        }
        .into()
    }

    pub fn invariant(message: impl Into<String>) -> Error {
        StatementError::InvariantViolation(message.into()).into()
    }
}
