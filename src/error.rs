use thiserror::Error;

/// Errors surfaced by the staffbook core and its persistence boundary.
///
/// All of these are recoverable at the call site: callers report them to the
/// user and carry on. Storage failures are caught at the database boundary
/// and never leave in-memory state half-mutated.
#[derive(Debug, Error)]
pub enum Error {
    /// An employee with the same first and last name is already in the group.
    #[error("employee {0} {1} already exists in the group")]
    DuplicateEmployee(String, String),

    /// The group is at its maximum capacity.
    #[error("group {name} is full ({capacity} members)")]
    GroupFull { name: String, capacity: usize },

    /// The referenced employee is not in the group.
    #[error("employee {0} {1} is not in the group")]
    EmployeeNotFound(String, String),

    /// No group with the given name exists.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// Input rejected at a creation boundary (birth year, salary, rating).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A persisted condition token that maps to no known condition.
    #[error("unknown condition: {0}")]
    UnknownCondition(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("malformed import data: {0}")]
    Import(#[from] serde_json::Error),

    /// A dispatched operation's worker task failed to complete.
    #[error("worker task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;
