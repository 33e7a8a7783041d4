//! Error type for relationship queries.
//!
//! Every surfaced failure of the query layer is a `QueryError`. The only
//! failure that is ever handled internally is the strategy mismatch raised
//! while fetching a many-to-many relationship, which the resolver turns into
//! a single UNION retry before giving up with [`QueryError::InvalidStrategy`].

use std::fmt;

/// Error type for relationship queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The entity is detached and cannot run relationship queries
    InvalidState(String),
    /// The requested field is not declared on the entity
    MemberAccess {
        entity: String,
        field: String,
    },
    /// The field has no relationship, or a call argument has the wrong type
    InvalidArgument(String),
    /// The relationship kind cannot be queried
    InvalidRelationship(String),
    /// The composed query cannot run with the fetch strategy in effect
    InvalidStrategy(String),
    /// A dispatched method was called with the wrong number of arguments
    InvalidMethodCall {
        entity: String,
        method: String,
        given: usize,
    },
    /// Failure reported by the row collaborator
    DataAccess(String),
    /// Other errors
    Other(String),
}

impl QueryError {
    /// Whether this error is the strategy mismatch signal.
    pub fn is_strategy_mismatch(&self) -> bool {
        matches!(self, QueryError::InvalidStrategy(_))
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            QueryError::MemberAccess { entity, field } => write!(
                f,
                "Cannot access undefined property '{field}' in entity {entity}."
            ),
            QueryError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            QueryError::InvalidRelationship(msg) => write!(f, "Invalid relationship: {msg}"),
            QueryError::InvalidStrategy(msg) => write!(f, "Invalid strategy: {msg}"),
            QueryError::InvalidMethodCall {
                entity,
                method,
                given,
            } => write!(
                f,
                "{entity}::{method} expects exactly 1 argument. {given} given."
            ),
            QueryError::DataAccess(msg) => write!(f, "Data access error: {msg}"),
            QueryError::Other(msg) => write!(f, "Query error: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}
