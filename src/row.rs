//! Row navigation collaborator.
//!
//! Rows are owned by the data-access layer. The query layer only needs to read
//! column values, walk to referencing/referenced rows with a filter chain, and
//! learn which fetched rows came from the same result set.
//!
//! Navigation never signals a strategy problem through `Err`: a fetch that the
//! filter chain rejects for the strategy in use comes back as
//! [`Fetched::StrategyMismatch`], and the caller decides whether to retry.

use crate::entity::Strategy;
use crate::error::QueryError;
use crate::filter::Filtering;
use sea_query::Value;
use std::fmt;
use std::rc::Rc;

/// Read access to the column values of one record
pub trait RowValues {
    /// Value stored in `column`, or `None` when the row has no such column
    fn get(&self, column: &str) -> Option<Value>;
}

/// Outcome of a row navigation call
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// The fetch ran and produced these rows
    Rows(T),
    /// The filter chain cannot run under the requested strategy
    StrategyMismatch(String),
}

impl<T> Fetched<T> {
    /// Whether the fetch was rejected for its strategy
    pub fn is_strategy_mismatch(&self) -> bool {
        matches!(self, Fetched::StrategyMismatch(_))
    }

    /// Convert to a `Result`, turning a mismatch into [`QueryError::InvalidStrategy`]
    pub fn into_result(self) -> Result<T, QueryError> {
        match self {
            Fetched::Rows(rows) => Ok(rows),
            Fetched::StrategyMismatch(reason) => Err(QueryError::InvalidStrategy(reason)),
        }
    }
}

/// An opaque handle to one fetched record
///
/// # Example
///
/// A data-access layer implements this for its row type; see
/// [`crate::mock::MockRow`] for an in-memory implementation.
pub trait Row: RowValues + Clone + 'static {
    /// Rows in `table` that reference this row through `column`
    ///
    /// `filtering` is applied to the query for `table`. `strategy` selects
    /// how the related set is fetched; `None` leaves it to the row layer.
    fn referencing(
        &self,
        table: &str,
        column: &str,
        filtering: Option<&Filtering>,
        strategy: Option<Strategy>,
    ) -> Result<Fetched<Vec<Self>>, QueryError>;

    /// The single row in `table` that this row references through `column`
    ///
    /// Returns `Fetched::Rows(None)` when the reference is empty or the
    /// referenced row is excluded by `filtering`.
    fn referenced(
        &self,
        table: &str,
        column: &str,
        filtering: Option<&Filtering>,
    ) -> Result<Fetched<Option<Self>>, QueryError>;

    /// The result set this row was fetched with, if the row layer shares one
    fn result_proxy(&self) -> Option<ResultProxy> {
        None
    }
}

/// Primary key value usable as a map key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Int(i64),
    /// Unsigned 64-bit value above `i64::MAX`; smaller values are `Int`
    Unsigned(u64),
    Text(String),
}

impl RowKey {
    /// Convert a column value into a key; NULL, floating point and binary values have no key
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::TinyInt(Some(v)) => Some(RowKey::Int(i64::from(*v))),
            Value::SmallInt(Some(v)) => Some(RowKey::Int(i64::from(*v))),
            Value::Int(Some(v)) => Some(RowKey::Int(i64::from(*v))),
            Value::BigInt(Some(v)) => Some(RowKey::Int(*v)),
            Value::TinyUnsigned(Some(v)) => Some(RowKey::Int(i64::from(*v))),
            Value::SmallUnsigned(Some(v)) => Some(RowKey::Int(i64::from(*v))),
            Value::Unsigned(Some(v)) => Some(RowKey::Int(i64::from(*v))),
            Value::BigUnsigned(Some(v)) => Some(RowKey::from(*v)),
            Value::String(Some(s)) => Some(RowKey::Text(s.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Int(v) => write!(f, "{v}"),
            RowKey::Unsigned(v) => write!(f, "{v}"),
            RowKey::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        RowKey::Int(value)
    }
}

impl From<u64> for RowKey {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(RowKey::Unsigned(value), RowKey::Int)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Text(value.to_string())
    }
}

/// Shared handle to one logical result set
///
/// Every row fetched by the same query execution hands out a clone of the
/// same proxy. Iterating its keys yields the primary keys of the whole result
/// in the order the query returned them.
#[derive(Debug, Clone)]
pub struct ResultProxy {
    keys: Rc<[RowKey]>,
}

impl ResultProxy {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = RowKey>,
    {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Primary keys in result order
    pub fn keys(&self) -> impl Iterator<Item = &RowKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether both handles point at the same result set
    pub fn same_result(&self, other: &ResultProxy) -> bool {
        Rc::ptr_eq(&self.keys, &other.keys)
    }
}
