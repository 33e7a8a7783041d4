//! Query injection capability.
//!
//! Anything that can refine a [`QueryBuilder`] can be handed to a relationship
//! query: the reusable [`Query`](crate::query::Query) value, or a closure wrapped
//! in [`QueryFn`].

use crate::error::QueryError;
use crate::mapper::Mapper;
use crate::query::builder::QueryBuilder;
use std::fmt;
use std::rc::Rc;

/// Apply caller-supplied query logic to a builder
///
/// Implementations may add WHERE, ORDER BY, LIMIT and OFFSET clauses. They
/// run after the entity-scoping filters, so they can narrow the result but
/// never widen it.
pub trait ApplyQuery {
    fn apply(&self, builder: &mut QueryBuilder, mapper: &dyn Mapper) -> Result<(), QueryError>;
}

impl<T: ApplyQuery + ?Sized> ApplyQuery for Rc<T> {
    fn apply(&self, builder: &mut QueryBuilder, mapper: &dyn Mapper) -> Result<(), QueryError> {
        (**self).apply(builder, mapper)
    }
}

impl<T: ApplyQuery + ?Sized> ApplyQuery for Box<T> {
    fn apply(&self, builder: &mut QueryBuilder, mapper: &dyn Mapper) -> Result<(), QueryError> {
        (**self).apply(builder, mapper)
    }
}

/// Closure adapter for [`ApplyQuery`]
///
/// # Example
///
/// ```
/// use lifeline::{query_fn, ApplyQuery, DefaultMapper, QueryBuilder};
///
/// let first_five = query_fn(|builder, _mapper| {
///     builder.limit(5);
///     Ok(())
/// });
///
/// let mut builder = QueryBuilder::new("tag");
/// first_five.apply(&mut builder, &DefaultMapper::new()).unwrap();
/// assert_eq!(builder.limit_value(), Some(5));
/// ```
pub struct QueryFn<F>(F);

impl<F> QueryFn<F>
where
    F: Fn(&mut QueryBuilder, &dyn Mapper) -> Result<(), QueryError>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ApplyQuery for QueryFn<F>
where
    F: Fn(&mut QueryBuilder, &dyn Mapper) -> Result<(), QueryError>,
{
    fn apply(&self, builder: &mut QueryBuilder, mapper: &dyn Mapper) -> Result<(), QueryError> {
        (self.0)(builder, mapper)
    }
}

impl<F> fmt::Debug for QueryFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueryFn")
    }
}

/// Wrap a closure as an injectable query
pub fn query_fn<F>(f: F) -> QueryFn<F>
where
    F: Fn(&mut QueryBuilder, &dyn Mapper) -> Result<(), QueryError>,
{
    QueryFn::new(f)
}
