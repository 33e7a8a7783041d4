//! Filters applied to relationship queries.
//!
//! A relationship query runs its filters in a fixed order: the implicit
//! entity-scoping filters from the mapper, then the caller's injected query,
//! then (only while the fetch strategy is being detected) the strategy guard.
//! [`Filtering`] is the ordered chain handed to the row collaborator.

pub mod guard;
pub mod injector;

#[doc(inline)]
pub use guard::{strategy_guard, STRATEGY_GUARD};
#[doc(inline)]
pub use injector::{inject, INJECTED_QUERY};

use crate::error::QueryError;
use crate::query::QueryBuilder;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// What a filter decided about the query it inspected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Keep going with the next filter
    Continue,
    /// The query cannot run under the current fetch strategy
    StrategyMismatch(String),
}

type FilterFn = dyn Fn(&mut QueryBuilder) -> Result<FilterVerdict, QueryError>;

/// A named step that refines or inspects a query builder
#[derive(Clone)]
pub struct Filter {
    name: Cow<'static, str>,
    func: Rc<FilterFn>,
}

impl Filter {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&mut QueryBuilder) -> Result<FilterVerdict, QueryError> + 'static,
    {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// Filter that only adds clauses and never rejects the strategy
    ///
    /// # Example
    ///
    /// ```
    /// use lifeline::{Filter, FilterVerdict, QueryBuilder};
    /// use sea_query::{Expr, ExprTrait};
    ///
    /// let not_deleted = Filter::scope("not_deleted", |builder| {
    ///     builder.filter(Expr::col("deleted").eq(false));
    /// });
    ///
    /// let mut builder = QueryBuilder::new("tag");
    /// assert_eq!(not_deleted.apply(&mut builder).unwrap(), FilterVerdict::Continue);
    /// ```
    pub fn scope<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&mut QueryBuilder) + 'static,
    {
        Self::new(name, move |builder| {
            func(builder);
            Ok(FilterVerdict::Continue)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, builder: &mut QueryBuilder) -> Result<FilterVerdict, QueryError> {
        (self.func)(builder)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("name", &self.name).finish()
    }
}

/// Ordered filter chain
#[derive(Debug, Clone, Default)]
pub struct Filtering {
    filters: Vec<Filter>,
}

impl Filtering {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter in order against `builder`
    ///
    /// Stops at the first filter that reports a strategy mismatch and returns
    /// that verdict; errors are propagated as-is.
    pub fn apply(&self, builder: &mut QueryBuilder) -> Result<FilterVerdict, QueryError> {
        for filter in &self.filters {
            match filter.apply(builder)? {
                FilterVerdict::Continue => {}
                mismatch => {
                    log::trace!("filter '{}' rejected query on {}", filter.name(), builder.table());
                    return Ok(mismatch);
                }
            }
        }
        Ok(FilterVerdict::Continue)
    }
}

impl From<Vec<Filter>> for Filtering {
    fn from(filters: Vec<Filter>) -> Self {
        Self::new(filters)
    }
}
