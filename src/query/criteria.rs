//! Reusable query value.

use crate::error::QueryError;
use crate::mapper::Mapper;
use crate::query::builder::QueryBuilder;
use crate::query::traits::ApplyQuery;
use sea_query::{Condition, DynIden, Expr, ExprTrait, IntoCondition, Order, Value};

/// Recorded WHERE / ORDER BY / LIMIT / OFFSET clauses
///
/// A `Query` can be built once and applied to any number of relationship
/// queries. Clauses are applied in the order they were added.
///
/// # Example
///
/// ```
/// use lifeline::{ApplyQuery, DefaultMapper, Query, QueryBuilder};
/// use sea_query::{Expr, ExprTrait, Order};
///
/// let query = Query::new()
///     .filter(Expr::col("published").eq(true))
///     .order_by("title", Order::Asc)
///     .limit(5);
///
/// let mut builder = QueryBuilder::new("book");
/// query.apply(&mut builder, &DefaultMapper::new()).unwrap();
/// assert_eq!(builder.limit_value(), Some(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    conditions: Vec<Condition>,
    equalities: Vec<(String, Value)>,
    primary_keys: Option<Vec<Value>>,
    orders: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a WHERE condition
    pub fn filter<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.conditions.push(condition.into_condition());
        self
    }

    /// Add a `column = value` condition
    pub fn where_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equalities.push((column.into(), value.into()));
        self
    }

    /// Restrict to rows whose primary key is one of `keys`
    ///
    /// The column is resolved through the mapper for whichever table the
    /// query is applied to.
    pub fn primary_key_in<I, V>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.primary_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Add an ORDER BY clause
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.orders.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl ApplyQuery for Query {
    fn apply(&self, builder: &mut QueryBuilder, mapper: &dyn Mapper) -> Result<(), QueryError> {
        for condition in &self.conditions {
            builder.filter(condition.clone());
        }
        for (column, value) in &self.equalities {
            builder.where_eq(column.clone(), value.clone());
        }
        if let Some(keys) = &self.primary_keys {
            let column = mapper.primary_key(builder.table());
            builder.filter(Expr::col(DynIden::from(column)).is_in(keys.clone()));
        }
        for (column, order) in &self.orders {
            builder.order_by(DynIden::from(column.clone()), order.clone());
        }
        if let Some(limit) = self.limit {
            builder.limit(limit);
        }
        if let Some(offset) = self.offset {
            builder.offset(offset);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::DefaultMapper;

    #[test]
    fn test_empty_query_leaves_builder_untouched() {
        let mut builder = QueryBuilder::new("tag");
        let before = builder.to_sql();
        Query::new().apply(&mut builder, &DefaultMapper::new()).unwrap();
        assert_eq!(builder.to_sql(), before);
        assert!(!builder.is_paginated());
    }

    #[test]
    fn test_pagination_is_applied() {
        let mut builder = QueryBuilder::new("tag");
        Query::new()
            .limit(10)
            .offset(5)
            .apply(&mut builder, &DefaultMapper::new())
            .unwrap();
        assert_eq!(builder.limit_value(), Some(10));
        assert_eq!(builder.offset_value(), Some(5));
    }

    #[test]
    fn test_primary_key_filter_uses_mapper() {
        let mut builder = QueryBuilder::new("tag");
        Query::new()
            .primary_key_in(vec![1i32, 2, 3])
            .apply(&mut builder, &DefaultMapper::with_primary_key("tag_id"))
            .unwrap();
        let sql = builder.to_sql();
        assert!(sql.contains("\"tag_id\" IN (1, 2, 3)"), "unexpected SQL: {sql}");
    }

    #[test]
    fn test_equalities_reach_the_builder() {
        let mut builder = QueryBuilder::new("book");
        Query::new()
            .where_eq("published", true)
            .apply(&mut builder, &DefaultMapper::new())
            .unwrap();
        assert_eq!(
            builder.equalities(),
            &[("published".to_string(), Value::Bool(Some(true)))]
        );
    }

    #[test]
    fn test_conditions_and_orders_render() {
        let mut builder = QueryBuilder::new("book");
        Query::new()
            .filter(Expr::col("published").eq(true))
            .order_by("title", Order::Asc)
            .order_by("id", Order::Desc)
            .apply(&mut builder, &DefaultMapper::new())
            .unwrap();
        let sql = builder.to_sql();
        assert!(sql.contains("WHERE"), "unexpected SQL: {sql}");
        assert!(sql.contains("ORDER BY \"title\" ASC, \"id\" DESC"), "unexpected SQL: {sql}");
    }
}
