//! Query builder handed to filters and injected queries.
//!
//! `QueryBuilder` owns a `sea_query::SelectStatement` for one target table and
//! keeps its own record of LIMIT and OFFSET, so a filter running late in the
//! chain can tell whether pagination was requested without rendering SQL.
//! Conditions added with [`QueryBuilder::where_eq`] are recorded as well, so a
//! row layer that does not speak SQL can still evaluate them.

use sea_query::{
    Asterisk, DynIden, Expr, ExprTrait, IntoColumnRef, IntoCondition, Order, PostgresQueryBuilder,
    SelectStatement, Value,
};

/// Mutable select statement for one table
///
/// # Example
///
/// ```
/// use lifeline::QueryBuilder;
/// use sea_query::{Expr, ExprTrait, Order};
///
/// let mut builder = QueryBuilder::new("tags");
/// builder
///     .filter(Expr::col("name").like("rust%"))
///     .order_by("name", Order::Asc)
///     .limit(5);
///
/// assert!(builder.is_paginated());
/// assert!(builder.to_sql().contains("LIMIT"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    statement: SelectStatement,
    equalities: Vec<(String, Value)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl QueryBuilder {
    /// Create a `SELECT * FROM table` builder
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        let mut statement = SelectStatement::default();
        statement
            .column(Asterisk)
            .from(DynIden::from(table.clone()));
        Self {
            table,
            statement,
            equalities: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Table this builder selects from
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Add a WHERE condition; conditions are AND-ed together
    pub fn filter<C>(&mut self, condition: C) -> &mut Self
    where
        C: IntoCondition,
    {
        self.statement.cond_where(condition.into_condition());
        self
    }

    /// Add a `column = value` condition
    ///
    /// Rendered like any other WHERE condition and also recorded in
    /// [`QueryBuilder::equalities`].
    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        self.statement
            .cond_where(Expr::col(DynIden::from(column.clone())).eq(value.clone()));
        self.equalities.push((column, value));
        self
    }

    /// Conditions added through [`QueryBuilder::where_eq`], in order
    pub fn equalities(&self) -> &[(String, Value)] {
        &self.equalities
    }

    /// Add an ORDER BY clause
    pub fn order_by<C: IntoColumnRef>(&mut self, column: C, order: Order) -> &mut Self {
        self.statement.order_by(column, order);
        self
    }

    /// Set the LIMIT clause
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.statement.limit(limit);
        self.limit = Some(limit);
        self
    }

    /// Set the OFFSET clause
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.statement.offset(offset);
        self.offset = Some(offset);
        self
    }

    /// LIMIT currently attached, if any
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// OFFSET currently attached, if any
    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Whether a LIMIT or OFFSET clause has been attached
    pub fn is_paginated(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// The underlying statement
    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    /// Render the statement as PostgreSQL with inlined values
    pub fn to_sql(&self) -> String {
        self.statement.to_string(PostgresQueryBuilder)
    }
}
