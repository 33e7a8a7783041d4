//! Schema mapper collaborator.
//!
//! The mapper answers naming questions (which table backs an entity class,
//! which column is the primary key, which class a row should become) and
//! produces the implicit filters that scope every relationship query to its
//! target entity type.

use crate::entity::PropertyDescriptor;
use crate::error::QueryError;
use crate::filter::Filter;
use crate::row::RowValues;
use heck::{ToSnakeCase, ToUpperCamelCase};
use sea_query::Value;

/// Traversal context passed to implicit filter construction
///
/// Pairs the entity a query starts from with the property being traversed,
/// so scoping filters can depend on where the query came from.
pub struct Caller<'a> {
    entity_class: &'a str,
    values: &'a dyn RowValues,
    property: &'a PropertyDescriptor,
}

impl<'a> Caller<'a> {
    pub fn new(
        entity_class: &'a str,
        values: &'a dyn RowValues,
        property: &'a PropertyDescriptor,
    ) -> Self {
        Self {
            entity_class,
            values,
            property,
        }
    }

    /// Class of the originating entity
    pub fn entity_class(&self) -> &str {
        self.entity_class
    }

    /// Property being traversed
    pub fn property(&self) -> &PropertyDescriptor {
        self.property
    }

    /// Column value of the originating entity
    pub fn get(&self, column: &str) -> Option<Value> {
        self.values.get(column)
    }
}

/// Schema and naming provider
pub trait Mapper {
    /// Primary key column of `table`
    fn primary_key(&self, table: &str) -> String;

    /// Table backing `entity_class`
    fn table(&self, entity_class: &str) -> String;

    /// Entity class a row of `table` materialises as
    ///
    /// `row` lets single-table inheritance pick a subclass from a
    /// discriminator column.
    fn entity_class(&self, table: &str, row: Option<&dyn RowValues>) -> String;

    /// Filters scoping every query for `entity_class`
    fn implicit_filters(
        &self,
        entity_class: &str,
        caller: &Caller<'_>,
    ) -> Result<Vec<Filter>, QueryError> {
        let _ = (entity_class, caller);
        Ok(Vec::new())
    }
}

/// Conventional mapper
///
/// - table = `snake_case(class)`
/// - entity class = `UpperCamelCase(table)`
/// - primary key = `id` for every table
/// - no implicit filters
#[derive(Debug, Clone)]
pub struct DefaultMapper {
    primary_key: String,
}

impl DefaultMapper {
    pub fn new() -> Self {
        Self::with_primary_key("id")
    }

    pub fn with_primary_key(primary_key: impl Into<String>) -> Self {
        Self {
            primary_key: primary_key.into(),
        }
    }

    /// Column referencing `target_table`, e.g. `author_id`
    pub fn relationship_column(&self, target_table: &str) -> String {
        format!("{target_table}_{}", self.primary_key)
    }

    /// Junction table joining `source_table` and `target_table`, e.g. `book_tag`
    pub fn relationship_table(&self, source_table: &str, target_table: &str) -> String {
        format!("{source_table}_{target_table}")
    }
}

impl Default for DefaultMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for DefaultMapper {
    fn primary_key(&self, _table: &str) -> String {
        self.primary_key.clone()
    }

    fn table(&self, entity_class: &str) -> String {
        entity_class.to_snake_case()
    }

    fn entity_class(&self, table: &str, _row: Option<&dyn RowValues>) -> String {
        table.to_upper_camel_case()
    }
}
