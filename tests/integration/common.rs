//! Shared schema for the integration tests
//!
//! - Author has many Tags (tag.author_id), detected strategy
//! - Author has many Books through author_book (HasMany)
//! - Order has many LineItems through order_items (HasMany)
//! - Shelf has many Books (book.shelf_id), UNION pinned

use lifeline::mock::{MockRow, MockStore};
use lifeline::{
    Caller, DefaultEntityFactory, DefaultMapper, Entity, Filter, Mapper, PropertyDescriptor,
    QueryError, Relationship, RowValues, Strategy,
};
use std::rc::Rc;

// ============================================================================
// Mappers
// ============================================================================

/// Default naming plus a `deleted = false` scope on every Book query
pub struct SoftDeleteMapper {
    inner: DefaultMapper,
}

impl SoftDeleteMapper {
    pub fn new() -> Self {
        Self {
            inner: DefaultMapper::new(),
        }
    }
}

impl Mapper for SoftDeleteMapper {
    fn primary_key(&self, table: &str) -> String {
        self.inner.primary_key(table)
    }

    fn table(&self, entity_class: &str) -> String {
        self.inner.table(entity_class)
    }

    fn entity_class(&self, table: &str, row: Option<&dyn RowValues>) -> String {
        self.inner.entity_class(table, row)
    }

    fn implicit_filters(
        &self,
        entity_class: &str,
        _caller: &Caller<'_>,
    ) -> Result<Vec<Filter>, QueryError> {
        if entity_class != "Book" {
            return Ok(Vec::new());
        }
        Ok(vec![Filter::scope("not_deleted", |builder| {
            builder.where_eq("deleted", false);
        })])
    }
}

// ============================================================================
// Schema
// ============================================================================

pub fn factory_with(mapper: Rc<dyn Mapper>, prefixes: &[&str]) -> Rc<DefaultEntityFactory> {
    let mut factory = DefaultEntityFactory::new(mapper);

    let author = factory
        .reflection_builder("Author")
        .property(PropertyDescriptor::scalar("name", "String"))
        .property(PropertyDescriptor::related(
            "tags",
            "Tag",
            Relationship::belongs_to_many("tag", "author_id", None),
        ))
        .property(PropertyDescriptor::related(
            "books",
            "Book",
            Relationship::has_many("author_book", "author_id", "book_id", "book"),
        ))
        .prefixes(prefixes.iter().copied())
        .build()
        .unwrap();
    factory.register(author);

    let order = factory
        .reflection_builder("Order")
        .property(PropertyDescriptor::related(
            "lineItems",
            "LineItem",
            Relationship::has_many("order_items", "order_id", "line_item_id", "line_item"),
        ))
        .prefixes(prefixes.iter().copied())
        .build()
        .unwrap();
    factory.register(order);

    let shelf = factory
        .reflection_builder("Shelf")
        .property(PropertyDescriptor::related(
            "books",
            "Book",
            Relationship::belongs_to_many("book", "shelf_id", Some(Strategy::Union)),
        ))
        .build()
        .unwrap();
    factory.register(shelf);

    for class in ["Tag", "Book", "LineItem"] {
        let reflection = factory.reflection_builder(class).build().unwrap();
        factory.register(reflection);
    }

    Rc::new(factory)
}

pub fn factory(prefixes: &[&str]) -> Rc<DefaultEntityFactory> {
    factory_with(Rc::new(DefaultMapper::new()), prefixes)
}

/// Author #1 with `tag_count` tags
pub fn author_with_tags(
    store: &MockStore,
    factory: &Rc<DefaultEntityFactory>,
    tag_count: i32,
) -> Entity<MockRow> {
    let row = store.insert("author", [("id", 1.into()), ("name", "Ann".into())]);
    for id in 0..tag_count {
        store.insert("tag", [("id", (100 + id).into()), ("author_id", 1.into())]);
    }
    DefaultEntityFactory::load(factory, "Author", row).unwrap()
}

pub fn int_ids(entities: &[Entity<MockRow>]) -> Vec<i32> {
    entities
        .iter()
        .map(|entity| match entity.get("id") {
            Some(sea_query::Value::Int(Some(id))) => id,
            other => panic!("unexpected id {other:?}"),
        })
        .collect()
}
