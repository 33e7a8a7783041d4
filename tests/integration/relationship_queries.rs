//! Relationship resolution through `Entity::query_property`

use crate::common::{author_with_tags, factory, factory_with, int_ids, SoftDeleteMapper};
use lifeline::mock::{FetchKind, FetchOutcome, MockStore};
use lifeline::{query_fn, ApplyQuery, DefaultEntityFactory, Query, QueryError, Strategy};
use sea_query::{Order, Value};
use std::rc::Rc;

fn no_op() -> Rc<dyn ApplyQuery> {
    Rc::new(Query::new())
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn detached_entities_cannot_query() {
    let store = MockStore::new();
    let factory = factory(&[]);
    let mut author = author_with_tags(&store, &factory, 3);
    author.detach();

    for field in ["tags", "books", "name", "missing"] {
        let err = author.query_property(field, no_op()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidState(_)), "{field}: {err}");
    }
    assert!(store.calls().is_empty());
}

#[test]
fn undeclared_field_is_member_access() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 0);
    let err = author.query_property("comments", no_op()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot access undefined property 'comments' in entity Author."
    );
}

#[test]
fn scalar_field_is_invalid_argument() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 0);
    let err = author.query_property("name", no_op()).unwrap_err();
    assert!(matches!(err, QueryError::InvalidArgument(_)));
}

// ============================================================================
// BelongsToMany
// ============================================================================

#[test]
fn limit_ten_switches_to_union_once() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 15);

    let tags = author
        .query_property("tags", Rc::new(Query::new().limit(10)))
        .unwrap();
    assert_eq!(tags.len(), 10);

    let strategies: Vec<_> = store.calls().iter().map(|c| (c.strategy, c.outcome)).collect();
    assert_eq!(
        strategies,
        vec![
            (Some(Strategy::Join), FetchOutcome::StrategyMismatch),
            (Some(Strategy::Union), FetchOutcome::Rows(10)),
        ]
    );
}

#[test]
fn union_retry_runs_without_guard() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 4);

    author
        .query_property("tags", Rc::new(Query::new().offset(1)))
        .unwrap();
    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].sql.contains("OFFSET 1"), "unexpected SQL: {}", calls[1].sql);
}

#[test]
fn pinned_union_is_never_retried() {
    let store = MockStore::new();
    let factory = factory(&[]);
    let shelf_row = store.insert("shelf", [("id", 7.into())]);
    for id in 1..=6 {
        store.insert("book", [("id", id.into()), ("shelf_id", 7.into())]);
    }
    let shelf = DefaultEntityFactory::load(&factory, "Shelf", shelf_row).unwrap();

    let books = shelf
        .query_property("books", Rc::new(Query::new().limit(2).offset(3)))
        .unwrap();
    assert_eq!(int_ids(&books), vec![4, 5]);

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].strategy, Some(Strategy::Union));
    assert_eq!(calls[0].outcome, FetchOutcome::Rows(2));
}

#[test]
fn query_errors_propagate_without_retry() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 2);
    let failing = query_fn(|_, _| Err(QueryError::Other("bad query".into())));

    let err = author.query_property("tags", Rc::new(failing)).unwrap_err();
    assert_eq!(err, QueryError::Other("bad query".into()));
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn results_are_live_entities_of_target_class() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 2);

    let tags = author.query_property("tags", no_op()).unwrap();
    assert_eq!(int_ids(&tags), vec![100, 101]);
    assert!(tags.iter().all(|t| t.class() == "Tag" && !t.is_detached()));
}

#[test]
fn caller_order_reaches_the_fetch() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&[]), 2);

    author
        .query_property("tags", Rc::new(Query::new().order_by("label", Order::Desc)))
        .unwrap();
    assert!(store.calls()[0].sql.contains("ORDER BY \"label\" DESC"));
}

// ============================================================================
// HasMany
// ============================================================================

#[test]
fn junction_results_follow_proxy_order_and_drop_missing_targets() {
    let store = MockStore::new();
    let factory = factory(&[]);
    let order_row = store.insert("order", [("id", 1.into())]);
    for id in [11, 12, 13, 14] {
        store.insert("line_item", [("id", id.into())]);
    }
    let links: [(i32, Value); 5] = [
        (1, 12.into()),
        (2, Value::Int(None)),
        (3, 14.into()),
        (4, 99.into()),
        (5, 11.into()),
    ];
    for (id, target) in links {
        store.insert(
            "order_items",
            [("id", id.into()), ("order_id", 1.into()), ("line_item_id", target)],
        );
    }
    store.set_result_order("line_item", [14i64, 13, 12, 11]);

    let order = DefaultEntityFactory::load(&factory, "Order", order_row).unwrap();
    let items = order.query_property("lineItems", no_op()).unwrap();
    assert_eq!(int_ids(&items), vec![14, 12, 11]);
    assert!(items.iter().all(|i| i.class() == "LineItem"));

    let calls = store.calls();
    assert_eq!(calls[0].kind, FetchKind::Referencing);
    assert_eq!(calls[0].table, "order_items");
    assert_eq!(calls.iter().filter(|c| c.kind == FetchKind::Referenced).count(), 5);
}

#[test]
fn implicit_filters_scope_target_fetches() {
    let store = MockStore::new();
    let factory = factory_with(Rc::new(SoftDeleteMapper::new()), &[]);
    let author_row = store.insert("author", [("id", 1.into())]);
    store.insert("book", [("id", 1.into()), ("deleted", false.into())]);
    store.insert(
        "author_book",
        [("id", 1.into()), ("author_id", 1.into()), ("book_id", 1.into())],
    );
    let author = DefaultEntityFactory::load(&factory, "Author", author_row).unwrap();

    let books = author.query_property("books", no_op()).unwrap();
    assert_eq!(books.len(), 1);

    let calls = store.calls();
    let target = calls.iter().find(|c| c.kind == FetchKind::Referenced).unwrap();
    assert!(target.sql.contains("\"deleted\" = FALSE"), "unexpected SQL: {}", target.sql);
    let junction = &calls[0];
    assert!(!junction.sql.contains("deleted"), "junction must not be scoped: {}", junction.sql);
}

#[test]
fn soft_deleted_targets_are_dropped_in_proxy_order() {
    let store = MockStore::new();
    let factory = factory_with(Rc::new(SoftDeleteMapper::new()), &[]);
    let author_row = store.insert("author", [("id", 1.into())]);
    for (id, deleted) in [(1, false), (2, true), (3, false)] {
        store.insert("book", [("id", id.into()), ("deleted", deleted.into())]);
        store.insert(
            "author_book",
            [("id", (10 + id).into()), ("author_id", 1.into()), ("book_id", id.into())],
        );
    }
    store.set_result_order("book", [3i64, 2, 1]);
    let author = DefaultEntityFactory::load(&factory, "Author", author_row).unwrap();

    let books = author.query_property("books", no_op()).unwrap();
    assert_eq!(int_ids(&books), vec![3, 1]);
}

#[test]
fn injected_conditions_exclude_related_rows() {
    let store = MockStore::new();
    let factory = factory(&[]);
    let author_row = store.insert("author", [("id", 1.into())]);
    for (id, label) in [(1, "rust"), (2, "php"), (3, "rust")] {
        store.insert("tag", [("id", id.into()), ("author_id", 1.into()), ("label", label.into())]);
    }
    let author = DefaultEntityFactory::load(&factory, "Author", author_row).unwrap();

    let tags = author
        .query_property("tags", Rc::new(Query::new().where_eq("label", "rust").limit(1)))
        .unwrap();
    assert_eq!(int_ids(&tags), vec![1]);
    assert_eq!(store.calls().len(), 2);
}

#[test]
fn junction_without_links_is_empty() {
    let store = MockStore::new();
    let factory = factory(&[]);
    let order_row = store.insert("order", [("id", 1.into())]);
    let order = DefaultEntityFactory::load(&factory, "Order", order_row).unwrap();

    assert!(order.query_property("lineItems", no_op()).unwrap().is_empty());
    assert_eq!(store.calls().len(), 1);
}
