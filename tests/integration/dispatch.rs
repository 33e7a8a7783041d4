//! Prefix dispatch through `Entity::call`

use crate::common::{author_with_tags, factory, int_ids};
use lifeline::mock::{FetchOutcome, MockRow, MockStore};
use lifeline::{
    query_fn, ApplyQuery, CallArg, DefaultEntityFactory, DefaultMapper, Dispatch, Entity,
    PropertyDescriptor, Query, QueryError, Relationship, Strategy,
};
use sea_query::Value;
use std::rc::Rc;

#[test]
fn find_tags_with_limit_five() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&["find"]), 8);

    let tags = author
        .call("findTags", vec![Query::new().limit(5).into()])
        .unwrap()
        .resolved()
        .unwrap();
    assert_eq!(tags.len(), 5);
    assert!(tags.iter().all(|t| t.class() == "Tag"));

    let log: Vec<_> = store.calls().iter().map(|c| (c.strategy, c.outcome)).collect();
    assert_eq!(
        log,
        vec![
            (Some(Strategy::Join), FetchOutcome::StrategyMismatch),
            (Some(Strategy::Union), FetchOutcome::Rows(5)),
        ]
    );
}

#[test]
fn find_line_items_through_order_items() {
    let store = MockStore::new();
    let factory = factory(&["find"]);
    let order_row = store.insert("order", [("id", 1.into())]);
    for id in [1, 2, 3] {
        store.insert("line_item", [("id", id.into())]);
    }
    for (link, target) in [(10, 3), (11, 1), (12, 2)] {
        store.insert(
            "order_items",
            [("id", link.into()), ("order_id", 1.into()), ("line_item_id", target.into())],
        );
    }
    store.set_result_order("line_item", [2i64, 3, 1]);
    let order = DefaultEntityFactory::load(&factory, "Order", order_row).unwrap();

    let items = order
        .call("findLineItems", vec![CallArg::query(Query::new())])
        .unwrap()
        .resolved()
        .unwrap();
    assert_eq!(int_ids(&items), vec![2, 3, 1]);
}

#[test]
fn unknown_method_falls_through() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&["find"]), 1);

    let dispatched = author
        .call("publish", vec![Value::from(true).into()])
        .unwrap();
    match dispatched {
        Dispatch::Unhandled { name, args } => {
            assert_eq!(name, "publish");
            assert_eq!(args[0].type_name(), "boolean");
        }
        other => panic!("publish must fall through: {other:?}"),
    }
}

#[test]
fn argument_count_is_checked() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&["find"]), 1);

    for args in [vec![], vec![Query::new().into(), Query::new().into()]] {
        let given = args.len();
        let err = author.call("findTags", args).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidMethodCall {
                entity: "Author".into(),
                method: "findTags".into(),
                given,
            }
        );
    }
    assert!(store.calls().is_empty());
}

#[test]
fn non_query_argument_names_its_type() {
    let store = MockStore::new();
    let author = author_with_tags(&store, &factory(&["find"]), 1);

    let err = author
        .call("findTags", vec![Value::from(42).into()])
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidArgument(msg) if msg.ends_with("integer given.")));
}

#[test]
fn accessors_are_listed_at_registration() {
    let factory = factory(&["find", "count"]);
    let author = factory.reflection("Author").unwrap();
    assert_eq!(
        author.accessors(),
        vec!["findTags", "findBooks", "countTags", "countBooks"]
    );
}

#[test]
fn prefixes_run_their_registered_handlers() {
    let mut factory = DefaultEntityFactory::new(Rc::new(DefaultMapper::new()));
    let author = factory
        .reflection_builder("Author")
        .property(PropertyDescriptor::related(
            "tags",
            "Tag",
            Relationship::belongs_to_many("tag", "author_id", Some(Strategy::Union)),
        ))
        .prefixes(["find"])
        .prefix_handler("first", |entity: &Entity<MockRow>, field, query| {
            let first = query_fn(move |builder, mapper| {
                query.apply(builder, mapper)?;
                builder.limit(1);
                Ok(())
            });
            Ok(Dispatch::Resolved(entity.query_property(field, Rc::new(first))?))
        })
        .prefix_handler("count", |entity: &Entity<MockRow>, field, query| {
            let found = entity.query_property(field, query)?;
            Ok(Dispatch::Value(Value::from(found.len() as i64)))
        })
        .build()
        .unwrap();
    factory.register(author);
    let tag = factory.reflection_builder("Tag").build().unwrap();
    factory.register(tag);
    let factory = Rc::new(factory);

    let store = MockStore::new();
    let author = author_with_tags(&store, &factory, 4);
    let call = |name: &str| author.call(name, vec![Query::new().into()]).unwrap();

    assert_eq!(call("findTags").resolved().map(|tags| tags.len()), Some(4));
    let first = call("firstTags").resolved().unwrap();
    assert_eq!(int_ids(&first), vec![100]);
    assert_eq!(call("countTags").value(), Some(Value::BigInt(Some(4))));

    let limits: Vec<_> = store.calls().iter().map(|c| c.sql.contains("LIMIT")).collect();
    assert_eq!(limits, vec![false, true, false]);
}
