//! # Lifeline
//!
//! Relationship-aware query augmentation for entity layers.
//!
//! A live [`Entity`] can fetch the entities related through one of its
//! properties while the caller refines the query with WHERE, ORDER BY, LIMIT
//! and OFFSET clauses:
//!
//! ```
//! use lifeline::mock::MockStore;
//! use lifeline::{DefaultEntityFactory, DefaultMapper, PropertyDescriptor, Query, Relationship};
//! use std::rc::Rc;
//!
//! let mut factory = DefaultEntityFactory::new(Rc::new(DefaultMapper::new()));
//! let author = factory
//!     .reflection_builder("Author")
//!     .property(PropertyDescriptor::related(
//!         "tags",
//!         "Tag",
//!         Relationship::belongs_to_many("tag", "author_id", None),
//!     ))
//!     .prefixes(["find"])
//!     .build()
//!     .unwrap();
//! factory.register(author);
//! factory.register(factory.reflection_builder("Tag").build().unwrap());
//! let factory = Rc::new(factory);
//!
//! let store = MockStore::new();
//! let row = store.insert("author", [("id", 1.into())]);
//! for id in 10..20 {
//!     store.insert("tag", [("id", id.into()), ("author_id", 1.into())]);
//! }
//!
//! let author = DefaultEntityFactory::load(&factory, "Author", row).unwrap();
//! let tags = author
//!     .query_property("tags", Rc::new(Query::new().limit(5)))
//!     .unwrap();
//! assert_eq!(tags.len(), 5);
//! ```
//!
//! Paginating a many-to-many fetch breaks the JOIN strategy, so the resolver
//! detects it with the strategy guard and re-issues the fetch with UNION.
//!
//! ## Modules
//!
//! - [`relation`]: the resolver and result assembler
//! - [`filter`]: filter chains, the strategy guard and the query injector
//! - [`query`]: the query builder and injectable queries
//! - [`entity`]: entities, reflections and the factory
//! - [`dispatch`]: `findTags(query)`-style method dispatch
//! - [`mapper`] / [`row`]: the schema and data-access collaborators
//! - [`mock`]: an in-memory row store for tests
//!
//! ## Features
//!
//! - `metrics` (default): Prometheus metrics through OpenTelemetry
//! - `tracing` (default): a span around every relationship query

pub mod config;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod metrics;
pub mod mock;
pub mod query;
pub mod relation;
pub mod row;

pub use config::{DispatchConfig, LifelineConfig};
pub use dispatch::{CallArg, Dispatch, MethodMatch, MethodPattern, PrefixHandlers};
pub use entity::{
    DefaultEntityFactory, Entity, EntityFactory, EntityReflection, EntityReflectionBuilder,
    PropertyDescriptor, Relationship, Strategy,
};
pub use error::QueryError;
pub use filter::{Filter, FilterVerdict, Filtering};
pub use mapper::{Caller, DefaultMapper, Mapper};
pub use query::{query_fn, ApplyQuery, Query, QueryBuilder, QueryFn};
pub use relation::{assemble, resolve};
pub use row::{Fetched, ResultProxy, Row, RowKey, RowValues};
