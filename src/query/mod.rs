//! Query building for relationship queries.
//!
//! - [`QueryBuilder`]: the statement every filter and injected query mutates
//! - [`ApplyQuery`]: the capability an injected query must provide
//! - [`Query`]: a reusable value implementing it
//! - [`QueryFn`]: closure adapter implementing it

pub mod builder;
pub mod criteria;
pub mod traits;

#[doc(inline)]
pub use builder::QueryBuilder;
#[doc(inline)]
pub use criteria::Query;
#[doc(inline)]
pub use traits::{query_fn, ApplyQuery, QueryFn};
