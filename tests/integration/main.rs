//! Integration tests for relationship queries
//!
//! Runs the public API end to end against the in-memory `MockStore`.

mod common;
mod dispatch;
mod relationship_queries;
