//! Strategy guard.
//!
//! The JOIN strategy fetches a many-to-many set in one combined query, so a
//! LIMIT or OFFSET would apply to the combined rows instead of to each parent.
//! The guard runs last in the chain and rejects any query carrying either
//! clause; the resolver then retries once with the UNION strategy, without
//! the guard.

use crate::filter::{Filter, FilterVerdict};

/// Name the guard filter is registered under
pub const STRATEGY_GUARD: &str = "strategy_guard";

/// Filter rejecting paginated queries for the JOIN strategy
pub fn strategy_guard() -> Filter {
    Filter::new(STRATEGY_GUARD, |builder| {
        if builder.is_paginated() {
            return Ok(FilterVerdict::StrategyMismatch(format!(
                "query on '{}' uses LIMIT or OFFSET, use UNION strategy",
                builder.table()
            )));
        }
        Ok(FilterVerdict::Continue)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryBuilder;

    #[test]
    fn test_unpaginated_query_passes() {
        let mut builder = QueryBuilder::new("tag");
        assert_eq!(strategy_guard().apply(&mut builder).unwrap(), FilterVerdict::Continue);
    }

    #[test]
    fn test_limit_is_rejected() {
        let mut builder = QueryBuilder::new("tag");
        builder.limit(10);
        let verdict = strategy_guard().apply(&mut builder).unwrap();
        assert!(matches!(
            verdict,
            FilterVerdict::StrategyMismatch(ref msg) if msg.contains("'tag'")
        ));
    }

    #[test]
    fn test_offset_is_rejected() {
        let mut builder = QueryBuilder::new("tag");
        builder.offset(1);
        assert!(matches!(
            strategy_guard().apply(&mut builder).unwrap(),
            FilterVerdict::StrategyMismatch(_)
        ));
    }

    #[test]
    fn test_guard_is_named() {
        assert_eq!(strategy_guard().name(), STRATEGY_GUARD);
    }
}
