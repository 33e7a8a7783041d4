//! Relationship resolver.
//!
//! Given a live entity, the name of one of its relationship properties and a
//! caller query, fetch the related rows and materialise them as entities.
//!
//! The filter chain is always `[implicit filters..., injected query]`, with
//! the strategy guard appended while a BelongsToMany fetch still has to find
//! out whether JOIN is usable. When the guard rejects the query the fetch is
//! re-issued once with UNION and without the guard.

use crate::entity::{Entity, Relationship, Strategy};
use crate::error::QueryError;
use crate::filter::{inject, strategy_guard, Filter, Filtering};
use crate::mapper::{Caller, Mapper};
use crate::query::ApplyQuery;
use crate::relation::assembler::assemble;
use crate::row::{Fetched, ResultProxy, Row, RowKey};
use std::collections::HashMap;
use std::rc::Rc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Fetch attempts per BelongsToMany resolution: the declared strategy, then UNION
pub const MAX_STRATEGY_ATTEMPTS: usize = 2;

/// Fetch the entities related to `entity` through `field`, refined by `query`
///
/// # Errors
///
/// - [`QueryError::InvalidState`] if `entity` is detached
/// - [`QueryError::MemberAccess`] if `field` is not declared on the entity
/// - [`QueryError::InvalidArgument`] if `field` has no relationship
/// - [`QueryError::InvalidRelationship`] for relationships other than
///   BelongsToMany and HasMany
/// - [`QueryError::InvalidStrategy`] if the query still cannot run after the
///   UNION fallback
///
/// Errors from filters, the injected query and the row collaborator are
/// propagated unchanged.
///
/// # Ordering
///
/// BelongsToMany results keep the order the row collaborator returned.
/// HasMany results follow the shared result set of the fetched target rows
/// when the collaborator provides one; without it the order is unspecified.
pub fn resolve<R: Row>(
    entity: &Entity<R>,
    field: &str,
    query: Rc<dyn ApplyQuery>,
) -> Result<Vec<Entity<R>>, QueryError> {
    let factory = entity.factory().ok_or_else(|| {
        QueryError::InvalidState(format!("Cannot query detached entity {}.", entity.class()))
    })?;
    let property = entity
        .reflection()
        .property(field)
        .ok_or_else(|| QueryError::MemberAccess {
            entity: entity.class().to_string(),
            field: field.to_string(),
        })?;
    let relationship = property.relationship().ok_or_else(|| {
        QueryError::InvalidArgument(format!(
            "Property '{}' in entity {} has no relationship.",
            property.name(),
            entity.class()
        ))
    })?;

    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::resolve_span(entity.class(), field, relationship.kind()).entered();
    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();

    let mapper = factory.mapper();
    let target_class = property.target_class();
    let caller = Caller::new(entity.class(), entity.row(), property);
    let mut filters = mapper.implicit_filters(target_class, &caller)?;
    filters.push(inject(query, Rc::clone(&mapper)));

    let rows = match relationship {
        Relationship::BelongsToMany {
            target_table,
            column_referencing_source,
            strategy,
        } => fetch_belongs_to_many(
            entity.row(),
            target_table,
            column_referencing_source,
            strategy.unwrap_or_else(|| factory.default_strategy()),
            filters,
        )?,
        Relationship::HasMany {
            relationship_table,
            column_referencing_source,
            column_referencing_target,
            target_table,
        } => fetch_has_many(
            entity.row(),
            mapper.as_ref(),
            relationship_table,
            column_referencing_source,
            column_referencing_target,
            target_table,
            filters,
        )?,
        other => {
            return Err(QueryError::InvalidRelationship(format!(
                "Only BelongsToMany and HasMany relationships are supported when querying \
                 entity property. {} given.",
                other.kind()
            )))
        }
    };

    log::debug!(
        "{}::{} resolved {} related row(s)",
        entity.class(),
        field,
        rows.len()
    );
    #[cfg(feature = "metrics")]
    METRICS.record_resolution(relationship.kind(), started.elapsed());

    assemble(rows, target_class, factory)
}

/// Fetch rows of `target_table` referencing `row`, detecting the strategy
///
/// Unless `declared` is UNION, the guard is appended and a rejected JOIN
/// attempt is retried once with UNION. A mismatch on a pinned UNION fetch, or
/// on the retry, is surfaced.
fn fetch_belongs_to_many<R: Row>(
    row: &R,
    target_table: &str,
    column: &str,
    declared: Strategy,
    mut filters: Vec<Filter>,
) -> Result<Vec<R>, QueryError> {
    let detect = declared != Strategy::Union;
    if detect {
        filters.push(strategy_guard());
    }

    let mut strategy = declared;
    let mut attempts = 0;
    loop {
        attempts += 1;
        let filtering = Filtering::new(filters.clone());
        let fetched = row.referencing(target_table, column, Some(&filtering), Some(strategy))?;
        let reason = match fetched {
            Fetched::Rows(rows) => return Ok(rows),
            Fetched::StrategyMismatch(reason) => reason,
        };

        if !detect || attempts >= MAX_STRATEGY_ATTEMPTS {
            log::warn!("{target_table}: {reason} (strategy {strategy:?}, attempt {attempts})");
            return Err(QueryError::InvalidStrategy(reason));
        }

        log::debug!("{target_table}: {reason}; retrying with UNION strategy");
        #[cfg(feature = "metrics")]
        METRICS.record_fallback();

        // guard is always last
        filters.pop();
        strategy = Strategy::Union;
    }
}

/// Fetch target rows linked to `row` through a junction table
fn fetch_has_many<R: Row>(
    row: &R,
    mapper: &dyn Mapper,
    relationship_table: &str,
    column_referencing_source: &str,
    column_referencing_target: &str,
    target_table: &str,
    filters: Vec<Filter>,
) -> Result<Vec<R>, QueryError> {
    let target_primary_key = mapper.primary_key(target_table);
    let filtering = Filtering::new(filters);
    let links = row
        .referencing(relationship_table, column_referencing_source, None, None)?
        .into_result()
        .inspect_err(|e| {
            if e.is_strategy_mismatch() {
                log::warn!("{relationship_table}: junction rows rejected: {e}");
            }
        })?;

    let mut targets: HashMap<RowKey, R> = HashMap::with_capacity(links.len());
    let mut result_proxy: Option<ResultProxy> = None;
    for link in &links {
        let fetched = link.referenced(target_table, column_referencing_target, Some(&filtering))?;
        if fetched.is_strategy_mismatch() {
            log::warn!("{target_table}: no fallback strategy through '{relationship_table}'");
        }
        let Some(target) = fetched.into_result()? else {
            continue;
        };
        if result_proxy.is_none() {
            result_proxy = target.result_proxy();
        }
        let key = target
            .get(&target_primary_key)
            .as_ref()
            .and_then(RowKey::from_value)
            .ok_or_else(|| {
                QueryError::DataAccess(format!(
                    "row in '{target_table}' has no usable primary key '{target_primary_key}'"
                ))
            })?;
        targets.insert(key, target);
    }

    Ok(match result_proxy {
        Some(proxy) => proxy.keys().filter_map(|key| targets.remove(key)).collect(),
        None => targets.into_values().collect(),
    })
}
