//! Query injector: adapts a caller-supplied query into a filter.

use crate::filter::{Filter, FilterVerdict};
use crate::mapper::Mapper;
use crate::query::ApplyQuery;
use std::rc::Rc;

/// Name the injected query filter is registered under
pub const INJECTED_QUERY: &str = "injected_query";

/// Wrap `query` as a filter that applies it with `mapper` as schema context
pub fn inject(query: Rc<dyn ApplyQuery>, mapper: Rc<dyn Mapper>) -> Filter {
    Filter::new(INJECTED_QUERY, move |builder| {
        query.apply(builder, mapper.as_ref())?;
        Ok(FilterVerdict::Continue)
    })
}
