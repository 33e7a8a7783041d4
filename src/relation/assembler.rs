//! Result assembly: rows to live entities.

use crate::entity::{Entity, EntityFactory};
use crate::error::QueryError;
use crate::row::{Row, RowValues};
use std::rc::Rc;

/// Materialise `rows` as live entities of `target_class` (or its subclasses)
///
/// The concrete class of each row is chosen by the mapper, so a table shared
/// by several classes yields the right one per row. Every entity is bound to
/// `factory` before it is returned. Output order is input order.
pub fn assemble<R: Row>(
    rows: Vec<R>,
    target_class: &str,
    factory: &Rc<dyn EntityFactory<R>>,
) -> Result<Vec<Entity<R>>, QueryError> {
    let mapper = factory.mapper();
    let table = mapper.table(target_class);
    rows.into_iter()
        .map(|row| {
            let entity_class = mapper.entity_class(&table, Some(&row as &dyn RowValues));
            let mut entity = factory.create_entity(&entity_class, row)?;
            entity.make_alive(Rc::clone(factory));
            Ok(entity)
        })
        .collect()
}
