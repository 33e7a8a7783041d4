//! Entities and the factory that creates them.
//!
//! An [`Entity`] wraps one row together with the metadata of its class. It is
//! *detached* until a factory activates it with [`Entity::make_alive`]; only
//! live entities may run relationship queries, because the query needs the
//! factory's mapper and must hand its results back to the same factory.

pub mod factory;
pub mod reflection;

#[doc(inline)]
pub use factory::DefaultEntityFactory;
#[doc(inline)]
pub use reflection::{
    EntityReflection, EntityReflectionBuilder, PropertyDescriptor, Relationship, Strategy,
};

use crate::error::QueryError;
use crate::mapper::Mapper;
use crate::query::ApplyQuery;
use crate::relation::resolver;
use crate::row::Row;
use sea_query::Value;
use std::fmt;
use std::rc::Rc;

/// Creates entities from rows and owns the schema mapper
pub trait EntityFactory<R: Row> {
    /// Mapper shared by every entity this factory activates
    fn mapper(&self) -> Rc<dyn Mapper>;

    /// Build a detached entity of `entity_class` around `row`
    fn create_entity(&self, entity_class: &str, row: R) -> Result<Entity<R>, QueryError>;

    /// Strategy used for many-to-many relationships that declare none
    fn default_strategy(&self) -> Strategy {
        Strategy::Join
    }
}

/// A domain object bound to one row
pub struct Entity<R: Row> {
    reflection: Rc<EntityReflection>,
    row: R,
    factory: Option<Rc<dyn EntityFactory<R>>>,
}

impl<R: Row> Entity<R> {
    /// Create a detached entity
    pub fn new(reflection: Rc<EntityReflection>, row: R) -> Self {
        Self {
            reflection,
            row,
            factory: None,
        }
    }

    pub fn class(&self) -> &str {
        self.reflection.class()
    }

    pub fn reflection(&self) -> &EntityReflection {
        &self.reflection
    }

    pub fn row(&self) -> &R {
        &self.row
    }

    /// Column value of the underlying row
    pub fn get(&self, column: &str) -> Option<Value> {
        self.row.get(column)
    }

    pub fn is_detached(&self) -> bool {
        self.factory.is_none()
    }

    /// Factory this entity is bound to, if live
    pub fn factory(&self) -> Option<&Rc<dyn EntityFactory<R>>> {
        self.factory.as_ref()
    }

    /// Bind to `factory`; the entity becomes live
    pub fn make_alive(&mut self, factory: Rc<dyn EntityFactory<R>>) {
        self.factory = Some(factory);
    }

    /// Drop the factory binding; relationship queries fail until re-activated
    pub fn detach(&mut self) {
        self.factory = None;
    }

    /// Fetch the entities related through `field`, refined by `query`
    ///
    /// See [`resolver::resolve`] for the full contract.
    pub fn query_property(
        &self,
        field: &str,
        query: Rc<dyn ApplyQuery>,
    ) -> Result<Vec<Entity<R>>, QueryError> {
        resolver::resolve(self, field, query)
    }
}

impl<R: Row> Clone for Entity<R> {
    fn clone(&self) -> Self {
        Self {
            reflection: Rc::clone(&self.reflection),
            row: self.row.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl<R: Row> fmt::Debug for Entity<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("class", &self.class())
            .field("detached", &self.is_detached())
            .finish()
    }
}
