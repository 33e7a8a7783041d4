//! Registry-backed entity factory.

use crate::config::LifelineConfig;
use crate::entity::reflection::{EntityReflection, EntityReflectionBuilder, Strategy};
use crate::entity::{Entity, EntityFactory};
use crate::error::QueryError;
use crate::mapper::Mapper;
use crate::row::Row;
use std::collections::HashMap;
use std::rc::Rc;

/// Entity factory holding the reflection of every registered class
///
/// # Example
///
/// ```
/// use lifeline::{DefaultEntityFactory, DefaultMapper, PropertyDescriptor};
/// use std::rc::Rc;
///
/// let mut factory = DefaultEntityFactory::new(Rc::new(DefaultMapper::new()));
/// let tag = factory
///     .reflection_builder("Tag")
///     .property(PropertyDescriptor::scalar("label", "String"))
///     .build()
///     .unwrap();
/// factory.register(tag);
/// assert!(factory.reflection("Tag").is_some());
/// ```
pub struct DefaultEntityFactory {
    mapper: Rc<dyn Mapper>,
    reflections: HashMap<String, Rc<EntityReflection>>,
    default_strategy: Strategy,
    prefixes: Vec<String>,
}

impl DefaultEntityFactory {
    pub fn new(mapper: Rc<dyn Mapper>) -> Self {
        Self::from_config(mapper, &LifelineConfig::default())
    }

    /// Factory using the configured default strategy and dispatch prefixes
    pub fn from_config(mapper: Rc<dyn Mapper>, config: &LifelineConfig) -> Self {
        Self {
            mapper,
            reflections: HashMap::new(),
            default_strategy: config.default_strategy,
            prefixes: config.dispatch.prefixes.clone(),
        }
    }

    pub fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Reflection builder for `class`, pre-seeded with the configured prefixes
    pub fn reflection_builder(&self, class: impl Into<String>) -> EntityReflectionBuilder {
        EntityReflection::builder(class).prefixes(self.prefixes.clone())
    }

    /// Register `reflection`, replacing any previous registration of its class
    pub fn register(&mut self, reflection: EntityReflection) -> Rc<EntityReflection> {
        let reflection = Rc::new(reflection);
        log::debug!("registered entity class {}", reflection.class());
        self.reflections
            .insert(reflection.class().to_string(), Rc::clone(&reflection));
        reflection
    }

    pub fn reflection(&self, class: &str) -> Option<Rc<EntityReflection>> {
        self.reflections.get(class).cloned()
    }

    /// Create an entity of `class` around `row` and activate it with `factory`
    pub fn load<R: Row>(
        factory: &Rc<DefaultEntityFactory>,
        class: &str,
        row: R,
    ) -> Result<Entity<R>, QueryError> {
        let mut entity = factory.create_entity(class, row)?;
        entity.make_alive(Rc::clone(factory) as Rc<dyn EntityFactory<R>>);
        Ok(entity)
    }
}

impl<R: Row> EntityFactory<R> for DefaultEntityFactory {
    fn mapper(&self) -> Rc<dyn Mapper> {
        Rc::clone(&self.mapper)
    }

    fn create_entity(&self, entity_class: &str, row: R) -> Result<Entity<R>, QueryError> {
        let reflection = self.reflection(entity_class).ok_or_else(|| {
            QueryError::InvalidArgument(format!(
                "Entity class '{entity_class}' is not registered."
            ))
        })?;
        Ok(Entity::new(reflection, row))
    }

    fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }
}
