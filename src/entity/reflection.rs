//! Entity metadata: properties, relationships and fetch strategies.
//!
//! An [`EntityReflection`] is built once per entity class at registration
//! time. It lists the declared properties, the relationship each one
//! traverses (if any), and the method-name prefixes the class answers to
//! through [`Entity::call`](crate::entity::Entity::call) with the handler run
//! for each prefix.

use crate::dispatch::{Dispatch, MethodPattern, PrefixHandlers};
use crate::entity::Entity;
use crate::error::QueryError;
use crate::query::ApplyQuery;
use crate::row::Row;
use serde::Deserialize;
use std::rc::Rc;

/// How a many-to-many related set is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One combined query for every parent row; breaks under LIMIT/OFFSET
    #[default]
    Join,
    /// One query per parent row merged together; safe under LIMIT/OFFSET
    Union,
}

/// How a property reaches its related entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relationship {
    /// Rows of `target_table` reference the source through `column_referencing_source`
    BelongsToMany {
        target_table: String,
        column_referencing_source: String,
        /// `None` defers to the factory's default strategy
        strategy: Option<Strategy>,
    },
    /// Source and target are linked through rows of `relationship_table`
    HasMany {
        relationship_table: String,
        column_referencing_source: String,
        column_referencing_target: String,
        target_table: String,
    },
    /// The source references a single target row
    HasOne {
        column_referencing_target: String,
        target_table: String,
    },
    /// A single target row references the source
    BelongsToOne {
        column_referencing_source: String,
        target_table: String,
    },
}

impl Relationship {
    pub fn belongs_to_many(
        target_table: impl Into<String>,
        column_referencing_source: impl Into<String>,
        strategy: Option<Strategy>,
    ) -> Self {
        Relationship::BelongsToMany {
            target_table: target_table.into(),
            column_referencing_source: column_referencing_source.into(),
            strategy,
        }
    }

    pub fn has_many(
        relationship_table: impl Into<String>,
        column_referencing_source: impl Into<String>,
        column_referencing_target: impl Into<String>,
        target_table: impl Into<String>,
    ) -> Self {
        Relationship::HasMany {
            relationship_table: relationship_table.into(),
            column_referencing_source: column_referencing_source.into(),
            column_referencing_target: column_referencing_target.into(),
            target_table: target_table.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Relationship::BelongsToMany { .. } => "BelongsToMany",
            Relationship::HasMany { .. } => "HasMany",
            Relationship::HasOne { .. } => "HasOne",
            Relationship::BelongsToOne { .. } => "BelongsToOne",
        }
    }

    pub fn target_table(&self) -> &str {
        match self {
            Relationship::BelongsToMany { target_table, .. }
            | Relationship::HasMany { target_table, .. }
            | Relationship::HasOne { target_table, .. }
            | Relationship::BelongsToOne { target_table, .. } => target_table,
        }
    }
}

/// Metadata for one declared entity field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: String,
    target_class: String,
    relationship: Option<Relationship>,
}

impl PropertyDescriptor {
    /// Plain column-backed field
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_class: type_name.into(),
            relationship: None,
        }
    }

    /// Field holding entities of `target_class` reached through `relationship`
    pub fn related(
        name: impl Into<String>,
        target_class: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self {
            name: name.into(),
            target_class: target_class.into(),
            relationship: Some(relationship),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entity class (or scalar type name) the field holds
    pub fn target_class(&self) -> &str {
        &self.target_class
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        self.relationship.as_ref()
    }

    pub fn has_relationship(&self) -> bool {
        self.relationship.is_some()
    }
}

/// Registered metadata of one entity class
#[derive(Debug, Clone)]
pub struct EntityReflection {
    class: String,
    properties: Vec<PropertyDescriptor>,
    methods: MethodPattern,
    handlers: PrefixHandlers,
}

impl EntityReflection {
    /// Start describing `class`; method dispatch is disabled until prefixes are set
    ///
    /// # Example
    ///
    /// ```
    /// use lifeline::{EntityReflection, PropertyDescriptor, Relationship};
    ///
    /// let author = EntityReflection::builder("Author")
    ///     .property(PropertyDescriptor::scalar("name", "String"))
    ///     .property(PropertyDescriptor::related(
    ///         "tags",
    ///         "Tag",
    ///         Relationship::belongs_to_many("tag", "author_id", None),
    ///     ))
    ///     .prefixes(["find"])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(author.accessors(), vec!["findTags".to_string()]);
    /// ```
    pub fn builder(class: impl Into<String>) -> EntityReflectionBuilder {
        EntityReflectionBuilder {
            class: class.into(),
            properties: Vec::new(),
            prefixes: Vec::new(),
            handler_prefixes: Vec::new(),
            handlers: PrefixHandlers::default(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Declared property named `name`
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Method-name pattern answered by [`Entity::call`](crate::entity::Entity::call)
    pub fn methods(&self) -> &MethodPattern {
        &self.methods
    }

    /// Handlers of prefixes that don't run the plain relationship query
    pub fn handlers(&self) -> &PrefixHandlers {
        &self.handlers
    }

    /// Every dispatchable method name, prefix by prefix, in declaration order
    pub fn accessors(&self) -> Vec<String> {
        self.methods
            .prefixes()
            .iter()
            .flat_map(|prefix| {
                self.properties
                    .iter()
                    .filter(|p| p.has_relationship())
                    .map(move |p| MethodPattern::accessor_name(prefix, &p.name))
            })
            .collect()
    }
}

/// Builder for [`EntityReflection`]
#[derive(Debug, Clone)]
pub struct EntityReflectionBuilder {
    class: String,
    properties: Vec<PropertyDescriptor>,
    prefixes: Vec<String>,
    handler_prefixes: Vec<String>,
    handlers: PrefixHandlers,
}

impl EntityReflectionBuilder {
    /// Declare a property; a later declaration with the same name replaces the earlier one
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.retain(|p| p.name != property.name);
        self.properties.push(property);
        self
    }

    /// Method-name prefixes routed to relationship queries
    ///
    /// Prefixes given a handler through [`Self::prefix_handler`] stay enabled.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Run `handler` for calls named `<prefix><Field>` instead of the plain
    /// relationship query, enabling the prefix if needed
    ///
    /// ```
    /// use lifeline::mock::MockRow;
    /// use lifeline::{Dispatch, Entity, EntityReflection};
    ///
    /// let author = EntityReflection::builder("Author")
    ///     .prefixes(["find"])
    ///     .prefix_handler("count", |entity: &Entity<MockRow>, field, query| {
    ///         let found = entity.query_property(field, query)?;
    ///         Ok(Dispatch::Value((found.len() as i64).into()))
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(author.methods().prefixes(), ["find", "count"]);
    /// assert!(author.handlers().contains("count"));
    /// ```
    pub fn prefix_handler<R, F>(mut self, prefix: impl Into<String>, handler: F) -> Self
    where
        R: Row,
        F: Fn(&Entity<R>, &str, Rc<dyn ApplyQuery>) -> Result<Dispatch<R>, QueryError> + 'static,
    {
        let prefix = prefix.into();
        self.handlers.insert(prefix.clone(), handler);
        self.handler_prefixes.push(prefix);
        self
    }

    pub fn build(mut self) -> Result<EntityReflection, QueryError> {
        for prefix in self.handler_prefixes.drain(..) {
            if !self.prefixes.contains(&prefix) {
                self.prefixes.push(prefix);
            }
        }
        Ok(EntityReflection {
            methods: MethodPattern::new(self.prefixes)?,
            class: self.class,
            properties: self.properties,
            handlers: self.handlers,
        })
    }
}
