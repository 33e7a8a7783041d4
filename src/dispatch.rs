//! Dynamic method dispatch.
//!
//! An entity class registered with method prefixes answers calls such as
//! `findTags(query)` by running the handler registered for the prefix with the
//! `tags` property and the query. Prefixes without a handler run
//! [`Entity::query_property`](crate::entity::Entity::query_property). Names
//! that don't match are handed back untouched so the caller can try its own
//! fallback.

use crate::entity::Entity;
use crate::error::QueryError;
use crate::query::ApplyQuery;
use crate::row::Row;
use regex::Regex;
use sea_query::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Compiled `^(prefix1|prefix2|...)(.+)$` matcher
#[derive(Debug, Clone, Default)]
pub struct MethodPattern {
    prefixes: Vec<String>,
    regex: Option<Regex>,
}

/// A method name split into prefix and property name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch {
    pub prefix: String,
    /// Remainder of the name with its first character lower-cased
    pub field: String,
}

impl MethodPattern {
    /// Compile a matcher for `prefixes`; an empty list disables dispatch
    pub fn new<I, S>(prefixes: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();
        if prefixes.is_empty() {
            return Ok(Self::default());
        }

        let alternatives = prefixes
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!("^({alternatives})(.+)$"))
            .map_err(|e| QueryError::Other(format!("invalid method prefix pattern: {e}")))?;

        Ok(Self {
            prefixes,
            regex: Some(regex),
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_enabled(&self) -> bool {
        self.regex.is_some()
    }

    /// Split `name` into prefix and property
    ///
    /// ```
    /// use lifeline::MethodPattern;
    ///
    /// let pattern = MethodPattern::new(["find"]).unwrap();
    /// let found = pattern.match_method("findLineItems").unwrap();
    /// assert_eq!(found.field, "lineItems");
    /// assert!(pattern.match_method("save").is_none());
    /// ```
    pub fn match_method(&self, name: &str) -> Option<MethodMatch> {
        let captures = self.regex.as_ref()?.captures(name)?;
        Some(MethodMatch {
            prefix: captures[1].to_string(),
            field: lcfirst(&captures[2]),
        })
    }

    /// Method name for `field` under `prefix`, e.g. `findTags`
    pub fn accessor_name(prefix: &str, field: &str) -> String {
        let mut chars = field.chars();
        match chars.next() {
            Some(first) => format!("{prefix}{}{}", first.to_uppercase(), chars.as_str()),
            None => prefix.to_string(),
        }
    }
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Operation run for a dispatched prefix with the entity, property name and query
pub type PrefixHandlerFn<R> =
    dyn Fn(&Entity<R>, &str, Rc<dyn ApplyQuery>) -> Result<Dispatch<R>, QueryError>;

struct Handler<R: Row>(Rc<PrefixHandlerFn<R>>);

/// Prefix handlers of one entity class
///
/// Handlers are stored type-erased because a reflection is shared by every
/// row type; the row type is checked again on lookup.
#[derive(Clone, Default)]
pub struct PrefixHandlers {
    handlers: HashMap<String, Rc<dyn Any>>,
}

impl PrefixHandlers {
    /// Register `handler` for `prefix`, replacing any previous one
    pub fn insert<R, F>(&mut self, prefix: impl Into<String>, handler: F)
    where
        R: Row,
        F: Fn(&Entity<R>, &str, Rc<dyn ApplyQuery>) -> Result<Dispatch<R>, QueryError> + 'static,
    {
        let handler: Rc<PrefixHandlerFn<R>> = Rc::new(handler);
        self.handlers.insert(prefix.into(), Rc::new(Handler(handler)));
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.handlers.contains_key(prefix)
    }

    /// Handler for `prefix`, `None` when the prefix uses the default query
    ///
    /// Fails with [`QueryError::InvalidState`] if the handler was registered
    /// for another row type.
    pub fn get<R: Row>(
        &self,
        prefix: &str,
    ) -> Result<Option<Rc<PrefixHandlerFn<R>>>, QueryError> {
        let Some(handler) = self.handlers.get(prefix) else {
            return Ok(None);
        };
        handler
            .downcast_ref::<Handler<R>>()
            .map(|handler| Some(Rc::clone(&handler.0)))
            .ok_or_else(|| {
                QueryError::InvalidState(format!(
                    "Handler for prefix '{prefix}' was registered for another row type."
                ))
            })
    }
}

impl fmt::Debug for PrefixHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefixes: Vec<_> = self.handlers.keys().collect();
        prefixes.sort();
        f.debug_struct("PrefixHandlers")
            .field("prefixes", &prefixes)
            .finish()
    }
}

/// One argument of a dispatched call
#[derive(Clone)]
pub enum CallArg {
    Query(Rc<dyn ApplyQuery>),
    Value(Value),
}

impl CallArg {
    pub fn query<Q: ApplyQuery + 'static>(query: Q) -> Self {
        CallArg::Query(Rc::new(query))
    }

    /// Type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CallArg::Query(_) => "query",
            CallArg::Value(value) => match value {
                Value::Bool(_) => "boolean",
                Value::TinyInt(_)
                | Value::SmallInt(_)
                | Value::Int(_)
                | Value::BigInt(_)
                | Value::TinyUnsigned(_)
                | Value::SmallUnsigned(_)
                | Value::Unsigned(_)
                | Value::BigUnsigned(_) => "integer",
                Value::Float(_) | Value::Double(_) => "double",
                Value::String(_) | Value::Char(_) => "string",
                Value::Bytes(_) => "bytes",
                _ => "value",
            },
        }
    }
}

impl From<Value> for CallArg {
    fn from(value: Value) -> Self {
        CallArg::Value(value)
    }
}

impl From<crate::query::Query> for CallArg {
    fn from(query: crate::query::Query) -> Self {
        CallArg::query(query)
    }
}

impl From<Rc<dyn ApplyQuery>> for CallArg {
    fn from(query: Rc<dyn ApplyQuery>) -> Self {
        CallArg::Query(query)
    }
}

impl fmt::Debug for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallArg::Query(_) => f.write_str("Query(..)"),
            CallArg::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Result of [`Entity::call`]
#[derive(Debug)]
pub enum Dispatch<R: Row> {
    /// The name matched a prefix and its handler returned entities
    Resolved(Vec<Entity<R>>),
    /// The name matched a prefix and its handler returned a scalar, e.g. a count
    Value(Value),
    /// The name matched no prefix; arguments are returned unchanged
    Unhandled { name: String, args: Vec<CallArg> },
}

impl<R: Row> Dispatch<R> {
    /// Resolved entities, or `None` if the call was not handled
    pub fn resolved(self) -> Option<Vec<Entity<R>>> {
        match self {
            Dispatch::Resolved(entities) => Some(entities),
            Dispatch::Value(_) | Dispatch::Unhandled { .. } => None,
        }
    }

    /// Scalar result, or `None` if the handler returned entities or the call was not handled
    pub fn value(self) -> Option<Value> {
        match self {
            Dispatch::Value(value) => Some(value),
            Dispatch::Resolved(_) | Dispatch::Unhandled { .. } => None,
        }
    }
}

impl<R: Row> Entity<R> {
    /// Route a prefixed method call to the prefix's handler
    ///
    /// `findTags(query)` on an entity whose class registered the `find`
    /// prefix runs the `find` handler with `"tags"` and `query`; without a
    /// handler it behaves like `query_property("tags", query)`.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidMethodCall`] unless exactly one argument is given
    /// - [`QueryError::InvalidArgument`] if that argument is not a query
    /// - anything the handler or [`Entity::query_property`] returns
    pub fn call(&self, name: &str, mut args: Vec<CallArg>) -> Result<Dispatch<R>, QueryError> {
        let Some(found) = self.reflection().methods().match_method(name) else {
            return Ok(Dispatch::Unhandled {
                name: name.to_string(),
                args,
            });
        };

        if args.len() != 1 {
            return Err(QueryError::InvalidMethodCall {
                entity: self.class().to_string(),
                method: name.to_string(),
                given: args.len(),
            });
        }

        match args.remove(0) {
            CallArg::Query(query) => {
                log::trace!("{}::{name} -> {}", self.class(), found.field);
                match self.reflection().handlers().get::<R>(&found.prefix)? {
                    Some(handler) => handler(self, &found.field, query),
                    None => Ok(Dispatch::Resolved(self.query_property(&found.field, query)?)),
                }
            }
            other => Err(QueryError::InvalidArgument(format!(
                "Argument 1 passed to {}::{name} must implement ApplyQuery. {} given.",
                self.class(),
                other.type_name()
            ))),
        }
    }
}
