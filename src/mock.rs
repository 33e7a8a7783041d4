//! In-memory row store for tests.
//!
//! [`MockStore`] keeps tables of rows in insertion order and hands out
//! [`MockRow`]s implementing [`Row`]. Navigation runs the filter chain against
//! a real [`QueryBuilder`], keeps only rows satisfying the conditions added
//! with [`QueryBuilder::where_eq`] and honours the LIMIT/OFFSET it ends up
//! with. Other WHERE clauses are rendered into the call log but not
//! evaluated. Every navigation call is recorded so tests can assert on
//! strategies and retries.
//!
//! ```
//! use lifeline::mock::MockStore;
//! use lifeline::{Fetched, Row};
//!
//! let store = MockStore::new();
//! let author = store.insert("author", [("id", 1.into())]);
//! store.insert("tag", [("id", 10.into()), ("author_id", 1.into())]);
//!
//! let tags = author.referencing("tag", "author_id", None, None).unwrap();
//! assert!(matches!(tags, Fetched::Rows(rows) if rows.len() == 1));
//! assert_eq!(store.calls().len(), 1);
//! ```

use crate::entity::Strategy;
use crate::error::QueryError;
use crate::filter::{FilterVerdict, Filtering};
use crate::query::QueryBuilder;
use crate::row::{Fetched, ResultProxy, Row, RowKey, RowValues};
use sea_query::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Which navigation method was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Referencing,
    Referenced,
}

/// What a navigation call produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Rows(usize),
    StrategyMismatch,
    Failed,
}

/// One recorded navigation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub kind: FetchKind,
    pub table: String,
    pub column: String,
    pub strategy: Option<Strategy>,
    pub sql: String,
    pub outcome: FetchOutcome,
}

#[derive(Default)]
struct StoreState {
    primary_key: String,
    tables: HashMap<String, Vec<Rc<BTreeMap<String, Value>>>>,
    result_orders: HashMap<String, Vec<RowKey>>,
    proxies: HashMap<String, ResultProxy>,
    proxies_enabled: bool,
    failing_tables: HashSet<String>,
    calls: Vec<FetchCall>,
}

impl StoreState {
    fn rows(&self, table: &str) -> Vec<Rc<BTreeMap<String, Value>>> {
        self.tables.get(table).cloned().unwrap_or_default()
    }

    fn key_of(&self, values: &BTreeMap<String, Value>) -> Option<RowKey> {
        values.get(&self.primary_key).and_then(RowKey::from_value)
    }

    fn proxy_for(&mut self, table: &str) -> Option<ResultProxy> {
        if !self.proxies_enabled {
            return None;
        }
        if let Some(proxy) = self.proxies.get(table) {
            return Some(proxy.clone());
        }
        let keys = match self.result_orders.get(table) {
            Some(order) => order.clone(),
            None => self
                .rows(table)
                .iter()
                .filter_map(|values| self.key_of(values))
                .collect(),
        };
        let proxy = ResultProxy::new(keys);
        self.proxies.insert(table.to_string(), proxy.clone());
        Some(proxy)
    }

    fn record(&mut self, call: FetchCall) {
        self.calls.push(call);
    }
}

/// Shared in-memory store
#[derive(Clone)]
pub struct MockStore {
    state: Rc<RefCell<StoreState>>,
}

impl MockStore {
    /// Store whose tables all use `id` as primary key
    pub fn new() -> Self {
        Self::with_primary_key("id")
    }

    pub fn with_primary_key(primary_key: impl Into<String>) -> Self {
        let state = StoreState {
            primary_key: primary_key.into(),
            proxies_enabled: true,
            ..StoreState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Append a row to `table` and return a handle to it
    pub fn insert<'a, I>(&self, table: &str, values: I) -> MockRow
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let values: BTreeMap<String, Value> = values
            .into_iter()
            .map(|(column, value)| (column.to_string(), value))
            .collect();
        let values = Rc::new(values);
        let mut state = self.state.borrow_mut();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(Rc::clone(&values));
        state.proxies.remove(table);
        MockRow {
            table: table.to_string(),
            values,
            proxy: None,
            store: self.clone(),
        }
    }

    /// Make the shared result set of `table` list its rows in `keys` order
    pub fn set_result_order<I, K>(&self, table: &str, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<RowKey>,
    {
        let mut state = self.state.borrow_mut();
        state
            .result_orders
            .insert(table.to_string(), keys.into_iter().map(Into::into).collect());
        state.proxies.remove(table);
    }

    /// Stop attaching result-set proxies to fetched rows
    pub fn disable_result_proxies(&self) {
        let mut state = self.state.borrow_mut();
        state.proxies_enabled = false;
        state.proxies.clear();
    }

    /// Make every navigation into `table` fail with [`QueryError::DataAccess`]
    pub fn fail_table(&self, table: &str) {
        self.state.borrow_mut().failing_tables.insert(table.to_string());
    }

    /// Recorded navigation calls, oldest first
    pub fn calls(&self) -> Vec<FetchCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        kind: FetchKind,
        table: &str,
        column: &str,
        strategy: Option<Strategy>,
        mut builder: QueryBuilder,
        filtering: Option<&Filtering>,
        candidates: Vec<Rc<BTreeMap<String, Value>>>,
    ) -> Result<Fetched<Vec<MockRow>>, QueryError> {
        let mut call = FetchCall {
            kind,
            table: table.to_string(),
            column: column.to_string(),
            strategy,
            sql: String::new(),
            outcome: FetchOutcome::Failed,
        };

        if self.state.borrow().failing_tables.contains(table) {
            call.sql = builder.to_sql();
            self.state.borrow_mut().record(call);
            return Err(QueryError::DataAccess(format!("table '{table}' is unavailable")));
        }

        let verdict = match filtering.map(|filtering| filtering.apply(&mut builder)) {
            Some(Ok(verdict)) => verdict,
            Some(Err(err)) => {
                call.sql = builder.to_sql();
                self.state.borrow_mut().record(call);
                return Err(err);
            }
            None => FilterVerdict::Continue,
        };
        call.sql = builder.to_sql();

        if let FilterVerdict::StrategyMismatch(reason) = verdict {
            call.outcome = FetchOutcome::StrategyMismatch;
            self.state.borrow_mut().record(call);
            return Ok(Fetched::StrategyMismatch(reason));
        }

        let candidates: Vec<_> = candidates
            .into_iter()
            .filter(|values| {
                builder
                    .equalities()
                    .iter()
                    .all(|(column, expected)| column_equals(values.get(column), expected))
            })
            .collect();
        let offset = builder.offset_value().unwrap_or(0) as usize;
        let limit = builder.limit_value().map_or(usize::MAX, |l| l as usize);
        let mut state = self.state.borrow_mut();
        let proxy = match kind {
            FetchKind::Referenced => state.proxy_for(table),
            FetchKind::Referencing if state.proxies_enabled => {
                let keys = candidates.iter().filter_map(|values| state.key_of(values));
                Some(ResultProxy::new(keys.collect::<Vec<_>>()))
            }
            FetchKind::Referencing => None,
        };
        let rows: Vec<MockRow> = candidates
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|values| MockRow {
                table: table.to_string(),
                values,
                proxy: proxy.clone(),
                store: self.clone(),
            })
            .collect();

        call.outcome = FetchOutcome::Rows(rows.len());
        state.record(call);
        Ok(Fetched::Rows(rows))
    }
}

/// SQL-style equality: a missing or NULL column never matches
fn column_equals(actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return false;
    };
    match (RowKey::from_value(actual), RowKey::from_value(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected && !is_null(actual),
    }
}

fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
    )
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockStore")
            .field("tables", &state.tables.keys().collect::<Vec<_>>())
            .field("calls", &state.calls.len())
            .finish()
    }
}

/// Row handle into a [`MockStore`]
#[derive(Clone)]
pub struct MockRow {
    table: String,
    values: Rc<BTreeMap<String, Value>>,
    proxy: Option<ResultProxy>,
    store: MockStore,
}

impl MockRow {
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Debug for MockRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRow")
            .field("table", &self.table)
            .field("values", &self.values)
            .finish()
    }
}

impl RowValues for MockRow {
    fn get(&self, column: &str) -> Option<Value> {
        self.values.get(column).cloned()
    }
}

impl Row for MockRow {
    fn referencing(
        &self,
        table: &str,
        column: &str,
        filtering: Option<&Filtering>,
        strategy: Option<Strategy>,
    ) -> Result<Fetched<Vec<Self>>, QueryError> {
        let primary_key = self.store.state.borrow().primary_key.clone();
        let own_key = self.get(&primary_key).ok_or_else(|| {
            QueryError::DataAccess(format!("row in '{}' has no '{primary_key}'", self.table))
        })?;

        let candidates: Vec<_> = self
            .store
            .state
            .borrow()
            .rows(table)
            .into_iter()
            .filter(|values| column_equals(values.get(column), &own_key))
            .collect();

        let mut builder = QueryBuilder::new(table);
        builder.where_eq(column, own_key);
        self.store.run(
            FetchKind::Referencing,
            table,
            column,
            strategy,
            builder,
            filtering,
            candidates,
        )
    }

    fn referenced(
        &self,
        table: &str,
        column: &str,
        filtering: Option<&Filtering>,
    ) -> Result<Fetched<Option<Self>>, QueryError> {
        let primary_key = self.store.state.borrow().primary_key.clone();
        let reference = self.get(column).filter(|value| RowKey::from_value(value).is_some());

        let candidates: Vec<_> = match &reference {
            Some(reference) => self
                .store
                .state
                .borrow()
                .rows(table)
                .into_iter()
                .filter(|values| column_equals(values.get(&primary_key), reference))
                .take(1)
                .collect(),
            None => Vec::new(),
        };

        let mut builder = QueryBuilder::new(table);
        if let Some(reference) = reference {
            builder.where_eq(primary_key, reference);
        }
        let fetched = self.store.run(
            FetchKind::Referenced,
            table,
            column,
            None,
            builder,
            filtering,
            candidates,
        )?;
        Ok(match fetched {
            Fetched::Rows(rows) => Fetched::Rows(rows.into_iter().next()),
            Fetched::StrategyMismatch(reason) => Fetched::StrategyMismatch(reason),
        })
    }

    fn result_proxy(&self) -> Option<ResultProxy> {
        self.proxy.clone()
    }
}
