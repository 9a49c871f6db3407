//! Connection and bind-target collaborator traits
//!
//! The engine drives one synchronous, blocking call at a time per
//! session; transport, pooling, transactions and cancellation all live
//! behind these traits on the driver side.

use crate::{CursorHandle, Result, Row, SqlTag, Value, WireValue};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog capability set of a backend
///
/// Selected once per schema handle; `Oracle` supports packages and
/// synonym indirection, `Minimal` only flat routine lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Oracle,
    Minimal,
}

/// The database connection collaborator
///
/// All session-scoped state the engine keeps (temp-table names,
/// created flags) is keyed by `session_id`, so two concurrent sessions
/// never collide on each other's temporary relations.
pub trait Connection: Send + Sync {
    /// Catalog capability set of this connection
    fn dialect(&self) -> Dialect;

    /// Stable identifier of the database session
    fn session_id(&self) -> u64;

    /// Run a catalog query, returning all rows in order
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a query expected to yield at most one interesting row
    fn select_first(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute a statement, returning the affected row count
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a single DDL statement in an isolated context that
    /// survives a later rollback of the caller's transaction
    fn execute_isolated(&self, sql: &str) -> Result<()>;
}

/// Positional or named bind key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindKey {
    /// 1-based bind position
    Index(usize),
    /// Bind name with the leading marker stripped
    Name(String),
}

impl BindKey {
    /// Parse a parameter token into a named key, stripping the leading
    /// `:` marker if present
    pub fn parse(token: &str) -> BindKey {
        BindKey::Name(token.trim_start_matches(':').to_string())
    }
}

impl From<usize> for BindKey {
    fn from(index: usize) -> Self {
        BindKey::Index(index)
    }
}

impl From<&str> for BindKey {
    fn from(token: &str) -> Self {
        BindKey::parse(token)
    }
}

impl std::fmt::Display for BindKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindKey::Index(i) => write!(f, "{}", i),
            BindKey::Name(n) => write!(f, ":{}", n),
        }
    }
}

/// A prepared call statement accepting typed set/get by position or name
///
/// One method pair per wire tag; the dispatch from `SqlTag` to the
/// concrete method is done by `plcall-bind`, never by string-built
/// method names. Getters return `None` for SQL NULL.
pub trait BindTarget {
    fn set_integer(&mut self, key: &BindKey, value: i64) -> Result<()>;
    fn set_float(&mut self, key: &BindKey, value: f64) -> Result<()>;
    fn set_decimal(&mut self, key: &BindKey, value: Decimal) -> Result<()>;
    fn set_string(&mut self, key: &BindKey, value: &str) -> Result<()>;
    fn set_clob(&mut self, key: &BindKey, value: &str) -> Result<()>;
    fn set_blob(&mut self, key: &BindKey, value: &[u8]) -> Result<()>;
    fn set_date(&mut self, key: &BindKey, value: NaiveDate) -> Result<()>;
    fn set_timestamp(&mut self, key: &BindKey, value: NaiveDateTime) -> Result<()>;
    fn set_array(&mut self, key: &BindKey, value: Vec<WireValue>) -> Result<()>;
    fn set_struct(&mut self, key: &BindKey, value: Vec<(String, WireValue)>) -> Result<()>;

    /// Bind an explicit null of the given target type
    fn set_null(&mut self, key: &BindKey, tag: SqlTag) -> Result<()>;

    fn get_integer(&mut self, key: &BindKey) -> Result<Option<i64>>;
    fn get_float(&mut self, key: &BindKey) -> Result<Option<f64>>;
    fn get_decimal(&mut self, key: &BindKey) -> Result<Option<Decimal>>;
    fn get_string(&mut self, key: &BindKey) -> Result<Option<String>>;
    fn get_clob(&mut self, key: &BindKey) -> Result<Option<String>>;
    fn get_blob(&mut self, key: &BindKey) -> Result<Option<Vec<u8>>>;
    fn get_date(&mut self, key: &BindKey) -> Result<Option<NaiveDate>>;
    fn get_timestamp(&mut self, key: &BindKey) -> Result<Option<NaiveDateTime>>;
    fn get_array(&mut self, key: &BindKey) -> Result<Option<Vec<WireValue>>>;
    fn get_struct(&mut self, key: &BindKey) -> Result<Option<Vec<(String, WireValue)>>>;
    fn get_cursor(&mut self, key: &BindKey) -> Result<Option<CursorHandle>>;
}
