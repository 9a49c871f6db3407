//! Driver-level value representation
//!
//! `WireValue` is what actually crosses the bind/fetch boundary, as
//! opposed to the host-side `Value`. The mapping between the two lives
//! in `plcall-bind`; this module only defines the closed tag set and
//! the wire shapes themselves.

use crate::{ColumnMeta, Result, Row, Value};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closed enumeration of bindable/fetchable SQL type tags
///
/// Dispatch always goes through this enum: an explicit declared tag
/// overrides the tag derived from a value's runtime shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlTag {
    Integer,
    Float,
    Decimal,
    Varchar,
    Clob,
    Blob,
    Date,
    Timestamp,
    Array,
    Struct,
    Cursor,
}

impl SqlTag {
    /// Derive a tag from a host value's runtime shape.
    ///
    /// Returns `None` for `Value::Null`, which carries no shape of its
    /// own; callers fall back to a declared tag or to `Varchar`.
    pub fn of_value(value: &Value) -> Option<SqlTag> {
        match value {
            Value::Null => None,
            // booleans travel as NUMBER 1/0
            Value::Bool(_) => Some(SqlTag::Decimal),
            Value::Integer(_) => Some(SqlTag::Integer),
            Value::Float(_) => Some(SqlTag::Float),
            Value::Decimal(_) => Some(SqlTag::Decimal),
            Value::String(_) => Some(SqlTag::Varchar),
            Value::Bytes(_) => Some(SqlTag::Blob),
            Value::Date(_) => Some(SqlTag::Date),
            Value::Timestamp(_) | Value::TimestampUtc(_) => Some(SqlTag::Timestamp),
            Value::Json(_) => Some(SqlTag::Varchar),
            Value::Array(_) => Some(SqlTag::Array),
            Value::Record(_) => Some(SqlTag::Struct),
        }
    }

    /// Tag name as used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            SqlTag::Integer => "INTEGER",
            SqlTag::Float => "FLOAT",
            SqlTag::Decimal => "DECIMAL",
            SqlTag::Varchar => "VARCHAR",
            SqlTag::Clob => "CLOB",
            SqlTag::Blob => "BLOB",
            SqlTag::Date => "DATE",
            SqlTag::Timestamp => "TIMESTAMP",
            SqlTag::Array => "ARRAY",
            SqlTag::Struct => "STRUCT",
            SqlTag::Cursor => "CURSOR",
        }
    }
}

impl std::fmt::Display for SqlTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A driver-level value
///
/// LOB payloads are `Option`: a `None` payload is the driver's
/// empty-LOB marker, which maps back to an absent host value rather
/// than an empty string or byte vector.
#[derive(Debug)]
pub enum WireValue {
    /// Typed NULL; the tag selects the driver's null-bind type code
    Null(SqlTag),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Varchar(String),
    Clob(Option<String>),
    Blob(Option<Vec<u8>>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Array(Vec<WireValue>),
    /// Struct fields in catalog column order
    Struct(Vec<(String, WireValue)>),
    Cursor(CursorHandle),
}

impl WireValue {
    /// The tag this wire value binds under
    pub fn tag(&self) -> SqlTag {
        match self {
            WireValue::Null(tag) => *tag,
            WireValue::Integer(_) => SqlTag::Integer,
            WireValue::Float(_) => SqlTag::Float,
            WireValue::Decimal(_) => SqlTag::Decimal,
            WireValue::Varchar(_) => SqlTag::Varchar,
            WireValue::Clob(_) => SqlTag::Clob,
            WireValue::Blob(_) => SqlTag::Blob,
            WireValue::Date(_) => SqlTag::Date,
            WireValue::Timestamp(_) => SqlTag::Timestamp,
            WireValue::Array(_) => SqlTag::Array,
            WireValue::Struct(_) => SqlTag::Struct,
            WireValue::Cursor(_) => SqlTag::Cursor,
        }
    }
}

impl PartialEq for WireValue {
    fn eq(&self, other: &Self) -> bool {
        use WireValue::*;
        match (self, other) {
            (Null(a), Null(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Varchar(a), Varchar(b)) => a == b,
            (Clob(a), Clob(b)) => a == b,
            (Blob(a), Blob(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Struct(a), Struct(b)) => a == b,
            // cursors are live driver state, never comparable
            (Cursor(_), Cursor(_)) => false,
            _ => false,
        }
    }
}

/// A lazily-consumed stream of rows backing a ref cursor
pub trait RowStream: Send {
    /// Column metadata of the open cursor
    fn columns(&self) -> &[ColumnMeta];

    /// Fetch the next row, `None` at end of stream
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Handle over an open ref cursor
///
/// Wraps the driver's row stream so fetched cursor values can be
/// iterated without materializing the whole result set.
pub struct CursorHandle {
    stream: Box<dyn RowStream>,
}

impl CursorHandle {
    pub fn new(stream: Box<dyn RowStream>) -> Self {
        Self { stream }
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        self.stream.columns()
    }

    /// Fetch the next row from the cursor
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        self.stream.next_row()
    }

    /// Drain the remaining rows into memory
    pub fn fetch_all(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.stream.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl Iterator for CursorHandle {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.next_row().transpose()
    }
}

impl std::fmt::Debug for CursorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorHandle")
            .field("columns", &self.stream.columns())
            .finish()
    }
}
