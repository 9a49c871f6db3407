//! Bidirectional host/wire value conversion
//!
//! Binding resolves a wire tag first (declared tag wins over the
//! value's runtime shape) and converts second. Fetching normalizes
//! driver numerics into exact host values: whole numbers come back as
//! `Integer`, everything else as `Decimal`, never as a float.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use indexmap::IndexMap;
use plcall_core::{CursorHandle, PlcallError, Result, SqlTag, Value, WireValue};
use plcall_metadata::{ArgumentMetadata, Composite};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How naive database timestamps relate to host-side instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeZoneMode {
    /// Database session time is UTC; fetched timestamps become
    /// `TimestampUtc`
    Utc,
    /// Database session time is local wall-clock time; fetched
    /// timestamps stay naive
    Local,
}

/// A fetched value: either a plain host value or a live cursor handle
#[derive(Debug)]
pub enum HostValue {
    Value(Value),
    Cursor(CursorHandle),
}

impl HostValue {
    /// Unwrap the plain value, rejecting cursors
    pub fn into_value(self) -> Result<Value> {
        match self {
            HostValue::Value(value) => Ok(value),
            HostValue::Cursor(_) => Err(PlcallError::Bind(
                "fetched a ref cursor where a plain value was expected".into(),
            )),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            HostValue::Value(value) => Some(value),
            HostValue::Cursor(_) => None,
        }
    }

    pub fn into_cursor(self) -> Option<CursorHandle> {
        match self {
            HostValue::Cursor(cursor) => Some(cursor),
            HostValue::Value(_) => None,
        }
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        HostValue::Value(value)
    }
}

/// Map a catalog type name to the wire tag it binds under
pub fn tag_for_data_type(data_type: &str) -> Option<SqlTag> {
    match data_type {
        "NUMBER" | "NUMERIC" | "DECIMAL" | "DEC" => Some(SqlTag::Decimal),
        "INTEGER" | "INT" | "SMALLINT" | "PLS_INTEGER" | "BINARY_INTEGER" | "NATURAL"
        | "POSITIVE" => Some(SqlTag::Integer),
        "FLOAT" | "REAL" | "DOUBLE PRECISION" | "BINARY_FLOAT" | "BINARY_DOUBLE" => {
            Some(SqlTag::Float)
        }
        "VARCHAR" | "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" | "LONG" | "ROWID" => {
            Some(SqlTag::Varchar)
        }
        "CLOB" | "NCLOB" => Some(SqlTag::Clob),
        "BLOB" | "RAW" | "LONG RAW" => Some(SqlTag::Blob),
        "DATE" => Some(SqlTag::Date),
        // booleans travel as NUMBER 1/0
        "BOOLEAN" | "PL/SQL BOOLEAN" => Some(SqlTag::Decimal),
        "REF CURSOR" => Some(SqlTag::Cursor),
        "PL/SQL TABLE" | "TABLE" | "VARRAY" => Some(SqlTag::Array),
        "PL/SQL RECORD" | "OBJECT" => Some(SqlTag::Struct),
        other if other.starts_with("TIMESTAMP") => Some(SqlTag::Timestamp),
        _ => None,
    }
}

/// Converts host values to wire values and back
#[derive(Debug, Clone, Copy)]
pub struct TypeConverter {
    pub default_timezone: TimeZoneMode,
}

impl Default for TypeConverter {
    fn default() -> Self {
        Self {
            default_timezone: TimeZoneMode::Local,
        }
    }
}

impl TypeConverter {
    pub fn new(default_timezone: TimeZoneMode) -> Self {
        Self { default_timezone }
    }

    /// Convert a host value for binding.
    ///
    /// The declared tag, when present, overrides the tag derived from
    /// the value's shape; `Null` carries no shape and binds as a typed
    /// null of the declared tag, falling back to `Varchar`.
    pub fn host_to_wire(&self, value: &Value, declared: Option<SqlTag>) -> Result<WireValue> {
        let Some(tag) = declared.or_else(|| SqlTag::of_value(value)) else {
            return Ok(WireValue::Null(SqlTag::Varchar));
        };
        if value.is_null() {
            return Ok(WireValue::Null(tag));
        }
        match (value, tag) {
            (Value::Bool(flag), SqlTag::Decimal) => {
                Ok(WireValue::Decimal(Decimal::from(i64::from(*flag))))
            }
            (Value::Bool(flag), SqlTag::Integer) => Ok(WireValue::Integer(i64::from(*flag))),

            (Value::Integer(n), SqlTag::Integer) => Ok(WireValue::Integer(*n)),
            (Value::Integer(n), SqlTag::Decimal) => Ok(WireValue::Decimal(Decimal::from(*n))),
            (Value::Integer(n), SqlTag::Float) => Ok(WireValue::Float(*n as f64)),
            (Value::Integer(n), SqlTag::Varchar) => Ok(WireValue::Varchar(n.to_string())),

            (Value::Float(f), SqlTag::Float) => Ok(WireValue::Float(*f)),
            (Value::Float(f), SqlTag::Decimal) => Decimal::from_f64(*f)
                .map(WireValue::Decimal)
                .ok_or_else(|| {
                    PlcallError::Bind(format!("float {} has no exact decimal form", f))
                }),
            (Value::Float(f), SqlTag::Integer) => float_to_i64(*f)
                .map(WireValue::Integer)
                .ok_or_else(|| {
                    PlcallError::Bind(format!("float {} does not fit an integer bind", f))
                }),

            (Value::Decimal(d), SqlTag::Decimal) => Ok(WireValue::Decimal(*d)),
            (Value::Decimal(d), SqlTag::Integer) => {
                d.to_i64().filter(|_| d.fract().is_zero()).map(WireValue::Integer).ok_or_else(
                    || PlcallError::Bind(format!("decimal {} does not fit an integer bind", d)),
                )
            }
            (Value::Decimal(d), SqlTag::Float) => {
                d.to_f64().map(WireValue::Float).ok_or_else(|| {
                    PlcallError::Bind(format!("decimal {} does not fit a float bind", d))
                })
            }
            (Value::Decimal(d), SqlTag::Varchar) => Ok(WireValue::Varchar(d.to_string())),

            (Value::String(s), SqlTag::Varchar) => Ok(WireValue::Varchar(s.clone())),
            (Value::String(s), SqlTag::Clob) => Ok(WireValue::Clob(Some(s.clone()))),
            (Value::String(s), SqlTag::Decimal) => {
                s.trim().parse::<Decimal>().map(WireValue::Decimal).map_err(|_| {
                    PlcallError::Bind(format!("string {:?} is not a decimal number", s))
                })
            }
            (Value::String(s), SqlTag::Integer) => {
                s.trim().parse::<i64>().map(WireValue::Integer).map_err(|_| {
                    PlcallError::Bind(format!("string {:?} is not an integer", s))
                })
            }
            (Value::String(s), SqlTag::Float) => {
                s.trim().parse::<f64>().map(WireValue::Float).map_err(|_| {
                    PlcallError::Bind(format!("string {:?} is not a float", s))
                })
            }
            (Value::String(s), SqlTag::Date) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(WireValue::Date)
                .map_err(|_| PlcallError::Bind(format!("string {:?} is not a date", s))),

            (Value::Bytes(bytes), SqlTag::Blob) => Ok(WireValue::Blob(Some(bytes.clone()))),

            (Value::Date(date), SqlTag::Date) => Ok(WireValue::Date(*date)),
            (Value::Date(date), SqlTag::Timestamp) => {
                Ok(WireValue::Timestamp(date.and_time(NaiveTime::MIN)))
            }
            (Value::Timestamp(ts), SqlTag::Timestamp) => Ok(WireValue::Timestamp(*ts)),
            (Value::Timestamp(ts), SqlTag::Date) => Ok(WireValue::Date(ts.date())),
            (Value::TimestampUtc(ts), SqlTag::Timestamp) => {
                Ok(WireValue::Timestamp(self.naive_of(ts)))
            }
            (Value::TimestampUtc(ts), SqlTag::Date) => Ok(WireValue::Date(self.naive_of(ts).date())),

            (Value::Json(json), SqlTag::Varchar) => Ok(WireValue::Varchar(json.to_string())),
            (Value::Json(json), SqlTag::Clob) => Ok(WireValue::Clob(Some(json.to_string()))),

            (Value::Array(items), SqlTag::Array) => {
                let converted: Result<Vec<WireValue>> = items
                    .iter()
                    .map(|item| self.host_to_wire(item, None))
                    .collect();
                Ok(WireValue::Array(converted?))
            }
            (Value::Record(fields), SqlTag::Struct) => {
                let converted: Result<Vec<(String, WireValue)>> = fields
                    .iter()
                    .map(|(name, field)| {
                        Ok((name.to_uppercase(), self.host_to_wire(field, None)?))
                    })
                    .collect();
                Ok(WireValue::Struct(converted?))
            }

            (value, tag) => Err(PlcallError::Bind(format!(
                "cannot bind {} value as {}",
                value_shape(value),
                tag
            ))),
        }
    }

    /// Convert a host value against its declared argument metadata.
    ///
    /// Record shapes are validated before anything is bound: a field
    /// the declaration does not know is a schema mismatch, a declared
    /// field the value omits binds as a typed null. Struct fields are
    /// emitted in declared catalog order regardless of the host
    /// record's insertion order.
    pub fn host_to_wire_with_metadata(
        &self,
        value: &Value,
        meta: &ArgumentMetadata,
    ) -> Result<WireValue> {
        match &meta.composite {
            Composite::Record(fields) => {
                if value.is_null() {
                    return Ok(WireValue::Null(SqlTag::Struct));
                }
                let record = value.as_record().ok_or_else(|| {
                    PlcallError::SchemaMismatch(format!(
                        "expected a record value for {} parameter, got {}",
                        meta.data_type,
                        value_shape(value)
                    ))
                })?;
                for key in record.keys() {
                    if !fields.contains_key(&key.to_lowercase()) {
                        return Err(PlcallError::SchemaMismatch(format!(
                            "field {:?} is not declared on the record type",
                            key
                        )));
                    }
                }
                let mut converted = Vec::with_capacity(fields.len());
                for (name, field_meta) in fields {
                    let wire = match record_field(record, name) {
                        Some(field) => self.host_to_wire_with_metadata(field, field_meta)?,
                        None => WireValue::Null(
                            tag_for_data_type(&field_meta.data_type).unwrap_or(SqlTag::Varchar),
                        ),
                    };
                    converted.push((name.to_uppercase(), wire));
                }
                Ok(WireValue::Struct(converted))
            }
            Composite::Collection(element) => {
                if value.is_null() {
                    return Ok(WireValue::Null(SqlTag::Array));
                }
                let items = value.as_array().ok_or_else(|| {
                    PlcallError::SchemaMismatch(format!(
                        "expected an array value for {} parameter, got {}",
                        meta.data_type,
                        value_shape(value)
                    ))
                })?;
                let converted: Result<Vec<WireValue>> = items
                    .iter()
                    .map(|item| match element.as_deref() {
                        Some(element_meta) => self.host_to_wire_with_metadata(item, element_meta),
                        None => self.host_to_wire(item, None),
                    })
                    .collect();
                Ok(WireValue::Array(converted?))
            }
            Composite::RefCursor(_) => {
                if value.is_null() {
                    return Ok(WireValue::Null(SqlTag::Cursor));
                }
                Err(PlcallError::Bind(
                    "ref cursor parameters accept no input value".into(),
                ))
            }
            Composite::Scalar => self.host_to_wire(value, tag_for_data_type(&meta.data_type)),
        }
    }

    /// Convert a fetched wire value to its host form.
    ///
    /// Only a top-level `Cursor` yields a handle; a cursor nested in a
    /// collection or struct is rejected.
    pub fn wire_to_host(&self, wire: WireValue) -> Result<HostValue> {
        match wire {
            WireValue::Cursor(cursor) => Ok(HostValue::Cursor(cursor)),
            other => Ok(HostValue::Value(self.wire_to_value(other)?)),
        }
    }

    fn wire_to_value(&self, wire: WireValue) -> Result<Value> {
        Ok(match wire {
            WireValue::Null(_) => Value::Null,
            WireValue::Integer(n) => Value::Integer(n),
            WireValue::Float(f) => normalize_float(f)?,
            WireValue::Decimal(d) => normalize_decimal(d),
            WireValue::Varchar(s) => Value::String(s),
            // an empty LOB is an absent value, not an empty payload
            WireValue::Clob(None) | WireValue::Blob(None) => Value::Null,
            WireValue::Clob(Some(s)) => Value::String(s),
            WireValue::Blob(Some(bytes)) => Value::Bytes(bytes),
            WireValue::Date(date) => Value::Date(date),
            WireValue::Timestamp(ts) => match self.default_timezone {
                TimeZoneMode::Utc => Value::TimestampUtc(Utc.from_utc_datetime(&ts)),
                TimeZoneMode::Local => Value::Timestamp(ts),
            },
            WireValue::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.wire_to_value(item))
                    .collect::<Result<Vec<Value>>>()?,
            ),
            WireValue::Struct(fields) => {
                let mut record = IndexMap::with_capacity(fields.len());
                for (name, field) in fields {
                    record.insert(name.to_lowercase(), self.wire_to_value(field)?);
                }
                Value::Record(record)
            }
            WireValue::Cursor(_) => {
                return Err(PlcallError::Bind(
                    "ref cursor nested inside a composite value".into(),
                ));
            }
        })
    }

    fn naive_of(&self, ts: &DateTime<Utc>) -> NaiveDateTime {
        match self.default_timezone {
            TimeZoneMode::Utc => ts.naive_utc(),
            TimeZoneMode::Local => ts.with_timezone(&Local).naive_local(),
        }
    }
}

/// Whole numbers come back as `Integer`; a value too wide for i64
/// stays `Decimal` rather than saturating
fn normalize_decimal(d: Decimal) -> Value {
    if d.fract().is_zero() {
        if let Some(n) = d.to_i64() {
            return Value::Integer(n);
        }
    }
    Value::Decimal(d)
}

/// A fetched float normalizes like a decimal; one outside decimal
/// range has no exact host form and is rejected rather than returned
/// lossy
fn normalize_float(f: f64) -> Result<Value> {
    if let Some(n) = float_to_i64(f) {
        return Ok(Value::Integer(n));
    }
    Decimal::from_f64(f).map(Value::Decimal).ok_or_else(|| {
        PlcallError::Bind(format!("float {} has no exact host representation", f))
    })
}

/// Exact whole-float to i64. The upper bound is exclusive: every f64
/// at or above 2^63 is outside i64, including `i64::MAX as f64`
/// which rounds up to 2^63.
fn float_to_i64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn record_field<'a>(
    record: &'a IndexMap<String, Value>,
    name: &str,
) -> Option<&'a Value> {
    record
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

fn value_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Decimal(_) => "decimal",
        Value::String(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::Date(_) => "date",
        Value::Timestamp(_) | Value::TimestampUtc(_) => "timestamp",
        Value::Json(_) => "json",
        Value::Array(_) => "array",
        Value::Record(_) => "record",
    }
}
