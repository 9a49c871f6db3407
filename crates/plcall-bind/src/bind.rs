//! Typed bind/fetch dispatch onto a prepared call statement
//!
//! Every bind goes through the closed tag set: the wire value selects
//! exactly one `BindTarget` method, and fetches select the getter from
//! the declared tag. No dispatch ever happens on type-name strings.

use crate::{HostValue, TypeConverter};
use plcall_core::{BindKey, BindTarget, PlcallError, Result, SqlTag, Value, WireValue};

/// Convert and bind one host value.
///
/// `Null` binds as a typed null of the declared tag, `Varchar` when
/// nothing is declared.
pub fn set_bind(
    converter: &TypeConverter,
    target: &mut dyn BindTarget,
    key: &BindKey,
    value: &Value,
    declared: Option<SqlTag>,
) -> Result<()> {
    let wire = converter.host_to_wire(value, declared)?;
    tracing::trace!(%key, tag = %wire.tag(), "binding parameter");
    write_wire(target, key, wire)
}

/// Bind an already-converted wire value
fn write_wire(target: &mut dyn BindTarget, key: &BindKey, wire: WireValue) -> Result<()> {
    match wire {
        WireValue::Null(tag) => target.set_null(key, tag),
        WireValue::Integer(n) => target.set_integer(key, n),
        WireValue::Float(f) => target.set_float(key, f),
        WireValue::Decimal(d) => target.set_decimal(key, d),
        WireValue::Varchar(s) => target.set_string(key, &s),
        WireValue::Clob(Some(s)) => target.set_clob(key, &s),
        WireValue::Clob(None) => target.set_null(key, SqlTag::Clob),
        WireValue::Blob(Some(bytes)) => target.set_blob(key, &bytes),
        WireValue::Blob(None) => target.set_null(key, SqlTag::Blob),
        WireValue::Date(date) => target.set_date(key, date),
        WireValue::Timestamp(ts) => target.set_timestamp(key, ts),
        WireValue::Array(items) => target.set_array(key, items),
        WireValue::Struct(fields) => target.set_struct(key, fields),
        WireValue::Cursor(_) => Err(PlcallError::Bind(
            "ref cursor values cannot be bound as input".into(),
        )),
    }
}

/// Fetch one OUT value under its declared tag and convert it back to
/// host form. SQL NULL fetches as `Value::Null` under every tag.
pub fn get_bind(
    converter: &TypeConverter,
    target: &mut dyn BindTarget,
    key: &BindKey,
    tag: SqlTag,
) -> Result<HostValue> {
    let wire = match tag {
        SqlTag::Integer => target.get_integer(key)?.map(WireValue::Integer),
        SqlTag::Float => target.get_float(key)?.map(WireValue::Float),
        SqlTag::Decimal => target.get_decimal(key)?.map(WireValue::Decimal),
        SqlTag::Varchar => target.get_string(key)?.map(WireValue::Varchar),
        SqlTag::Clob => target.get_clob(key)?.map(|s| WireValue::Clob(Some(s))),
        SqlTag::Blob => target.get_blob(key)?.map(|b| WireValue::Blob(Some(b))),
        SqlTag::Date => target.get_date(key)?.map(WireValue::Date),
        SqlTag::Timestamp => target.get_timestamp(key)?.map(WireValue::Timestamp),
        SqlTag::Array => target.get_array(key)?.map(WireValue::Array),
        SqlTag::Struct => target.get_struct(key)?.map(WireValue::Struct),
        SqlTag::Cursor => target.get_cursor(key)?.map(WireValue::Cursor),
    };
    match wire {
        Some(wire) => converter.wire_to_host(wire),
        None => Ok(HostValue::Value(Value::Null)),
    }
}
