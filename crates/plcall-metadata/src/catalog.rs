//! Catalog argument rows
//!
//! The argument catalog delivers one flat, pre-ordered row per
//! parameter, return slot, or nested type member. `CatalogRow` is the
//! decoded form the builder consumes.

use crate::RoutineIdentity;
use plcall_core::{Connection, PlcallError, Result, Row, Value};
use serde::{Deserialize, Serialize};

/// Parameter direction as reported by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    /// True for directions that produce a value (`OUT` and `IN/OUT`)
    pub fn is_out(&self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }

    pub fn parse(raw: &str) -> Result<Direction> {
        match raw {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            "IN/OUT" => Ok(Direction::InOut),
            other => Err(PlcallError::MetadataDefect(format!(
                "unknown parameter direction {:?}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
            Direction::InOut => "IN/OUT",
        })
    }
}

/// One decoded argument-catalog row
///
/// Rows arrive pre-sorted by (overload, sequence); within an overload
/// the order is what makes level attachment work, so it must never be
/// re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// Per-overload discriminator assigned by the catalog, when the
    /// backend provides one
    pub subprogram_id: Option<i64>,
    /// Overload key; `None` for a routine with a single signature
    pub overload: Option<i32>,
    /// Argument name; `None` for a function's return slot and for
    /// collection element rows
    pub argument_name: Option<String>,
    /// 1-based ordinal within the row's nesting level
    pub position: Option<i32>,
    /// Nesting depth, 0 for top-level parameters
    pub data_level: i32,
    /// Catalog type name, e.g. `NUMBER` or `PL/SQL RECORD`
    pub data_type: String,
    pub direction: Direction,
    pub data_length: Option<i32>,
    pub data_precision: Option<i32>,
    pub data_scale: Option<i32>,
    /// `C` when the length facet counts characters, `B` for bytes
    pub char_used: Option<String>,
    pub char_length: Option<i32>,
    pub type_owner: Option<String>,
    pub type_name: Option<String>,
    pub type_subname: Option<String>,
}

/// Fetch the ordered argument row stream for a resolved routine
pub fn fetch_argument_rows(
    conn: &dyn Connection,
    identity: &RoutineIdentity,
) -> Result<Vec<CatalogRow>> {
    let Some(object_id) = identity.object_id else {
        // backends without an argument catalog present routines as
        // argumentless; the builder synthesizes the empty overload
        return Ok(Vec::new());
    };
    let rows = conn.query(
        "SELECT subprogram_id, TO_NUMBER(overload), argument_name, position, data_level, \
         data_type, in_out, data_length, data_precision, data_scale, char_used, \
         char_length, type_owner, type_name, type_subname \
         FROM all_arguments \
         WHERE object_id = :1 \
         AND owner = :2 \
         AND object_name = :3 \
         ORDER BY overload, sequence",
        &[
            Value::Integer(object_id),
            Value::String(identity.schema.clone()),
            Value::String(identity.routine.clone()),
        ],
    )?;
    rows.iter().map(decode_row).collect()
}

fn decode_row(row: &Row) -> Result<CatalogRow> {
    Ok(CatalogRow {
        subprogram_id: opt_i64(row, 0),
        overload: opt_i32(row, 1),
        argument_name: opt_string(row, 2),
        position: opt_i32(row, 3),
        data_level: opt_i32(row, 4).unwrap_or(0),
        data_type: opt_string(row, 5).ok_or_else(|| {
            PlcallError::MetadataDefect("argument row without a data type".into())
        })?,
        direction: Direction::parse(
            opt_string(row, 6)
                .ok_or_else(|| {
                    PlcallError::MetadataDefect("argument row without a direction".into())
                })?
                .as_str(),
        )?,
        data_length: opt_i32(row, 7),
        data_precision: opt_i32(row, 8),
        data_scale: opt_i32(row, 9),
        char_used: opt_string(row, 10),
        char_length: opt_i32(row, 11),
        type_owner: opt_string(row, 12),
        type_name: opt_string(row, 13),
        type_subname: opt_string(row, 14),
    })
}

fn opt_i64(row: &Row, index: usize) -> Option<i64> {
    row.get(index).and_then(Value::as_i64)
}

fn opt_i32(row: &Row, index: usize) -> Option<i32> {
    row.get(index)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
}

fn opt_string(row: &Row, index: usize) -> Option<String> {
    row.get(index).and_then(Value::as_str).map(str::to_string)
}
