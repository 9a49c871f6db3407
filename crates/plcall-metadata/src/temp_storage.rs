//! Session-scoped backing tables for package-local collections
//!
//! The driver cannot bind a collection type declared inside a package,
//! so values are staged through a global temporary table instead. One
//! table per affected parameter, created lazily and at most once per
//! overload per session.

use crate::{ArgumentMetadata, Composite, ProcedureMetadata};
use plcall_core::{Connection, PlcallError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Prefix of every generated backing table name
pub const TEMP_TABLE_PREFIX: &str = "plcall_tt_";

/// One queued backing table for a package-local collection parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempTableSpec {
    /// Parameter position within its overload
    pub position: i32,
    /// Per-overload discriminator (catalog subprogram id, or the
    /// overload key where the backend has none)
    pub discriminator: i64,
    /// The collection argument this table backs
    pub collection: ArgumentMetadata,
}

impl TempTableSpec {
    /// Generated relation name, collision-free across concurrent
    /// sessions and routines
    pub fn relation_name(&self, session_id: u64, object_id: i64) -> String {
        format!(
            "{}{}_{}_{}_{}",
            TEMP_TABLE_PREFIX, session_id, object_id, self.discriminator, self.position
        )
    }
}

/// Tracks which overloads already have their backing tables in place
/// for one session
///
/// Owned per (session, routine); never shared across sessions, since
/// the generated names embed the session id.
#[derive(Debug, Default)]
pub struct TempTables {
    created: HashSet<i32>,
}

impl TempTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the backing tables of an overload if not yet done in
    /// this session. Idempotent; a partial failure leaves the overload
    /// not-created so a retry re-attempts every entry.
    pub fn ensure_created(
        &mut self,
        conn: &dyn Connection,
        metadata: &ProcedureMetadata,
        overload: i32,
    ) -> Result<()> {
        if self.created.contains(&overload) {
            return Ok(());
        }
        let Some(overload_metadata) = metadata.overload(overload) else {
            return Ok(());
        };
        if !overload_metadata.temp_tables.is_empty() {
            // the object id keys the generated names; defaulting it
            // would let unrelated routines share a relation
            let object_id = metadata.identity().object_id.ok_or_else(|| {
                PlcallError::MetadataDefect(format!(
                    "routine {} queues temp storage but has no catalog object id",
                    metadata.identity().qualified_name()
                ))
            })?;
            let session_id = conn.session_id();
            for spec in &overload_metadata.temp_tables {
                let name = spec.relation_name(session_id, object_id);
                let sql = create_table_sql(&name, spec)?;
                tracing::debug!(table = %name, overload, "creating collection backing table");
                conn.execute_isolated(&sql)?;
            }
        }
        self.created.insert(overload);
        Ok(())
    }
}

fn create_table_sql(name: &str, spec: &TempTableSpec) -> Result<String> {
    let element = spec.collection.element().ok_or_else(|| {
        PlcallError::MetadataDefect(format!(
            "collection parameter at position {} has no element metadata",
            spec.position
        ))
    })?;

    let mut sql = format!("CREATE GLOBAL TEMPORARY TABLE {} (\n", name);
    match &element.composite {
        Composite::Record(fields) => {
            let mut sorted: Vec<(&String, &ArgumentMetadata)> = fields.iter().collect();
            sorted.sort_by_key(|(_, meta)| meta.position);
            let columns: Vec<String> = sorted
                .iter()
                .map(|(field, meta)| format!("{} {}", field, type_to_sql(meta)))
                .collect();
            sql.push_str(&columns.join(",\n"));
        }
        _ => {
            sql.push_str(&format!("element {}", type_to_sql(element)));
        }
    }
    // synthetic ordinal column preserving array order on insert/fetch
    sql.push_str(",\ni__ NUMBER(38)\n");
    sql.push_str(") ON COMMIT PRESERVE ROWS");
    Ok(sql)
}

/// Render an argument's type facets as a SQL column type.
///
/// Pure and deterministic; precision/scale/length formatting only.
pub fn type_to_sql(meta: &ArgumentMetadata) -> String {
    match meta.data_type.as_str() {
        "NUMBER" => match (meta.data_precision, meta.data_scale) {
            (Some(precision), Some(scale)) => format!("NUMBER({},{})", precision, scale),
            (Some(precision), None) => format!("NUMBER({})", precision),
            _ => "NUMBER".to_string(),
        },
        "VARCHAR2" | "CHAR" => {
            let length = match meta.char_used.as_deref() {
                Some("C") => meta.char_length.map(|l| format!("{} CHAR", l)),
                Some("B") => meta.data_length.map(|l| format!("{} BYTE", l)),
                _ => meta.data_length.map(|l| l.to_string()),
            };
            match length {
                Some(length) => format!("{}({})", meta.data_type, length),
                None => meta.data_type.clone(),
            }
        }
        "NVARCHAR2" | "NCHAR" => match meta.char_length {
            Some(length) => format!("{}({})", meta.data_type, length),
            None => meta.data_type.clone(),
        },
        "PL/SQL TABLE" | "TABLE" | "VARRAY" | "OBJECT" | "XMLTYPE" => meta
            .sql_type_name()
            .unwrap_or_else(|| meta.data_type.clone()),
        _ => meta.data_type.clone(),
    }
}

#[cfg(test)]
mod tests;
