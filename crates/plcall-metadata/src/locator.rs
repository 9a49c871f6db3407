//! Routine lookup over the backend catalog
//!
//! Two capability variants selected once per schema handle: the
//! Oracle-style locator understands packages and synonym indirection,
//! the minimal locator only does a flat name lookup.

use crate::{Resolution, RoutineIdentity};
use plcall_core::{Connection, Dialect, PlcallError, Result, Row, Value};

/// Resolves a routine name to its catalog identity
///
/// `find` returns `Ok(None)` when nothing matches; absence is an
/// expected outcome, not a failure.
pub trait ProcedureLocator: Send + Sync {
    fn find(
        &self,
        conn: &dyn Connection,
        schema: &str,
        routine: &str,
        package: Option<&str>,
        override_schema: Option<&str>,
    ) -> Result<Option<RoutineIdentity>>;
}

/// Pick the locator matching a connection's capability set
pub fn locator_for(dialect: Dialect) -> &'static dyn ProcedureLocator {
    match dialect {
        Dialect::Oracle => &OracleLocator,
        Dialect::Minimal => &MinimalLocator,
    }
}

/// Oracle-style lookup: direct, then synonym, or package member
pub struct OracleLocator;

impl ProcedureLocator for OracleLocator {
    fn find(
        &self,
        conn: &dyn Connection,
        schema: &str,
        routine: &str,
        package: Option<&str>,
        override_schema: Option<&str>,
    ) -> Result<Option<RoutineIdentity>> {
        let schema = schema.to_uppercase();
        let routine = routine.to_uppercase();

        let Some(package) = package else {
            if let Some(row) = conn.select_first(
                "SELECT object_id FROM all_objects \
                 WHERE owner = :1 \
                 AND object_name = :2 \
                 AND object_type IN ('PROCEDURE','FUNCTION')",
                &[
                    Value::String(schema.clone()),
                    Value::String(routine.clone()),
                ],
            )? {
                return Ok(Some(RoutineIdentity {
                    schema,
                    package: None,
                    routine,
                    resolution: Resolution::Direct,
                    object_id: Some(column_i64(&row, 0)?),
                }));
            }

            // not owned directly, search synonyms; the caller's own
            // synonym wins over a PUBLIC one on a tie
            if let Some(row) = conn.select_first(
                "SELECT o.owner, o.object_name, o.object_id, s.owner \
                 FROM all_synonyms s, all_objects o \
                 WHERE s.owner IN (:1, 'PUBLIC') \
                 AND s.synonym_name = :2 \
                 AND o.owner = s.table_owner \
                 AND o.object_name = s.table_name \
                 AND o.object_type IN ('PROCEDURE','FUNCTION') \
                 ORDER BY DECODE(s.owner, 'PUBLIC', 1, 0)",
                &[
                    Value::String(schema.clone()),
                    Value::String(routine.clone()),
                ],
            )? {
                return Ok(Some(RoutineIdentity {
                    schema: column_string(&row, 0)?,
                    package: None,
                    routine: column_string(&row, 1)?,
                    resolution: Resolution::Synonym {
                        owner: column_string(&row, 3)?,
                    },
                    object_id: Some(column_i64(&row, 2)?),
                }));
            }

            tracing::debug!(schema = %schema, routine = %routine, "routine not found");
            return Ok(None);
        };

        let owner = override_schema
            .map(str::to_uppercase)
            .unwrap_or_else(|| schema.clone());
        let package = package.to_uppercase();
        if let Some(row) = conn.select_first(
            "SELECT o.object_id FROM all_procedures p, all_objects o \
             WHERE p.owner = :1 \
             AND p.object_name = :2 \
             AND p.procedure_name = :3 \
             AND o.owner = p.owner \
             AND o.object_name = p.object_name \
             AND o.object_type = 'PACKAGE'",
            &[
                Value::String(owner.clone()),
                Value::String(package.clone()),
                Value::String(routine.clone()),
            ],
        )? {
            Ok(Some(RoutineIdentity {
                schema: owner,
                package: Some(package),
                routine,
                resolution: Resolution::Direct,
                object_id: Some(column_i64(&row, 0)?),
            }))
        } else {
            tracing::debug!(
                schema = %owner, package = %package, routine = %routine,
                "package routine not found"
            );
            Ok(None)
        }
    }
}

/// Flat lookup against an information_schema-style routine catalog;
/// no packages, no synonyms
pub struct MinimalLocator;

impl ProcedureLocator for MinimalLocator {
    fn find(
        &self,
        conn: &dyn Connection,
        schema: &str,
        routine: &str,
        package: Option<&str>,
        _override_schema: Option<&str>,
    ) -> Result<Option<RoutineIdentity>> {
        if package.is_some() {
            tracing::debug!(routine = %routine, "packages not supported by this backend");
            return Ok(None);
        }
        let schema = schema.to_uppercase();
        let routine = routine.to_uppercase();
        if let Some(row) = conn.select_first(
            "SELECT routine_name FROM information_schema.routines \
             WHERE UPPER(routine_schema) = :1 \
             AND UPPER(routine_name) = :2",
            &[
                Value::String(schema.clone()),
                Value::String(routine.clone()),
            ],
        )? {
            Ok(Some(RoutineIdentity {
                schema,
                package: None,
                routine: column_string(&row, 0)?,
                resolution: Resolution::Direct,
                object_id: None,
            }))
        } else {
            Ok(None)
        }
    }
}

fn column_i64(row: &Row, index: usize) -> Result<i64> {
    row.get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| PlcallError::Query(format!("expected numeric catalog column {}", index)))
}

fn column_string(row: &Row, index: usize) -> Result<String> {
    row.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PlcallError::Query(format!("expected text catalog column {}", index)))
}
