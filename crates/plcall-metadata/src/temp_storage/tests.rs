//! Tests for temp-storage materialization

use super::*;
use crate::{CatalogRow, Direction, Resolution, RoutineIdentity, TypeRef};
use plcall_core::{Connection, Dialect, Result, Row, Value};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Connection that records issued DDL and can fail a number of times
struct DdlRecorder {
    session_id: u64,
    issued: Mutex<Vec<String>>,
    failures_left: AtomicU32,
}

impl DdlRecorder {
    fn new(session_id: u64) -> Self {
        Self {
            session_id,
            issued: Mutex::new(Vec::new()),
            failures_left: AtomicU32::new(0),
        }
    }

    fn failing_once(session_id: u64) -> Self {
        let recorder = Self::new(session_id);
        recorder.failures_left.store(1, Ordering::SeqCst);
        recorder
    }

    fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }
}

impl Connection for DdlRecorder {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn session_id(&self) -> u64 {
        self.session_id
    }

    fn query(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
        Ok(0)
    }

    fn execute_isolated(&self, sql: &str) -> Result<()> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PlcallError::StorageCreation("simulated DDL failure".into()));
        }
        self.issued.lock().unwrap().push(sql.to_string());
        Ok(())
    }
}

fn identity() -> RoutineIdentity {
    RoutineIdentity {
        schema: "HR".into(),
        package: Some("EMP_PKG".into()),
        routine: "BULK_LOAD".into(),
        resolution: Resolution::Direct,
        object_id: Some(1021),
    }
}

fn row(
    name: Option<&str>,
    position: Option<i32>,
    level: i32,
    data_type: &str,
) -> CatalogRow {
    CatalogRow {
        subprogram_id: Some(4),
        overload: None,
        argument_name: name.map(str::to_string),
        position,
        data_level: level,
        data_type: data_type.to_string(),
        direction: Direction::In,
        data_length: None,
        data_precision: None,
        data_scale: None,
        char_used: None,
        char_length: None,
        type_owner: None,
        type_name: None,
        type_subname: None,
    }
}

/// Routine with one package-local table-of-records parameter
fn metadata_with_record_collection() -> ProcedureMetadata {
    let mut collection = row(Some("P_EMPS"), Some(1), 0, "PL/SQL TABLE");
    collection.type_owner = Some("HR".into());
    collection.type_name = Some("EMP_PKG".into());
    collection.type_subname = Some("T_EMPS".into());
    let mut id_field = row(Some("ID"), Some(1), 2, "NUMBER");
    id_field.data_precision = Some(10);
    let mut name_field = row(Some("NAME"), Some(2), 2, "VARCHAR2");
    name_field.data_length = Some(30);
    let rows = vec![
        collection,
        row(None, Some(1), 1, "PL/SQL RECORD"),
        id_field,
        name_field,
    ];
    ProcedureMetadata::build(identity(), rows).unwrap()
}

fn metadata_with_scalar_collection() -> ProcedureMetadata {
    let mut collection = row(Some("P_IDS"), Some(1), 0, "PL/SQL TABLE");
    collection.type_owner = Some("HR".into());
    collection.type_name = Some("EMP_PKG".into());
    collection.type_subname = Some("T_IDS".into());
    let mut element = row(None, Some(1), 1, "NUMBER");
    element.data_precision = Some(10);
    let rows = vec![collection, element];
    ProcedureMetadata::build(identity(), rows).unwrap()
}

#[test]
fn ddl_issued_exactly_once_per_overload() {
    let conn = DdlRecorder::new(11);
    let metadata = metadata_with_record_collection();
    let mut temp_tables = TempTables::new();
    temp_tables.ensure_created(&conn, &metadata, 0).unwrap();
    temp_tables.ensure_created(&conn, &metadata, 0).unwrap();
    assert_eq!(conn.issued().len(), 1);
}

#[test]
fn record_element_ddl_lists_fields_by_position() {
    let conn = DdlRecorder::new(11);
    let metadata = metadata_with_record_collection();
    TempTables::new()
        .ensure_created(&conn, &metadata, 0)
        .unwrap();
    let sql = conn.issued().remove(0);
    assert_eq!(
        sql,
        "CREATE GLOBAL TEMPORARY TABLE plcall_tt_11_1021_4_1 (\n\
         id NUMBER(10),\n\
         name VARCHAR2(30),\n\
         i__ NUMBER(38)\n\
         ) ON COMMIT PRESERVE ROWS"
    );
}

#[test]
fn scalar_element_ddl_uses_single_element_column() {
    let conn = DdlRecorder::new(11);
    let metadata = metadata_with_scalar_collection();
    TempTables::new()
        .ensure_created(&conn, &metadata, 0)
        .unwrap();
    let sql = conn.issued().remove(0);
    assert!(sql.contains("element NUMBER(10)"));
    assert!(sql.contains("i__ NUMBER(38)"));
    assert!(sql.ends_with("ON COMMIT PRESERVE ROWS"));
}

#[test]
fn concurrent_sessions_get_disjoint_names() {
    let metadata = metadata_with_scalar_collection();
    let first = DdlRecorder::new(11);
    let second = DdlRecorder::new(22);
    TempTables::new().ensure_created(&first, &metadata, 0).unwrap();
    TempTables::new().ensure_created(&second, &metadata, 0).unwrap();
    let first_sql = first.issued().remove(0);
    let second_sql = second.issued().remove(0);
    assert!(first_sql.contains("plcall_tt_11_"));
    assert!(second_sql.contains("plcall_tt_22_"));
    assert_ne!(first_sql, second_sql);
}

#[test]
fn failed_ddl_leaves_overload_not_created() {
    let conn = DdlRecorder::failing_once(11);
    let metadata = metadata_with_scalar_collection();
    let mut temp_tables = TempTables::new();
    assert!(temp_tables.ensure_created(&conn, &metadata, 0).is_err());
    // the retry starts over and issues the DDL again
    temp_tables.ensure_created(&conn, &metadata, 0).unwrap();
    assert_eq!(conn.issued().len(), 1);
    temp_tables.ensure_created(&conn, &metadata, 0).unwrap();
    assert_eq!(conn.issued().len(), 1);
}

#[test]
fn queued_storage_without_object_id_is_a_defect() {
    let conn = DdlRecorder::new(11);
    let mut anonymous = identity();
    anonymous.object_id = None;

    let mut collection = row(Some("P_IDS"), Some(1), 0, "PL/SQL TABLE");
    collection.type_owner = Some("HR".into());
    collection.type_name = Some("EMP_PKG".into());
    collection.type_subname = Some("T_IDS".into());
    let element = row(None, Some(1), 1, "NUMBER");
    let metadata = ProcedureMetadata::build(anonymous, vec![collection, element]).unwrap();

    let err = TempTables::new()
        .ensure_created(&conn, &metadata, 0)
        .unwrap_err();
    assert!(matches!(err, PlcallError::MetadataDefect(_)));
    assert!(conn.issued().is_empty());
}

#[test]
fn no_object_id_without_collections_stays_a_noop() {
    let conn = DdlRecorder::new(11);
    let mut anonymous = identity();
    anonymous.object_id = None;
    let metadata = ProcedureMetadata::build(anonymous, Vec::new()).unwrap();
    TempTables::new()
        .ensure_created(&conn, &metadata, 0)
        .unwrap();
    assert!(conn.issued().is_empty());
}

#[test]
fn overload_without_collections_is_a_noop() {
    let conn = DdlRecorder::new(11);
    let metadata = ProcedureMetadata::build(identity(), Vec::new()).unwrap();
    TempTables::new()
        .ensure_created(&conn, &metadata, 0)
        .unwrap();
    assert!(conn.issued().is_empty());
}

#[test]
fn type_to_sql_formats_facets() {
    let meta = |data_type: &str| ArgumentMetadata {
        position: Some(1),
        data_type: data_type.to_string(),
        direction: Direction::In,
        data_length: None,
        data_precision: None,
        data_scale: None,
        char_used: None,
        char_length: None,
        type_ref: None,
        composite: Composite::Scalar,
    };

    let mut number = meta("NUMBER");
    assert_eq!(type_to_sql(&number), "NUMBER");
    number.data_precision = Some(10);
    assert_eq!(type_to_sql(&number), "NUMBER(10)");
    number.data_scale = Some(2);
    assert_eq!(type_to_sql(&number), "NUMBER(10,2)");

    let mut varchar = meta("VARCHAR2");
    varchar.data_length = Some(100);
    assert_eq!(type_to_sql(&varchar), "VARCHAR2(100)");
    varchar.char_used = Some("C".into());
    varchar.char_length = Some(50);
    assert_eq!(type_to_sql(&varchar), "VARCHAR2(50 CHAR)");
    varchar.char_used = Some("B".into());
    assert_eq!(type_to_sql(&varchar), "VARCHAR2(100 BYTE)");

    let mut nvarchar = meta("NVARCHAR2");
    nvarchar.char_length = Some(15);
    assert_eq!(type_to_sql(&nvarchar), "NVARCHAR2(15)");

    assert_eq!(type_to_sql(&meta("DATE")), "DATE");

    let mut varray = meta("VARRAY");
    varray.type_ref = Some(TypeRef {
        owner: "HR".into(),
        name: "T_NUMBERS".into(),
        subname: None,
    });
    assert_eq!(type_to_sql(&varray), "HR.T_NUMBERS");
}
