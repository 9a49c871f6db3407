//! Tests for the argument-metadata builder

use super::*;
use plcall_core::PlcallError;
use pretty_assertions::assert_eq;

fn row(
    overload: Option<i32>,
    name: Option<&str>,
    position: Option<i32>,
    level: i32,
    data_type: &str,
    direction: Direction,
) -> CatalogRow {
    CatalogRow {
        subprogram_id: None,
        overload,
        argument_name: name.map(str::to_string),
        position,
        data_level: level,
        data_type: data_type.to_string(),
        direction,
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

fn with_type(
    mut row: CatalogRow,
    owner: &str,
    name: &str,
    subname: Option<&str>,
) -> CatalogRow {
    row.type_owner = Some(owner.to_string());
    row.type_name = Some(name.to_string());
    row.type_subname = subname.map(str::to_string);
    row
}

#[test]
fn simple_procedure_arguments() {
    let rows = vec![
        row(None, Some("P_ID"), Some(1), 0, "NUMBER", Direction::In),
        row(None, Some("P_NAME"), Some(2), 0, "VARCHAR2", Direction::Out),
    ];
    let (forest, overloaded) = build_overloads(rows).unwrap();
    assert!(!overloaded);
    let overload = &forest[&0];
    assert_eq!(
        overload.arguments.keys().collect::<Vec<_>>(),
        vec!["p_id", "p_name"]
    );
    assert_eq!(overload.arguments["p_id"].position, Some(1));
    assert_eq!(overload.arguments["p_name"].direction, Direction::Out);
    assert!(overload.return_value.is_none());
}

#[test]
fn function_return_slot_is_not_a_parameter() {
    let rows = vec![
        row(None, None, Some(0), 0, "NUMBER", Direction::Out),
        row(None, Some("P_IN"), Some(1), 0, "VARCHAR2", Direction::In),
    ];
    let (forest, _) = build_overloads(rows).unwrap();
    let overload = &forest[&0];
    assert_eq!(overload.arguments.len(), 1);
    let ret = overload.return_value.as_ref().unwrap();
    assert_eq!(ret.data_type, "NUMBER");
    assert_eq!(ret.direction, Direction::Out);
}

#[test]
fn record_fields_attach_in_catalog_order() {
    let rows = vec![
        row(None, Some("P_EMP"), Some(1), 0, "PL/SQL RECORD", Direction::In),
        row(None, Some("EMP_ID"), Some(1), 1, "NUMBER", Direction::In),
        row(None, Some("EMP_NAME"), Some(2), 1, "VARCHAR2", Direction::In),
    ];
    let (forest, _) = build_overloads(rows).unwrap();
    let record = &forest[&0].arguments["p_emp"];
    let fields = record.fields().unwrap();
    assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["emp_id", "emp_name"]);
    assert_eq!(fields["emp_name"].data_type, "VARCHAR2");
}

#[test]
fn collection_of_records_nests_two_levels() {
    let rows = vec![
        with_type(
            row(None, Some("P_ROWS"), Some(1), 0, "TABLE", Direction::In),
            "HR",
            "EMP_TAB",
            None,
        ),
        row(None, None, Some(1), 1, "PL/SQL RECORD", Direction::In),
        row(None, Some("ID"), Some(1), 2, "NUMBER", Direction::In),
        row(None, Some("NAME"), Some(2), 2, "VARCHAR2", Direction::In),
    ];
    let (forest, _) = build_overloads(rows).unwrap();
    let collection = &forest[&0].arguments["p_rows"];
    assert!(collection.is_collection());
    let element = collection.element().unwrap();
    let fields = element.fields().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["id"].data_type, "NUMBER");
}

#[test]
fn package_local_collection_queues_a_temp_table() {
    let mut collection = with_type(
        row(None, Some("P_IDS"), Some(2), 0, "PL/SQL TABLE", Direction::In),
        "HR",
        "EMP_PKG",
        Some("T_IDS"),
    );
    collection.subprogram_id = Some(7);
    let rows = vec![
        collection,
        row(None, None, Some(1), 1, "NUMBER", Direction::In),
    ];
    let (forest, _) = build_overloads(rows).unwrap();
    let temp_tables = &forest[&0].temp_tables;
    assert_eq!(temp_tables.len(), 1);
    assert_eq!(temp_tables[0].position, 2);
    assert_eq!(temp_tables[0].discriminator, 7);
    assert_eq!(temp_tables[0].collection.element().unwrap().data_type, "NUMBER");
}

#[test]
fn temp_table_discriminator_falls_back_to_overload_key() {
    let rows = vec![
        with_type(
            row(Some(3), Some("P_IDS"), Some(1), 0, "PL/SQL TABLE", Direction::In),
            "HR",
            "EMP_PKG",
            Some("T_IDS"),
        ),
        row(Some(3), None, Some(1), 1, "NUMBER", Direction::In),
    ];
    let (forest, overloaded) = build_overloads(rows).unwrap();
    assert!(overloaded);
    assert_eq!(forest[&3].temp_tables[0].discriminator, 3);
}

#[test]
fn nested_package_collection_is_rejected() {
    let rows = vec![
        row(None, Some("P_REC"), Some(1), 0, "PL/SQL RECORD", Direction::In),
        with_type(
            row(None, Some("IDS"), Some(1), 1, "PL/SQL TABLE", Direction::In),
            "HR",
            "EMP_PKG",
            Some("T_IDS"),
        ),
    ];
    let err = build_overloads(rows).unwrap_err();
    assert!(matches!(err, PlcallError::UnsupportedType { .. }));
}

#[test]
fn package_local_object_rejected_only_on_default_overload() {
    let object_row = |overload| {
        with_type(
            row(overload, Some("P_OBJ"), Some(1), 0, "OBJECT", Direction::In),
            "HR",
            "EMP_PKG",
            Some("T_OBJ"),
        )
    };

    let err = build_overloads(vec![object_row(None)]).unwrap_err();
    match err {
        PlcallError::UnsupportedType { type_name, .. } => {
            assert_eq!(type_name, "HR.EMP_PKG.T_OBJ");
        }
        other => panic!("expected UnsupportedType, got {other:?}"),
    }

    // the same shape on a non-default overload builds without error so
    // callers of the other overloads are not blocked
    let rows = vec![
        row(Some(1), Some("P_ID"), Some(1), 0, "NUMBER", Direction::In),
        object_row(Some(2)),
    ];
    let (forest, overloaded) = build_overloads(rows).unwrap();
    assert!(overloaded);
    assert!(forest[&2].arguments.contains_key("p_obj"));
}

#[test]
fn child_row_without_parent_level_is_a_defect() {
    let rows = vec![row(None, Some("FIELD"), Some(1), 2, "NUMBER", Direction::In)];
    let err = build_overloads(rows).unwrap_err();
    assert!(matches!(err, PlcallError::MetadataDefect(_)));
}

#[test]
fn no_rows_synthesizes_empty_default_overload() {
    let (forest, overloaded) = build_overloads(Vec::new()).unwrap();
    assert!(!overloaded);
    assert_eq!(forest.len(), 1);
    assert!(forest[&0].arguments.is_empty());
    assert!(forest[&0].return_value.is_none());
}

#[test]
fn degenerate_unnamed_in_row_is_skipped() {
    let rows = vec![row(None, None, None, 0, "VARCHAR2", Direction::In)];
    let (forest, _) = build_overloads(rows).unwrap();
    assert!(forest[&0].arguments.is_empty());
    assert!(forest[&0].return_value.is_none());
}

#[test]
fn ref_cursor_keeps_declared_row_shape() {
    let rows = vec![
        row(None, Some("P_CUR"), Some(1), 0, "REF CURSOR", Direction::Out),
        row(None, None, Some(1), 1, "PL/SQL RECORD", Direction::Out),
        row(None, Some("ID"), Some(1), 2, "NUMBER", Direction::Out),
    ];
    let (forest, _) = build_overloads(rows).unwrap();
    let cursor = &forest[&0].arguments["p_cur"];
    assert!(matches!(cursor.composite, Composite::RefCursor(Some(_))));
    assert!(cursor.element().unwrap().fields().unwrap().contains_key("id"));
}

#[test]
fn flattened_tree_reproduces_input_row_count() {
    // well-formed stream: every level-L row's parent precedes it
    let rows = vec![
        row(None, None, Some(0), 0, "NUMBER", Direction::Out), // return slot
        row(None, Some("P_REC"), Some(1), 0, "PL/SQL RECORD", Direction::In),
        row(None, Some("A"), Some(1), 1, "NUMBER", Direction::In),
        row(None, Some("B"), Some(2), 1, "VARCHAR2", Direction::In),
        row(None, Some("P_TAB"), Some(2), 0, "TABLE", Direction::In),
        row(None, None, Some(1), 1, "NUMBER", Direction::In),
    ];
    let input_rows = rows.len();
    let (forest, _) = build_overloads(rows).unwrap();
    let overload = &forest[&0];
    let parameter_nodes: usize = overload
        .arguments
        .values()
        .map(ArgumentMetadata::node_count)
        .sum();
    // the synthesized return-slot row is counted separately
    assert_eq!(parameter_nodes + 1, input_rows);
}

#[test]
fn sql_type_name_elides_public_owner() {
    let public = TypeRef {
        owner: "PUBLIC".into(),
        name: "DBMS_SQL".into(),
        subname: Some("NUMBER_TABLE".into()),
    };
    assert_eq!(public.sql_type_name(), "DBMS_SQL.NUMBER_TABLE");
    let owned = TypeRef {
        owner: "HR".into(),
        name: "EMP_PKG".into(),
        subname: Some("T_IDS".into()),
    };
    assert_eq!(owned.sql_type_name(), "HR.EMP_PKG.T_IDS");
    assert!(owned.in_package());
}
