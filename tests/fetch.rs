// Rust-oracle - Rust binding for Oracle database
//
// URL: https://github.com/kubo/rust-oracle
//
//-----------------------------------------------------------------------------
// Copyright (c) 2017-2018 Kubo Takehiro <kubo@jiubao.org>. All rights reserved.
// This program is free software: you can modify it and/or redistribute it
// under the terms of:
//
// (i)  the Universal Permissive License v 1.0 or at your option, any
//      later version (http://oss.oracle.com/licenses/upl); and/or
//
// (ii) the Apache License v 2.0. (http://www.apache.org/licenses/LICENSE-2.0)
//-----------------------------------------------------------------------------

mod common;

use oracle_cursor::test_util::NativeCall;
use oracle_cursor::*;
use std::rc::Rc;

#[test]
fn select_two_columns() {
    let (native, conn) = common::connect();
    let sql = "SELECT id, name FROM t";
    native.add_query(
        sql,
        vec![
            ColumnInfo::new("ID", VarType::Int64, 0).with_nullable(false),
            ColumnInfo::new("NAME", VarType::Varchar, 20),
        ],
        vec![
            vec![Value::from(1), Value::from("one")],
            vec![Value::from(2), Value::from("two")],
        ],
    );
    let mut cursor = conn.cursor();
    cursor.prepare(sql, None).unwrap();
    assert_eq!(cursor.statement_type(), StatementType::Select);
    cursor.execute("", params![]).unwrap();

    let description = cursor.description().unwrap();
    assert_eq!(description.len(), 2);
    assert_eq!(description[0].name(), "ID");
    assert!(!description[0].nullable());
    assert_eq!(cursor.fetch_vars().len(), 2);
    assert_eq!(native.count(|c| matches!(c, NativeCall::Define { .. })), 2);

    assert_eq!(
        cursor.fetchone().unwrap().unwrap().get_as::<(i64, String)>().unwrap(),
        (1, "one".to_string())
    );
    assert_eq!(cursor.rowcount(), Some(1));
    let rows = cursor.fetchall().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<_, String>("name").unwrap(), "two");
    assert_eq!(cursor.rowcount(), Some(2));
}

#[test]
fn execute_returns_cursor_for_queries() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 3);
    let mut cursor = conn.cursor();
    let rows = cursor
        .execute(common::EMP_SQL, params![])
        .unwrap()
        .unwrap()
        .fetchall()
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert!(cursor
        .execute("delete from emp", params![])
        .unwrap()
        .is_none());
    assert!(cursor.description().is_none());
}

#[test]
fn end_of_data_is_idempotent() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 3);
    let mut cursor = conn.cursor();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.fetchall().unwrap().len(), 3);
    assert!(cursor.fetchone().unwrap().is_none());
    assert!(cursor.fetchone().unwrap().is_none());
    assert!(cursor.fetchall().unwrap().is_empty());
    // the short batch ended the result set
    assert_eq!(native.count(common::is_fetch), 1);
    assert_eq!(cursor.rowcount(), Some(3));
}

#[test]
fn result_set_ending_on_batch_boundary() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 4);
    let mut cursor = conn.cursor_builder().arraysize(2).build();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    let empnos = cursor
        .rows_as::<i64>()
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(empnos, vec![1, 2, 3, 4]);
    assert!(cursor.fetchone().unwrap().is_none());
    // two full batches and an empty one
    assert_eq!(native.count(common::is_fetch), 3);
    assert!(native
        .calls()
        .iter()
        .filter(|c| common::is_fetch(c))
        .all(|c| matches!(c, NativeCall::Fetch { num_rows: 2, .. })));
}

#[test]
fn fetchmany_sizes() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 7);
    let mut cursor = conn.cursor_builder().arraysize(3).build();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.fetchmany(2).unwrap().len(), 2);
    // zero means arraysize
    let rows = cursor.fetchmany(0).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get::<_, i64>(0).unwrap(), 3);
    assert_eq!(cursor.fetchmany(10).unwrap().len(), 2);
    assert!(cursor.fetchmany(10).unwrap().is_empty());
}

#[test]
fn executing_again_restarts_fetch() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 2);
    let mut cursor = conn.cursor();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.fetchall().unwrap().len(), 2);
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.rowcount(), Some(0));
    assert_eq!(cursor.fetchall().unwrap().len(), 2);
    // columns are defined once per prepared query
    assert_eq!(native.count(|c| matches!(c, NativeCall::Define { .. })), 2);
}

#[test]
fn fetch_requires_query() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let mut cursor = conn.cursor();
    let err = cursor.fetchone().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);

    cursor.execute("delete from emp", params![]).unwrap();
    let err = cursor.fetchall().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);

    cursor.execute(common::EMP_SQL, params![]).unwrap();
    cursor.close().unwrap();
    let err = cursor.fetchone().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);
}

#[test]
fn row_factory_rewrites_rows() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 2);
    let mut cursor = conn
        .cursor_builder()
        .row_factory(|row: Row| -> Result<Row> {
            let mut values = row.values().to_vec();
            values.reverse();
            let mut names = row.column_names().to_vec();
            names.reverse();
            Ok(Row::new(Rc::new(names), values))
        })
        .build();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    let row = cursor.fetchone().unwrap().unwrap();
    assert_eq!(row.get_as::<(String, i64)>().unwrap(), ("EMP1".to_string(), 1));
    assert_eq!(row.get::<_, i64>("EMPNO").unwrap(), 1);

    cursor.clear_row_factory();
    let row = cursor.fetchone().unwrap().unwrap();
    assert_eq!(row.get::<_, i64>(0).unwrap(), 2);
}

#[test]
fn row_factory_error_is_returned() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let mut cursor = conn.cursor();
    cursor.set_row_factory(|_row: Row| -> Result<Row> {
        Err(Error::new(ErrorKind::InvalidArgument, "rejected"))
    });
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    let err = cursor.fetchone().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn column_errors() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let mut cursor = conn.cursor();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    let row = cursor.fetchone().unwrap().unwrap();
    assert_eq!(
        row.get::<_, i64>(2).unwrap_err().kind(),
        ErrorKind::InvalidColumnIndex
    );
    assert_eq!(
        row.get::<_, i64>("SAL").unwrap_err().kind(),
        ErrorKind::InvalidColumnName
    );
    assert_eq!(
        row.get::<_, i64>("ENAME").unwrap_err().kind(),
        ErrorKind::InvalidTypeConversion
    );
}

#[test]
fn null_columns() {
    let (native, conn) = common::connect();
    let sql = "select comm from emp";
    native.add_query(
        sql,
        vec![ColumnInfo::new("COMM", VarType::Int64, 0)],
        vec![vec![Value::Null]],
    );
    let mut cursor = conn.cursor();
    cursor.execute(sql, params![]).unwrap();
    let row = cursor.fetchone().unwrap().unwrap();
    assert_eq!(row.get::<_, Option<i64>>(0).unwrap(), None);
    assert_eq!(
        row.get::<_, i64>(0).unwrap_err().kind(),
        ErrorKind::NullValue
    );
}

#[test]
fn setoutputsize_applies_to_next_define() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let other_sql = "select ename from emp";
    native.add_query(
        other_sql,
        vec![ColumnInfo::new("ENAME", VarType::Varchar, 10)],
        vec![vec![Value::from("KING")]],
    );
    let mut cursor = conn.cursor();
    cursor.setoutputsize(100, Some(1));
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.fetch_vars()[0].size(), 8);
    assert_eq!(cursor.fetch_vars()[1].size(), 100);

    // consumed by the execute above
    cursor.execute(other_sql, params![]).unwrap();
    assert_eq!(cursor.fetch_vars()[0].size(), 10);

    cursor.setoutputsize(30, None);
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.fetch_vars()[1].size(), 30);
}

#[test]
fn output_type_handler_chooses_variable() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let mut cursor = conn.cursor_builder().arraysize(5).build();
    cursor.set_output_type_handler(|column: &ColumnInfo, array_size: u32| -> Result<Option<VarSpec>> {
        assert_eq!(array_size, 5);
        if column.name() != "ENAME" {
            return Ok(None);
        }
        Ok(Some(
            VarSpec::new(VarType::Varchar)
                .size(column.size())
                .out_converter(|val: Value| -> Result<Value> {
                    Ok(Value::String(val.to_string().to_lowercase()))
                }),
        ))
    });
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    assert_eq!(cursor.fetch_vars()[0].array_size(), 5);
    let (empno, ename) = cursor
        .fetchone_as::<(i64, String)>()
        .unwrap()
        .unwrap();
    assert_eq!(empno, 1);
    assert_eq!(ename, "emp1");
}

#[test]
fn ref_cursor_from_plsql() {
    let (native, conn) = common::connect();
    let sql = "begin open_emps(:1); end;";
    native.add_ref_cursor(
        sql,
        1,
        vec![
            ColumnInfo::new("EMPNO", VarType::Int64, 0),
            ColumnInfo::new("ENAME", VarType::Varchar, 10),
        ],
        vec![
            vec![Value::from(7369), Value::from("SMITH")],
            vec![Value::from(7499), Value::from("ALLEN")],
        ],
    );
    let mut cursor = conn.cursor();
    let out = cursor.var(VarType::Cursor, None, None).unwrap();
    cursor.execute(sql, params![&out]).unwrap();
    let stmt: native::RawStmt = out.get_value(0).unwrap().get().unwrap();

    let mut emps = conn.ref_cursor(stmt);
    assert_eq!(emps.statement_type(), StatementType::Unknown);
    let rows = emps.fetchall().unwrap();
    assert_eq!(emps.statement_type(), StatementType::Select);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get::<_, String>("ename").unwrap(), "ALLEN");
    assert_eq!(emps.rowcount(), Some(2));
    assert_eq!(emps.description().map(|d| d.len()), Some(2));

    drop(emps);
    // owned by the adopting cursor: freed, not given back to the cache
    assert_eq!(
        native.count(|c| matches!(c, NativeCall::StmtFree { stmt: s } if *s == stmt)),
        1
    );
    assert_eq!(
        native.count(|c| matches!(c, NativeCall::StmtRelease { stmt: s, .. } if *s == stmt)),
        0
    );
}

#[test]
fn prepared_query_not_executed() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let mut cursor = conn.cursor();
    cursor.prepare(common::EMP_SQL, None).unwrap();
    let err = cursor.fetchone().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);
    assert_eq!(err.to_string(), "query not executed");
    assert_eq!(native.count(common::is_fetch), 0);

    cursor.execute("delete from emp", params![]).unwrap();
    let err = cursor.fetchone().unwrap_err();
    assert_eq!(err.to_string(), "not a query");
}

#[test]
fn prefetch_runs_once_per_batch() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 3);
    let mut cursor = conn.cursor_builder().arraysize(2).build();
    cursor.execute(common::EMP_SQL, params![]).unwrap();
    let fetch_nums = |cursor: &Cursor| -> Vec<u32> {
        cursor.fetch_vars().iter().map(|var| var.fetch_num()).collect()
    };
    assert_eq!(fetch_nums(&cursor), vec![0, 0]);

    assert!(cursor.fetchone().unwrap().is_some());
    assert_eq!(fetch_nums(&cursor), vec![1, 1]);
    assert!(cursor.fetchone().unwrap().is_some());
    assert_eq!(fetch_nums(&cursor), vec![1, 1]);

    // the third row needs the second batch
    assert!(cursor.fetchone().unwrap().is_some());
    assert_eq!(fetch_nums(&cursor), vec![2, 2]);

    // a short batch ends the result set without another fetch
    assert!(cursor.fetchone().unwrap().is_none());
    assert_eq!(fetch_nums(&cursor), vec![2, 2]);
}

#[test]
fn cursor_column_is_cleared_before_each_fetch() {
    let (native, conn) = common::connect();
    let sql = "select cursor(select ename from emp) from dept";
    native.add_query(
        sql,
        vec![ColumnInfo::new("EMPS", VarType::Cursor, 0)],
        vec![
            vec![Value::Cursor(native::RawStmt(0x501))],
            vec![Value::Cursor(native::RawStmt(0x502))],
            vec![Value::Cursor(native::RawStmt(0x503))],
        ],
    );
    let mut cursor = conn.cursor_builder().arraysize(2).build();
    cursor.execute(sql, params![]).unwrap();
    let var = cursor.fetch_vars()[0].clone();
    assert_eq!(var.var_type(), VarType::Cursor);

    cursor.fetchone().unwrap();
    assert_eq!(var.fetch_num(), 1);
    assert_eq!(var.get_value(1).unwrap(), Value::Cursor(native::RawStmt(0x502)));

    cursor.fetchone().unwrap();
    let row = cursor.fetchone().unwrap().unwrap();
    assert_eq!(var.fetch_num(), 2);
    assert_eq!(row.values()[0], Value::Cursor(native::RawStmt(0x503)));
    // the second batch has one row; the handle left from the first batch is gone
    assert_eq!(var.get_value(1).unwrap(), Value::Null);
}
