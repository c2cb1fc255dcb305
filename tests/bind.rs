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

const INSERT_ID: &str = "INSERT INTO t(id) VALUES (:1)";

#[test]
fn positional_then_named_is_rejected() {
    let (_native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let sql = "insert into t(a) values (:a)";
    cursor.execute(sql, named_params! { "a" => 1 }).unwrap();
    let err = cursor.execute(sql, params![1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Programming);
    assert!(err.is_usage_error());

    let sql = "insert into t(a) values (:1)";
    cursor.execute(sql, params![1]).unwrap();
    let err = cursor.execute(sql, named_params! { "a" => 1 }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Programming);
}

#[test]
fn new_statement_starts_new_bind_table() {
    let (_native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor
        .execute("insert into t(a) values (:a)", named_params! { "a" => 1 })
        .unwrap();
    cursor
        .execute("insert into t(a) values (:1)", params![2])
        .unwrap();
    assert_eq!(cursor.bind_vars().len(), 1);
}

#[test]
fn executemany_empty_rows() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor.executemany(INSERT_ID, &[]).unwrap();
    assert_eq!(native.count(common::is_prepare), 1);
    assert_eq!(native.count(common::is_execute), 0);
}

#[test]
fn executemany_rejects_queries() {
    let (native, conn) = common::connect();
    common::add_emp_query(&native, 1);
    let mut cursor = conn.cursor();
    let err = cursor.executemany(common::EMP_SQL, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
    let err = cursor
        .executemany(common::EMP_SQL, &[params![1], params![2]])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
    assert_eq!(native.count(common::is_execute), 0);
}

#[test]
fn executemany_single_round_trip() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor
        .executemany(INSERT_ID, &[params![1], params![2], params![3]])
        .unwrap();
    assert_eq!(native.count(common::is_execute), 1);
    let executions = native.executions();
    assert_eq!(executions[0].num_iters, 3);
    assert_eq!(
        executions[0].binds,
        vec![vec![Value::from(1), Value::from(2), Value::from(3)]]
    );
    assert_eq!(cursor.rowcount(), Some(3));
}

#[test]
fn executemany_defers_null_typing() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor
        .executemany(
            "insert into t(id, name) values (:1, :2)",
            &[
                params![None::<i64>, "a"],
                params![5, None::<&str>],
                params![6, "c"],
            ],
        )
        .unwrap();
    let executions = native.executions();
    assert_eq!(
        executions[0].binds,
        vec![
            vec![Value::Null, Value::from(5), Value::from(6)],
            vec![Value::from("a"), Value::Null, Value::from("c")],
        ]
    );
    let vars = cursor.bind_vars();
    assert_eq!(vars[0].as_ref().map(|v| v.var_type()), Some(VarType::Int64));
    assert_eq!(vars[0].as_ref().map(|v| v.array_size()), Some(3));
}

#[test]
fn executemany_all_null_column() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor
        .executemany(INSERT_ID, &[params![None::<i64>], params![None::<i64>]])
        .unwrap();
    let vars = cursor.bind_vars();
    // the last row decides the type
    assert_eq!(vars[0].as_ref().map(|v| v.var_type()), Some(VarType::Varchar));
    assert_eq!(
        native.executions()[0].binds,
        vec![vec![Value::Null, Value::Null]]
    );
}

#[test]
fn executemany_size_overflow_is_fatal() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let err = cursor
        .executemany(
            "insert into t(name) values (:1)",
            &[params!["ab"], params!["abcdef"]],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfRange);
    assert_eq!(native.count(common::is_execute), 0);
}

#[test]
fn executemany_type_change_is_fatal() {
    let (_native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let err = cursor
        .executemany(INSERT_ID, &[params![1], params!["x"]])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTypeConversion);
}

#[test]
fn executemany_grows_existing_variables() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor.execute(INSERT_ID, params![1]).unwrap();
    let first = cursor.bind_vars()[0].clone().unwrap();
    assert_eq!(first.array_size(), 1);
    cursor
        .executemany(INSERT_ID, &[params![2], params![3]])
        .unwrap();
    let second = cursor.bind_vars()[0].clone().unwrap();
    assert!(!second.ptr_eq(&first));
    assert_eq!(second.array_size(), 2);
    assert_eq!(
        native.executions()[1].binds,
        vec![vec![Value::from(2), Value::from(3)]]
    );
}

#[test]
fn oversized_value_replaces_variable_at_first_position() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let sql = "insert into t(name) values (:1)";
    cursor.execute(sql, params!["ab"]).unwrap();
    let first = cursor.bind_vars()[0].clone().unwrap();
    cursor.execute(sql, params!["abcdef"]).unwrap();
    let second = cursor.bind_vars()[0].clone().unwrap();
    assert!(!second.ptr_eq(&first));
    assert_eq!(second.size(), 6);
    assert_eq!(
        native.executions()[1].binds,
        vec![vec![Value::from("abcdef")]]
    );
}

#[test]
fn variable_arguments_are_bound_as_is() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let var = cursor.var(VarType::Int64, None, None).unwrap();
    var.set_value(0, 42).unwrap();
    let sql = "insert into t(id) values (:1)";
    cursor.execute(sql, params![&var]).unwrap();
    assert!(cursor.bind_vars()[0].as_ref().unwrap().ptr_eq(&var));
    // kept in its slot and bound again on the next execute
    cursor.execute(sql, params![&var]).unwrap();
    assert_eq!(
        native.count(|c| matches!(c, NativeCall::BindByPos { .. })),
        2
    );
    assert_eq!(native.executions()[1].binds, vec![vec![Value::from(42)]]);
}

#[test]
fn setinputsizes_survives_prepare() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor
        .setinputsizes(
            vec![None, Some(VarSpec::new(VarType::Varchar).size(50))],
            Vec::new(),
        )
        .unwrap();
    cursor
        .execute("insert into t(a, b) values (:1, :2)", params![1, "x"])
        .unwrap();
    let vars = cursor.bind_vars();
    assert_eq!(vars[0].as_ref().map(|v| v.var_type()), Some(VarType::Int64));
    assert_eq!(vars[1].as_ref().map(|v| v.size()), Some(50));
    assert_eq!(
        native.executions()[0].binds,
        vec![vec![Value::from(1)], vec![Value::from("x")]]
    );

    // sizes apply to one statement only
    cursor
        .execute("insert into t(a, b) values (:1, :2) ", params![1, "x"])
        .unwrap();
    assert_eq!(cursor.bind_vars()[1].as_ref().map(|v| v.size()), Some(1));
}

#[test]
fn setinputsizes_named() {
    let (_native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let err = cursor
        .setinputsizes(
            vec![Some(VarSpec::new(VarType::Int64))],
            vec![("a".to_string(), VarSpec::new(VarType::Int64))],
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);

    cursor
        .setinputsizes(
            Vec::new(),
            vec![("a".to_string(), VarSpec::new(VarType::Double))],
        )
        .unwrap();
    let err = cursor
        .execute("insert into t(a) values (:a)", params![1])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Programming);
}

#[test]
fn input_type_handler_chooses_variable() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    cursor.set_input_type_handler(|val: &Value, num_elements: u32| -> Result<Option<VarSpec>> {
        assert_eq!(num_elements, 1);
        Ok(match val {
            Value::String(_) => Some(
                VarSpec::new(VarType::Varchar)
                    .size(100)
                    .in_converter(|val: Value| -> Result<Value> {
                        Ok(Value::String(val.to_string().to_uppercase()))
                    }),
            ),
            _ => None,
        })
    });
    cursor
        .execute("insert into t(a, b) values (:1, :2)", params!["smith", 1])
        .unwrap();
    let vars = cursor.bind_vars();
    assert_eq!(vars[0].as_ref().map(|v| v.size()), Some(100));
    assert_eq!(vars[1].as_ref().map(|v| v.size()), Some(8));
    assert_eq!(
        native.executions()[0].binds,
        vec![vec![Value::from("SMITH")], vec![Value::from(1)]]
    );
}
