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

use oracle_cursor::*;

#[test]
fn callfunc_builds_anonymous_block() {
    let (native, conn) = common::connect();
    native.add_plsql("begin :1 := pkg.f (:2); end;", |args: &mut Vec<Value>| {
        let n = args[1].get::<i64>()?;
        args[0] = Value::from(n * 10);
        Ok(())
    });
    let mut cursor = conn.cursor();
    let val = cursor
        .callfunc("pkg.f", VarType::Int64, &[5.into()], Vec::new())
        .unwrap();
    assert_eq!(val, Value::from(50));

    let executions = native.executions();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].sql, "begin :1 := pkg.f (:2); end;");
    assert_eq!(executions[0].num_iters, 1);
    // return slot first, then the argument
    assert_eq!(
        executions[0].binds,
        vec![vec![Value::Null], vec![Value::from(5)]]
    );
    assert_eq!(cursor.statement_type(), StatementType::Begin);
}

#[test]
fn callproc_with_keyword_arguments() {
    let (native, conn) = common::connect();
    native.add_plsql(
        "begin emp_pkg.hire (:1,:2,dept => :3,active => :4 = 1); end;",
        |args: &mut Vec<Value>| {
            assert_eq!(args[2], Value::from(30));
            assert_eq!(args[3], Value::from(true));
            args[1] = Value::from(format!("{} hired", args[1].get::<String>()?));
            Ok(())
        },
    );
    let mut cursor = conn.cursor();
    let name = cursor.var(VarType::Varchar, Some(40), None).unwrap();
    name.set_value(0, "SCOTT").unwrap();
    let results = cursor
        .callproc(
            "emp_pkg.hire",
            &[BindArg::from(7788), BindArg::from(&name)],
            vec![
                ("dept".to_string(), BindArg::from(30)),
                ("active".to_string(), BindArg::from(true)),
            ],
        )
        .unwrap();
    assert_eq!(
        results,
        vec![
            Value::from(7788),
            Value::from("SCOTT hired"),
            Value::from(30),
            Value::from(true),
        ]
    );
    assert_eq!(name.get_value(0).unwrap(), Value::from("SCOTT hired"));
}

#[test]
fn callproc_without_arguments() {
    let (native, conn) = common::connect();
    let mut cursor = conn.cursor();
    let results = cursor.callproc("dbms_output.enable", &[], Vec::new()).unwrap();
    assert!(results.is_empty());
    assert_eq!(native.executions()[0].sql, "begin dbms_output.enable (); end;");
}

#[test]
fn callfunc_error_is_returned() {
    let (native, conn) = common::connect();
    native.add_plsql("begin :1 := f (:2); end;", |_args: &mut Vec<Value>| {
        Err(Error::new(ErrorKind::InvalidArgument, "ORA-06502: numeric or value error"))
    });
    let mut cursor = conn.cursor();
    let err = cursor
        .callfunc("f", VarType::Varchar, &["x".into()], Vec::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Database);
    assert!(err.to_string().contains("ORA-06502"));

    cursor.close().unwrap();
    let err = cursor
        .callfunc("f", VarType::Varchar, &["x".into()], Vec::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);
}
