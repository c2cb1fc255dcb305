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

use oracle_cursor::params;
use oracle_cursor::ColumnInfo;
use oracle_cursor::Result;
use oracle_cursor::ErrorKind;
use oracle_cursor::Row;
use oracle_cursor::RowValue;
use oracle_cursor::Value;
use oracle_cursor::VarType;
use std::rc::Rc;

#[test]
fn procmacro_ok_shadow() {
    #[allow(dead_code)]
    enum AnotherResult<T, E> {
        Ok(T),
        Err(E),
    }

    #[allow(unused_imports)]
    use AnotherResult::Ok;

    #[derive(Debug, RowValue)]
    struct Foo {}
}

fn upper_ename(val: &Value) -> Result<String> {
    Ok(val.get::<String>()?.to_uppercase())
}

#[derive(Debug, PartialEq, RowValue)]
struct Emp {
    empno: i64,
    #[row_value(rename = "ENAME")]
    name: String,
    #[row_value(with = "upper_ename")]
    job: String,
    mgr: Option<i64>,
}

#[test]
fn derived_row_value() {
    let (native, conn) = common::connect();
    let sql = "select empno, ename, job, mgr from emp order by empno";
    native.add_query(
        sql,
        vec![
            ColumnInfo::new("EMPNO", VarType::Int64, 0),
            ColumnInfo::new("ENAME", VarType::Varchar, 10),
            ColumnInfo::new("JOB", VarType::Varchar, 9),
            ColumnInfo::new("MGR", VarType::Int64, 0),
        ],
        vec![
            vec![
                Value::from(7839),
                Value::from("KING"),
                Value::from("president"),
                Value::Null,
            ],
            vec![
                Value::from(7566),
                Value::from("JONES"),
                Value::from("manager"),
                Value::from(7839),
            ],
        ],
    );
    let mut cursor = conn.cursor();
    cursor.execute(sql, params![]).unwrap();
    let emps = cursor
        .rows_as::<Emp>()
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(
        emps,
        vec![
            Emp {
                empno: 7839,
                name: "KING".to_string(),
                job: "PRESIDENT".to_string(),
                mgr: None,
            },
            Emp {
                empno: 7566,
                name: "JONES".to_string(),
                job: "MANAGER".to_string(),
                mgr: Some(7839),
            },
        ]
    );
}

#[derive(Debug, RowValue)]
struct EmpSal {
    #[row_value(rename = "ENAME")]
    name: String,
    sal: i64,
}

#[test]
fn derived_row_value_resolves_columns_first() {
    // NULL can't be read as String, but the missing SAL column is found first
    let row = Row::new(
        Rc::new(vec!["ENAME".to_string(), "EMPNO".to_string()]),
        vec![Value::Null, Value::from(7369)],
    );
    let err = row.get_as::<EmpSal>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidColumnName);

    let row = Row::new(
        Rc::new(vec!["SAL".to_string(), "ENAME".to_string()]),
        vec![Value::from(800), Value::from("SMITH")],
    );
    let emp = row.get_as::<EmpSal>().unwrap();
    assert_eq!(emp.name, "SMITH");
    assert_eq!(emp.sal, 800);
}
