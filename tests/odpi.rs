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

#![cfg(feature = "odpi")]

mod common;

use oracle_cursor::*;

#[test]
#[ignore = "requires an Oracle server"]
fn select_from_dual() -> Result<()> {
    let conn = common::connect_odpi()?;
    let mut cursor = conn.cursor();
    cursor.execute(
        "select :1 + 1, 'x' || :2, sysdate from dual",
        params![1, "y"],
    )?;
    let row = cursor.fetchone()?.unwrap();
    assert_eq!(row.get::<_, i64>(0)?, 2);
    assert_eq!(row.get::<_, String>(1)?, "xy");
    assert!(row.get::<_, Timestamp>(2)?.year() >= 2017);
    assert!(cursor.fetchone()?.is_none());
    Ok(())
}

#[test]
#[ignore = "requires an Oracle server"]
fn call_builtin_function() -> Result<()> {
    let conn = common::connect_odpi()?;
    let mut cursor = conn.cursor();
    let val = cursor.callfunc(
        "dbms_random.string",
        VarType::Varchar,
        &["x".into(), 10.into()],
        Vec::new(),
    )?;
    assert_eq!(val.get::<String>()?.len(), 10);
    Ok(())
}

#[test]
#[ignore = "requires an Oracle server"]
fn parse_error_offset() -> Result<()> {
    let conn = common::connect_odpi()?;
    let mut cursor = conn.cursor();
    let err = cursor
        .execute("select 1 from dual where", params![])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Database);
    assert!(err.db_error().map_or(0, |e| e.offset()) > 0);
    Ok(())
}
