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

use oracle_cursor::{params, Connection, Timestamp, VarType};

fn main() {
    let conn = Connection::connect("scott", "tiger", "").unwrap();
    let mut cursor = conn.cursor();
    cursor
        .execute(
            "select empno, ename, job, mgr, hiredate, sal, comm, deptno from emp",
            params![],
        )
        .unwrap();

    println!(" {:-30} {:-8} {}", "Name", "Null?", "Type");
    println!(" {:-30} {:-8} {}", "------------------------------", "--------", "----------------------------");
    for info in cursor.description().unwrap_or(&[]) {
        println!(" {:-30} {:-8} {}",
                 info.name(),
                 if info.nullable() {""} else {"NOT NULL"},
                 info.var_type());
    }
    println!();

    for row_result in cursor.rows().unwrap() {
        let row = row_result.unwrap();
        let empno: i32 = row.get(0).unwrap();  // index by 0-based position
        let ename: String = row.get("ENAME").unwrap(); // index by case-insensitive name
        let job: String = row.get(2).unwrap();
        let mgr: Option<i32> = row.get(3).unwrap(); // nullable column must be got as Option<...>
        let hiredate: Timestamp = row.get(4).unwrap();
        let sal: f64 = row.get(5).unwrap();
        let comm: Option<f64> = row.get(6).unwrap();
        let deptno: Option<i32> = row.get(7).unwrap();

        println!("{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                 empno,
                 ename,
                 job,
                 mgr.map_or("".to_string(), |v| v.to_string()),
                 hiredate,
                 sal,
                 comm.map_or("".to_string(), |v| v.to_string()),
                 deptno.map_or("".to_string(), |v| v.to_string()));
    }

    // Set/Get bind values
    let retval = cursor.var(VarType::Varchar, Some(5), None).unwrap();
    cursor.execute("begin :1 := :2; end;", params![&retval, 123]).unwrap();
    println!(":1 (as String) => {}", retval.get_value(0).unwrap().get::<String>().unwrap());
    println!(":1 (as i32) => {}", retval.get_value(0).unwrap().get::<i32>().unwrap());
    cursor.execute("begin :1 := :2; end;", params![&retval, None::<i32>]).unwrap();
    let val: Option<i32> = retval.get_value(0).unwrap().get().unwrap();
    println!(":1 is null? => {}", val.is_none());

    // Call a stored function
    let name = cursor
        .callfunc("dbms_random.string", VarType::Varchar, &["u".into(), 8.into()], Vec::new())
        .unwrap();
    println!("dbms_random.string('u', 8) => {}", name);
}
