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

#![allow(dead_code)]

use oracle_cursor::test_util::NativeCall;
use oracle_cursor::test_util::ScriptedNative;
use oracle_cursor::ColumnInfo;
use oracle_cursor::Connection;
use oracle_cursor::Value;
use oracle_cursor::VarType;
use std::env;
use std::rc::Rc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn env_var_or(env_name: &str, default: &str) -> String {
    match env::var_os(env_name) {
        Some(env_var) => env_var.into_string().unwrap(),
        None => String::from(default),
    }
}

pub fn main_user() -> String {
    env_var_or("ODPIC_TEST_MAIN_USER", "odpic")
}

pub fn main_password() -> String {
    env_var_or("ODPIC_TEST_MAIN_PASSWORD", "welcome")
}

pub fn connect_string() -> String {
    env_var_or("ODPIC_TEST_CONNECT_STRING", "localhost/orclpdb")
}

/// Installs a subscriber printing events selected by `RUST_LOG`.
pub fn init_logger() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Returns a scripted database and a connection on it.
pub fn connect() -> (Rc<ScriptedNative>, Connection) {
    init_logger();
    let native = Rc::new(ScriptedNative::new());
    let conn = Connection::new(native.clone());
    (native, conn)
}

/// Connects to a real server when the `odpi` feature is enabled.
#[cfg(feature = "odpi")]
pub fn connect_odpi() -> oracle_cursor::Result<Connection> {
    init_logger();
    Connection::connect(main_user(), main_password(), connect_string())
}

pub const EMP_SQL: &str = "select empno, ename from emp order by empno";

/// Registers `EMP_SQL` returning `n` rows.
pub fn add_emp_query(native: &ScriptedNative, n: i64) {
    native.add_query(
        EMP_SQL,
        vec![
            ColumnInfo::new("EMPNO", VarType::Int64, 0),
            ColumnInfo::new("ENAME", VarType::Varchar, 10),
        ],
        (1..=n)
            .map(|i| vec![Value::from(i), Value::from(format!("EMP{}", i))])
            .collect(),
    );
}

pub fn is_prepare(call: &NativeCall) -> bool {
    matches!(call, NativeCall::Prepare { .. })
}

pub fn is_execute(call: &NativeCall) -> bool {
    matches!(call, NativeCall::Execute { .. })
}

pub fn is_fetch(call: &NativeCall) -> bool {
    matches!(call, NativeCall::Fetch { .. })
}
