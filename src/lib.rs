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

/*!
A client-side database cursor engine for [Oracle database][] over a
handle-based call-level interface.

A [`Cursor`] prepares a statement, binds Rust values to its placeholders,
executes it once or for many rows of arguments in a single round trip,
fetches query results batch by batch and builds rows from them. Stored
procedures and functions are called through generated anonymous PL/SQL
blocks.

The native library is reached through the [`Native`](native::Native) trait.
The `odpi` feature provides an implementation on top of [ODPI-C][].

## Usage

Put this in your `Cargo.toml`:

```text
[dependencies]
oracle-cursor = { version = "0.1.0", features = ["odpi"] }
```

When you need to fetch or bind [chrono](https://docs.rs/chrono/0.4/chrono/)
data types, enable `chrono` feature too.

## Examples

Executes a select statement and gets rows:

```no_run
# use oracle_cursor::*;
# fn try_main() -> Result<()> {
let conn = Connection::connect("scott", "tiger", "//localhost/XE")?;
let mut cursor = conn.cursor();

let sql = "select ename, sal, comm from emp where deptno = :1";
cursor.execute(sql, params![30])?;
for row_result in cursor.rows()? {
    let row = row_result?;
    // get a column value by position (0-based)
    let ename: String = row.get(0)?;
    // get a column by name (case-insensitive)
    let sal: i64 = row.get("sal")?;
    // Use `Option<...>` to get a nullable column.
    let comm: Option<i64> = row.get(2)?;

    println!(" {:14}| {:>10}    | {:>10}    |",
             ename, sal, comm.map_or("".to_string(), |v| v.to_string()));
}
# Ok(())
# }
```

Inserts many rows in one round trip:

```no_run
# use oracle_cursor::*;
# fn try_main() -> Result<()> {
let conn = Connection::connect("scott", "tiger", "//localhost/XE")?;
let mut cursor = conn.cursor();

cursor.executemany(
    "insert into emp(empno, ename, comm) values (:1, :2, :3)",
    &[
        params![113, "John", None::<i64>],
        params![114, "Smith", 300],
    ],
)?;
assert_eq!(cursor.rowcount(), Some(2));
conn.commit()?;
# Ok(())
# }
```

Calls a stored function:

```no_run
# use oracle_cursor::*;
# fn try_main() -> Result<()> {
let conn = Connection::connect("scott", "tiger", "//localhost/XE")?;
let mut cursor = conn.cursor();

let name = cursor.callfunc("dbms_random.string", VarType::Varchar, &["x".into(), 10.into()], Vec::new())?;
println!("{}", name);
# Ok(())
# }
```

## Logging

Statement preparation, execution, fetching and handle lifetimes are
reported through the [`tracing`](https://docs.rs/tracing) crate at the
`debug` and `trace` levels.

[Oracle database]: https://www.oracle.com/database/index.html
[ODPI-C]: https://oracle.github.io/odpi/
*/

#![cfg_attr(docsrs, feature(doc_cfg))]

use std::result;

mod bind;
#[cfg(feature = "chrono")]
#[cfg_attr(docsrs, doc(cfg(feature = "chrono")))]
mod chrono;
mod connection;
mod cursor;
mod error;
mod fetch;
pub mod native;
#[cfg(feature = "odpi")]
#[cfg_attr(docsrs, doc(cfg(feature = "odpi")))]
pub mod odpi;
mod procedure;
mod row;
mod statement;
#[doc(hidden)]
pub mod test_util;
mod value;
mod variable;

pub use crate::bind::BindArg;
pub use crate::bind::KeywordArgs;
pub use crate::bind::Params;
pub use crate::connection::Connection;
pub use crate::cursor::Cursor;
pub use crate::cursor::CursorBuilder;
pub use crate::cursor::DEFAULT_ARRAY_SIZE;
pub use crate::cursor::DEFAULT_BIND_ARRAY_SIZE;
pub use crate::error::DbError;
pub use crate::error::Error;
pub use crate::error::ErrorKind;
pub use crate::row::ColumnIndex;
pub use crate::row::ColumnInfo;
pub use crate::row::Row;
pub use crate::row::RowFactory;
pub use crate::row::RowValue;
pub use crate::row::Rows;
pub use crate::row::RowsAs;
pub use crate::statement::StatementType;
pub use crate::value::FromValue;
pub use crate::value::Timestamp;
pub use crate::value::Value;
pub use crate::variable::InConverter;
pub use crate::variable::InputTypeHandler;
pub use crate::variable::OutConverter;
pub use crate::variable::OutputTypeHandler;
pub use crate::variable::VarSpec;
pub use crate::variable::VarType;
pub use crate::variable::Variable;
pub use crate::variable::MAX_BINARY_SIZE;
pub use crate::variable::MAX_STRING_SIZE;

/// Derives [`RowValue`] for a struct with named fields.
///
/// Each field is read from the column named after the field in upper case.
///
/// ```
/// # use oracle_cursor::*;
/// # use oracle_cursor::test_util::ScriptedNative;
/// # use std::rc::Rc;
/// # let native = Rc::new(ScriptedNative::new());
/// # native.add_query("select empno, ename, mgr from emp",
/// #     vec![ColumnInfo::new("EMPNO", VarType::Int64, 0),
/// #          ColumnInfo::new("ENAME", VarType::Varchar, 10),
/// #          ColumnInfo::new("MGR", VarType::Int64, 0)],
/// #     vec![vec![Value::from(7839), Value::from("KING"), Value::Null]]);
/// # let conn = Connection::new(native.clone());
/// #[derive(RowValue)]
/// struct Emp {
///     empno: i64,
///     #[row_value(rename = "ENAME")]
///     name: String,
///     mgr: Option<i64>,
/// }
///
/// let mut cursor = conn.cursor();
/// cursor.execute("select empno, ename, mgr from emp", params![])?;
/// let emp = cursor.fetchone_as::<Emp>()?.unwrap();
/// assert_eq!(emp.name, "KING");
/// assert_eq!(emp.mgr, None);
/// # Ok::<(), Error>(())
/// ```
pub use oracle_cursor_procmacro::RowValue;

pub type Result<T> = result::Result<T, Error>;
