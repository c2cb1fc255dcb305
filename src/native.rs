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

//! The call-level interface the cursor engine drives.
//!
//! Every function returns a status code in the style of ODPI-C and OCI.
//! Results are written to out-parameters. When a call returns
//! [`STATUS_FAILURE`], [`Native::error_info`] describes the failure until the
//! next call. The cursor engine never interprets handles; it only passes them
//! back to the library that issued them.

use crate::row::ColumnInfo;
use crate::value::Value;
use crate::variable::VarType;
use std::borrow::Cow;
use std::fmt;

/// The call completed.
pub const STATUS_SUCCESS: i32 = 0;
/// The call failed. Details are available from [`Native::error_info`].
pub const STATUS_FAILURE: i32 = -1;
/// A fetch found no further rows. Not an error.
pub const STATUS_NO_DATA: i32 = 100;

/// Opaque statement handle issued by a [`Native`] implementation
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RawStmt(pub usize);

/// Opaque variable handle issued by a [`Native`] implementation
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RawVar(pub usize);

impl fmt::Display for RawStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "stmt@{:#x}", self.0)
    }
}

/// Statement attributes queried by [`Native::stmt_attr`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StmtAttr {
    /// Rows affected by DML, or the cumulative number of rows fetched by a query
    RowCount,
    /// Number of select-list columns of an executed query
    ParamCount,
    /// Statement kind code as issued by the database (1 = SELECT, 2 = UPDATE, ...)
    StatementType,
    /// Parse error offset of the most recent failed execution
    ParseErrorOffset,
}

/// Execution mode passed to [`Native::stmt_execute`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecMode {
    Default,
    CommitOnSuccess,
}

/// Error detail of the most recent failed native call
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorInfo {
    pub code: i32,
    pub offset: u32,
    pub message: String,
    pub fn_name: Cow<'static, str>,
    pub action: Cow<'static, str>,
}

/// A call-level database library.
///
/// Handles are owned by the implementation. Statement handles come either
/// from [`prepare_stmt`](Native::prepare_stmt), which may hand out a cached
/// statement and must be given back with [`stmt_release`](Native::stmt_release),
/// or from a cursor-typed variable, in which case the cursor adopting it
/// frees it with [`stmt_free`](Native::stmt_free).
pub trait Native {
    /// Prepares `sql`, through the statement cache with `tag` when given.
    ///
    /// `stmt` may be overwritten even when the call fails.
    fn prepare_stmt(&self, sql: &str, tag: Option<&str>, stmt: &mut Option<RawStmt>) -> i32;

    /// Gives a prepared statement back to the statement cache.
    fn stmt_release(&self, stmt: RawStmt, tag: Option<&str>) -> i32;

    /// Frees a statement handle outright.
    fn stmt_free(&self, stmt: RawStmt) -> i32;

    /// Executes a statement. `num_iters` is 0 for queries and the number of
    /// bound array elements to process otherwise.
    fn stmt_execute(&self, stmt: RawStmt, num_iters: u32, mode: ExecMode) -> i32;

    /// Fetches up to `num_rows` rows into the define variables, returning
    /// [`STATUS_NO_DATA`] when the result set is exhausted.
    fn stmt_fetch(&self, stmt: RawStmt, num_rows: u32) -> i32;

    fn stmt_attr(&self, stmt: RawStmt, attr: StmtAttr, value: &mut u64) -> i32;

    /// Describes the select-list column at `pos` (one-based).
    fn stmt_column_info(&self, stmt: RawStmt, pos: u32, info: &mut ColumnInfo) -> i32;

    /// Binds a variable to the placeholder at `pos` (one-based).
    fn stmt_bind_by_pos(&self, stmt: RawStmt, pos: u32, var: RawVar) -> i32;

    fn stmt_bind_by_name(&self, stmt: RawStmt, name: &str, var: RawVar) -> i32;

    /// Makes `var` the fetch target of the column at `pos` (one-based).
    fn stmt_define(&self, stmt: RawStmt, pos: u32, var: RawVar) -> i32;

    /// Allocates a variable with `array_size` elements of `size` each.
    fn var_new(&self, var_type: VarType, array_size: u32, size: u32, var: &mut Option<RawVar>)
        -> i32;

    fn var_release(&self, var: RawVar) -> i32;

    /// Stores `value` at array position `pos` (zero-based). The value has
    /// already been checked against the variable's type and size.
    fn var_set(&self, var: RawVar, pos: u32, value: &Value) -> i32;

    /// Reads the value at array position `pos` (zero-based).
    fn var_get(&self, var: RawVar, pos: u32, value: &mut Value) -> i32;

    fn commit(&self) -> i32;

    fn rollback(&self) -> i32;

    /// Returns `false` once the underlying session is gone.
    fn is_connected(&self) -> bool;

    /// Returns the detail of the most recent failure.
    fn error_info(&self) -> ErrorInfo;
}
