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

use crate::chkerr;
use crate::native::Native;
use crate::native::RawStmt;
use crate::native::StmtAttr;
use crate::native::STATUS_SUCCESS;
use crate::Error;
use crate::Result;
use std::fmt;
use tracing::debug;

/// Statement type returned by [Cursor.statement_type()](crate::Cursor::statement_type).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatementType {
    /// SELECT statement
    Select,

    /// INSERT statement
    Insert,

    /// UPDATE statement
    Update,

    /// DELETE statement
    Delete,

    /// MERGE statement
    Merge,

    /// CREATE statement
    Create,

    /// ALTER statement
    Alter,

    /// DROP statement
    Drop,

    /// PL/SQL statement without declare clause
    Begin,

    /// PL/SQL statement with declare clause
    Declare,

    /// CALL statement
    Call,

    /// COMMIT statement
    Commit,

    /// ROLLBACK statement
    Rollback,

    /// Statement kind codes without a dedicated variant
    Other(u32),

    /// No statement has been prepared, or the kind hasn't been queried yet
    /// such as for a cursor populated as a REF CURSOR.
    Unknown,
}

impl StatementType {
    /// Maps the statement kind code reported by the database.
    pub(crate) fn from_code(code: u64) -> StatementType {
        match code {
            1 => StatementType::Select,
            2 => StatementType::Update,
            3 => StatementType::Delete,
            4 => StatementType::Insert,
            5 => StatementType::Create,
            6 => StatementType::Drop,
            7 => StatementType::Alter,
            8 => StatementType::Begin,
            9 => StatementType::Declare,
            10 => StatementType::Call,
            16 => StatementType::Merge,
            17 => StatementType::Rollback,
            21 => StatementType::Commit,
            n => StatementType::Other(u32::try_from(n).unwrap_or(u32::MAX)),
        }
    }

    /// Returns the statement kind code reported by the database.
    pub(crate) fn code(self) -> u64 {
        match self {
            StatementType::Select => 1,
            StatementType::Update => 2,
            StatementType::Delete => 3,
            StatementType::Insert => 4,
            StatementType::Create => 5,
            StatementType::Drop => 6,
            StatementType::Alter => 7,
            StatementType::Begin => 8,
            StatementType::Declare => 9,
            StatementType::Call => 10,
            StatementType::Merge => 16,
            StatementType::Rollback => 17,
            StatementType::Commit => 21,
            StatementType::Other(n) => n.into(),
            StatementType::Unknown => 0,
        }
    }

    pub fn is_query(self) -> bool {
        self == StatementType::Select
    }

    /// Returns `true` for CREATE, ALTER and DROP.
    pub fn is_ddl(self) -> bool {
        matches!(
            self,
            StatementType::Create | StatementType::Alter | StatementType::Drop
        )
    }

    /// Returns `true` for statements whose row count is the number of affected rows.
    pub fn is_dml(self) -> bool {
        matches!(
            self,
            StatementType::Insert
                | StatementType::Update
                | StatementType::Delete
                | StatementType::Merge
        )
    }

    pub fn is_plsql(self) -> bool {
        matches!(
            self,
            StatementType::Begin | StatementType::Declare | StatementType::Call
        )
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            StatementType::Select => write!(f, "select"),
            StatementType::Insert => write!(f, "insert"),
            StatementType::Update => write!(f, "update"),
            StatementType::Delete => write!(f, "delete"),
            StatementType::Merge => write!(f, "merge"),
            StatementType::Create => write!(f, "create"),
            StatementType::Alter => write!(f, "alter"),
            StatementType::Drop => write!(f, "drop"),
            StatementType::Begin => write!(f, "PL/SQL(begin)"),
            StatementType::Declare => write!(f, "PL/SQL(declare)"),
            StatementType::Call => write!(f, "call"),
            StatementType::Commit => write!(f, "commit"),
            StatementType::Rollback => write!(f, "rollback"),
            StatementType::Other(ref n) => write!(f, "other({})", n),
            StatementType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Where a statement handle came from, which decides how it is given back
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Ownership {
    /// Borrowed from the statement cache; released with the tag it was prepared with
    Cached { tag: Option<String> },
    /// Owned by the cursor; freed outright
    Owned,
}

/// The native statement handle of a cursor
///
/// The handle is either absent or valid. Every release path resets it to
/// absent, so a handle is never released twice.
#[derive(Debug)]
pub(crate) struct StmtHandle {
    raw: Option<RawStmt>,
    ownership: Ownership,
}

impl StmtHandle {
    pub(crate) fn absent() -> StmtHandle {
        StmtHandle {
            raw: None,
            ownership: Ownership::Cached { tag: None },
        }
    }

    /// Wraps a handle the cursor takes ownership of.
    pub(crate) fn owned(raw: RawStmt) -> StmtHandle {
        StmtHandle {
            raw: Some(raw),
            ownership: Ownership::Owned,
        }
    }

    pub(crate) fn is_present(&self) -> bool {
        self.raw.is_some()
    }

    pub(crate) fn raw(&self) -> Result<RawStmt> {
        self.raw
            .ok_or_else(|| Error::interface("statement handle is not allocated"))
    }

    pub(crate) fn tag(&self) -> Option<&str> {
        match &self.ownership {
            Ownership::Cached { tag } => tag.as_deref(),
            Ownership::Owned => None,
        }
    }

    /// Prepares `sql` through the statement cache.
    ///
    /// The handle must be released beforehand. When preparing fails the
    /// handle is left absent whatever the native call wrote to it.
    pub(crate) fn prepare(&mut self, native: &dyn Native, sql: &str, tag: Option<&str>) -> Result<()> {
        debug_assert!(self.raw.is_none());
        let mut raw = None;
        let status = native.prepare_stmt(sql, tag, &mut raw);
        if status != STATUS_SUCCESS {
            self.raw = None;
            return Err(Error::from_native(native));
        }
        self.raw = raw;
        self.ownership = Ownership::Cached {
            tag: tag.map(|t| t.to_string()),
        };
        debug!(?raw, ?tag, "prepared statement");
        Ok(())
    }

    /// Gives the handle back: freed when owned, returned to the statement
    /// cache otherwise. The handle is absent afterwards even when the native
    /// call fails; the failure is reported only when `raise` is set.
    pub(crate) fn release(&mut self, native: &dyn Native, raise: bool) -> Result<()> {
        if let Some(raw) = self.raw.take() {
            let status = match &self.ownership {
                Ownership::Owned => native.stmt_free(raw),
                Ownership::Cached { tag } => native.stmt_release(raw, tag.as_deref()),
            };
            debug!(?raw, ownership = ?self.ownership, status, "released statement");
            if raise && status != STATUS_SUCCESS {
                return Err(Error::from_native(native));
            }
        }
        Ok(())
    }

    pub(crate) fn attr(&self, native: &dyn Native, attr: StmtAttr) -> Result<u64> {
        let raw = self.raw()?;
        let mut value = 0;
        chkerr!(native, native.stmt_attr(raw, attr, &mut value));
        Ok(value)
    }

    pub(crate) fn statement_type(&self, native: &dyn Native) -> Result<StatementType> {
        Ok(StatementType::from_code(
            self.attr(native, StmtAttr::StatementType)?,
        ))
    }
}
