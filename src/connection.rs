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
use crate::statement::StmtHandle;
use crate::Cursor;
use crate::CursorBuilder;
use crate::Error;
use crate::Result;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Connection to a database
///
/// The connection itself is established by the [`Native`] implementation.
/// This type carries the session state cursors depend on: whether it is
/// still open and whether statements commit on success.
pub struct Connection {
    native: Rc<dyn Native>,
    autocommit: Cell<bool>,
    is_open: Cell<bool>,
}

impl Connection {
    /// Wraps an established native session.
    pub fn new(native: Rc<dyn Native>) -> Connection {
        Connection {
            native,
            autocommit: Cell::new(false),
            is_open: Cell::new(true),
        }
    }

    /// Connects to an Oracle server through ODPI-C.
    ///
    /// ```no_run
    /// # use oracle_cursor::*;
    /// let conn = Connection::connect("scott", "tiger", "//localhost/XE")?;
    /// # Ok::<(), Error>(())
    /// ```
    #[cfg(feature = "odpi")]
    pub fn connect<U, P, C>(username: U, password: P, connect_string: C) -> Result<Connection>
    where
        U: AsRef<str>,
        P: AsRef<str>,
        C: AsRef<str>,
    {
        let native = crate::odpi::OdpiNative::connect(
            username.as_ref(),
            password.as_ref(),
            connect_string.as_ref(),
        )?;
        Ok(Connection::new(Rc::new(native)))
    }

    pub(crate) fn native(&self) -> &Rc<dyn Native> {
        &self.native
    }

    /// Creates a cursor with default settings.
    pub fn cursor(&self) -> Cursor<'_> {
        CursorBuilder::new(self).build()
    }

    /// Returns a builder to create a cursor with non-default settings.
    pub fn cursor_builder(&self) -> CursorBuilder<'_> {
        CursorBuilder::new(self)
    }

    /// Wraps a statement handle produced by a REF CURSOR in a cursor.
    ///
    /// The cursor owns the handle and frees it when closed or dropped.
    /// Rows are defined on the first fetch.
    ///
    /// ```
    /// # use oracle_cursor::*;
    /// # use oracle_cursor::test_util::ScriptedNative;
    /// # use std::rc::Rc;
    /// # let native = Rc::new(ScriptedNative::new());
    /// # native.add_ref_cursor("begin open_emps(:1); end;", 1,
    /// #     vec![ColumnInfo::new("ENAME", VarType::Varchar, 10)],
    /// #     vec![vec![Value::from("SMITH")]]);
    /// # let conn = Connection::new(native.clone());
    /// let mut cursor = conn.cursor();
    /// let out = cursor.var(VarType::Cursor, None, None)?;
    /// cursor.execute("begin open_emps(:1); end;", params![&out])?;
    /// let mut emps = conn.ref_cursor(out.get_value(0)?.get()?);
    /// let row = emps.fetchone()?.unwrap();
    /// assert_eq!(row.get::<_, String>("ENAME")?, "SMITH");
    /// # Ok::<(), Error>(())
    /// ```
    pub fn ref_cursor(&self, stmt: RawStmt) -> Cursor<'_> {
        let mut cursor = self.cursor();
        cursor.adopt_handle(StmtHandle::owned(stmt));
        cursor
    }

    /// Returns `true` when statements are committed as part of execution.
    pub fn autocommit(&self) -> bool {
        self.autocommit.get()
    }

    pub fn set_autocommit(&self, autocommit: bool) {
        self.autocommit.set(autocommit);
    }

    pub fn commit(&self) -> Result<()> {
        self.raise_if_not_connected()?;
        chkerr!(self.native.as_ref(), self.native.commit());
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        self.raise_if_not_connected()?;
        chkerr!(self.native.as_ref(), self.native.rollback());
        Ok(())
    }

    /// Marks the connection closed. Cursors created from it fail afterwards.
    pub fn close(&self) -> Result<()> {
        self.raise_if_not_connected()?;
        debug!("closing connection");
        self.is_open.set(false);
        Ok(())
    }

    pub(crate) fn raise_if_not_connected(&self) -> Result<()> {
        if self.is_open.get() && self.native.is_connected() {
            Ok(())
        } else {
            Err(Error::interface("not connected"))
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("autocommit", &self.autocommit.get())
            .field("is_open", &self.is_open.get())
            .finish()
    }
}
