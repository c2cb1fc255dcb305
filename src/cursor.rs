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

use crate::bind;
use crate::bind::BindSlot;
use crate::bind::BindTable;
use crate::bind::KeywordArgs;
use crate::fetch::FetchWindow;
use crate::native::ExecMode;
use crate::native::StmtAttr;
use crate::native::STATUS_SUCCESS;
use crate::row::ColumnInfo;
use crate::row::RowFactory;
use crate::statement::StmtHandle;
use crate::variable::InputTypeHandler;
use crate::variable::OutputTypeHandler;
use crate::variable::VarFactory;
use crate::Connection;
use crate::Error;
use crate::Params;
use crate::Result;
use crate::StatementType;
use crate::VarSpec;
use crate::VarType;
use crate::Variable;
use std::fmt;
use std::rc::Rc;
use tracing::debug;
use tracing::warn;

/// Default number of rows fetched per native fetch
pub const DEFAULT_ARRAY_SIZE: u32 = 50;

/// Default number of elements of variables created by
/// [`Cursor::var`] and [`Cursor::setinputsizes`]
pub const DEFAULT_BIND_ARRAY_SIZE: u32 = 1;

/// Size override of variable-length fetch columns set by [`Cursor::setoutputsize`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OutputSize {
    pub(crate) size: u32,
    /// zero-based column index; every variable-length column when `None`
    pub(crate) column: Option<usize>,
}

/// A builder to create a [`Cursor`] with non-default settings
///
/// ```
/// # use oracle_cursor::*;
/// # use oracle_cursor::test_util::ScriptedNative;
/// # use std::rc::Rc;
/// # let conn = Connection::new(Rc::new(ScriptedNative::new()));
/// let cursor = conn
///     .cursor_builder()
///     .arraysize(200)
///     .bindarraysize(10)
///     .build();
/// assert_eq!(cursor.arraysize(), 200);
/// assert_eq!(cursor.bindarraysize(), 10);
/// ```
pub struct CursorBuilder<'conn> {
    conn: &'conn Connection,
    arraysize: u32,
    bindarraysize: u32,
    row_factory: Option<Rc<dyn RowFactory>>,
    input_type_handler: Option<Rc<dyn InputTypeHandler>>,
    output_type_handler: Option<Rc<dyn OutputTypeHandler>>,
}

impl<'conn> CursorBuilder<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> CursorBuilder<'conn> {
        CursorBuilder {
            conn,
            arraysize: DEFAULT_ARRAY_SIZE,
            bindarraysize: DEFAULT_BIND_ARRAY_SIZE,
            row_factory: None,
            input_type_handler: None,
            output_type_handler: None,
        }
    }

    /// Sets the number of rows fetched per round trip. The default is 50.
    /// Zero is treated as one.
    pub fn arraysize(&mut self, size: u32) -> &mut CursorBuilder<'conn> {
        self.arraysize = size.max(1);
        self
    }

    /// Sets the number of elements of variables created by
    /// [`Cursor::var`] and [`Cursor::setinputsizes`]. The default is 1.
    pub fn bindarraysize(&mut self, size: u32) -> &mut CursorBuilder<'conn> {
        self.bindarraysize = size.max(1);
        self
    }

    pub fn row_factory<F>(&mut self, factory: F) -> &mut CursorBuilder<'conn>
    where
        F: RowFactory + 'static,
    {
        self.row_factory = Some(Rc::new(factory));
        self
    }

    pub fn input_type_handler<H>(&mut self, handler: H) -> &mut CursorBuilder<'conn>
    where
        H: InputTypeHandler + 'static,
    {
        self.input_type_handler = Some(Rc::new(handler));
        self
    }

    pub fn output_type_handler<H>(&mut self, handler: H) -> &mut CursorBuilder<'conn>
    where
        H: OutputTypeHandler + 'static,
    {
        self.output_type_handler = Some(Rc::new(handler));
        self
    }

    pub fn build(&self) -> Cursor<'conn> {
        Cursor {
            conn: self.conn,
            handle: StmtHandle::absent(),
            is_open: true,
            statement: None,
            statement_type: StatementType::Unknown,
            arraysize: self.arraysize,
            bindarraysize: self.bindarraysize,
            fetch_array_size: self.arraysize,
            rowcount: None,
            window: FetchWindow::new(),
            bind_table: None,
            input_sizes: false,
            fetch_vars: None,
            columns: Vec::new(),
            column_names: Rc::new(Vec::new()),
            output_size: None,
            row_factory: self.row_factory.clone(),
            input_type_handler: self.input_type_handler.clone(),
            output_type_handler: self.output_type_handler.clone(),
        }
    }
}

/// Cursor
///
/// A cursor prepares and executes statements on a [`Connection`] and
/// fetches rows of queries in batches of [`arraysize`](Cursor::arraysize) rows.
///
/// ```
/// # use oracle_cursor::*;
/// # use oracle_cursor::test_util::ScriptedNative;
/// # use std::rc::Rc;
/// # let native = Rc::new(ScriptedNative::new());
/// # native.add_query("select empno, ename from emp order by empno",
/// #     vec![ColumnInfo::new("EMPNO", VarType::Int64, 0), ColumnInfo::new("ENAME", VarType::Varchar, 10)],
/// #     vec![vec![Value::from(7369), Value::from("SMITH")], vec![Value::from(7499), Value::from("ALLEN")]]);
/// # let conn = Connection::new(native.clone());
/// let mut cursor = conn.cursor();
/// cursor.execute("select empno, ename from emp order by empno", params![])?;
/// for row_result in cursor.rows()? {
///     let (empno, ename) = row_result?.get_as::<(i64, String)>()?;
///     println!("{} {}", empno, ename);
/// }
/// # Ok::<(), Error>(())
/// ```
pub struct Cursor<'conn> {
    pub(crate) conn: &'conn Connection,
    pub(crate) handle: StmtHandle,
    is_open: bool,
    statement: Option<String>,
    pub(crate) statement_type: StatementType,
    arraysize: u32,
    bindarraysize: u32,
    pub(crate) fetch_array_size: u32,
    pub(crate) rowcount: Option<u64>,
    pub(crate) window: FetchWindow,
    pub(crate) bind_table: Option<BindTable>,
    input_sizes: bool,
    pub(crate) fetch_vars: Option<Vec<Variable>>,
    pub(crate) columns: Vec<ColumnInfo>,
    pub(crate) column_names: Rc<Vec<String>>,
    pub(crate) output_size: Option<OutputSize>,
    pub(crate) row_factory: Option<Rc<dyn RowFactory>>,
    input_type_handler: Option<Rc<dyn InputTypeHandler>>,
    pub(crate) output_type_handler: Option<Rc<dyn OutputTypeHandler>>,
}

impl<'conn> Cursor<'conn> {
    pub(crate) fn adopt_handle(&mut self, handle: StmtHandle) {
        self.handle = handle;
        self.statement_type = StatementType::Unknown;
    }

    pub(crate) fn raise_if_not_open(&self) -> Result<()> {
        if !self.is_open {
            return Err(Error::interface("not open"));
        }
        self.conn.raise_if_not_connected()
    }

    /// Prepares a statement without executing it. A following execute with
    /// an empty statement text uses it.
    ///
    /// With a `tag`, the statement is looked up in and given back to the
    /// statement cache under that tag.
    pub fn prepare(&mut self, sql: &str, tag: Option<&str>) -> Result<()> {
        self.raise_if_not_open()?;
        self.internal_prepare(sql, tag)
    }

    fn internal_prepare(&mut self, sql: &str, tag: Option<&str>) -> Result<()> {
        let sql = if sql.is_empty() || self.statement.as_deref() == Some(sql) {
            let current = match &self.statement {
                Some(current) => current.clone(),
                None => return Err(Error::programming("no statement specified and no prior statement prepared")),
            };
            // DDL must be prepared again to run again
            if !self.statement_type.is_ddl() && self.handle.is_present() {
                debug!(statement_type = %self.statement_type, "reusing prepared statement");
                return Ok(());
            }
            current
        } else {
            sql.to_string()
        };

        let native = self.conn.native().as_ref();
        self.handle.release(native, true)?;
        if let Err(err) = self.handle.prepare(native, &sql, tag) {
            self.statement = None;
            self.statement_type = StatementType::Unknown;
            self.fetch_vars = None;
            return Err(err);
        }
        if !self.input_sizes {
            self.bind_table = None;
        }
        self.statement = Some(sql);
        self.get_statement_type()
    }

    pub(crate) fn get_statement_type(&mut self) -> Result<()> {
        self.statement_type = self.handle.statement_type(self.conn.native().as_ref())?;
        self.window = FetchWindow::new();
        self.fetch_vars = None;
        self.columns.clear();
        self.column_names = Rc::new(Vec::new());
        Ok(())
    }

    pub(crate) fn set_row_count(&mut self) -> Result<()> {
        if self.statement_type.is_query() {
            self.rowcount = Some(0);
            self.window = FetchWindow::new();
        } else if self.statement_type.is_dml() {
            self.rowcount = Some(
                self.handle
                    .attr(self.conn.native().as_ref(), StmtAttr::RowCount)?,
            );
        } else {
            self.rowcount = None;
        }
        Ok(())
    }

    fn set_error_offset(&self, err: Error) -> Error {
        if err.db_error().is_none() {
            return err;
        }
        match self
            .handle
            .attr(self.conn.native().as_ref(), StmtAttr::ParseErrorOffset)
        {
            Ok(offset) => err.with_offset(u32::try_from(offset).unwrap_or(u32::MAX)),
            Err(_) => err,
        }
    }

    fn internal_execute(&mut self, num_iters: u32) -> Result<()> {
        let mode = if self.conn.autocommit() {
            ExecMode::CommitOnSuccess
        } else {
            ExecMode::Default
        };
        let raw = self.handle.raw()?;
        let native = self.conn.native().as_ref();
        debug!(statement_type = %self.statement_type, num_iters, ?mode, "executing statement");
        if native.stmt_execute(raw, num_iters, mode) != STATUS_SUCCESS {
            let err = self.set_error_offset(Error::from_native(native));
            if let Err(row_count_err) = self.set_row_count() {
                debug!(%row_count_err, "row count is unavailable after failure");
            }
            return Err(err);
        }
        self.set_row_count()?;
        debug!(rowcount = ?self.rowcount, "executed statement");
        Ok(())
    }

    fn set_bind_variables(
        &mut self,
        params: &Params,
        num_elements: u32,
        array_pos: u32,
        defer: bool,
    ) -> Result<()> {
        let conn = self.conn;
        let input_type_handler = self.input_type_handler.clone();
        let factory = VarFactory {
            native: conn.native(),
            input_type_handler: input_type_handler.as_deref(),
            output_type_handler: None,
        };
        bind::set_bind_variables(
            &mut self.bind_table,
            &factory,
            params,
            num_elements,
            array_pos,
            defer,
        )
    }

    fn perform_bind(&mut self) -> Result<()> {
        self.input_sizes = false;
        if let Some(table) = &self.bind_table {
            table.perform_bind(self.handle.raw()?)?;
        }
        Ok(())
    }

    /// Executes a statement with positional or named arguments.
    ///
    /// An empty `sql` executes the statement prepared last. Returns the
    /// cursor for queries, so rows can be fetched from the result, and
    /// `None` for other statements.
    ///
    /// ```
    /// # use oracle_cursor::*;
    /// # use oracle_cursor::test_util::ScriptedNative;
    /// # use std::rc::Rc;
    /// # let native = Rc::new(ScriptedNative::new());
    /// # native.add_query("select ename from emp where empno = :1",
    /// #     vec![ColumnInfo::new("ENAME", VarType::Varchar, 10)],
    /// #     vec![vec![Value::from("SMITH")]]);
    /// # let conn = Connection::new(native.clone());
    /// let mut cursor = conn.cursor();
    /// let rows = cursor
    ///     .execute("select ename from emp where empno = :1", params![7369])?
    ///     .expect("a query returns the cursor")
    ///     .fetchall()?;
    /// assert_eq!(rows.len(), 1);
    ///
    /// assert!(cursor.execute("update emp set sal = sal * 1.1", params![])?.is_none());
    /// # Ok::<(), Error>(())
    /// ```
    pub fn execute<P>(&mut self, sql: &str, params: P) -> Result<Option<&mut Cursor<'conn>>>
    where
        P: Into<Params>,
    {
        self.execute_with(sql, params.into(), Vec::new())
    }

    /// Executes a statement with either positional arguments or keyword
    /// arguments. Passing both fails with an [`Interface`](crate::ErrorKind::Interface) error.
    pub fn execute_with(
        &mut self,
        sql: &str,
        args: Params,
        kwargs: KeywordArgs,
    ) -> Result<Option<&mut Cursor<'conn>>> {
        let params = match (args.is_empty(), kwargs.is_empty()) {
            (false, false) => {
                return Err(Error::interface(
                    "expecting argument or keyword arguments, not both",
                ))
            }
            (true, false) => Params::Named(kwargs),
            _ => args,
        };

        self.raise_if_not_open()?;
        self.internal_prepare(sql, None)?;

        if !params.is_empty() {
            self.set_bind_variables(&params, 1, 0, false)?;
        }
        self.perform_bind()?;

        let is_query = self.statement_type.is_query();
        self.internal_execute(if is_query { 0 } else { 1 })?;

        if is_query && self.fetch_vars.is_none() {
            self.perform_define()?;
        }
        self.output_size = None;

        Ok(if is_query { Some(self) } else { None })
    }

    /// Executes a statement once for each row of arguments in a single
    /// native execution.
    ///
    /// Queries fail with [`NotSupported`](crate::ErrorKind::NotSupported).
    /// An empty list of rows executes nothing.
    ///
    /// ```
    /// # use oracle_cursor::*;
    /// # use oracle_cursor::test_util::ScriptedNative;
    /// # use std::rc::Rc;
    /// # let conn = Connection::new(Rc::new(ScriptedNative::new()));
    /// let mut cursor = conn.cursor();
    /// cursor.executemany(
    ///     "insert into emp(empno, ename) values (:1, :2)",
    ///     &[params![1, "A"], params![2, None::<&str>], params![3, "C"]],
    /// )?;
    /// assert_eq!(cursor.rowcount(), Some(3));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn executemany(&mut self, sql: &str, rows: &[Params]) -> Result<()> {
        self.raise_if_not_open()?;
        self.internal_prepare(sql, None)?;

        if self.statement_type.is_query() {
            return Err(Error::not_supported(
                "queries not supported: results undefined",
            ));
        }

        let num_rows = u32::try_from(rows.len())?;
        for (i, row) in rows.iter().enumerate() {
            let array_pos = u32::try_from(i)?;
            self.set_bind_variables(row, num_rows, array_pos, array_pos + 1 < num_rows)?;
        }
        self.perform_bind()?;

        if num_rows > 0 {
            self.internal_execute(num_rows)?;
        }
        Ok(())
    }

    /// Creates the bind variables of the next execution in advance.
    ///
    /// Positional entries of `None` leave the position to be typed from the
    /// value bound later. The variables survive the next prepare of a new
    /// statement. Passing both forms fails with an
    /// [`Interface`](crate::ErrorKind::Interface) error.
    ///
    /// ```
    /// # use oracle_cursor::*;
    /// # use oracle_cursor::test_util::ScriptedNative;
    /// # use std::rc::Rc;
    /// # let conn = Connection::new(Rc::new(ScriptedNative::new()));
    /// let mut cursor = conn.cursor();
    /// cursor.setinputsizes(vec![Some(VarSpec::new(VarType::Varchar).size(100)), None], Vec::new())?;
    /// cursor.execute("insert into emp(ename, empno) values (:1, :2)", params!["SMITH", 1])?;
    /// assert_eq!(cursor.bind_vars()[0].as_ref().map(|v| v.size()), Some(100));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn setinputsizes(
        &mut self,
        args: Vec<Option<VarSpec>>,
        kwargs: Vec<(String, VarSpec)>,
    ) -> Result<()> {
        if !args.is_empty() && !kwargs.is_empty() {
            return Err(Error::interface(
                "expecting arguments or keyword arguments, not both",
            ));
        }
        self.raise_if_not_open()?;

        self.input_sizes = true;
        let native = self.conn.native();
        let table = if !kwargs.is_empty() {
            let mut slots = Vec::with_capacity(kwargs.len());
            for (name, spec) in kwargs {
                let var = Variable::from_spec(native, spec, self.bindarraysize)?;
                slots.push((name, BindSlot::Bound(var)));
            }
            BindTable::Named(slots)
        } else {
            let mut slots = Vec::with_capacity(args.len());
            for spec in args {
                slots.push(match spec {
                    Some(spec) => BindSlot::Bound(Variable::from_spec(
                        native,
                        spec,
                        self.bindarraysize,
                    )?),
                    None => BindSlot::Unbound,
                });
            }
            BindTable::Positional(slots)
        };
        self.bind_table = Some(table);
        Ok(())
    }

    /// Overrides the element size of variable-length fetch columns for
    /// the next execute: column `column` (zero-based) only, or all such
    /// columns when `None`.
    pub fn setoutputsize(&mut self, size: u32, column: Option<usize>) {
        self.output_size = Some(OutputSize { size, column });
    }

    /// Creates a variable to be bound, for example as an output parameter.
    ///
    /// `size` defaults to the default size of `var_type` and `array_size`
    /// to [`bindarraysize`](Cursor::bindarraysize).
    pub fn var(
        &self,
        var_type: VarType,
        size: Option<u32>,
        array_size: Option<u32>,
    ) -> Result<Variable> {
        self.raise_if_not_open()?;
        let spec = match size {
            Some(size) if size > 0 => VarSpec::new(var_type).size(size),
            _ => VarSpec::new(var_type),
        };
        Variable::from_spec(
            self.conn.native(),
            spec,
            array_size.unwrap_or(self.bindarraysize),
        )
    }

    /// Closes the cursor and gives its statement handle back.
    ///
    /// Closing a closed cursor fails with an [`Interface`](crate::ErrorKind::Interface) error.
    pub fn close(&mut self) -> Result<()> {
        self.raise_if_not_open()?;
        let result = self.handle.release(self.conn.native().as_ref(), true);
        self.is_open = false;
        self.bind_table = None;
        self.fetch_vars = None;
        debug!("closed cursor");
        result
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Returns the text of the statement prepared last.
    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    /// Returns the number of rows fetched so far for queries and the number
    /// of affected rows for INSERT, UPDATE, DELETE and MERGE. `None` for
    /// other statements.
    pub fn rowcount(&self) -> Option<u64> {
        self.rowcount
    }

    pub fn arraysize(&self) -> u32 {
        self.arraysize
    }

    /// Sets the number of rows fetched per round trip. It takes effect at
    /// the next execution of a new query. Zero is treated as one.
    pub fn set_arraysize(&mut self, size: u32) {
        self.arraysize = size.max(1);
    }

    pub fn bindarraysize(&self) -> u32 {
        self.bindarraysize
    }

    pub fn set_bindarraysize(&mut self, size: u32) {
        self.bindarraysize = size.max(1);
    }

    /// Returns the columns of the executed query.
    pub fn description(&self) -> Option<&[ColumnInfo]> {
        if self.statement_type.is_query() && self.fetch_vars.is_some() {
            Some(&self.columns)
        } else {
            None
        }
    }

    /// Returns the bind variables in bind order. Positions not typed yet are `None`.
    pub fn bind_vars(&self) -> Vec<Option<Variable>> {
        match &self.bind_table {
            Some(table) => table.slots().iter().map(|s| s.var().cloned()).collect(),
            None => Vec::new(),
        }
    }

    /// Returns the variables rows are fetched into.
    pub fn fetch_vars(&self) -> &[Variable] {
        self.fetch_vars.as_deref().unwrap_or(&[])
    }

    pub fn set_row_factory<F>(&mut self, factory: F)
    where
        F: RowFactory + 'static,
    {
        self.row_factory = Some(Rc::new(factory));
    }

    pub fn clear_row_factory(&mut self) {
        self.row_factory = None;
    }

    pub fn set_input_type_handler<H>(&mut self, handler: H)
    where
        H: InputTypeHandler + 'static,
    {
        self.input_type_handler = Some(Rc::new(handler));
    }

    pub fn set_output_type_handler<H>(&mut self, handler: H)
    where
        H: OutputTypeHandler + 'static,
    {
        self.output_type_handler = Some(Rc::new(handler));
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("statement", &self.statement)
            .field("statement_type", &self.statement_type)
            .field("is_open", &self.is_open)
            .field("rowcount", &self.rowcount)
            .field("arraysize", &self.arraysize)
            .finish()
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.handle.release(self.conn.native().as_ref(), true) {
            warn!(%err, "failed to release statement handle");
        }
    }
}
