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

//! Defining fetch variables and refilling them batch by batch.

use crate::chkerr;
use crate::cursor::OutputSize;
use crate::native::StmtAttr;
use crate::native::STATUS_NO_DATA;
use crate::native::STATUS_SUCCESS;
use crate::row::ColumnInfo;
use crate::variable::VarFactory;
use crate::Cursor;
use crate::Error;
use crate::Result;
use crate::StatementType;
use std::rc::Rc;
use tracing::debug;
use tracing::trace;

/// Rows of the current batch held in the fetch variables
///
/// `materialized` is `None` until the first fetch after an execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FetchWindow {
    pub(crate) materialized: Option<u32>,
    pub(crate) consumed: u32,
}

impl FetchWindow {
    pub(crate) fn new() -> FetchWindow {
        FetchWindow::default()
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        match self.materialized {
            None => true,
            Some(n) => self.consumed >= n,
        }
    }
}

impl OutputSize {
    fn for_column(&self, idx: usize) -> Option<u32> {
        match self.column {
            _ if self.size == 0 => None,
            None => Some(self.size),
            Some(column) if column == idx => Some(self.size),
            Some(_) => None,
        }
    }
}

impl Cursor<'_> {
    /// Creates one fetch variable per select-list column and defines it.
    pub(crate) fn perform_define(&mut self) -> Result<()> {
        let conn = self.conn;
        let native = conn.native();
        let raw = self.handle.raw()?;
        let num_cols = self.handle.attr(native.as_ref(), StmtAttr::ParamCount)?;
        let num_cols = u32::try_from(num_cols)?;

        self.fetch_array_size = self.arraysize();
        let output_type_handler = self.output_type_handler.clone();
        let factory = VarFactory {
            native,
            input_type_handler: None,
            output_type_handler: output_type_handler.as_deref(),
        };

        let mut columns = Vec::with_capacity(num_cols as usize);
        let mut vars = Vec::with_capacity(num_cols as usize);
        for pos in 1..=num_cols {
            let mut info = ColumnInfo::default();
            chkerr!(
                native.as_ref(),
                native.stmt_column_info(raw, pos, &mut info)
            );
            let size_override = self
                .output_size
                .and_then(|output_size| output_size.for_column(pos as usize - 1));
            let var = factory.new_for_column(&info, self.fetch_array_size, size_override)?;
            var.define(raw, pos)?;
            trace!(pos, column = %info, var_type = %var.var_type(), "defined column");
            columns.push(info);
            vars.push(var);
        }

        self.column_names = Rc::new(columns.iter().map(|c| c.name().to_string()).collect());
        self.columns = columns;
        self.fetch_vars = Some(vars);
        debug!(num_cols, fetch_array_size = self.fetch_array_size, "performed define");
        Ok(())
    }

    /// Refills the fetch variables with the next batch of up to `num_rows` rows.
    fn internal_fetch(&mut self, num_rows: u32) -> Result<()> {
        let vars = self
            .fetch_vars
            .as_ref()
            .ok_or_else(|| Error::interface("query not executed"))?;
        for var in vars {
            var.pre_fetch()?;
        }

        let native = self.conn.native().as_ref();
        let raw = self.handle.raw()?;
        let status = native.stmt_fetch(raw, num_rows);
        if status != STATUS_SUCCESS && status != STATUS_NO_DATA {
            return Err(Error::from_native(native));
        }

        let total = self.handle.attr(native, StmtAttr::RowCount)?;
        let fetched = total.saturating_sub(self.rowcount.unwrap_or(0));
        self.window = FetchWindow {
            materialized: Some(u32::try_from(fetched)?),
            consumed: 0,
        };
        trace!(num_rows, fetched, total, "fetched rows");
        Ok(())
    }

    /// Returns `true` when a row is available at the current window
    /// position, fetching the next batch when the current one is used up.
    ///
    /// A batch shorter than the fetch array size ends the result set, so no
    /// native fetch is issued past it.
    pub(crate) fn more_rows(&mut self) -> Result<bool> {
        if self.window.is_exhausted() {
            let last_batch_full = self
                .window
                .materialized
                .map_or(true, |n| n == self.fetch_array_size);
            if last_batch_full {
                self.internal_fetch(self.fetch_array_size)?;
            }
            if self.window.is_exhausted() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Checks that rows can be fetched from this cursor.
    pub(crate) fn verify_fetch(&mut self) -> Result<()> {
        self.raise_if_not_open()?;
        self.fixup_bound_cursor()?;
        if !self.statement_type.is_query() {
            return Err(Error::interface("not a query"));
        }
        Ok(())
    }

    /// Completes a cursor populated from a REF CURSOR: its statement kind is
    /// queried and its columns defined on first use.
    fn fixup_bound_cursor(&mut self) -> Result<()> {
        if self.handle.is_present() && self.statement_type == StatementType::Unknown {
            self.get_statement_type()?;
            if self.statement_type.is_query() && self.fetch_vars.is_none() {
                self.perform_define()?;
            }
            self.set_row_count()?;
            debug!(statement_type = %self.statement_type, "adopted bound cursor");
        }
        Ok(())
    }
}
