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

//! An in-memory [`Native`] implementation driven by scripts.
//!
//! Statements are classified by their first keyword. Queries return the
//! rows registered with [`ScriptedNative::add_query`], DML affects one row
//! per iteration unless registered otherwise and PL/SQL blocks run the
//! closure registered with [`ScriptedNative::add_plsql`]. Every native call
//! is logged and can be inspected with [`ScriptedNative::calls`].

use crate::native::ErrorInfo;
use crate::native::ExecMode;
use crate::native::Native;
use crate::native::RawStmt;
use crate::native::RawVar;
use crate::native::StmtAttr;
use crate::native::STATUS_FAILURE;
use crate::native::STATUS_NO_DATA;
use crate::native::STATUS_SUCCESS;
use crate::row::ColumnInfo;
use crate::Result;
use crate::StatementType;
use crate::Value;
use crate::VarType;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

/// A logged native call
#[derive(Clone, Debug, PartialEq)]
pub enum NativeCall {
    Prepare {
        sql: String,
        tag: Option<String>,
    },
    StmtRelease {
        stmt: RawStmt,
        tag: Option<String>,
    },
    StmtFree {
        stmt: RawStmt,
    },
    Execute {
        stmt: RawStmt,
        num_iters: u32,
        mode: ExecMode,
    },
    Fetch {
        stmt: RawStmt,
        num_rows: u32,
    },
    BindByPos {
        stmt: RawStmt,
        pos: u32,
        var: RawVar,
    },
    BindByName {
        stmt: RawStmt,
        name: String,
        var: RawVar,
    },
    Define {
        stmt: RawStmt,
        pos: u32,
        var: RawVar,
    },
    VarNew {
        var: RawVar,
        var_type: VarType,
        array_size: u32,
        size: u32,
    },
    VarRelease {
        var: RawVar,
    },
    Commit,
    Rollback,
}

/// A successful execution as seen by the database
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    pub sql: String,
    pub num_iters: u32,
    pub mode: ExecMode,
    /// Bound values in bind order, one inner vector per bind variable
    /// holding the elements `0..max(num_iters, 1)`.
    pub binds: Vec<Vec<Value>>,
}

type PlsqlHandler = Rc<dyn Fn(&mut Vec<Value>) -> Result<()>>;

#[derive(Clone)]
enum Script {
    Query {
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<Value>>,
    },
    Dml {
        affected: u64,
    },
    Plsql(PlsqlHandler),
    RefCursor {
        pos: u32,
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<Value>>,
    },
}

struct ResultSet {
    columns: Vec<ColumnInfo>,
    rows: Vec<Vec<Value>>,
    next: usize,
}

struct StmtState {
    sql: String,
    stmt_type: StatementType,
    binds_by_pos: BTreeMap<u32, RawVar>,
    binds_by_name: Vec<(String, RawVar)>,
    defines: BTreeMap<u32, RawVar>,
    result: Option<ResultSet>,
    row_count: u64,
    error_offset: u64,
}

impl StmtState {
    fn new(sql: &str, stmt_type: StatementType) -> StmtState {
        StmtState {
            sql: sql.to_string(),
            stmt_type,
            binds_by_pos: BTreeMap::new(),
            binds_by_name: Vec::new(),
            defines: BTreeMap::new(),
            result: None,
            row_count: 0,
            error_offset: 0,
        }
    }

    fn bound_vars(&self) -> Vec<RawVar> {
        self.binds_by_pos
            .values()
            .copied()
            .chain(self.binds_by_name.iter().map(|(_, var)| *var))
            .collect()
    }
}

struct VarState {
    values: Vec<Value>,
}

#[derive(Default)]
struct State {
    next_handle: usize,
    stmts: HashMap<usize, StmtState>,
    vars: HashMap<usize, VarState>,
    scripts: HashMap<String, Script>,
    prepare_failures: HashMap<String, ErrorInfo>,
    execute_failures: HashMap<String, (ErrorInfo, u64)>,
    release_failures: HashMap<String, ErrorInfo>,
    calls: Vec<NativeCall>,
    executions: Vec<Execution>,
    last_error: ErrorInfo,
    disconnected: bool,
}

impl State {
    fn new_handle(&mut self) -> usize {
        self.next_handle += 0x10;
        0x1000 + self.next_handle
    }

    fn fail(&mut self, code: i32, fn_name: &'static str, message: String) -> i32 {
        self.last_error = ErrorInfo {
            code,
            offset: 0,
            message,
            fn_name: fn_name.into(),
            action: "".into(),
        };
        STATUS_FAILURE
    }

    /// Forgets `stmt`. A registered release failure is reported after the
    /// handle is gone, as a native library does when closing fails.
    fn remove_stmt(&mut self, stmt: RawStmt, fn_name: &'static str) -> i32 {
        match self.stmts.remove(&stmt.0) {
            Some(removed) => match self.release_failures.get(&removed.sql).cloned() {
                Some(info) => {
                    self.last_error = ErrorInfo { fn_name: fn_name.into(), ..info };
                    STATUS_FAILURE
                }
                None => STATUS_SUCCESS,
            },
            None => self.fail(-1, fn_name, format!("invalid handle {}", stmt)),
        }
    }

    fn var_values(&self, var: RawVar) -> Option<&Vec<Value>> {
        self.vars.get(&var.0).map(|v| &v.values)
    }

    fn set_var_value(&mut self, var: RawVar, pos: usize, value: Value) {
        if let Some(slot) = self
            .vars
            .get_mut(&var.0)
            .and_then(|v| v.values.get_mut(pos))
        {
            *slot = value;
        }
    }
}

fn classify(sql: &str) -> StatementType {
    let keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    match keyword.as_str() {
        "select" | "with" => StatementType::Select,
        "update" => StatementType::Update,
        "delete" => StatementType::Delete,
        "insert" => StatementType::Insert,
        "merge" => StatementType::Merge,
        "create" => StatementType::Create,
        "drop" => StatementType::Drop,
        "alter" => StatementType::Alter,
        "begin" => StatementType::Begin,
        "declare" => StatementType::Declare,
        "call" => StatementType::Call,
        "commit" => StatementType::Commit,
        "rollback" => StatementType::Rollback,
        _ => StatementType::Other(99),
    }
}

/// A scripted in-memory database
#[derive(Default)]
pub struct ScriptedNative {
    state: RefCell<State>,
}

impl ScriptedNative {
    pub fn new() -> ScriptedNative {
        ScriptedNative::default()
    }

    /// Registers the result set of a query.
    pub fn add_query(&self, sql: &str, columns: Vec<ColumnInfo>, rows: Vec<Vec<Value>>) {
        self.state
            .borrow_mut()
            .scripts
            .insert(sql.to_string(), Script::Query { columns, rows });
    }

    /// Registers the number of rows a DML statement affects in total.
    pub fn add_dml(&self, sql: &str, affected: u64) {
        self.state
            .borrow_mut()
            .scripts
            .insert(sql.to_string(), Script::Dml { affected });
    }

    /// Registers a PL/SQL block. `handler` gets the first element of every
    /// bound variable in bind order; what it leaves there is written back.
    pub fn add_plsql<F>(&self, sql: &str, handler: F)
    where
        F: Fn(&mut Vec<Value>) -> Result<()> + 'static,
    {
        self.state
            .borrow_mut()
            .scripts
            .insert(sql.to_string(), Script::Plsql(Rc::new(handler)));
    }

    /// Registers a PL/SQL block opening a REF CURSOR into the variable bound
    /// at `pos` (one-based).
    pub fn add_ref_cursor(
        &self,
        sql: &str,
        pos: u32,
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<Value>>,
    ) {
        self.state.borrow_mut().scripts.insert(
            sql.to_string(),
            Script::RefCursor { pos, columns, rows },
        );
    }

    /// Makes preparing `sql` fail. The failed call still writes a bogus
    /// handle to its out-parameter.
    pub fn fail_prepare(&self, sql: &str, code: i32, message: &str) {
        self.state.borrow_mut().prepare_failures.insert(
            sql.to_string(),
            ErrorInfo {
                code,
                offset: 0,
                message: message.to_string(),
                fn_name: "prepare_stmt".into(),
                action: "prepare".into(),
            },
        );
    }

    /// Makes executing `sql` fail with the parse error offset `offset`.
    pub fn fail_execute(&self, sql: &str, code: i32, message: &str, offset: u64) {
        self.state.borrow_mut().execute_failures.insert(
            sql.to_string(),
            (
                ErrorInfo {
                    code,
                    offset: 0,
                    message: message.to_string(),
                    fn_name: "stmt_execute".into(),
                    action: "execute".into(),
                },
                offset,
            ),
        );
    }

    /// Makes releasing or freeing the statement handle of `sql` fail. An
    /// empty `sql` matches REF CURSOR handles.
    pub fn fail_release(&self, sql: &str, code: i32, message: &str) {
        self.state.borrow_mut().release_failures.insert(
            sql.to_string(),
            ErrorInfo {
                code,
                offset: 0,
                message: message.to_string(),
                fn_name: "".into(),
                action: "close".into(),
            },
        );
    }

    /// Makes the session report itself as gone.
    pub fn disconnect(&self) {
        self.state.borrow_mut().disconnected = true;
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.borrow().calls.clone()
    }

    /// Counts logged calls matching `pred`.
    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&NativeCall) -> bool,
    {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn executions(&self) -> Vec<Execution> {
        self.state.borrow().executions.clone()
    }

    /// Number of statement handles neither released nor freed
    pub fn open_statements(&self) -> usize {
        self.state.borrow().stmts.len()
    }

    /// Number of variables not released
    pub fn live_vars(&self) -> usize {
        self.state.borrow().vars.len()
    }

    fn execute_plsql(&self, stmt: RawStmt, handler: PlsqlHandler) -> i32 {
        let (vars, mut args) = {
            let state = self.state.borrow();
            let vars = match state.stmts.get(&stmt.0) {
                Some(s) => s.bound_vars(),
                None => return STATUS_FAILURE,
            };
            let args = vars
                .iter()
                .map(|var| {
                    state
                        .var_values(*var)
                        .and_then(|values| values.first().cloned())
                        .unwrap_or(Value::Null)
                })
                .collect::<Vec<_>>();
            (vars, args)
        };
        let result = handler(&mut args);
        let mut state = self.state.borrow_mut();
        if let Err(err) = result {
            let code = err.db_code().unwrap_or(20000);
            return state.fail(code, "stmt_execute", err.to_string());
        }
        for (var, val) in vars.into_iter().zip(args) {
            state.set_var_value(var, 0, val);
        }
        STATUS_SUCCESS
    }

    fn open_ref_cursor(
        &self,
        stmt: RawStmt,
        pos: u32,
        columns: Vec<ColumnInfo>,
        rows: Vec<Vec<Value>>,
    ) -> i32 {
        let mut state = self.state.borrow_mut();
        let var = match state
            .stmts
            .get(&stmt.0)
            .and_then(|s| s.binds_by_pos.get(&pos).copied())
        {
            Some(var) => var,
            None => {
                return state.fail(
                    6550,
                    "stmt_execute",
                    format!("ORA-06550: nothing bound at position {}", pos),
                )
            }
        };
        let handle = state.new_handle();
        let mut ref_stmt = StmtState::new("", StatementType::Select);
        ref_stmt.result = Some(ResultSet {
            columns,
            rows,
            next: 0,
        });
        state.stmts.insert(handle, ref_stmt);
        state.set_var_value(var, 0, Value::Cursor(RawStmt(handle)));
        STATUS_SUCCESS
    }
}

impl Native for ScriptedNative {
    fn prepare_stmt(&self, sql: &str, tag: Option<&str>, stmt: &mut Option<RawStmt>) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::Prepare {
            sql: sql.to_string(),
            tag: tag.map(|t| t.to_string()),
        });
        if let Some(info) = state.prepare_failures.get(sql).cloned() {
            *stmt = Some(RawStmt(0xdead));
            state.last_error = info;
            return STATUS_FAILURE;
        }
        let handle = state.new_handle();
        state.stmts.insert(handle, StmtState::new(sql, classify(sql)));
        *stmt = Some(RawStmt(handle));
        STATUS_SUCCESS
    }

    fn stmt_release(&self, stmt: RawStmt, tag: Option<&str>) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::StmtRelease {
            stmt,
            tag: tag.map(|t| t.to_string()),
        });
        state.remove_stmt(stmt, "stmt_release")
    }

    fn stmt_free(&self, stmt: RawStmt) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::StmtFree { stmt });
        state.remove_stmt(stmt, "stmt_free")
    }

    fn stmt_execute(&self, stmt: RawStmt, num_iters: u32, mode: ExecMode) -> i32 {
        let script = {
            let mut state = self.state.borrow_mut();
            state.calls.push(NativeCall::Execute {
                stmt,
                num_iters,
                mode,
            });
            let (sql, stmt_type, vars) = match state.stmts.get(&stmt.0) {
                Some(s) => (s.sql.clone(), s.stmt_type, s.bound_vars()),
                None => {
                    return state.fail(-1, "stmt_execute", format!("invalid handle {}", stmt))
                }
            };
            if let Some((info, offset)) = state.execute_failures.get(&sql).cloned() {
                if let Some(s) = state.stmts.get_mut(&stmt.0) {
                    s.error_offset = offset;
                    s.row_count = 0;
                }
                state.last_error = info;
                return STATUS_FAILURE;
            }

            let num_elements = num_iters.max(1) as usize;
            let binds: Vec<Vec<Value>> = vars
                .iter()
                .map(|var| {
                    state
                        .var_values(*var)
                        .map(|values| values.iter().take(num_elements).cloned().collect::<Vec<_>>())
                        .unwrap_or_default()
                })
                .collect();
            let script = state.scripts.get(&sql).cloned();

            let mut result = None;
            let mut row_count = 0;
            if stmt_type.is_query() {
                match &script {
                    Some(Script::Query { columns, rows }) => {
                        result = Some(ResultSet {
                            columns: columns.clone(),
                            rows: rows.clone(),
                            next: 0,
                        });
                    }
                    _ => {
                        return state.fail(
                            942,
                            "stmt_execute",
                            "ORA-00942: table or view does not exist".to_string(),
                        )
                    }
                }
            } else if stmt_type.is_dml() {
                row_count = match &script {
                    Some(Script::Dml { affected }) => *affected,
                    _ => num_iters.into(),
                };
            }
            if let Some(s) = state.stmts.get_mut(&stmt.0) {
                s.result = result;
                s.row_count = row_count;
            }
            state.executions.push(Execution {
                sql,
                num_iters,
                mode,
                binds,
            });
            script
        };

        match script {
            Some(Script::Plsql(handler)) => self.execute_plsql(stmt, handler),
            Some(Script::RefCursor { pos, columns, rows }) => {
                self.open_ref_cursor(stmt, pos, columns, rows)
            }
            _ => STATUS_SUCCESS,
        }
    }

    fn stmt_fetch(&self, stmt: RawStmt, num_rows: u32) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::Fetch { stmt, num_rows });
        let (batch, defines) = match state.stmts.get_mut(&stmt.0) {
            Some(StmtState {
                result: Some(result),
                defines,
                row_count,
                ..
            }) => {
                let end = (result.next + num_rows as usize).min(result.rows.len());
                let batch = result.rows[result.next..end].to_vec();
                result.next = end;
                *row_count += batch.len() as u64;
                (batch, defines.clone())
            }
            _ => {
                return state.fail(
                    1002,
                    "stmt_fetch",
                    "ORA-01002: fetch out of sequence".to_string(),
                )
            }
        };
        for (idx, row) in batch.iter().enumerate() {
            for (pos, var) in &defines {
                let val = row.get(*pos as usize - 1).cloned().unwrap_or(Value::Null);
                state.set_var_value(*var, idx, val);
            }
        }
        if batch.len() < num_rows as usize {
            STATUS_NO_DATA
        } else {
            STATUS_SUCCESS
        }
    }

    fn stmt_attr(&self, stmt: RawStmt, attr: StmtAttr, value: &mut u64) -> i32 {
        let mut state = self.state.borrow_mut();
        let s = match state.stmts.get(&stmt.0) {
            Some(s) => s,
            None => return state.fail(-1, "stmt_attr", format!("invalid handle {}", stmt)),
        };
        *value = match attr {
            StmtAttr::RowCount => s.row_count,
            StmtAttr::ParamCount => s.result.as_ref().map_or(0, |r| r.columns.len() as u64),
            StmtAttr::StatementType => s.stmt_type.code(),
            StmtAttr::ParseErrorOffset => s.error_offset,
        };
        STATUS_SUCCESS
    }

    fn stmt_column_info(&self, stmt: RawStmt, pos: u32, info: &mut ColumnInfo) -> i32 {
        let mut state = self.state.borrow_mut();
        let column = state
            .stmts
            .get(&stmt.0)
            .and_then(|s| s.result.as_ref())
            .and_then(|r| r.columns.get((pos as usize).wrapping_sub(1)))
            .cloned();
        match column {
            Some(column) => {
                *info = column;
                STATUS_SUCCESS
            }
            None => state.fail(
                1007,
                "stmt_column_info",
                "ORA-01007: variable not in select list".to_string(),
            ),
        }
    }

    fn stmt_bind_by_pos(&self, stmt: RawStmt, pos: u32, var: RawVar) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::BindByPos { stmt, pos, var });
        match state.stmts.get_mut(&stmt.0) {
            Some(s) => {
                s.binds_by_pos.insert(pos, var);
                STATUS_SUCCESS
            }
            None => state.fail(-1, "stmt_bind_by_pos", format!("invalid handle {}", stmt)),
        }
    }

    fn stmt_bind_by_name(&self, stmt: RawStmt, name: &str, var: RawVar) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::BindByName {
            stmt,
            name: name.to_string(),
            var,
        });
        match state.stmts.get_mut(&stmt.0) {
            Some(s) => {
                match s.binds_by_name.iter_mut().find(|(n, _)| n == name) {
                    Some(bind) => bind.1 = var,
                    None => s.binds_by_name.push((name.to_string(), var)),
                }
                STATUS_SUCCESS
            }
            None => state.fail(-1, "stmt_bind_by_name", format!("invalid handle {}", stmt)),
        }
    }

    fn stmt_define(&self, stmt: RawStmt, pos: u32, var: RawVar) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::Define { stmt, pos, var });
        match state.stmts.get_mut(&stmt.0) {
            Some(s) => {
                s.defines.insert(pos, var);
                STATUS_SUCCESS
            }
            None => state.fail(-1, "stmt_define", format!("invalid handle {}", stmt)),
        }
    }

    fn var_new(
        &self,
        var_type: VarType,
        array_size: u32,
        size: u32,
        var: &mut Option<RawVar>,
    ) -> i32 {
        let mut state = self.state.borrow_mut();
        let handle = state.new_handle();
        state.vars.insert(
            handle,
            VarState {
                values: vec![Value::Null; array_size as usize],
            },
        );
        state.calls.push(NativeCall::VarNew {
            var: RawVar(handle),
            var_type,
            array_size,
            size,
        });
        *var = Some(RawVar(handle));
        STATUS_SUCCESS
    }

    fn var_release(&self, var: RawVar) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(NativeCall::VarRelease { var });
        match state.vars.remove(&var.0) {
            Some(_) => STATUS_SUCCESS,
            None => state.fail(-1, "var_release", format!("invalid variable {:?}", var)),
        }
    }

    fn var_set(&self, var: RawVar, pos: u32, value: &Value) -> i32 {
        let mut state = self.state.borrow_mut();
        match state
            .vars
            .get_mut(&var.0)
            .and_then(|v| v.values.get_mut(pos as usize))
        {
            Some(slot) => {
                *slot = value.clone();
                STATUS_SUCCESS
            }
            None => state.fail(-1, "var_set", format!("invalid position {}", pos)),
        }
    }

    fn var_get(&self, var: RawVar, pos: u32, value: &mut Value) -> i32 {
        let mut state = self.state.borrow_mut();
        match state
            .var_values(var)
            .and_then(|values| values.get(pos as usize))
        {
            Some(val) => {
                *value = val.clone();
                STATUS_SUCCESS
            }
            None => state.fail(-1, "var_get", format!("invalid position {}", pos)),
        }
    }

    fn commit(&self) -> i32 {
        self.state.borrow_mut().calls.push(NativeCall::Commit);
        STATUS_SUCCESS
    }

    fn rollback(&self) -> i32 {
        self.state.borrow_mut().calls.push(NativeCall::Rollback);
        STATUS_SUCCESS
    }

    fn is_connected(&self) -> bool {
        !self.state.borrow().disconnected
    }

    fn error_info(&self) -> ErrorInfo {
        self.state.borrow().last_error.clone()
    }
}
