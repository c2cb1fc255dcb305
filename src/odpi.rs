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

//! [`Native`] implementation on top of [ODPI-C](https://oracle.github.io/odpi/).
//!
//! Handles issued by this module are ODPI-C pointers. Each read of a REF
//! CURSOR element adds a reference to the statement, which the cursor
//! adopting it gives back with [`Native::stmt_free`].

use crate::error::DbError;
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
use crate::Error;
use crate::Result;
use crate::Timestamp;
use crate::Value;
use crate::VarType;
use odpic_sys::*;
use once_cell::sync::OnceCell;
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::CStr;
use std::mem::MaybeUninit;
use std::os::raw::c_char;
use std::ptr;
use std::rc::Rc;
use std::slice;
use tracing::debug;

const UTF8: &str = "UTF-8\0";

// dpiContext is created only once in the process.
struct Context {
    raw: *mut dpiContext,
}

unsafe impl Sync for Context {}
unsafe impl Send for Context {}

static GLOBAL_CONTEXT: OnceCell<Context> = OnceCell::new();

fn global_context() -> Result<*mut dpiContext> {
    let ctxt = GLOBAL_CONTEXT.get_or_try_init(|| {
        let mut params = unsafe { MaybeUninit::<dpiContextCreateParams>::zeroed().assume_init() };
        let driver_name: &'static str = concat!("oracle-cursor : ", env!("CARGO_PKG_VERSION"), "\0");
        params.defaultDriverName = driver_name.as_ptr() as *const c_char;
        let mut raw = ptr::null_mut();
        let mut err = MaybeUninit::uninit();
        if unsafe {
            dpiContext_createWithParams(
                DPI_MAJOR_VERSION,
                DPI_MINOR_VERSION,
                &mut params,
                &mut raw,
                err.as_mut_ptr(),
            )
        } == DPI_SUCCESS as i32
        {
            Ok(Context { raw })
        } else {
            Err(error_from_dpi_error(&unsafe { err.assume_init() }))
        }
    })?;
    Ok(ctxt.raw)
}

fn error_info_from_dpi_error(err: &dpiErrorInfo) -> ErrorInfo {
    ErrorInfo {
        code: err.code,
        offset: err.offset.into(),
        message: to_rust_str(err.message, err.messageLength),
        fn_name: cstr_to_string(err.fnName).into(),
        action: cstr_to_string(err.action).into(),
    }
}

fn error_from_dpi_error(err: &dpiErrorInfo) -> Error {
    Error::from_db_error(DbError::from_error_info(error_info_from_dpi_error(err)))
}

fn context_error(ctxt: *mut dpiContext) -> dpiErrorInfo {
    unsafe {
        let mut err = MaybeUninit::uninit();
        dpiContext_getError(ctxt, err.as_mut_ptr());
        err.assume_init()
    }
}

fn cstr_to_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

struct OdpiStr {
    ptr: *const c_char,
    len: u32,
}

fn to_odpi_str(s: &str) -> OdpiStr {
    if s.is_empty() {
        OdpiStr {
            ptr: ptr::null(),
            len: 0,
        }
    } else {
        OdpiStr {
            ptr: s.as_ptr() as *const c_char,
            len: s.len() as u32,
        }
    }
}

fn to_rust_str(ptr: *const c_char, len: u32) -> String {
    String::from_utf8_lossy(to_rust_slice(ptr, len)).into_owned()
}

fn to_rust_slice<'a>(ptr: *const c_char, len: u32) -> &'a [u8] {
    if ptr.is_null() {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr as *const u8, len as usize) }
    }
}

fn stmt_ptr(stmt: RawStmt) -> *mut dpiStmt {
    stmt.0 as *mut dpiStmt
}

// Returns parameters to create a new dpiVar: oracle type, native type and
// whether the size is in bytes.
fn var_create_param(var_type: VarType) -> (dpiOracleTypeNum, dpiNativeTypeNum, i32) {
    match var_type {
        VarType::Varchar => (DPI_ORACLE_TYPE_VARCHAR, DPI_NATIVE_TYPE_BYTES, 1),
        VarType::Raw => (DPI_ORACLE_TYPE_RAW, DPI_NATIVE_TYPE_BYTES, 1),
        VarType::Int64 | VarType::Boolean => (DPI_ORACLE_TYPE_NUMBER, DPI_NATIVE_TYPE_INT64, 0),
        VarType::Double => (DPI_ORACLE_TYPE_NUMBER, DPI_NATIVE_TYPE_DOUBLE, 0),
        VarType::Timestamp => (DPI_ORACLE_TYPE_TIMESTAMP, DPI_NATIVE_TYPE_TIMESTAMP, 0),
        VarType::Cursor => (DPI_ORACLE_TYPE_STMT, DPI_NATIVE_TYPE_STMT, 0),
    }
}

fn column_info_from_query_info(info: &dpiQueryInfo) -> ColumnInfo {
    let type_info = &info.typeInfo;
    let (var_type, size) = match type_info.oracleTypeNum {
        DPI_ORACLE_TYPE_VARCHAR
        | DPI_ORACLE_TYPE_NVARCHAR
        | DPI_ORACLE_TYPE_CHAR
        | DPI_ORACLE_TYPE_NCHAR
        | DPI_ORACLE_TYPE_LONG_VARCHAR => (VarType::Varchar, type_info.clientSizeInBytes),
        DPI_ORACLE_TYPE_RAW | DPI_ORACLE_TYPE_LONG_RAW => (VarType::Raw, type_info.dbSizeInBytes),
        DPI_ORACLE_TYPE_NATIVE_INT => (VarType::Int64, 0),
        DPI_ORACLE_TYPE_NUMBER if type_info.scale == 0 && (1..=18).contains(&type_info.precision) => {
            (VarType::Int64, 0)
        }
        DPI_ORACLE_TYPE_NUMBER | DPI_ORACLE_TYPE_NATIVE_FLOAT | DPI_ORACLE_TYPE_NATIVE_DOUBLE => {
            (VarType::Double, 0)
        }
        DPI_ORACLE_TYPE_DATE
        | DPI_ORACLE_TYPE_TIMESTAMP
        | DPI_ORACLE_TYPE_TIMESTAMP_TZ
        | DPI_ORACLE_TYPE_TIMESTAMP_LTZ => (VarType::Timestamp, 0),
        DPI_ORACLE_TYPE_BOOLEAN => (VarType::Boolean, 0),
        DPI_ORACLE_TYPE_STMT => (VarType::Cursor, 0),
        // ROWID and LOBs are fetched as text
        _ => (VarType::Varchar, VarType::Varchar.default_size()),
    };
    ColumnInfo::new(to_rust_str(info.name, info.nameLength), var_type, size)
        .with_precision(type_info.precision, type_info.scale)
        .with_nullable(info.nullOk != 0)
}

struct OdpiVar {
    handle: *mut dpiVar,
    data: *mut dpiData,
    var_type: VarType,
    array_size: u32,
    // buffer row index of the statement the variable is defined on
    row_offset: Option<Rc<Cell<u32>>>,
}

impl OdpiVar {
    fn data_at(&self, pos: u32) -> Option<*mut dpiData> {
        let idx = pos + self.row_offset.as_ref().map_or(0, |offset| offset.get());
        if idx < self.array_size {
            Some(unsafe { self.data.add(idx as usize) })
        } else {
            None
        }
    }
}

/// A connection made through ODPI-C
pub struct OdpiNative {
    ctxt: *mut dpiContext,
    conn: *mut dpiConn,
    vars: RefCell<HashMap<usize, OdpiVar>>,
    row_indexes: RefCell<HashMap<usize, Rc<Cell<u32>>>>,
    last_error: RefCell<ErrorInfo>,
}

impl OdpiNative {
    /// Connects to an Oracle server.
    pub fn connect(username: &str, password: &str, connect_string: &str) -> Result<OdpiNative> {
        let ctxt = global_context()?;
        let mut common_params = MaybeUninit::uninit();
        let mut conn_params = MaybeUninit::uninit();
        let (mut common_params, mut conn_params) = unsafe {
            if dpiContext_initCommonCreateParams(ctxt, common_params.as_mut_ptr())
                != DPI_SUCCESS as i32
                || dpiContext_initConnCreateParams(ctxt, conn_params.as_mut_ptr())
                    != DPI_SUCCESS as i32
            {
                return Err(error_from_dpi_error(&context_error(ctxt)));
            }
            (common_params.assume_init(), conn_params.assume_init())
        };
        common_params.encoding = UTF8.as_ptr() as *const c_char;
        common_params.nencoding = UTF8.as_ptr() as *const c_char;

        let username = to_odpi_str(username);
        let password = to_odpi_str(password);
        let connect_string = to_odpi_str(connect_string);
        let mut conn = ptr::null_mut();
        if unsafe {
            dpiConn_create(
                ctxt,
                username.ptr,
                username.len,
                password.ptr,
                password.len,
                connect_string.ptr,
                connect_string.len,
                &common_params,
                &mut conn_params,
                &mut conn,
            )
        } != DPI_SUCCESS as i32
        {
            return Err(error_from_dpi_error(&context_error(ctxt)));
        }
        debug!("connected through ODPI-C");
        Ok(OdpiNative {
            ctxt,
            conn,
            vars: RefCell::new(HashMap::new()),
            row_indexes: RefCell::new(HashMap::new()),
            last_error: RefCell::new(ErrorInfo::default()),
        })
    }

    fn check(&self, code: i32) -> i32 {
        if code == DPI_SUCCESS as i32 {
            STATUS_SUCCESS
        } else {
            *self.last_error.borrow_mut() = error_info_from_dpi_error(&context_error(self.ctxt));
            STATUS_FAILURE
        }
    }

    fn fail<M>(&self, message: M) -> i32
    where
        M: Into<String>,
    {
        *self.last_error.borrow_mut() = ErrorInfo {
            message: message.into(),
            fn_name: "oracle_cursor::odpi".into(),
            ..ErrorInfo::default()
        };
        STATUS_FAILURE
    }

    fn row_index(&self, stmt: RawStmt) -> Rc<Cell<u32>> {
        self.row_indexes
            .borrow_mut()
            .entry(stmt.0)
            .or_default()
            .clone()
    }
}

impl Drop for OdpiNative {
    fn drop(&mut self) {
        for (_, var) in self.vars.borrow_mut().drain() {
            unsafe { dpiVar_release(var.handle) };
        }
        unsafe { dpiConn_release(self.conn) };
    }
}

impl Native for OdpiNative {
    fn prepare_stmt(&self, sql: &str, tag: Option<&str>, stmt: &mut Option<RawStmt>) -> i32 {
        let sql = to_odpi_str(sql);
        let tag = to_odpi_str(tag.unwrap_or(""));
        let mut handle: *mut dpiStmt = ptr::null_mut();
        let status = self.check(unsafe {
            dpiConn_prepareStmt(
                self.conn,
                0,
                sql.ptr,
                sql.len,
                tag.ptr,
                tag.len,
                &mut handle,
            )
        });
        if status == STATUS_SUCCESS {
            *stmt = Some(RawStmt(handle as usize));
            self.row_index(RawStmt(handle as usize));
        }
        status
    }

    fn stmt_release(&self, stmt: RawStmt, tag: Option<&str>) -> i32 {
        let tag = to_odpi_str(tag.unwrap_or(""));
        let status = self.check(unsafe { dpiStmt_close(stmt_ptr(stmt), tag.ptr, tag.len) });
        unsafe { dpiStmt_release(stmt_ptr(stmt)) };
        self.row_indexes.borrow_mut().remove(&stmt.0);
        status
    }

    fn stmt_free(&self, stmt: RawStmt) -> i32 {
        self.row_indexes.borrow_mut().remove(&stmt.0);
        self.check(unsafe { dpiStmt_release(stmt_ptr(stmt)) })
    }

    fn stmt_execute(&self, stmt: RawStmt, num_iters: u32, mode: ExecMode) -> i32 {
        let mode = match mode {
            ExecMode::Default => DPI_MODE_EXEC_DEFAULT,
            ExecMode::CommitOnSuccess => DPI_MODE_EXEC_COMMIT_ON_SUCCESS,
        };
        if num_iters <= 1 {
            let mut num_query_columns = 0;
            self.check(unsafe { dpiStmt_execute(stmt_ptr(stmt), mode, &mut num_query_columns) })
        } else {
            self.check(unsafe { dpiStmt_executeMany(stmt_ptr(stmt), mode, num_iters) })
        }
    }

    fn stmt_fetch(&self, stmt: RawStmt, num_rows: u32) -> i32 {
        let mut buffer_row_index = 0;
        let mut num_rows_fetched = 0;
        let mut more_rows = 0;
        let status = self.check(unsafe {
            dpiStmt_fetchRows(
                stmt_ptr(stmt),
                num_rows,
                &mut buffer_row_index,
                &mut num_rows_fetched,
                &mut more_rows,
            )
        });
        if status != STATUS_SUCCESS {
            return status;
        }
        self.row_index(stmt).set(buffer_row_index);
        if num_rows_fetched < num_rows {
            STATUS_NO_DATA
        } else {
            STATUS_SUCCESS
        }
    }

    fn stmt_attr(&self, stmt: RawStmt, attr: StmtAttr, value: &mut u64) -> i32 {
        match attr {
            StmtAttr::RowCount => self.check(unsafe { dpiStmt_getRowCount(stmt_ptr(stmt), value) }),
            StmtAttr::ParamCount => {
                let mut num = 0;
                let status =
                    self.check(unsafe { dpiStmt_getNumQueryColumns(stmt_ptr(stmt), &mut num) });
                *value = num.into();
                status
            }
            StmtAttr::StatementType => {
                let mut info = MaybeUninit::uninit();
                let status = self.check(unsafe { dpiStmt_getInfo(stmt_ptr(stmt), info.as_mut_ptr()) });
                if status == STATUS_SUCCESS {
                    let info: dpiStmtInfo = unsafe { info.assume_init() };
                    *value = if info.isQuery != 0 {
                        DPI_STMT_TYPE_SELECT.into()
                    } else {
                        info.statementType.into()
                    };
                }
                status
            }
            StmtAttr::ParseErrorOffset => {
                *value = self.last_error.borrow().offset.into();
                STATUS_SUCCESS
            }
        }
    }

    fn stmt_column_info(&self, stmt: RawStmt, pos: u32, info: &mut ColumnInfo) -> i32 {
        let mut query_info = MaybeUninit::uninit();
        let status = self.check(unsafe {
            dpiStmt_getQueryInfo(stmt_ptr(stmt), pos, query_info.as_mut_ptr())
        });
        if status == STATUS_SUCCESS {
            *info = column_info_from_query_info(unsafe { &query_info.assume_init() });
        }
        status
    }

    fn stmt_bind_by_pos(&self, stmt: RawStmt, pos: u32, var: RawVar) -> i32 {
        match self.vars.borrow().get(&var.0) {
            Some(v) => self.check(unsafe { dpiStmt_bindByPos(stmt_ptr(stmt), pos, v.handle) }),
            None => self.fail(format!("unknown variable {:?}", var)),
        }
    }

    fn stmt_bind_by_name(&self, stmt: RawStmt, name: &str, var: RawVar) -> i32 {
        let name = to_odpi_str(name);
        match self.vars.borrow().get(&var.0) {
            Some(v) => self.check(unsafe {
                dpiStmt_bindByName(stmt_ptr(stmt), name.ptr, name.len, v.handle)
            }),
            None => self.fail(format!("unknown variable {:?}", var)),
        }
    }

    fn stmt_define(&self, stmt: RawStmt, pos: u32, var: RawVar) -> i32 {
        let row_index = self.row_index(stmt);
        let mut vars = self.vars.borrow_mut();
        let v = match vars.get_mut(&var.0) {
            Some(v) => v,
            None => return self.fail(format!("unknown variable {:?}", var)),
        };
        let status = self.check(unsafe { dpiStmt_setFetchArraySize(stmt_ptr(stmt), v.array_size) });
        if status != STATUS_SUCCESS {
            return status;
        }
        let status = self.check(unsafe { dpiStmt_define(stmt_ptr(stmt), pos, v.handle) });
        if status == STATUS_SUCCESS {
            v.row_offset = Some(row_index);
        }
        status
    }

    fn var_new(&self, var_type: VarType, array_size: u32, size: u32, var: &mut Option<RawVar>) -> i32 {
        let (oratype, native_type, size_is_bytes) = var_create_param(var_type);
        let size = if var_type.is_variable_length() { size } else { 0 };
        let mut handle = ptr::null_mut();
        let mut data = ptr::null_mut();
        let status = self.check(unsafe {
            dpiConn_newVar(
                self.conn,
                oratype,
                native_type,
                array_size,
                size,
                size_is_bytes,
                0,
                ptr::null_mut(),
                &mut handle,
                &mut data,
            )
        });
        if status == STATUS_SUCCESS {
            self.vars.borrow_mut().insert(
                handle as usize,
                OdpiVar {
                    handle,
                    data,
                    var_type,
                    array_size,
                    row_offset: None,
                },
            );
            *var = Some(RawVar(handle as usize));
        }
        status
    }

    fn var_release(&self, var: RawVar) -> i32 {
        match self.vars.borrow_mut().remove(&var.0) {
            Some(v) => self.check(unsafe { dpiVar_release(v.handle) }),
            None => self.fail(format!("unknown variable {:?}", var)),
        }
    }

    fn var_set(&self, var: RawVar, pos: u32, value: &Value) -> i32 {
        let vars = self.vars.borrow();
        let v = match vars.get(&var.0) {
            Some(v) => v,
            None => return self.fail(format!("unknown variable {:?}", var)),
        };
        if pos >= v.array_size {
            return self.fail(format!("array position {} is out of range", pos));
        }
        let data = unsafe { v.data.add(pos as usize) };
        unsafe {
            match value {
                Value::Null => dpiData_setNull(data),
                Value::String(s) => {
                    return self.check(dpiVar_setFromBytes(
                        v.handle,
                        pos,
                        s.as_ptr() as *const c_char,
                        s.len() as u32,
                    ))
                }
                Value::Bytes(b) => {
                    return self.check(dpiVar_setFromBytes(
                        v.handle,
                        pos,
                        b.as_ptr() as *const c_char,
                        b.len() as u32,
                    ))
                }
                Value::Int64(n) => dpiData_setInt64(data, *n),
                Value::Double(n) => dpiData_setDouble(data, *n),
                Value::Boolean(b) => dpiData_setInt64(data, i64::from(*b)),
                Value::Timestamp(ts) => dpiData_setTimestamp(
                    data,
                    ts.year() as i16,
                    ts.month() as u8,
                    ts.day() as u8,
                    ts.hour() as u8,
                    ts.minute() as u8,
                    ts.second() as u8,
                    ts.nanosecond(),
                    0,
                    0,
                ),
                Value::Cursor(stmt) => {
                    return self.check(dpiVar_setFromStmt(v.handle, pos, stmt_ptr(*stmt)))
                }
            }
        }
        STATUS_SUCCESS
    }

    fn var_get(&self, var: RawVar, pos: u32, value: &mut Value) -> i32 {
        let vars = self.vars.borrow();
        let v = match vars.get(&var.0) {
            Some(v) => v,
            None => return self.fail(format!("unknown variable {:?}", var)),
        };
        let data = match v.data_at(pos) {
            Some(data) => data,
            None => return self.fail(format!("array position {} is out of range", pos)),
        };
        unsafe {
            if (*data).isNull != 0 {
                *value = Value::Null;
                return STATUS_SUCCESS;
            }
            *value = match v.var_type {
                VarType::Varchar => {
                    let bytes = dpiData_getBytes(data);
                    Value::String(to_rust_str((*bytes).ptr, (*bytes).length))
                }
                VarType::Raw => {
                    let bytes = dpiData_getBytes(data);
                    Value::Bytes(to_rust_slice((*bytes).ptr, (*bytes).length).to_vec())
                }
                VarType::Int64 => Value::Int64(dpiData_getInt64(data)),
                VarType::Double => Value::Double(dpiData_getDouble(data)),
                VarType::Boolean => Value::Boolean(dpiData_getInt64(data) != 0),
                VarType::Timestamp => {
                    let ts = &*dpiData_getTimestamp(data);
                    match Timestamp::new(
                        ts.year.into(),
                        ts.month.into(),
                        ts.day.into(),
                        ts.hour.into(),
                        ts.minute.into(),
                        ts.second.into(),
                        ts.fsecond,
                    ) {
                        Ok(ts) => Value::Timestamp(ts),
                        Err(err) => return self.fail(err.to_string()),
                    }
                }
                VarType::Cursor => {
                    let stmt = dpiData_getStmt(data);
                    let status = self.check(dpiStmt_addRef(stmt));
                    if status != STATUS_SUCCESS {
                        return status;
                    }
                    Value::Cursor(RawStmt(stmt as usize))
                }
            };
        }
        STATUS_SUCCESS
    }

    fn commit(&self) -> i32 {
        self.check(unsafe { dpiConn_commit(self.conn) })
    }

    fn rollback(&self) -> i32 {
        self.check(unsafe { dpiConn_rollback(self.conn) })
    }

    fn is_connected(&self) -> bool {
        !self.conn.is_null()
    }

    fn error_info(&self) -> ErrorInfo {
        self.last_error.borrow().clone()
    }
}
