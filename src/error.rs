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

use crate::native::ErrorInfo;
use crate::native::Native;
use std::borrow::Cow;
use std::convert;
use std::error;
use std::fmt;
use std::fmt::Display;
use std::num;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
/// A list of error categories.
///
/// It is used with the [`Error`] type.
///
/// Use `_` to match “all other errors” in `match` expression because it has [`#[non_exhaustive]`](https://doc.rust-lang.org/reference/attributes/type_system.html#the-non_exhaustive-attribute) attribute.
pub enum ErrorKind {
    /// Error reported by the native call-level library.
    Database,

    /// Error when the cursor or its connection is used in a state that
    /// doesn't allow the call, such as fetching from a closed cursor.
    Interface,

    /// Error caused by the statement or its arguments, such as mixing
    /// positional and named binds on one statement.
    Programming,

    /// Error when the requested operation isn't supported for the statement,
    /// such as `executemany` with a query.
    NotSupported,

    /// Error when NULL value is got but the target rust type cannot handle NULL.
    /// Use `Option<...>` in this case.
    NullValue,

    /// Error when a value doesn't fit in a variable, or a conversion
    /// from a type to another fails due to out-of-range
    OutOfRange,

    /// Error when conversion from a type to another is not allowed.
    InvalidTypeConversion,

    /// Error when an array position is outside a variable's elements. (zero based)
    InvalidArrayIndex,

    /// Error when an unacceptable argument is passed
    InvalidArgument,

    /// Error when the column index is out of range. (zero based)
    InvalidColumnIndex,

    /// Error when the column name is not in the SQL.
    InvalidColumnName,

    /// Internal error. When you get this error, please report it with a test case to reproduce it.
    InternalError,
}

/// The error type for oracle-cursor
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    // DbError is in Box to reduce the size of this struct.
    // See: https://rust-lang.github.io/rust-clippy/master/index.html#result_large_err
    dberr: Option<Box<DbError>>,
    source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error. Converters and type handlers use this to report
    /// their own failures.
    pub fn new<M>(kind: ErrorKind, message: M) -> Error
    where
        M: Into<Cow<'static, str>>,
    {
        Error {
            kind,
            message: message.into(),
            dberr: None,
            source: None,
        }
    }

    /// Builds a database error from the detail the native library recorded
    /// for its most recent failure.
    pub fn from_native(native: &dyn Native) -> Error {
        Error::from_db_error(DbError::from_error_info(native.error_info()))
    }

    pub(crate) fn from_db_error(dberr: DbError) -> Error {
        Error::new(ErrorKind::Database, format!("Database Error: {}", dberr.message))
            .add_dberr(dberr)
    }

    pub(crate) fn add_dberr(self, dberr: DbError) -> Error {
        Error {
            dberr: Some(Box::new(dberr)),
            ..self
        }
    }

    pub(crate) fn add_source<E>(self, source: E) -> Error
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Error {
            source: Some(source.into()),
            ..self
        }
    }

    /// Replaces the parse error offset of the contained [`DbError`].
    pub(crate) fn with_offset(mut self, offset: u32) -> Error {
        if let Some(dberr) = self.dberr.as_mut() {
            dberr.offset = offset;
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns [`DbError`].
    pub fn db_error(&self) -> Option<&DbError> {
        self.dberr.as_ref().map(|b| b.as_ref())
    }

    /// Returns the native error code.
    /// For example 1 for "ORA-0001: unique constraint violated"
    pub fn db_code(&self) -> Option<i32> {
        match (self.kind, &self.dberr) {
            (ErrorKind::Database, Some(dberr)) if dberr.code != 0 => Some(dberr.code),
            _ => None,
        }
    }

    /// Returns `true` for errors caused by misuse of the cursor API:
    /// [`ErrorKind::Interface`] and [`ErrorKind::Programming`].
    pub fn is_usage_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Interface | ErrorKind::Programming)
    }

    /// Returns `true` when a failed assignment into an existing bind
    /// variable may be retried with a freshly created variable.
    pub(crate) fn is_recoverable_set_value_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidTypeConversion | ErrorKind::OutOfRange | ErrorKind::InvalidArrayIndex
        )
    }

    pub(crate) fn interface<T>(message: T) -> Error
    where
        T: Into<Cow<'static, str>>,
    {
        Error::new(ErrorKind::Interface, message.into())
    }

    pub(crate) fn programming<T>(message: T) -> Error
    where
        T: Into<Cow<'static, str>>,
    {
        Error::new(ErrorKind::Programming, message.into())
    }

    pub(crate) fn not_supported<T>(message: T) -> Error
    where
        T: Into<Cow<'static, str>>,
    {
        Error::new(ErrorKind::NotSupported, message.into())
    }

    pub(crate) fn null_value() -> Error {
        Error::new(ErrorKind::NullValue, "NULL value found")
    }

    pub(crate) fn out_of_range<T>(message: T) -> Error
    where
        T: Into<Cow<'static, str>>,
    {
        Error::new(ErrorKind::OutOfRange, message.into())
    }

    pub(crate) fn invalid_type_conversion<T1, T2>(from: T1, to: T2) -> Error
    where
        T1: Display,
        T2: Display,
    {
        Error::new(
            ErrorKind::InvalidTypeConversion,
            format!("invalid type conversion from {} to {}", from, to),
        )
    }

    pub(crate) fn invalid_array_index(pos: u32, array_size: u32) -> Error {
        Error::new(
            ErrorKind::InvalidArrayIndex,
            format!(
                "array position {} is out of range (array size {})",
                pos, array_size
            ),
        )
    }

    pub(crate) fn invalid_column_index<T>(index: T) -> Error
    where
        T: Display,
    {
        Error::new(
            ErrorKind::InvalidColumnIndex,
            format!("invalid column index {} (zero-based)", index),
        )
    }

    pub(crate) fn invalid_column_name<T>(name: T) -> Error
    where
        T: Display,
    {
        Error::new(
            ErrorKind::InvalidColumnName,
            format!("invalid column name {}", name),
        )
    }

    pub(crate) fn invalid_argument<M>(message: M) -> Error
    where
        M: Into<Cow<'static, str>>,
    {
        Error::new(ErrorKind::InvalidArgument, message.into())
    }

    pub(crate) fn internal_error<T>(message: T) -> Error
    where
        T: Into<Cow<'static, str>>,
    {
        Error::new(ErrorKind::InternalError, message.into())
    }
}

/// Error detail reported by the native call-level library
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct DbError {
    code: i32,
    offset: u32,
    message: String,
    fn_name: Cow<'static, str>,
    action: Cow<'static, str>,
}

impl DbError {
    pub(crate) fn from_error_info(info: ErrorInfo) -> DbError {
        DbError {
            code: info.code,
            offset: info.offset,
            message: info.message,
            fn_name: info.fn_name,
            action: info.action,
        }
    }

    /// Creates a new DbError.
    pub fn new<M, F, A>(code: i32, offset: u32, message: M, fn_name: F, action: A) -> DbError
    where
        M: Into<String>,
        F: Into<Cow<'static, str>>,
        A: Into<Cow<'static, str>>,
    {
        DbError {
            code,
            offset,
            message: message.into(),
            fn_name: fn_name.into(),
            action: action.into(),
        }
    }

    /// The native error code. If no database error has taken place the value is 0.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The parse error offset (in bytes) of the statement when executing it failed.
    /// Otherwise the value is 0.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The native function name which was called in which the error took place.
    pub fn fn_name(&self) -> &str {
        &self.fn_name
    }

    /// The internal action that was being performed when the error took place.
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        if let Some(ref err) = self.source {
            Some(err.as_ref())
        } else {
            None
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<convert::Infallible> for Error {
    fn from(err: convert::Infallible) -> Self {
        match err {}
    }
}

impl From<num::TryFromIntError> for Error {
    fn from(err: num::TryFromIntError) -> Self {
        Error::out_of_range(err.to_string()).add_source(err)
    }
}

/// Checks the status code returned by a native call and returns a
/// database error built from the native error detail when it failed.
#[macro_export]
#[doc(hidden)]
macro_rules! chkerr {
    ($native:expr, $code:expr) => {{
        if $code != $crate::native::STATUS_SUCCESS {
            return Err($crate::Error::from_native($native));
        }
    }};
    ($native:expr, $code:expr, $cleanup:stmt) => {{
        if $code != $crate::native::STATUS_SUCCESS {
            let err = $crate::Error::from_native($native);
            $cleanup
            return Err(err);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_kinds() {
        assert!(Error::interface("not open").is_usage_error());
        assert!(Error::programming("intermixed").is_usage_error());
        assert!(!Error::not_supported("query").is_usage_error());
        assert!(!Error::null_value().is_usage_error());
    }

    #[test]
    fn recoverable_set_value_errors() {
        assert!(Error::out_of_range("too large").is_recoverable_set_value_error());
        assert!(Error::invalid_type_conversion("Int64", "Varchar").is_recoverable_set_value_error());
        assert!(Error::invalid_array_index(3, 3).is_recoverable_set_value_error());
        assert!(!Error::invalid_argument("converter").is_recoverable_set_value_error());
    }

    #[test]
    fn offset_is_replaced() {
        let err = Error::from_db_error(DbError::new(923, 0, "ORA-00923", "execute", "parse"))
            .with_offset(12);
        assert_eq!(err.kind(), ErrorKind::Database);
        assert_eq!(err.db_code(), Some(923));
        assert_eq!(err.db_error().map(|e| e.offset()), Some(12));
        assert_eq!(err.to_string(), "Database Error: ORA-00923");
    }
}
