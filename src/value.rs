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

use crate::native::RawStmt;
use crate::Error;
use crate::Result;
use std::convert::TryFrom;
use std::fmt;

/// Timestamp without time zone
///
/// ```
/// # use oracle_cursor::Timestamp;
/// let ts = Timestamp::new(2017, 8, 9, 11, 22, 33, 500000000)?;
/// assert_eq!(ts.to_string(), "2017-08-09 11:22:33.500000000");
/// # Ok::<(), oracle_cursor::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanosecond: u32,
}

impl Timestamp {
    /// Creates a timestamp.
    ///
    /// Valid values are:
    ///
    /// | argument | valid values |
    /// |---|---|
    /// | `year` | -4713 to 9999 |
    /// | `month` | 1 to 12 |
    /// | `day` | 1 to 31 |
    /// | `hour` | 0 to 23 |
    /// | `minute` | 0 to 59 |
    /// | `second` | 0 to 59 |
    /// | `nanosecond` | 0 to 999,999,999 |
    ///
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        nanosecond: u32,
    ) -> Result<Timestamp> {
        let mut errmsg = "";
        if !(-4713..=9999).contains(&year) {
            errmsg = "year";
        } else if !(1..=12).contains(&month) {
            errmsg = "month";
        } else if !(1..=31).contains(&day) {
            errmsg = "day";
        } else if hour > 23 {
            errmsg = "hour";
        } else if minute > 59 {
            errmsg = "minute";
        } else if second > 59 {
            errmsg = "second";
        } else if nanosecond > 999_999_999 {
            errmsg = "nanosecond";
        }
        if !errmsg.is_empty() {
            return Err(Error::out_of_range(format!("invalid {}", errmsg)));
        }
        Ok(Timestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond,
        })
    }

    /// Returns the year number from -4713 to 9999.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Returns the month number from 1 to 12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the day number from 1 to 31.
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Returns the hour number from 0 to 23.
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Returns the minute number from 0 to 59.
    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Returns the second number from 0 to 59.
    pub fn second(&self) -> u32 {
        self.second
    }

    /// Returns the nanosecond number from 0 to 999,999,999.
    pub fn nanosecond(&self) -> u32 {
        self.nanosecond
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:09}",
            if self.year < 0 { "-" } else { "" },
            self.year.abs(),
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.nanosecond
        )
    }
}

/// A value moved between the application and bind or define variables
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int64(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Boolean(bool),
    Timestamp(Timestamp),
    /// Statement handle produced by a REF CURSOR
    Cursor(RawStmt),
}

macro_rules! define_value_accessors {
    ($($variant:ident : $type:ty,)+) => {
        paste::item! {
            impl Value {
                $(
                    #[doc = concat!("Returns the `", stringify!($variant), "` payload, if any.")]
                    pub fn [<as_ $variant:snake>](&self) -> Option<&$type> {
                        match self {
                            Value::$variant(val) => Some(val),
                            _ => None,
                        }
                    }
                )+
            }

            $(
                impl From<$type> for Value {
                    fn from(val: $type) -> Value {
                        Value::$variant(val)
                    }
                }
            )+
        }
    };
}

define_value_accessors! {
    Int64: i64,
    Double: f64,
    String: String,
    Bytes: Vec<u8>,
    Boolean: bool,
    Timestamp: Timestamp,
    Cursor: RawStmt,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Int64(_) => "Int64",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Boolean(_) => "Boolean",
            Value::Timestamp(_) => "Timestamp",
            Value::Cursor(_) => "Cursor",
        }
    }

    /// Gets the value as the specified rust type.
    pub fn get<T>(&self) -> Result<T>
    where
        T: FromValue,
    {
        T::from_value(self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int64(val) => write!(f, "{}", val),
            Value::Double(val) => write!(f, "{}", val),
            Value::String(val) => write!(f, "{}", val),
            Value::Bytes(val) => {
                for b in val {
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
            Value::Boolean(val) => write!(f, "{}", val),
            Value::Timestamp(val) => write!(f, "{}", val),
            Value::Cursor(val) => write!(f, "{}", val),
        }
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Value {
        Value::Int64(val.into())
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Value {
        Value::Int64(val.into())
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Value {
        Value::Double(val.into())
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Value {
        Value::String(val.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(val: &[u8]) -> Value {
        Value::Bytes(val.to_vec())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(val: Option<T>) -> Value {
        match val {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Conversion from a [`Value`] to a rust type
///
/// NULL converts to `None` for `Option<T>` and fails with
/// [`ErrorKind::NullValue`](crate::ErrorKind::NullValue) otherwise.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self>;
}

fn conversion_error<T>(val: &Value, to: &'static str) -> Result<T> {
    if val.is_null() {
        Err(Error::null_value())
    } else {
        Err(Error::invalid_type_conversion(val.type_name(), to))
    }
}

macro_rules! impl_from_value_for_int {
    ($($type:ty),+) => {
        $(
            impl FromValue for $type {
                fn from_value(val: &Value) -> Result<$type> {
                    match val {
                        Value::Int64(n) => Ok(<$type>::try_from(*n)?),
                        Value::Boolean(b) => Ok(<$type>::from(*b as u8)),
                        Value::String(s) => s.trim().parse().map_err(|err| {
                            Error::invalid_type_conversion("String", stringify!($type))
                                .add_source(err)
                        }),
                        _ => conversion_error(val, stringify!($type)),
                    }
                }
            }
        )+
    };
}

impl_from_value_for_int!(i64, i32, u32, u64);

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<f64> {
        match val {
            Value::Double(n) => Ok(*n),
            Value::Int64(n) => Ok(*n as f64),
            _ => conversion_error(val, "f64"),
        }
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<String> {
        match val {
            Value::Null | Value::Cursor(_) => conversion_error(val, "String"),
            Value::String(s) => Ok(s.clone()),
            _ => Ok(val.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(val: &Value) -> Result<Vec<u8>> {
        match val {
            Value::Bytes(b) => Ok(b.clone()),
            _ => conversion_error(val, "Vec<u8>"),
        }
    }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<bool> {
        match val {
            Value::Boolean(b) => Ok(*b),
            Value::Int64(n) => Ok(*n != 0),
            _ => conversion_error(val, "bool"),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(val: &Value) -> Result<Timestamp> {
        match val {
            Value::Timestamp(ts) => Ok(*ts),
            _ => conversion_error(val, "Timestamp"),
        }
    }
}

impl FromValue for RawStmt {
    fn from_value(val: &Value) -> Result<RawStmt> {
        match val {
            Value::Cursor(stmt) => Ok(*stmt),
            _ => conversion_error(val, "RawStmt"),
        }
    }
}

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Value> {
        Ok(val.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(val: &Value) -> Result<Option<T>> {
        match val {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(val)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn timestamp_range_check() {
        assert!(Timestamp::new(2024, 2, 29, 23, 59, 59, 999_999_999).is_ok());
        let err = Timestamp::new(2024, 13, 1, 0, 0, 0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(err.to_string(), "invalid month");
    }

    #[test]
    fn accessors_and_conversions() {
        let val = Value::from(7i32);
        assert_eq!(val.as_int64(), Some(&7));
        assert_eq!(val.as_string(), None);
        assert_eq!(val.get::<u32>().unwrap(), 7);
        assert_eq!(val.get::<String>().unwrap(), "7");
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn null_needs_option() {
        assert_eq!(Value::Null.get::<i64>().unwrap_err().kind(), ErrorKind::NullValue);
        assert_eq!(Value::Null.get::<Option<i64>>().unwrap(), None);
        assert_eq!(
            Value::Int64(-1).get::<u32>().unwrap_err().kind(),
            ErrorKind::OutOfRange
        );
        assert_eq!(
            Value::Bytes(vec![1]).get::<i64>().unwrap_err().kind(),
            ErrorKind::InvalidTypeConversion
        );
    }
}
