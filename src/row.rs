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

use crate::Cursor;
use crate::Error;
use crate::FromValue;
use crate::Result;
use crate::Value;
use crate::VarType;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Column information of a query
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInfo {
    name: String,
    var_type: VarType,
    size: u32,
    precision: i16,
    scale: i8,
    nullable: bool,
}

impl ColumnInfo {
    /// Creates column information. Native implementations fill it in from
    /// the describe data of a statement.
    pub fn new<N>(name: N, var_type: VarType, size: u32) -> ColumnInfo
    where
        N: Into<String>,
    {
        ColumnInfo {
            name: name.into(),
            var_type,
            size,
            precision: 0,
            scale: 0,
            nullable: true,
        }
    }

    pub fn with_precision(mut self, precision: i16, scale: i8) -> ColumnInfo {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> ColumnInfo {
        self.nullable = nullable;
        self
    }

    /// Gets column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the type of the variable the column is fetched into by default
    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    /// Gets the maximum size in bytes of the column. Zero when the column
    /// type has no size.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn precision(&self) -> i16 {
        self.precision
    }

    pub fn scale(&self) -> i8 {
        self.scale
    }

    /// Gets whether the column may contain NULL.
    pub fn nullable(&self) -> bool {
        self.nullable
    }
}

impl Default for ColumnInfo {
    fn default() -> ColumnInfo {
        ColumnInfo::new("", VarType::Varchar, 0)
    }
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name, self.var_type)?;
        if self.var_type.is_variable_length() {
            write!(f, "({})", self.size)?;
        }
        if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

/// A trait to look up a column of a [`Row`] by index or by name
///
/// Indexes are zero-based. Names are compared case-insensitively.
pub trait ColumnIndex {
    fn idx(&self, column_names: &[String]) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn idx(&self, column_names: &[String]) -> Result<usize> {
        if *self < column_names.len() {
            Ok(*self)
        } else {
            Err(Error::invalid_column_index(*self))
        }
    }
}

impl ColumnIndex for &str {
    fn idx(&self, column_names: &[String]) -> Result<usize> {
        column_names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(self))
            .ok_or_else(|| Error::invalid_column_name(self))
    }
}

/// Row in a result set of a query
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    column_names: Rc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row. Row factories use this to return rewritten rows.
    pub fn new(column_names: Rc<Vec<String>>, values: Vec<Value>) -> Row {
        Row {
            column_names,
            values,
        }
    }

    /// Gets the column value at the specified index or name.
    pub fn get<I, T>(&self, colidx: I) -> Result<T>
    where
        I: ColumnIndex,
        T: FromValue,
    {
        self.value(colidx)?.get()
    }

    /// Gets the column value at the specified index or name without conversion.
    pub fn value<I>(&self, colidx: I) -> Result<&Value>
    where
        I: ColumnIndex,
    {
        let pos = colidx.idx(&self.column_names)?;
        self.values
            .get(pos)
            .ok_or_else(|| Error::invalid_column_index(pos))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Gets column values as specified type.
    ///
    /// Type inference for the return type doesn't work. You need to specify
    /// it explicitly such as `row.get_as::<(i64, String)>()`.
    /// See [`RowValue`] for available return types.
    pub fn get_as<T>(&self) -> Result<T>
    where
        T: RowValue,
    {
        T::get(self)
    }
}

/// A hook applied to every fetched row before it is returned
///
/// ```
/// # use oracle_cursor::*;
/// # use oracle_cursor::test_util::ScriptedNative;
/// # use std::rc::Rc;
/// # let native = Rc::new(ScriptedNative::new());
/// # native.add_query("select ename from emp",
/// #     vec![ColumnInfo::new("ENAME", VarType::Varchar, 10)],
/// #     vec![vec![Value::from("smith")]]);
/// # let conn = Connection::new(native.clone());
/// let mut cursor = conn.cursor();
/// cursor.set_row_factory(|row: Row| -> Result<Row> {
///     let upper = row.get::<_, String>(0)?.to_uppercase();
///     Ok(Row::new(Rc::new(row.column_names().to_vec()), vec![Value::from(upper)]))
/// });
/// cursor.execute("select ename from emp", params![])?;
/// let row = cursor.fetchone()?.unwrap();
/// assert_eq!(row.get::<_, String>(0)?, "SMITH");
/// # Ok::<(), Error>(())
/// ```
pub trait RowFactory {
    fn make_row(&self, row: Row) -> Result<Row>;
}

impl<F> RowFactory for F
where
    F: Fn(Row) -> Result<Row>,
{
    fn make_row(&self, row: Row) -> Result<Row> {
        self(row)
    }
}

/// A trait to get a row as specified type
///
/// This is the return type of [`Row::get_as`], [`Cursor::fetchone_as`]
/// and [`Cursor::rows_as`].
///
/// The crate provides implementations for a type implementing
/// [`FromValue`], which reads the first column, and tuples of types
/// implementing [`FromValue`] whose number of elements is 1 through 16.
///
/// You can implement the trait for your own types, or derive it for
/// structs with named fields:
///
/// ```
/// # use oracle_cursor::*;
/// # use oracle_cursor::test_util::ScriptedNative;
/// # use std::rc::Rc;
/// # let native = Rc::new(ScriptedNative::new());
/// # native.add_query("select empno, ename from emp",
/// #     vec![ColumnInfo::new("EMPNO", VarType::Int64, 0), ColumnInfo::new("ENAME", VarType::Varchar, 10)],
/// #     vec![vec![Value::from(7369), Value::from("SMITH")]]);
/// # let conn = Connection::new(native.clone());
/// struct Emp {
///     empno: i64,
///     ename: String,
/// }
///
/// impl RowValue for Emp {
///     fn get(row: &Row) -> Result<Emp> {
///         Ok(Emp {
///             empno: row.get("empno")?,
///             ename: row.get("ename")?,
///         })
///     }
/// }
///
/// let mut cursor = conn.cursor();
/// cursor.execute("select empno, ename from emp", params![])?;
/// for emp in cursor.rows_as::<Emp>()? {
///     let emp = emp?;
///     println!("{},{}", emp.empno, emp.ename);
/// }
/// # Ok::<(), Error>(())
/// ```
pub trait RowValue: Sized {
    fn get(row: &Row) -> Result<Self>;
}

impl<T: FromValue> RowValue for T {
    fn get(row: &Row) -> Result<T> {
        row.get::<usize, T>(0)
    }
}

macro_rules! impl_row_value_for_tuple {
    ($(
        [$(($idx:tt, $T:ident))+],
    )+) => {
        $(
            impl<$($T:FromValue,)+> RowValue for ($($T,)+) {
                fn get(row: &Row) -> Result<($($T,)+)> {
                    Ok((
                        $(row.get::<usize, $T>($idx)?,)+
                    ))
                }
            }
        )+
    }
}

impl_row_value_for_tuple! {
    [(0,T0)],
    [(0,T0)(1,T1)],
    [(0,T0)(1,T1)(2,T2)],
    [(0,T0)(1,T1)(2,T2)(3,T3)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)
     (10,T10)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)
     (10,T10)(11,T11)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)
     (10,T10)(11,T11)(12,T12)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)
     (10,T10)(11,T11)(12,T12)(13,T13)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)
     (10,T10)(11,T11)(12,T12)(13,T13)(14,T14)],
    [(0,T0)(1,T1)(2,T2)(3,T3)(4,T4)(5,T5)(6,T6)(7,T7)(8,T8)(9,T9)
     (10,T10)(11,T11)(12,T12)(13,T13)(14,T14)(15,T15)],
}

/// Iterator over the remaining rows of a cursor
///
/// Created by [`Cursor::rows`].
pub struct Rows<'cur, 'conn> {
    cursor: &'cur mut Cursor<'conn>,
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Result<Row>> {
        self.cursor.fetchone().transpose()
    }
}

/// Iterator over the remaining rows of a cursor as a [`RowValue`]
///
/// Created by [`Cursor::rows_as`].
pub struct RowsAs<'cur, 'conn, T> {
    rows: Rows<'cur, 'conn>,
    phantom: PhantomData<T>,
}

impl<T> Iterator for RowsAs<'_, '_, T>
where
    T: RowValue,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        self.rows
            .next()
            .map(|row_result| row_result.and_then(|row| row.get_as::<T>()))
    }
}

impl<'conn> Cursor<'conn> {
    /// Builds a row from the current window position and advances it.
    fn create_row(&mut self) -> Result<Row> {
        let pos = self.window.consumed;
        let vars = self
            .fetch_vars
            .as_ref()
            .ok_or_else(|| Error::interface("query not executed"))?;
        let mut values = Vec::with_capacity(vars.len());
        for var in vars {
            values.push(var.get_value(pos)?);
        }
        self.window.consumed += 1;
        self.rowcount = Some(self.rowcount.unwrap_or(0) + 1);

        let row = Row::new(self.column_names.clone(), values);
        match &self.row_factory {
            Some(factory) => factory.make_row(row),
            None => Ok(row),
        }
    }

    /// Fetches the next row. Returns `None` at the end of the result set,
    /// on every call after that too.
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.verify_fetch()?;
        if !self.more_rows()? {
            return Ok(None);
        }
        self.create_row().map(Some)
    }

    /// Fetches up to `num_rows` rows, or up to [`arraysize`](Cursor::arraysize)
    /// rows when `num_rows` is zero.
    pub fn fetchmany(&mut self, num_rows: usize) -> Result<Vec<Row>> {
        let num_rows = if num_rows == 0 {
            self.arraysize() as usize
        } else {
            num_rows
        };
        self.verify_fetch()?;
        let mut rows = Vec::new();
        while rows.len() < num_rows && self.more_rows()? {
            rows.push(self.create_row()?);
        }
        Ok(rows)
    }

    /// Fetches all remaining rows.
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.verify_fetch()?;
        let mut rows = Vec::new();
        while self.more_rows()? {
            rows.push(self.create_row()?);
        }
        Ok(rows)
    }

    /// Fetches the next row as specified type.
    pub fn fetchone_as<T>(&mut self) -> Result<Option<T>>
    where
        T: RowValue,
    {
        match self.fetchone()? {
            Some(row) => row.get_as::<T>().map(Some),
            None => Ok(None),
        }
    }

    /// Returns an iterator over the remaining rows.
    pub fn rows(&mut self) -> Result<Rows<'_, 'conn>> {
        self.verify_fetch()?;
        Ok(Rows { cursor: self })
    }

    /// Returns an iterator over the remaining rows as specified type.
    pub fn rows_as<T>(&mut self) -> Result<RowsAs<'_, 'conn, T>>
    where
        T: RowValue,
    {
        Ok(RowsAs {
            rows: self.rows()?,
            phantom: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn row() -> Row {
        Row::new(
            Rc::new(vec!["EMPNO".to_string(), "ENAME".to_string()]),
            vec![Value::from(7369), Value::from("SMITH")],
        )
    }

    #[test]
    fn get_by_index_and_name() {
        let row = row();
        assert_eq!(row.get::<_, i64>(0).unwrap(), 7369);
        assert_eq!(row.get::<_, String>("ename").unwrap(), "SMITH");
        assert_eq!(row.value("EMPNO").unwrap(), &Value::from(7369));
        assert_eq!(
            row.get::<_, i64>(2).unwrap_err().kind(),
            ErrorKind::InvalidColumnIndex
        );
        assert_eq!(
            row.get::<_, i64>("sal").unwrap_err().kind(),
            ErrorKind::InvalidColumnName
        );
    }

    #[test]
    fn get_as_tuple() {
        let row = row();
        let (empno, ename) = row.get_as::<(i32, String)>().unwrap();
        assert_eq!(empno, 7369);
        assert_eq!(ename, "SMITH");
        assert_eq!(row.get_as::<i64>().unwrap(), 7369);
        assert_eq!(row.get_as::<(Option<i64>,)>().unwrap(), (Some(7369),));
    }

    #[test]
    fn column_info_display() {
        let col = ColumnInfo::new("ENAME", VarType::Varchar, 10).with_nullable(false);
        assert_eq!(col.to_string(), "ENAME VARCHAR2(10) NOT NULL");
        let col = ColumnInfo::new("SAL", VarType::Double, 0).with_precision(7, 2);
        assert_eq!(col.to_string(), "SAL BINARY_DOUBLE");
        assert_eq!(col.precision(), 7);
    }
}
