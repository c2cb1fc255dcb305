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
use crate::native::RawVar;
use crate::row::ColumnInfo;
use crate::Error;
use crate::Result;
use crate::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Maximum size in bytes of a VARCHAR2 value
pub const MAX_STRING_SIZE: u32 = 4000;

/// Maximum size in bytes of a RAW value
pub const MAX_BINARY_SIZE: u32 = 2000;

/// Kind of the values stored in a [`Variable`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VarType {
    /// Character data up to [`MAX_STRING_SIZE`] bytes
    Varchar,
    /// Binary data up to [`MAX_BINARY_SIZE`] bytes
    Raw,
    /// Integral number
    Int64,
    /// Floating point number
    Double,
    /// Boolean, sent to the database as the number 0 or 1
    Boolean,
    Timestamp,
    /// REF CURSOR statement handle
    Cursor,
}

impl VarType {
    /// Returns the element size used when no size is given explicitly.
    pub fn default_size(self) -> u32 {
        match self {
            VarType::Varchar => MAX_STRING_SIZE,
            VarType::Raw => MAX_BINARY_SIZE,
            VarType::Int64 | VarType::Double => 8,
            VarType::Boolean => 4,
            VarType::Timestamp => 11,
            VarType::Cursor => 0,
        }
    }

    /// Returns `true` when the element size is chosen per variable.
    pub fn is_variable_length(self) -> bool {
        matches!(self, VarType::Varchar | VarType::Raw)
    }

    /// Infers the variable type that can hold `val`.
    ///
    /// NULL infers [`VarType::Varchar`].
    pub fn for_value(val: &Value) -> VarType {
        match val {
            Value::Null | Value::String(_) => VarType::Varchar,
            Value::Bytes(_) => VarType::Raw,
            Value::Int64(_) => VarType::Int64,
            Value::Double(_) => VarType::Double,
            Value::Boolean(_) => VarType::Boolean,
            Value::Timestamp(_) => VarType::Timestamp,
            Value::Cursor(_) => VarType::Cursor,
        }
    }

    /// Returns the element size of a variable created to hold `val`.
    pub(crate) fn size_for_value(self, val: &Value) -> u32 {
        if !self.is_variable_length() {
            return self.default_size();
        }
        let len = match val {
            Value::String(s) => s.len(),
            Value::Bytes(b) => b.len(),
            _ => 0,
        };
        u32::try_from(len).unwrap_or(u32::MAX).max(1)
    }

    /// Checks that `val` can be stored in an element of `size` bytes and
    /// returns it in the representation the native layer expects.
    pub(crate) fn accept(self, size: u32, val: Value) -> Result<Value> {
        let len = match (self, &val) {
            (_, Value::Null) => return Ok(val),
            (VarType::Varchar, Value::String(s)) => s.len(),
            (VarType::Raw, Value::Bytes(b)) => b.len(),
            (VarType::Double, Value::Int64(n)) => return Ok(Value::Double(*n as f64)),
            (VarType::Int64, Value::Int64(_))
            | (VarType::Double, Value::Double(_))
            | (VarType::Boolean, Value::Boolean(_))
            | (VarType::Timestamp, Value::Timestamp(_))
            | (VarType::Cursor, Value::Cursor(_)) => return Ok(val),
            _ => return Err(Error::invalid_type_conversion(val.type_name(), self)),
        };
        if len > size as usize {
            return Err(Error::out_of_range(format!(
                "value of {} bytes exceeds the {} variable size {}",
                len, self, size
            )));
        }
        Ok(val)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VarType::Varchar => write!(f, "VARCHAR2"),
            VarType::Raw => write!(f, "RAW"),
            VarType::Int64 => write!(f, "NUMBER"),
            VarType::Double => write!(f, "BINARY_DOUBLE"),
            VarType::Boolean => write!(f, "BOOLEAN"),
            VarType::Timestamp => write!(f, "TIMESTAMP"),
            VarType::Cursor => write!(f, "REF CURSOR"),
        }
    }
}

/// Conversion applied to a value before it is stored in a variable
pub trait InConverter {
    fn convert(&self, val: Value) -> Result<Value>;
}

impl<F> InConverter for F
where
    F: Fn(Value) -> Result<Value>,
{
    fn convert(&self, val: Value) -> Result<Value> {
        self(val)
    }
}

/// Conversion applied to a non-NULL value read from a variable
pub trait OutConverter {
    fn convert(&self, val: Value) -> Result<Value>;
}

impl<F> OutConverter for F
where
    F: Fn(Value) -> Result<Value>,
{
    fn convert(&self, val: Value) -> Result<Value> {
        self(val)
    }
}

/// Hook consulted before a bind variable is created from a value.
///
/// Returning `Ok(None)` keeps the variable type inferred from the value.
pub trait InputTypeHandler {
    fn var_spec(&self, val: &Value, num_elements: u32) -> Result<Option<VarSpec>>;
}

impl<F> InputTypeHandler for F
where
    F: Fn(&Value, u32) -> Result<Option<VarSpec>>,
{
    fn var_spec(&self, val: &Value, num_elements: u32) -> Result<Option<VarSpec>> {
        self(val, num_elements)
    }
}

/// Hook consulted before a define variable is created for a column.
///
/// Returning `Ok(None)` keeps the variable type derived from the column.
pub trait OutputTypeHandler {
    fn var_spec(&self, column: &ColumnInfo, array_size: u32) -> Result<Option<VarSpec>>;
}

impl<F> OutputTypeHandler for F
where
    F: Fn(&ColumnInfo, u32) -> Result<Option<VarSpec>>,
{
    fn var_spec(&self, column: &ColumnInfo, array_size: u32) -> Result<Option<VarSpec>> {
        self(column, array_size)
    }
}

/// Type, size and converters of a variable to be created
///
/// ```
/// # use oracle_cursor::{Result, Value, VarSpec, VarType};
/// let spec = VarSpec::new(VarType::Varchar)
///     .size(20)
///     .out_converter(|val: Value| -> Result<Value> {
///         Ok(Value::String(val.to_string().to_uppercase()))
///     });
/// assert_eq!(spec.var_type(), VarType::Varchar);
/// ```
#[derive(Clone)]
pub struct VarSpec {
    var_type: VarType,
    size: Option<u32>,
    in_converter: Option<Rc<dyn InConverter>>,
    out_converter: Option<Rc<dyn OutConverter>>,
}

impl VarSpec {
    pub fn new(var_type: VarType) -> VarSpec {
        VarSpec {
            var_type,
            size: None,
            in_converter: None,
            out_converter: None,
        }
    }

    /// Sets the element size. Only variable-length types use it.
    pub fn size(mut self, size: u32) -> VarSpec {
        self.size = Some(size);
        self
    }

    pub fn in_converter<C>(mut self, conv: C) -> VarSpec
    where
        C: InConverter + 'static,
    {
        self.in_converter = Some(Rc::new(conv));
        self
    }

    pub fn out_converter<C>(mut self, conv: C) -> VarSpec
    where
        C: OutConverter + 'static,
    {
        self.out_converter = Some(Rc::new(conv));
        self
    }

    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    fn element_size(&self) -> u32 {
        match self.size {
            Some(size) if self.var_type.is_variable_length() => size.max(1),
            _ => self.var_type.default_size(),
        }
    }
}

impl From<VarType> for VarSpec {
    fn from(var_type: VarType) -> VarSpec {
        VarSpec::new(var_type)
    }
}

impl fmt::Debug for VarSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VarSpec")
            .field("var_type", &self.var_type)
            .field("size", &self.size)
            .field("in_converter", &self.in_converter.is_some())
            .field("out_converter", &self.out_converter.is_some())
            .finish()
    }
}

struct VarBuffer {
    native: Rc<dyn Native>,
    handle: RawVar,
    var_type: VarType,
    size: u32,
    array_size: u32,
    in_converter: Option<Rc<dyn InConverter>>,
    out_converter: Option<Rc<dyn OutConverter>>,
    fetch_num: u32,
}

impl Drop for VarBuffer {
    fn drop(&mut self) {
        let _ = self.native.var_release(self.handle);
    }
}

/// A native array buffer used as a bind or define target
///
/// A variable holds `array_size` elements of one [`VarType`]. Cloning a
/// `Variable` yields another reference to the same buffer; use
/// [`ptr_eq`](Variable::ptr_eq) to test identity.
#[derive(Clone)]
pub struct Variable {
    inner: Rc<RefCell<VarBuffer>>,
}

impl Variable {
    pub(crate) fn new(
        native: &Rc<dyn Native>,
        var_type: VarType,
        size: u32,
        array_size: u32,
    ) -> Result<Variable> {
        let array_size = array_size.max(1);
        let mut handle = None;
        chkerr!(
            native.as_ref(),
            native.var_new(var_type, array_size, size, &mut handle)
        );
        let handle =
            handle.ok_or_else(|| Error::internal_error("variable handle was not returned"))?;
        trace!(%var_type, size, array_size, "created variable");
        Ok(Variable {
            inner: Rc::new(RefCell::new(VarBuffer {
                native: native.clone(),
                handle,
                var_type,
                size,
                array_size,
                in_converter: None,
                out_converter: None,
                fetch_num: 0,
            })),
        })
    }

    pub(crate) fn from_spec(
        native: &Rc<dyn Native>,
        spec: VarSpec,
        array_size: u32,
    ) -> Result<Variable> {
        let var = Variable::new(native, spec.var_type, spec.element_size(), array_size)?;
        {
            let mut buf = var.inner.borrow_mut();
            buf.in_converter = spec.in_converter;
            buf.out_converter = spec.out_converter;
        }
        Ok(var)
    }

    pub fn var_type(&self) -> VarType {
        self.inner.borrow().var_type
    }

    /// Returns the size in bytes of an element.
    pub fn size(&self) -> u32 {
        self.inner.borrow().size
    }

    /// Returns the number of elements.
    pub fn array_size(&self) -> u32 {
        self.inner.borrow().array_size
    }

    /// Returns how many fetches this variable has been used for as a define target.
    pub fn fetch_num(&self) -> u32 {
        self.inner.borrow().fetch_num
    }

    pub fn set_in_converter<C>(&self, conv: C)
    where
        C: InConverter + 'static,
    {
        self.inner.borrow_mut().in_converter = Some(Rc::new(conv));
    }

    pub fn set_out_converter<C>(&self, conv: C)
    where
        C: OutConverter + 'static,
    {
        self.inner.borrow_mut().out_converter = Some(Rc::new(conv));
    }

    /// Returns `true` when both refer to the same variable.
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stores a value at array position `pos` (zero-based).
    ///
    /// The in-converter, if any, runs first. A value of the wrong kind fails
    /// with [`InvalidTypeConversion`](crate::ErrorKind::InvalidTypeConversion),
    /// one larger than the element size with [`OutOfRange`](crate::ErrorKind::OutOfRange)
    /// and a position past the last element with
    /// [`InvalidArrayIndex`](crate::ErrorKind::InvalidArrayIndex).
    pub fn set_value<T>(&self, pos: u32, val: T) -> Result<()>
    where
        T: Into<Value>,
    {
        let buf = self.inner.borrow();
        if pos >= buf.array_size {
            return Err(Error::invalid_array_index(pos, buf.array_size));
        }
        let val = match &buf.in_converter {
            Some(conv) => conv.convert(val.into())?,
            None => val.into(),
        };
        let val = buf.var_type.accept(buf.size, val)?;
        chkerr!(
            buf.native.as_ref(),
            buf.native.var_set(buf.handle, pos, &val)
        );
        Ok(())
    }

    /// Reads the value at array position `pos` (zero-based) through the
    /// out-converter, if any.
    pub fn get_value(&self, pos: u32) -> Result<Value> {
        let buf = self.inner.borrow();
        if pos >= buf.array_size {
            return Err(Error::invalid_array_index(pos, buf.array_size));
        }
        let mut val = Value::Null;
        chkerr!(
            buf.native.as_ref(),
            buf.native.var_get(buf.handle, pos, &mut val)
        );
        match &buf.out_converter {
            Some(conv) if !val.is_null() => conv.convert(val),
            _ => Ok(val),
        }
    }

    pub(crate) fn bind_by_pos(&self, stmt: RawStmt, pos: u32) -> Result<()> {
        let buf = self.inner.borrow();
        chkerr!(
            buf.native.as_ref(),
            buf.native.stmt_bind_by_pos(stmt, pos, buf.handle)
        );
        Ok(())
    }

    pub(crate) fn bind_by_name(&self, stmt: RawStmt, name: &str) -> Result<()> {
        let buf = self.inner.borrow();
        chkerr!(
            buf.native.as_ref(),
            buf.native.stmt_bind_by_name(stmt, name, buf.handle)
        );
        Ok(())
    }

    pub(crate) fn define(&self, stmt: RawStmt, pos: u32) -> Result<()> {
        let buf = self.inner.borrow();
        chkerr!(
            buf.native.as_ref(),
            buf.native.stmt_define(stmt, pos, buf.handle)
        );
        Ok(())
    }

    /// Runs before each native fetch into this variable.
    pub(crate) fn pre_fetch(&self) -> Result<()> {
        let mut buf = self.inner.borrow_mut();
        buf.fetch_num += 1;
        if buf.var_type == VarType::Cursor {
            // handles from the previous batch belong to cursors already handed out
            for pos in 0..buf.array_size {
                chkerr!(
                    buf.native.as_ref(),
                    buf.native.var_set(buf.handle, pos, &Value::Null)
                );
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let buf = self.inner.borrow();
        f.debug_struct("Variable")
            .field("handle", &buf.handle)
            .field("var_type", &buf.var_type)
            .field("size", &buf.size)
            .field("array_size", &buf.array_size)
            .finish()
    }
}

/// Creates bind and define variables, consulting the cursor's type handlers.
pub(crate) struct VarFactory<'a> {
    pub(crate) native: &'a Rc<dyn Native>,
    pub(crate) input_type_handler: Option<&'a dyn InputTypeHandler>,
    pub(crate) output_type_handler: Option<&'a dyn OutputTypeHandler>,
}

impl VarFactory<'_> {
    pub(crate) fn new_by_spec(&self, spec: VarSpec, array_size: u32) -> Result<Variable> {
        Variable::from_spec(self.native, spec, array_size)
    }

    /// Creates a variable able to hold `val` in each of `num_elements` elements.
    pub(crate) fn new_by_value(&self, val: &Value, num_elements: u32) -> Result<Variable> {
        if let Some(handler) = self.input_type_handler {
            if let Some(spec) = handler.var_spec(val, num_elements)? {
                return self.new_by_spec(spec, num_elements);
            }
        }
        let var_type = VarType::for_value(val);
        Variable::new(
            self.native,
            var_type,
            var_type.size_for_value(val),
            num_elements,
        )
    }

    /// Creates a define variable for `column`.
    ///
    /// `size_override` replaces the element size of variable-length columns.
    pub(crate) fn new_for_column(
        &self,
        column: &ColumnInfo,
        array_size: u32,
        size_override: Option<u32>,
    ) -> Result<Variable> {
        if let Some(handler) = self.output_type_handler {
            if let Some(spec) = handler.var_spec(column, array_size)? {
                return self.new_by_spec(spec, array_size);
            }
        }
        let var_type = column.var_type();
        let size = if var_type.is_variable_length() {
            size_override.unwrap_or_else(|| {
                if column.size() > 0 {
                    column.size()
                } else {
                    var_type.default_size()
                }
            })
        } else {
            var_type.default_size()
        };
        Variable::new(self.native, var_type, size, array_size)
    }
}
