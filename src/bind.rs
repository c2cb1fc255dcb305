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
use crate::variable::VarFactory;
use crate::Error;
use crate::Result;
use crate::Timestamp;
use crate::Value;
use crate::Variable;
use tracing::trace;

/// A bind argument: a plain value or a variable created by the application
#[derive(Clone, Debug)]
pub enum BindArg {
    Value(Value),
    /// Bound as is. Use this for output parameters.
    Var(Variable),
}

impl BindArg {
    pub(crate) fn is_boolean(&self) -> bool {
        matches!(self, BindArg::Value(Value::Boolean(_)))
    }
}

macro_rules! impl_from_for_bind_arg {
    ($($type:ty),+) => {
        $(
            impl From<$type> for BindArg {
                fn from(val: $type) -> BindArg {
                    BindArg::Value(val.into())
                }
            }
        )+
    };
}

impl_from_for_bind_arg!(
    Value,
    i64,
    i32,
    u32,
    f64,
    f32,
    bool,
    String,
    &str,
    Vec<u8>,
    &[u8],
    Timestamp,
    RawStmt
);

impl<T> From<Option<T>> for BindArg
where
    T: Into<Value>,
{
    fn from(val: Option<T>) -> BindArg {
        BindArg::Value(val.into())
    }
}

impl From<Variable> for BindArg {
    fn from(var: Variable) -> BindArg {
        BindArg::Var(var)
    }
}

impl From<&Variable> for BindArg {
    fn from(var: &Variable) -> BindArg {
        BindArg::Var(var.clone())
    }
}

/// Keyword arguments: placeholder names paired with arguments
pub type KeywordArgs = Vec<(String, BindArg)>;

/// Bind arguments of one execution
///
/// Use [`params!`](crate::params) and [`named_params!`](crate::named_params)
/// to build them.
#[derive(Clone, Debug)]
pub enum Params {
    /// Bound to `:1`, `:2`, ... in order
    Positional(Vec<BindArg>),
    /// Bound by placeholder name
    Named(KeywordArgs),
}

impl Params {
    /// No bind arguments.
    pub fn none() -> Params {
        Params::Positional(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(args) => args.len(),
            Params::Named(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Params {
    fn default() -> Params {
        Params::none()
    }
}

impl From<Vec<BindArg>> for Params {
    fn from(args: Vec<BindArg>) -> Params {
        Params::Positional(args)
    }
}

impl From<KeywordArgs> for Params {
    fn from(args: KeywordArgs) -> Params {
        Params::Named(args)
    }
}

/// Builds positional [`Params`].
///
/// ```
/// # use oracle_cursor::{params, Params};
/// let params = params![1, "Smith", None::<i64>];
/// assert_eq!(params.len(), 3);
/// assert!(params![].is_empty());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::Positional(::std::vec::Vec::new())
    };
    ($($val:expr),+ $(,)?) => {
        $crate::Params::Positional(::std::vec![$($crate::BindArg::from($val)),+])
    };
}

/// Builds named [`Params`].
///
/// ```
/// # use oracle_cursor::{named_params, Params};
/// let params = named_params! { "empno" => 7369, "ename" => "SMITH" };
/// assert!(matches!(params, Params::Named(ref args) if args[1].0 == "ename"));
/// ```
#[macro_export]
macro_rules! named_params {
    ($($name:expr => $val:expr),* $(,)?) => {
        $crate::Params::Named(::std::vec![
            $((::std::string::String::from($name), $crate::BindArg::from($val))),*
        ])
    };
}

/// A bind position: not yet typed, or bound to a variable.
///
/// A bound variable holding NULL at the current array position is the
/// typed-but-empty state.
#[derive(Clone, Debug)]
pub(crate) enum BindSlot {
    Unbound,
    Bound(Variable),
}

impl BindSlot {
    pub(crate) fn var(&self) -> Option<&Variable> {
        match self {
            BindSlot::Unbound => None,
            BindSlot::Bound(var) => Some(var),
        }
    }
}

/// Bind variables of a cursor, all positional or all named
#[derive(Debug)]
pub(crate) enum BindTable {
    Positional(Vec<BindSlot>),
    Named(Vec<(String, BindSlot)>),
}

impl BindTable {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            BindTable::Positional(slots) => slots.is_empty(),
            BindTable::Named(slots) => slots.is_empty(),
        }
    }

    pub(crate) fn slots(&self) -> Vec<&BindSlot> {
        match self {
            BindTable::Positional(slots) => slots.iter().collect(),
            BindTable::Named(slots) => slots.iter().map(|(_, slot)| slot).collect(),
        }
    }

    /// Binds every typed slot to `stmt`: positional slots at their one-based
    /// position, named slots by name. Unbound slots are skipped.
    pub(crate) fn perform_bind(&self, stmt: RawStmt) -> Result<()> {
        match self {
            BindTable::Positional(slots) => {
                for (i, slot) in slots.iter().enumerate() {
                    if let Some(var) = slot.var() {
                        var.bind_by_pos(stmt, u32::try_from(i + 1)?)?;
                    }
                }
            }
            BindTable::Named(slots) => {
                for (name, slot) in slots {
                    if let Some(var) = slot.var() {
                        var.bind_by_name(stmt, name)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn intermixed_binds() -> Error {
    Error::programming("positional and named binds cannot be intermixed")
}

/// Merges one row of arguments into the bind table, creating it on first use.
///
/// `num_elements` is the number of rows bound in this pass and `array_pos`
/// the row being set. With `defer` set, NULL values leave untyped slots
/// unbound so a later row can decide the type.
pub(crate) fn set_bind_variables(
    table: &mut Option<BindTable>,
    factory: &VarFactory,
    params: &Params,
    num_elements: u32,
    array_pos: u32,
    defer: bool,
) -> Result<()> {
    if table.as_ref().map_or(false, BindTable::is_empty) {
        *table = None;
    }
    match params {
        Params::Positional(args) => {
            let table = table.get_or_insert_with(|| BindTable::Positional(Vec::new()));
            let slots = match table {
                BindTable::Positional(slots) => slots,
                BindTable::Named(_) => return Err(intermixed_binds()),
            };
            if slots.len() < args.len() {
                slots.resize(args.len(), BindSlot::Unbound);
            }
            for (i, arg) in args.iter().enumerate() {
                let new_var =
                    resolve_slot(factory, num_elements, array_pos, arg, slots[i].var(), defer)?;
                if let Some(var) = new_var {
                    trace!(pos = i + 1, array_pos, "bound new variable");
                    slots[i] = BindSlot::Bound(var);
                }
            }
        }
        Params::Named(args) => {
            let table = table.get_or_insert_with(|| BindTable::Named(Vec::new()));
            let slots = match table {
                BindTable::Named(slots) => slots,
                BindTable::Positional(_) => return Err(intermixed_binds()),
            };
            for (name, arg) in args {
                let idx = slots.iter().position(|(n, _)| n == name);
                let orig_var = idx.and_then(|idx| slots[idx].1.var());
                let new_var = resolve_slot(factory, num_elements, array_pos, arg, orig_var, defer)?;
                match (idx, new_var) {
                    (Some(idx), Some(var)) => slots[idx].1 = BindSlot::Bound(var),
                    (None, Some(var)) => slots.push((name.clone(), BindSlot::Bound(var))),
                    (None, None) => slots.push((name.clone(), BindSlot::Unbound)),
                    (Some(_), None) => {}
                }
                trace!(%name, array_pos, "resolved named bind");
            }
        }
    }
    Ok(())
}

/// Decides the variable of one bind slot for `arg` at `array_pos`.
///
/// Returns the variable to store in the slot, or `None` when the slot keeps
/// its current variable (which then already holds the value) or stays unbound.
pub(crate) fn resolve_slot(
    factory: &VarFactory,
    num_elements: u32,
    array_pos: u32,
    arg: &BindArg,
    orig_var: Option<&Variable>,
    defer: bool,
) -> Result<Option<Variable>> {
    if let Some(orig_var) = orig_var {
        match arg {
            BindArg::Var(var) => {
                return Ok(if var.ptr_eq(orig_var) {
                    None
                } else {
                    Some(var.clone())
                });
            }
            BindArg::Value(val) if num_elements > orig_var.array_size() => {
                // more rows than the existing variable holds
                let var = Variable::new(
                    factory.native,
                    orig_var.var_type(),
                    orig_var.size(),
                    num_elements,
                )?;
                var.set_value(array_pos, val.clone())?;
                return Ok(Some(var));
            }
            BindArg::Value(val) => match orig_var.set_value(array_pos, val.clone()) {
                Ok(()) => return Ok(None),
                Err(err) if array_pos > 0 || !err.is_recoverable_set_value_error() => {
                    return Err(err)
                }
                Err(err) => {
                    trace!(%err, "replacing bind variable");
                }
            },
        }
    }

    match arg {
        BindArg::Var(var) => Ok(Some(var.clone())),
        BindArg::Value(Value::Null) if defer => Ok(None),
        BindArg::Value(val) => {
            let var = factory.new_by_value(val, num_elements)?;
            var.set_value(array_pos, val.clone())?;
            Ok(Some(var))
        }
    }
}
