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

use crate::bind::BindArg;
use crate::bind::KeywordArgs;
use crate::Cursor;
use crate::Params;
use crate::Result;
use crate::Value;
use crate::VarType;
use crate::Variable;
use tracing::debug;

/// Builds the anonymous PL/SQL block calling `name` and the positional
/// arguments bound to it.
///
/// Placeholders are numbered from `:1`, which is the return value when
/// `return_value` is given. Keyword arguments are passed in PL/SQL named
/// notation but bound by position after the positional arguments. Boolean
/// arguments are sent as numbers and turned back into booleans with `= 1`.
pub(crate) fn build_call(
    name: &str,
    return_value: Option<&Variable>,
    args: &[BindArg],
    kwargs: &KeywordArgs,
) -> (String, Vec<BindArg>) {
    let mut bind_args = Vec::with_capacity(args.len() + kwargs.len() + 1);
    let mut sql = String::from("begin ");
    let mut arg_num = 1;

    if let Some(var) = return_value {
        bind_args.push(BindArg::Var(var.clone()));
        sql.push_str(":1 := ");
        arg_num += 1;
    }
    let first_arg_num = arg_num;

    sql.push_str(name);
    sql.push_str(" (");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            sql.push(',');
        }
        sql.push_str(&format!(":{}", arg_num));
        if arg.is_boolean() {
            sql.push_str(" = 1");
        }
        bind_args.push(arg.clone());
        arg_num += 1;
    }
    for (key, arg) in kwargs {
        if arg_num > first_arg_num {
            sql.push(',');
        }
        sql.push_str(&format!("{} => :{}", key, arg_num));
        if arg.is_boolean() {
            sql.push_str(" = 1");
        }
        bind_args.push(arg.clone());
        arg_num += 1;
    }
    sql.push_str("); end;");
    (sql, bind_args)
}

impl Cursor<'_> {
    fn call(
        &mut self,
        name: &str,
        return_value: Option<&Variable>,
        args: &[BindArg],
        kwargs: &KeywordArgs,
    ) -> Result<()> {
        self.raise_if_not_open()?;
        let (sql, bind_args) = build_call(name, return_value, args, kwargs);
        debug!(%sql, "calling stored subprogram");
        self.execute(&sql, Params::Positional(bind_args))?;
        Ok(())
    }

    /// Calls a stored procedure and returns the values of all arguments
    /// after the call, positional arguments first. OUT and IN OUT
    /// arguments hold what the procedure set.
    ///
    /// ```
    /// # use oracle_cursor::*;
    /// # use oracle_cursor::test_util::ScriptedNative;
    /// # use std::rc::Rc;
    /// # let native = Rc::new(ScriptedNative::new());
    /// # native.add_plsql("begin raise_sal (:1,:2); end;", |args: &mut Vec<Value>| {
    /// #     let sal = args[1].get::<i64>()?;
    /// #     args[1] = Value::from(sal + 100);
    /// #     Ok(())
    /// # });
    /// # let conn = Connection::new(native.clone());
    /// let mut cursor = conn.cursor();
    /// let sal = cursor.var(VarType::Int64, None, None)?;
    /// sal.set_value(0, 1000)?;
    /// let results = cursor.callproc("raise_sal", &[BindArg::from(7369), BindArg::from(&sal)], Vec::new())?;
    /// assert_eq!(results[1], Value::from(1100));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn callproc(
        &mut self,
        name: &str,
        args: &[BindArg],
        kwargs: KeywordArgs,
    ) -> Result<Vec<Value>> {
        self.call(name, None, args, &kwargs)?;
        self.bind_vars()
            .iter()
            .map(|var| match var {
                Some(var) => var.get_value(0),
                None => Ok(Value::Null),
            })
            .collect()
    }

    /// Calls a stored function and returns its return value.
    ///
    /// ```
    /// # use oracle_cursor::*;
    /// # use oracle_cursor::test_util::ScriptedNative;
    /// # use std::rc::Rc;
    /// # let native = Rc::new(ScriptedNative::new());
    /// # native.add_plsql("begin :1 := pkg.f (:2); end;", |args: &mut Vec<Value>| {
    /// #     args[0] = Value::from(args[1].get::<i64>()? * 2);
    /// #     Ok(())
    /// # });
    /// # let conn = Connection::new(native.clone());
    /// let mut cursor = conn.cursor();
    /// let val = cursor.callfunc("pkg.f", VarType::Int64, &[BindArg::from(21)], Vec::new())?;
    /// assert_eq!(val, Value::from(42));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn callfunc(
        &mut self,
        name: &str,
        return_type: VarType,
        args: &[BindArg],
        kwargs: KeywordArgs,
    ) -> Result<Value> {
        let return_value = self.var(return_type, None, Some(1))?;
        self.call(name, Some(&return_value), args, &kwargs)?;
        return_value.get_value(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql(
        name: &str,
        return_value: Option<&Variable>,
        args: Vec<BindArg>,
        kwargs: KeywordArgs,
    ) -> String {
        build_call(name, return_value, &args, &kwargs).0
    }

    #[test]
    fn procedure_text() {
        assert_eq!(sql("p", None, vec![], vec![]), "begin p (); end;");
        assert_eq!(
            sql("pkg.p", None, vec![1.into(), "a".into()], vec![]),
            "begin pkg.p (:1,:2); end;"
        );
        assert_eq!(
            sql("p", None, vec![true.into()], vec![("b".into(), false.into())]),
            "begin p (:1 = 1,b => :2 = 1); end;"
        );
        assert_eq!(
            sql(
                "p",
                None,
                vec![],
                vec![("a".into(), 1.into()), ("b".into(), 2.into())]
            ),
            "begin p (a => :1,b => :2); end;"
        );
    }

    #[test]
    fn function_text() {
        use crate::test_util::ScriptedNative;
        use std::rc::Rc;

        let native: Rc<dyn crate::native::Native> = Rc::new(ScriptedNative::new());
        let ret = Variable::new(&native, VarType::Int64, 8, 1).unwrap();
        assert_eq!(sql("f", Some(&ret), vec![], vec![]), "begin :1 := f (); end;");
        assert_eq!(
            sql("pkg.f", Some(&ret), vec![5.into()], vec![]),
            "begin :1 := pkg.f (:2); end;"
        );
        assert_eq!(
            sql("f", Some(&ret), vec![], vec![("x".into(), 1.into())]),
            "begin :1 := f (x => :2); end;"
        );
        let (_, binds) = build_call("f", Some(&ret), &[5.into()], &vec![("x".into(), 1.into())]);
        assert_eq!(binds.len(), 3);
        assert!(matches!(&binds[0], BindArg::Var(var) if var.ptr_eq(&ret)));
    }
}
