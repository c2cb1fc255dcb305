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

//! Derive macros of the [`oracle_cursor`] crate.
//!
//! [`oracle_cursor`]: ../oracle_cursor/index.html

use proc_macro::TokenStream;

mod derive_row_value;

/// Derives [`RowValue`] for a struct with named fields.
///
/// Each field is read from the column whose name is the field name in
/// upper case. `#[row_value(rename = "...")]` names the column explicitly and
/// `#[row_value(with = "path::to::function")]` converts the column value
/// through `function(&Value) -> Result<T>` instead of `Value::get`.
///
/// All columns are looked up before any value is converted.
///
/// ```ignore
/// use oracle_cursor::RowValue;
///
/// #[derive(RowValue)]
/// struct Emp {
///     empno: i64,
///     #[row_value(rename = "ENAME")]
///     name: String,
///     mgr: Option<i64>,
/// }
/// ```
///
/// [`RowValue`]: ../oracle_cursor/trait.RowValue.html
#[proc_macro_derive(RowValue, attributes(row_value))]
pub fn derive_row_value(input: TokenStream) -> TokenStream {
    derive_row_value::derive_row_value(input)
}
