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

//! `#[derive(RowValue)]`
//!
//! The generated `RowValue::get` resolves every column position from the
//! row's column names first and then converts the values by position, so a
//! missing column is reported before any conversion runs.

use darling::ast::Data;
use darling::FromDeriveInput;
use darling::FromField;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::format_ident;
use quote::quote;
use syn::ext::IdentExt;
use syn::parse_macro_input;
use syn::DeriveInput;
use syn::Ident;
use syn::LitStr;
use syn::Path;

#[derive(FromDeriveInput)]
#[darling(supports(struct_named))]
struct RowStruct {
    ident: Ident,
    data: Data<(), RowField>,
}

#[derive(FromField)]
#[darling(attributes(row_value))]
struct RowField {
    ident: Option<Ident>,
    /// column name; the field name in upper case when absent
    #[darling(default)]
    rename: Option<String>,
    /// `fn(&Value) -> Result<T>` used instead of `Value::get`
    #[darling(default)]
    with: Option<Path>,
}

impl RowField {
    fn column_name(&self, ident: &Ident) -> String {
        match &self.rename {
            Some(name) => name.clone(),
            None => ident.unraw().to_string().to_uppercase(),
        }
    }
}

pub fn derive_row_value(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match RowStruct::from_derive_input(&input) {
        Ok(row_struct) => row_struct.expand().into(),
        Err(err) => err.write_errors().into(),
    }
}

impl RowStruct {
    fn expand(&self) -> TokenStream2 {
        let ident = &self.ident;
        let fields: Vec<&RowField> = match &self.data {
            Data::Struct(fields) => fields.iter().collect(),
            Data::Enum(_) => Vec::new(),
        };

        let mut positions = Vec::with_capacity(fields.len());
        let mut inits = Vec::with_capacity(fields.len());
        for (idx, field) in fields.into_iter().enumerate() {
            let field_ident = match &field.ident {
                Some(field_ident) => field_ident,
                None => continue,
            };
            let pos = format_ident!("__pos{}", idx);
            let column = LitStr::new(&field.column_name(field_ident), field_ident.span());
            positions.push(quote! {
                let #pos = ::oracle_cursor::ColumnIndex::idx(&#column, column_names)?;
            });
            let value = match &field.with {
                Some(function) => quote! { #function(row.value(#pos)?)? },
                None => quote! { row.value(#pos)?.get()? },
            };
            inits.push(quote! { #field_ident: #value, });
        }

        let column_names = if positions.is_empty() {
            quote! { let _ = row; }
        } else {
            quote! { let column_names = row.column_names(); }
        };

        quote! {
            impl ::oracle_cursor::RowValue for #ident {
                fn get(row: &::oracle_cursor::Row) -> ::oracle_cursor::Result<Self> {
                    #column_names
                    #(#positions)*
                    ::std::result::Result::Ok(#ident {
                        #(#inits)*
                    })
                }
            }
        }
    }
}
