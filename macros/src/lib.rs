//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了oxstore的宏实现，提供 `#[derive(Record)]`。

use darling::{ast, FromDeriveInput, FromField};
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[derive(FromDeriveInput)]
#[darling(attributes(record), supports(struct_named))]
struct RecordInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: ast::Data<(), RecordField>,
    /// 缓存键委托给 `HasPrimaryKey`
    #[darling(default)]
    primary_key: bool,
}

#[derive(FromField)]
#[darling(attributes(record))]
struct RecordField {
    ident: Option<syn::Ident>,
    ty: syn::Type,
    /// 列名，默认与字段名相同
    #[darling(default)]
    rename: Option<String>,
    /// 不落库，读取时取 `Default`
    #[darling(default)]
    skip: bool,
}

/// 为具名字段结构体实现 `oxstore::Record`
///
/// ```ignore
/// #[derive(Record)]
/// #[record(primary_key)]
/// struct User {
///     id: i64,
///     #[record(rename = "user_name")]
///     name: String,
///     #[record(skip)]
///     dirty: bool,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let parsed = match RecordInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(e) => return e.write_errors().into(),
    };

    let ident = &parsed.ident;
    let (impl_generics, ty_generics, where_clause) = parsed.generics.split_for_impl();

    let fields = match &parsed.data {
        ast::Data::Struct(fields) => &fields.fields,
        ast::Data::Enum(_) => {
            return syn::Error::new_spanned(ident, "Record can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut hydrate = Vec::new();
    let mut capture = Vec::new();
    for field in fields {
        let Some(name) = &field.ident else {
            continue;
        };
        let ty = &field.ty;

        if field.skip {
            hydrate.push(quote! {
                #name: ::core::default::Default::default()
            });
            continue;
        }

        let column = field
            .rename
            .clone()
            .unwrap_or_else(|| name.to_string().trim_start_matches("r#").to_string());

        hydrate.push(quote! {
            #name: row.get::<#ty>(#column)?
        });
        capture.push(quote! {
            (
                ::std::string::String::from(#column),
                ::oxstore::ToFieldValue::to_field_value(&self.#name),
            )
        });
    }

    let derived_key = if parsed.primary_key {
        quote! {
            fn derived_key(&self) -> ::core::option::Option<::std::string::String> {
                ::core::option::Option::Some(::std::string::ToString::to_string(
                    &::oxstore::HasPrimaryKey::primary_key(self),
                ))
            }
        }
    } else {
        quote! {}
    };

    let expanded = quote! {
        impl #impl_generics ::oxstore::Record for #ident #ty_generics #where_clause {
            fn from_row(row: &::oxstore::Row) -> ::oxstore::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#hydrate,)*
                })
            }

            fn fields(&self) -> ::std::vec::Vec<(::std::string::String, ::oxstore::FieldValue)> {
                ::std::vec![#(#capture,)*]
            }

            #derived_key
        }
    };

    expanded.into()
}
