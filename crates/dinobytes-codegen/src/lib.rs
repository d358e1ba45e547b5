// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type,
};

/// Field kind for code generation
enum FieldKind {
    /// `Vec<u8>`, written as a byte string
    ByteVec,
    /// Anything else, converted through `ToValue` / `FromValue`
    Convert,
}

/// `#[derive(Record)]` macro: generates `Taggable`, `ToValue` and `FromValue`
///
/// Field order on the wire is declaration order. Field types must implement
/// `ToValue` and `FromValue`; `Vec<u8>` fields are written as byte strings
/// rather than integer sequences.
///
/// The record name defaults to the struct name and can be overridden with
/// `#[record(name = "...")]`.
///
/// Example:
/// ```ignore
/// use dinobytes::Record;
///
/// #[derive(Record)]
/// #[record(name = "telemetry.Frame")]
/// struct Frame {
///     seq: u32,
///     source: String,
///     payload: Vec<u8>,     // byte string
///     inner: Option<Meta>,  // nested record or nil
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let type_name = record_name(input)?;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Generic records are not supported",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Only named fields are supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "Only structs are supported")),
    };

    let mut field_names = Vec::new();
    let mut to_exprs = Vec::new();
    let mut from_exprs = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        field_names.push(ident.unraw().to_string());

        match field_kind(&field.ty) {
            FieldKind::ByteVec => {
                to_exprs.push(quote! {
                    ::dinobytes::Value::Bytes(::std::clone::Clone::clone(&self.#ident))
                });
                from_exprs.push(quote! {
                    #ident: ::dinobytes::__private::bytes_from_value(
                        fields.next().unwrap_or(::dinobytes::Value::Nil),
                    )?
                });
            }
            FieldKind::Convert => {
                let ty = &field.ty;
                to_exprs.push(quote! {
                    ::dinobytes::ToValue::to_value(&self.#ident, registry)?
                });
                from_exprs.push(quote! {
                    #ident: <#ty as ::dinobytes::FromValue>::from_value(
                        fields.next().unwrap_or(::dinobytes::Value::Nil),
                    )?
                });
            }
        }
    }

    Ok(quote! {
        impl ::dinobytes::Taggable for #name {
            const NAME: &'static str = #type_name;
            const FIELDS: &'static [&'static str] = &[#(#field_names),*];

            fn to_fields(
                &self,
                registry: &::dinobytes::TypeRegistry,
            ) -> ::dinobytes::Result<::std::vec::Vec<::dinobytes::Value>> {
                let _ = registry;
                Ok(::std::vec![#(#to_exprs),*])
            }

            fn from_fields(
                fields: ::std::vec::Vec<::dinobytes::Value>,
            ) -> ::dinobytes::Result<Self> {
                let fields = ::dinobytes::__private::check_arity(
                    <Self as ::dinobytes::Taggable>::NAME,
                    <Self as ::dinobytes::Taggable>::FIELDS.len(),
                    fields,
                )?;
                #[allow(unused_mut, unused_variables)]
                let mut fields = fields.into_iter();
                Ok(Self {
                    #(#from_exprs),*
                })
            }
        }

        impl ::dinobytes::ToValue for #name {
            fn to_value(
                &self,
                registry: &::dinobytes::TypeRegistry,
            ) -> ::dinobytes::Result<::dinobytes::Value> {
                ::dinobytes::Taggable::to_record(self, registry).map(::dinobytes::Value::Record)
            }
        }

        impl ::dinobytes::FromValue for #name {
            fn from_value(value: ::dinobytes::Value) -> ::dinobytes::Result<Self> {
                ::dinobytes::__private::record_from_value::<Self>(value)
            }
        }
    })
}

/// `#[record(name = "...")]`, or the struct name
fn record_name(input: &DeriveInput) -> syn::Result<String> {
    let mut name = input.ident.unraw().to_string();
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                name = lit.value();
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `name`"))
            }
        })?;
    }
    Ok(name)
}

/// `Vec<u8>` (by last path segment) is a byte string; everything else converts
fn field_kind(ty: &Type) -> FieldKind {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Vec" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(GenericArgument::Type(Type::Path(inner_path))) = args.args.first() {
                        if let Some(inner_segment) = inner_path.path.segments.last() {
                            if inner_segment.ident == "u8" {
                                return FieldKind::ByteVec;
                            }
                        }
                    }
                }
            }
        }
    }
    FieldKind::Convert
}
