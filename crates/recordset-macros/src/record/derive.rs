//! Implementation of the `#[derive(Record)]` macro.

use std::collections::{HashMap, HashSet};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::parse_record_attrs;

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut constants: HashMap<String, String> = HashMap::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_record_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let query_name = attrs
            .rename
            .unwrap_or_else(|| field_name.to_string().trim_start_matches("r#").to_string());
        if !seen.insert(query_name.clone()) {
            return Err(Error::new(
                field.span(),
                format!("duplicate record field name '{}'", query_name),
            ));
        }

        let const_text = to_screaming_snake_case(&query_name);
        if let Some(other) = constants.insert(const_text.clone(), query_name.clone()) {
            return Err(Error::new(
                field.span(),
                format!(
                    "record field names '{}' and '{}' both map to constant {}",
                    other, query_name, const_text
                ),
            ));
        }
        let const_name = format_ident!("{}", const_text);
        field_constants.push(quote! {
            /// Field name constant for queries.
            pub const #const_name: &'static str = #query_name;
        });

        let value_expr = if attrs.timestamp {
            quote! { ::recordset::AsTimestamp::timestamp_value(&self.#field_name) }
        } else {
            quote! { ::recordset::AsValue::as_value(&self.#field_name) }
        };

        field_matches.push(quote! {
            #query_name => #value_expr,
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::recordset::Record for #struct_name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::recordset::Value<'_> {
                match field {
                    #(#field_matches)*
                    _ => ::recordset::Value::None,
                }
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_ascii_lowercase();
        } else {
            // Anything that can't appear in an identifier
            result.push('_');
            prev_was_lower = false;
        }
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}
