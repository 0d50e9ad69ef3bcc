//! Proc macros for recordset.
//!
//! # Derive Macros
//!
//! - [`Record`] - Generate field access for query-enabled structs

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod record;

/// Derives the `Record` trait for a struct with named fields.
///
/// Every named field is exposed under its own name unless marked otherwise.
/// Field values are converted with `AsValue`, so any type implementing it
/// (strings, numbers, booleans, `Option`, `Vec`) works out of the box.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Exclude this field from queries |
/// | `rename = "..."` | Use a custom name for queries |
/// | `timestamp` | Read the field through `AsTimestamp` |
///
/// # Generated Code
///
/// 1. Field name constants (e.g., `Rune::NAME`, `Rune::LVL`)
/// 2. Implementation of `Record::field_value()`
///
/// # Example
///
/// ```ignore
/// use recordset::{Dataset, Record};
///
/// #[derive(Record)]
/// struct Rune {
///     name: String,
///     #[record(rename = "lvl")]
///     level: u8,
///     #[record(timestamp)]
///     found_at: i64,
///     #[record(skip)]
///     lore: String,
/// }
///
/// let mut runes = Dataset::new(|| Vec::<Rune>::new());
/// runes.queries(Rune::LVL).unwrap();
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
