//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates field name constants and a `Record` impl from struct
//! annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
