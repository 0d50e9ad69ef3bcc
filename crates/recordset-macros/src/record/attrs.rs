//! Attribute parsing for the Record derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Field-level attributes from `#[record(...)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordAttr {
    /// Leave the field out of queries.
    pub skip: bool,
    /// Custom field name for queries (default: field name).
    pub rename: Option<String>,
    /// Read the field through `AsTimestamp` instead of `AsValue`.
    pub timestamp: bool,
}

impl RecordAttr {
    fn check_skip(&self, span: Span) -> Result<()> {
        if self.skip && (self.rename.is_some() || self.timestamp) {
            return Err(Error::new(
                span,
                "skip cannot be combined with other record attributes",
            ));
        }
        Ok(())
    }
}

impl Parse for RecordAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = RecordAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => attr.skip = true,
                Meta::Path(p) if p.is_ident("timestamp") => attr.timestamp = true,

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        if s.value().is_empty() {
                            return Err(Error::new(s.span(), "rename must not be empty"));
                        }
                        attr.rename = Some(s.value());
                    } else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown record attribute. Expected: skip, timestamp, or rename = \"...\"",
                    ));
                }
            }
        }

        attr.check_skip(input.span())?;
        Ok(attr)
    }
}

/// Extract `#[record(...)]` attributes from a field's attributes.
///
/// Repeated attributes are merged, later ones winning on `rename`.
pub fn parse_record_attrs(attrs: &[Attribute]) -> Result<RecordAttr> {
    let mut merged = RecordAttr::default();
    for attr in attrs {
        if attr.path().is_ident("record") {
            let parsed = attr.parse_args::<RecordAttr>()?;
            merged.skip |= parsed.skip;
            merged.timestamp |= parsed.timestamp;
            if parsed.rename.is_some() {
                merged.rename = parsed.rename;
            }
            // Conflicts may be split across attributes
            merged.check_skip(attr.span())?;
        }
    }
    Ok(merged)
}
