//! Attribute parsing for the Entity derive macro.
//!
//! Handles struct-level and field-level `#[join(...)]` attributes.

use crate::sql_ident::is_valid_sql_ident;
use syn::{Attribute, LitStr, Result};

/// Struct-level `#[join(...)]` options.
#[derive(Default)]
pub(super) struct StructAttr {
    pub table: Option<LitStr>,
    pub alias: Option<LitStr>,
    pub tenant: Option<syn::Path>,
}

/// Field-level `#[join(...)]` options.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub skip: bool,
    pub column: Option<LitStr>,
    pub soft_delete: Option<LitStr>,
}

impl StructAttr {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = StructAttr::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("join")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    out.table = Some(checked_ident(meta.value()?.parse()?, "table")?);
                } else if meta.path.is_ident("alias") {
                    out.alias = Some(checked_ident(meta.value()?.parse()?, "alias")?);
                } else if meta.path.is_ident("tenant") {
                    let value = meta.value()?;
                    let path = if value.peek(LitStr) {
                        value.parse::<LitStr>()?.parse::<syn::Path>()?
                    } else {
                        value.parse::<syn::Path>()?
                    };
                    out.tenant = Some(path);
                } else {
                    return Err(meta.error("expected `table`, `alias` or `tenant`"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

impl FieldAttr {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = FieldAttr::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("join")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    out.is_id = true;
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                } else if meta.path.is_ident("column") {
                    out.column = Some(checked_ident(meta.value()?.parse()?, "column")?);
                } else if meta.path.is_ident("soft_delete") {
                    out.soft_delete = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("expected `id`, `skip`, `column` or `soft_delete`"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

fn checked_ident(lit: LitStr, what: &str) -> Result<LitStr> {
    if is_valid_sql_ident(&lit.value()) {
        Ok(lit)
    } else {
        Err(syn::Error::new(
            lit.span(),
            format!("{what} must be a plain SQL identifier"),
        ))
    }
}
