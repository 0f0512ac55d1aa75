//! Entity derive macro implementation

mod attrs;

use attrs::{FieldAttr, StructAttr};
use heck::{ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

struct Column {
    field: String,
    column: String,
    soft_delete: Option<String>,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let struct_attr = StructAttr::parse(&input.attrs)?;
    let entity_name = name.to_string();
    let table = struct_attr
        .table
        .as_ref()
        .map(|t| t.value())
        .unwrap_or_else(|| entity_name.to_snake_case());

    let mut key: Option<Column> = None;
    let mut columns = Vec::new();
    let mut consts = Vec::new();

    for field in fields {
        let attr = FieldAttr::parse(&field.attrs)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_name = ident.to_string();
        let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name).to_string();
        let column = Column {
            column: attr
                .column
                .as_ref()
                .map(|c| c.value())
                .unwrap_or_else(|| field_name.clone()),
            soft_delete: attr.soft_delete.as_ref().map(|s| s.value()),
            field: field_name.clone(),
        };

        let const_name = format_ident!("{}", field_name.to_shouty_snake_case());
        let doc = format!("Field accessor for `{field_name}`.");
        consts.push(quote! {
            #[doc = #doc]
            pub const #const_name: pgjoin::Field<#name> = pgjoin::Field::new(#field_name);
        });

        if attr.is_id {
            if key.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[join(id)]",
                ));
            }
            if column.soft_delete.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "the primary key cannot be the soft-delete marker",
                ));
            }
            key = Some(column);
        } else {
            columns.push(column);
        }
    }

    let key = match key {
        Some(key) => key,
        None => {
            let Some(pos) = columns.iter().position(|c| c.field == "id") else {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity requires a #[join(id)] field or a field named `id`",
                ));
            };
            columns.remove(pos)
        }
    };

    if columns.iter().filter(|c| c.soft_delete.is_some()).count() > 1 {
        return Err(syn::Error::new_spanned(
            &input,
            "only one field can be marked #[join(soft_delete = ...)]",
        ));
    }

    let key_field = &key.field;
    let key_column = &key.column;
    let field_calls = columns.iter().map(|c| {
        let field = &c.field;
        let column = &c.column;
        match &c.soft_delete {
            Some(value) => quote! { .soft_delete(#field, #column, #value) },
            None => quote! { .field(#field, #column) },
        }
    });
    let alias_call = struct_attr.alias.as_ref().map(|alias| quote! { .alias(#alias) });
    let tenant_call = struct_attr
        .tenant
        .as_ref()
        .map(|tenant| quote! { .tenant_base::<#tenant>() });

    Ok(quote! {
        impl #name {
            #(#consts)*
        }

        impl pgjoin::Entity for #name {
            fn descriptor() -> pgjoin::EntityDescriptor {
                pgjoin::EntityDescriptor::new(#entity_name, #table)
                    .primary_key(#key_field, #key_column)
                    #(#field_calls)*
                    #alias_call
                    #tenant_call
            }
        }

        // Auto-register this entity with DescriptorRegistry::discover via inventory
        pgjoin::inventory::submit! {
            pgjoin::EntityRegistration {
                register_fn: |registry: &mut pgjoin::DescriptorRegistry| {
                    registry.register::<#name>();
                }
            }
        }
    })
}
