//! Derive macros for pgjoin
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;
mod sql_ident;

/// Derive `Entity` metadata for a struct.
///
/// # Example
///
/// ```ignore
/// use pgjoin::Entity;
///
/// #[derive(Entity)]
/// #[join(table = "sys_user", alias = "u", tenant = TenantScoped)]
/// struct User {
///     #[join(id)]
///     user_id: i64,
///     #[join(column = "user_name")]
///     name: String,
///     #[join(soft_delete = "0")]
///     deleted: i16,
///     #[join(skip)]
///     cached: Option<String>,
/// }
/// ```
///
/// # Generated
///
/// - `impl pgjoin::Entity` building the entity descriptor
/// - one `pgjoin::Field<Self>` constant per field, named in upper snake case
///   (`User::USER_ID`, `User::NAME`, ...)
/// - a startup registration picked up by `DescriptorRegistry::discover()`
///
/// # Attributes
///
/// Struct level:
/// - `#[join(table = "name")]` - Table name (defaults to the struct name in snake case)
/// - `#[join(alias = "name")]` - Table alias (defaults to the struct name in lower camel case)
/// - `#[join(tenant = Type)]` - Scope the table by the tenant whose base marker is `Type`
///
/// Field level:
/// - `#[join(id)]` - Primary key (defaults to a field named `id`)
/// - `#[join(column = "name")]` - Map field to a different column name
/// - `#[join(soft_delete = "value")]` - Soft-delete marker; `value` marks a live row
/// - `#[join(skip)]` - Not a column
#[proc_macro_derive(Entity, attributes(join))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
