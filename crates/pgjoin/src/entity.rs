//! Entity metadata: descriptors and typed field accessors.

use heck::ToLowerCamelCase;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// Static table metadata for one entity type.
///
/// Implemented by `#[derive(Entity)]`; can also be written by hand.
pub trait Entity: 'static {
    /// Build the descriptor for this entity.
    fn descriptor() -> EntityDescriptor;
}

/// A typed accessor for one field of entity `E`.
///
/// The entity type travels with the field, so resolving it against a query
/// never depends on the position it is passed in.
pub struct Field<E> {
    name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Field<E> {
    /// Create a field accessor for the field called `name`.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }

    /// The field name (not the column name).
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<E: Entity> Field<E> {
    /// Erase the entity type into a [`FieldRef`].
    pub fn erase(self) -> FieldRef {
        FieldRef {
            entity: TypeId::of::<E>(),
            entity_name: std::any::type_name::<E>(),
            field: self.name,
        }
    }
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Field<E> {}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// A field reference with its entity type erased to a [`TypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    pub(crate) entity: TypeId,
    pub(crate) entity_name: &'static str,
    pub(crate) field: &'static str,
}

impl FieldRef {
    /// The field name.
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl<E: Entity> From<Field<E>> for FieldRef {
    fn from(field: Field<E>) -> Self {
        field.erase()
    }
}

/// Primary key metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMeta {
    pub field: String,
    pub column: String,
}

/// Metadata for one non-key field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Field name.
    pub field: String,
    /// Column name.
    pub column: String,
    /// Whether this column is the soft-delete marker.
    pub soft_delete: bool,
    /// Marker value of a row that is not deleted.
    pub not_deleted_value: Option<String>,
}

impl FieldMeta {
    pub fn new(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column: column.into(),
            soft_delete: false,
            not_deleted_value: None,
        }
    }
}

/// Static per-type table and column metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    entity: &'static str,
    table: String,
    alias: Option<String>,
    primary_key: KeyMeta,
    fields: Vec<FieldMeta>,
    tenant_base: Option<TypeId>,
}

impl EntityDescriptor {
    /// Create a descriptor for entity `entity` stored in `table`.
    ///
    /// The primary key defaults to field and column `id`.
    pub fn new(entity: &'static str, table: impl Into<String>) -> Self {
        Self {
            entity,
            table: table.into(),
            alias: None,
            primary_key: KeyMeta {
                field: "id".to_string(),
                column: "id".to_string(),
            },
            fields: Vec::new(),
            tenant_base: None,
        }
    }

    pub fn primary_key(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.primary_key = KeyMeta {
            field: field.into(),
            column: column.into(),
        };
        self
    }

    /// Add a plain field.
    pub fn field(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.fields.push(FieldMeta::new(field, column));
        self
    }

    /// Add the soft-delete marker field.
    pub fn soft_delete(
        mut self,
        field: impl Into<String>,
        column: impl Into<String>,
        not_deleted_value: impl Into<String>,
    ) -> Self {
        let mut meta = FieldMeta::new(field, column);
        meta.soft_delete = true;
        meta.not_deleted_value = Some(not_deleted_value.into());
        self.fields.push(meta);
        self
    }

    /// Override the default table alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Mark this entity as scoped by the tenant whose base type is `B`.
    pub fn tenant_base<B: 'static>(mut self) -> Self {
        self.tenant_base = Some(TypeId::of::<B>());
        self
    }

    pub fn entity_name(&self) -> &'static str {
        self.entity
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &KeyMeta {
        &self.primary_key
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn tenant_base_type(&self) -> Option<TypeId> {
        self.tenant_base
    }

    /// Explicit alias, or the entity name in lower camel case.
    pub fn default_alias(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.entity.to_lower_camel_case(),
        }
    }

    /// Column of `field`, checking the primary key first.
    pub fn column_of(&self, field: &str) -> Option<&str> {
        if self.primary_key.field == field {
            return Some(&self.primary_key.column);
        }
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.column.as_str())
    }

    /// The soft-delete marker field, if declared.
    pub fn soft_delete_field(&self) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.soft_delete)
    }

    /// `(field, column)` pairs for the primary key followed by every field.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        let key = std::iter::once((
            self.primary_key.field.as_str(),
            self.primary_key.column.as_str(),
        ));
        let rest = self
            .fields
            .iter()
            .filter(|f| f.field != self.primary_key.field)
            .map(|f| (f.field.as_str(), f.column.as_str()));
        key.chain(rest)
    }
}
