//! Field reference resolution against a query's table registry.

use crate::entity::{Entity, Field, FieldRef};
use crate::error::{BuildError, BuildResult};
use crate::table::TableRegistry;

/// A field resolved to a column of one registered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Alias of the owning table.
    pub table_alias: String,
    pub column: String,
    /// Output alias: the explicit alias, or the field name.
    pub output_alias: String,
}

impl ResolvedColumn {
    /// `tableAlias.column`
    pub fn condition_form(&self) -> String {
        format!("{}.{}", self.table_alias, self.column)
    }

    /// `tableAlias.column AS outputAlias`
    pub fn select_form(&self) -> String {
        format!(
            "{}.{} AS {}",
            self.table_alias, self.column, self.output_alias
        )
    }
}

/// Resolve `field` by its declaring entity type.
///
/// Never depends on where the field came from (left or right of an ON
/// clause, master or joined table): only the field's own entity is used.
pub fn resolve(
    registry: &TableRegistry,
    field: FieldRef,
    alias: Option<&str>,
) -> BuildResult<ResolvedColumn> {
    if registry.is_empty() {
        return Err(BuildError::EmptyRegistry);
    }
    let entry = registry
        .get(field.entity)
        .ok_or(BuildError::UnregisteredEntity {
            entity: field.entity_name,
        })?;

    let descriptor = entry.descriptor();
    let column = descriptor
        .column_of(field.field)
        .ok_or_else(|| BuildError::UnknownField {
            entity: descriptor.entity_name().to_string(),
            field: field.field.to_string(),
        })?;

    Ok(ResolvedColumn {
        table_alias: entry.alias().to_string(),
        column: column.to_string(),
        output_alias: alias.unwrap_or(field.field).to_string(),
    })
}

/// Something that names a column in a condition.
///
/// Typed fields resolve against the query's tables; strings are taken as
/// already-qualified column text.
pub trait IntoColumn {
    fn into_column(self, registry: &TableRegistry) -> BuildResult<String>;
}

impl<E: Entity> IntoColumn for Field<E> {
    fn into_column(self, registry: &TableRegistry) -> BuildResult<String> {
        resolve(registry, self.erase(), None).map(|c| c.condition_form())
    }
}

impl IntoColumn for FieldRef {
    fn into_column(self, registry: &TableRegistry) -> BuildResult<String> {
        resolve(registry, self, None).map(|c| c.condition_form())
    }
}

impl IntoColumn for &str {
    fn into_column(self, _registry: &TableRegistry) -> BuildResult<String> {
        Ok(self.to_string())
    }
}

impl IntoColumn for String {
    fn into_column(self, _registry: &TableRegistry) -> BuildResult<String> {
        Ok(self)
    }
}

impl IntoColumn for &String {
    fn into_column(self, _registry: &TableRegistry) -> BuildResult<String> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityDescriptor;
    use crate::table::TableEntry;
    use std::any::TypeId;
    use std::sync::Arc;

    struct User;
    impl Entity for User {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("User", "sys_user")
                .primary_key("user_id", "uid")
                .field("role_id", "role_id")
                .field("name", "user_name")
        }
    }

    struct Role;
    impl Entity for Role {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Role", "role").field("name", "name")
        }
    }

    struct Dept;
    impl Entity for Dept {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Dept", "dept")
        }
    }

    fn registry() -> TableRegistry {
        let mut registry = TableRegistry::new();
        registry.insert(
            TypeId::of::<User>(),
            TableEntry::master(Arc::new(User::descriptor())),
        );
        registry.insert(
            TypeId::of::<Role>(),
            TableEntry::joined(Arc::new(Role::descriptor())),
        );
        registry
    }

    #[test]
    fn primary_key_uses_key_column_and_field_alias() {
        let col = resolve(&registry(), Field::<User>::new("user_id").erase(), None).unwrap();
        assert_eq!(col.condition_form(), "user.uid");
        assert_eq!(col.select_form(), "user.uid AS user_id");
    }

    #[test]
    fn output_alias_is_field_name_unless_overridden() {
        let field = Field::<User>::new("name").erase();
        let col = resolve(&registry(), field, None).unwrap();
        assert_eq!(col.select_form(), "user.user_name AS name");
        let col = resolve(&registry(), field, Some("userName")).unwrap();
        assert_eq!(col.select_form(), "user.user_name AS userName");
    }

    #[test]
    fn unregistered_entity_fails_regardless_of_registry_size() {
        let err = resolve(&registry(), Field::<Dept>::new("id").erase(), None).unwrap_err();
        assert!(matches!(err, BuildError::UnregisteredEntity { .. }));

        let mut only_master = TableRegistry::new();
        only_master.insert(
            TypeId::of::<User>(),
            TableEntry::master(Arc::new(User::descriptor())),
        );
        let err = resolve(&only_master, Field::<Dept>::new("id").erase(), None).unwrap_err();
        assert!(matches!(err, BuildError::UnregisteredEntity { .. }));
    }

    #[test]
    fn empty_registry_and_unknown_field() {
        let err = resolve(&TableRegistry::new(), Field::<User>::new("name").erase(), None);
        assert_eq!(err.unwrap_err(), BuildError::EmptyRegistry);

        let err = resolve(&registry(), Field::<Role>::new("color").erase(), None).unwrap_err();
        assert!(matches!(err, BuildError::UnknownField { ref field, .. } if field == "color"));
    }

    #[test]
    fn raw_strings_pass_through() {
        let reg = registry();
        assert_eq!("x.y".into_column(&reg).unwrap(), "x.y");
        assert_eq!(
            Field::<Role>::new("name").into_column(&reg).unwrap(),
            "role.name"
        );
    }
}
