//! Per-query table registrations and their select-mode state machine.

use crate::entity::EntityDescriptor;
use crate::error::{BuildError, BuildResult};
use std::any::TypeId;
use std::sync::Arc;

/// Which of a table's columns go into the select clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Every field plus the primary key.
    All,
    /// Nothing.
    None,
    /// Fields added explicitly since the last reset.
    Some,
}

/// One table joined into a query.
#[derive(Debug, Clone)]
pub struct TableEntry {
    alias: String,
    descriptor: Arc<EntityDescriptor>,
    is_master: bool,
    mode: SelectMode,
    /// `(output alias, "alias.column")`, unique by output alias.
    selected: Vec<(String, String)>,
}

impl TableEntry {
    /// Register the master table; it starts with every column selected.
    pub fn master(descriptor: Arc<EntityDescriptor>) -> Self {
        let mut entry = Self::new(descriptor, true);
        entry.select_all();
        entry
    }

    /// Register a joined table; it starts with nothing selected.
    pub fn joined(descriptor: Arc<EntityDescriptor>) -> Self {
        Self::new(descriptor, false)
    }

    fn new(descriptor: Arc<EntityDescriptor>, is_master: bool) -> Self {
        Self {
            alias: descriptor.default_alias(),
            descriptor,
            is_master,
            mode: SelectMode::None,
            selected: Vec::new(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Output aliases currently selected, in selection order.
    pub fn selected_aliases(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(|(alias, _)| alias.as_str())
    }

    /// `FROM` fragment: `table AS alias`.
    pub fn from_fragment(&self) -> String {
        format!("{} AS {}", self.descriptor.table_name(), self.alias)
    }

    /// Condition form of `column` on this table.
    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{}", self.alias, column)
    }

    /// Select every field plus the primary key, replacing any prior selection.
    pub fn select_all(&mut self) {
        self.mode = SelectMode::All;
        let selected = self
            .descriptor
            .columns()
            .map(|(field, column)| (field.to_string(), self.qualify(column)))
            .collect();
        self.selected = selected;
    }

    /// Select nothing from this table.
    pub fn select_none(&mut self) {
        self.mode = SelectMode::None;
        self.selected.clear();
    }

    /// Add `fields` to this table's selection.
    ///
    /// Coming from `All` the selection is reset first; otherwise it
    /// accumulates. Every field is checked before any is added.
    pub fn select_some<S: AsRef<str>>(&mut self, fields: &[S]) -> BuildResult<()> {
        let mut resolved = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            let column =
                self.descriptor
                    .column_of(field)
                    .ok_or_else(|| BuildError::UnknownField {
                        entity: self.descriptor.entity_name().to_string(),
                        field: field.to_string(),
                    })?;
            resolved.push((field.to_string(), self.qualify(column)));
        }

        if self.mode == SelectMode::All {
            self.select_none();
        }
        self.mode = SelectMode::Some;
        for (alias, column) in resolved {
            self.put(alias, column);
        }
        Ok(())
    }

    fn put(&mut self, alias: String, column: String) {
        match self.selected.iter_mut().find(|(a, _)| *a == alias) {
            Some(slot) => slot.1 = column,
            None => self.selected.push((alias, column)),
        }
    }

    /// `alias.col AS out,alias.col AS out` or an empty string.
    pub fn select_string(&self) -> String {
        self.selected
            .iter()
            .map(|(alias, column)| format!("{column} AS {alias}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Tables of one query keyed by entity type, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    entries: Vec<(TypeId, TableEntry)>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, entity: TypeId) -> bool {
        self.entries.iter().any(|(id, _)| *id == entity)
    }

    pub fn get(&self, entity: TypeId) -> Option<&TableEntry> {
        self.entries
            .iter()
            .find(|(id, _)| *id == entity)
            .map(|(_, entry)| entry)
    }

    pub fn get_mut(&mut self, entity: TypeId) -> Option<&mut TableEntry> {
        self.entries
            .iter_mut()
            .find(|(id, _)| *id == entity)
            .map(|(_, entry)| entry)
    }

    /// Register `entry`, replacing an existing registration in place.
    ///
    /// Returns `true` when an earlier registration was replaced.
    pub fn insert(&mut self, entity: TypeId, entry: TableEntry) -> bool {
        match self.entries.iter_mut().find(|(id, _)| *id == entity) {
            Some(slot) => {
                slot.1 = entry;
                true
            }
            None => {
                self.entries.push((entity, entry));
                false
            }
        }
    }

    /// Drop every entry except the master.
    pub fn retain_master(&mut self) {
        self.entries.retain(|(_, entry)| entry.is_master());
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter().map(|(_, entry)| entry)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TableEntry> {
        self.entries.iter_mut().map(|(_, entry)| entry)
    }

    pub fn master(&self) -> Option<&TableEntry> {
        self.iter().find(|entry| entry.is_master())
    }

    pub fn master_mut(&mut self) -> Option<&mut TableEntry> {
        self.iter_mut().find(|entry| entry.is_master())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role() -> Arc<EntityDescriptor> {
        Arc::new(
            EntityDescriptor::new("Role", "role")
                .field("name", "name")
                .field("code", "role_code"),
        )
    }

    #[test]
    fn master_starts_with_all_columns_key_first() {
        let entry = TableEntry::master(role());
        assert_eq!(entry.mode(), SelectMode::All);
        assert_eq!(
            entry.select_string(),
            "role.id AS id,role.name AS name,role.role_code AS code"
        );
    }

    #[test]
    fn joined_starts_empty() {
        let entry = TableEntry::joined(role());
        assert_eq!(entry.mode(), SelectMode::None);
        assert_eq!(entry.select_string(), "");
    }

    #[test]
    fn select_some_after_all_resets() {
        let mut entry = TableEntry::master(role());
        entry.select_some(&["name"]).unwrap();
        assert_eq!(entry.mode(), SelectMode::Some);
        assert_eq!(entry.select_string(), "role.name AS name");
    }

    #[test]
    fn select_some_accumulates() {
        let mut entry = TableEntry::joined(role());
        entry.select_some(&["name"]).unwrap();
        entry.select_some(&["code"]).unwrap();
        entry.select_some(&["name"]).unwrap();
        let aliases: Vec<_> = entry.selected_aliases().collect();
        assert_eq!(aliases, ["name", "code"]);
    }

    #[test]
    fn select_some_with_no_fields_switches_mode_only() {
        let mut entry = TableEntry::joined(role());
        entry.select_some::<&str>(&[]).unwrap();
        assert_eq!(entry.mode(), SelectMode::Some);
        assert_eq!(entry.select_string(), "");
    }

    #[test]
    fn select_some_unknown_field_leaves_state() {
        let mut entry = TableEntry::master(role());
        let err = entry.select_some(&["name", "missing"]).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownField {
                entity: "Role".to_string(),
                field: "missing".to_string()
            }
        );
        assert_eq!(entry.mode(), SelectMode::All);
    }

    #[test]
    fn registry_replaces_in_place() {
        let mut registry = TableRegistry::new();
        let a = TypeId::of::<u8>();
        let b = TypeId::of::<u16>();
        assert!(!registry.insert(a, TableEntry::master(role())));
        assert!(!registry.insert(b, TableEntry::joined(role())));
        assert!(registry.insert(a, TableEntry::master(role())));
        assert_eq!(registry.len(), 2);
        assert!(registry.iter().next().unwrap().is_master());

        registry.retain_master();
        assert_eq!(registry.len(), 1);
    }
}
