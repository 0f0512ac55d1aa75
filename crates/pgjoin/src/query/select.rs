//! Column selection.

use super::QueryJoin;
use crate::entity::{Entity, Field, FieldMeta};
use crate::error::{BuildError, BuildResult};
use crate::ident::validate_alias;
use crate::resolve::resolve;
use crate::table::TableEntry;
use std::any::TypeId;

impl<M: Entity> QueryJoin<M> {
    fn with_entry<E: Entity>(mut self, f: impl FnOnce(&mut TableEntry) -> BuildResult<()>) -> Self {
        let result = match self.tables.get_mut(TypeId::of::<E>()) {
            Some(entry) => f(entry),
            None => Err(BuildError::UnregisteredEntity {
                entity: std::any::type_name::<E>(),
            }),
        };
        if let Err(err) = result {
            self.record(err);
        }
        self
    }

    /// Select every column of `E`.
    pub fn select_all<E: Entity>(self) -> Self {
        self.with_entry::<E>(|entry| {
            entry.select_all();
            Ok(())
        })
    }

    /// Select nothing from `E`.
    pub fn select_none<E: Entity>(self) -> Self {
        self.with_entry::<E>(|entry| {
            entry.select_none();
            Ok(())
        })
    }

    /// Select every column of every registered table.
    pub fn select_all_tables(mut self) -> Self {
        self.tables.iter_mut().for_each(TableEntry::select_all);
        self
    }

    /// Select nothing from any registered table.
    pub fn select_none_tables(mut self) -> Self {
        self.tables.iter_mut().for_each(TableEntry::select_none);
        self
    }

    /// Add one field to its table's selection.
    pub fn select<E: Entity>(self, field: Field<E>) -> Self {
        self.selects(&[field])
    }

    /// Add fields of `E` to its selection; a full selection is reset first.
    pub fn selects<E: Entity>(self, fields: &[Field<E>]) -> Self {
        let names: Vec<&'static str> = fields.iter().map(Field::name).collect();
        self.with_entry::<E>(|entry| entry.select_some(&names))
    }

    /// Select master fields accepted by `keep`; the primary key is not offered.
    pub fn select_matching(mut self, keep: impl Fn(&FieldMeta) -> bool) -> Self {
        let Some(master) = self.tables.master_mut() else {
            self.record(BuildError::EmptyRegistry);
            return self;
        };
        let key = master.descriptor().key().field.clone();
        let names: Vec<String> = master
            .descriptor()
            .fields()
            .iter()
            .filter(|f| f.field != key && keep(*f))
            .map(|f| f.field.clone())
            .collect();
        if let Err(err) = master.select_some(&names) {
            self.record(err);
        }
        self
    }

    /// Select `field` under output alias `alias`.
    ///
    /// An alias that is already selected is logged and skipped; the first
    /// binding wins.
    pub fn select_as<E: Entity>(mut self, field: Field<E>, alias: &str) -> Self {
        if let Err(err) = validate_alias(alias) {
            self.record(err);
            return self;
        }
        let column = match resolve(&self.tables, field.erase(), Some(alias)) {
            Ok(column) => column,
            Err(err) => {
                self.record(err);
                return self;
            }
        };
        if self.has_explicit(alias) {
            tracing::warn!(
                target: "pgjoin",
                error = %BuildError::DuplicateOutputAlias(alias.to_string()),
                "select skipped"
            );
            return self;
        }
        let fragment = column.condition_form();
        self.explicit_selects.push((column.output_alias, fragment));
        self
    }

    /// Select raw expressions verbatim; duplicates are logged and skipped.
    pub fn select_raw<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for expr in exprs {
            let expr = expr.into();
            if expr.trim().is_empty() {
                continue;
            }
            if self.has_explicit(&expr) {
                tracing::warn!(
                    target: "pgjoin",
                    error = %BuildError::DuplicateOutputAlias(expr.clone()),
                    "select skipped"
                );
                continue;
            }
            self.explicit_selects.push((expr, String::new()));
        }
        self
    }

    fn has_explicit(&self, alias: &str) -> bool {
        self.explicit_selects.iter().any(|(a, _)| a == alias)
    }
}
