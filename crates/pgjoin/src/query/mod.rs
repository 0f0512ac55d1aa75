//! The join query composer.
//!
//! [`QueryJoin`] owns everything one statement needs: the registered tables,
//! the FROM text, the caller's conditions and the selection. Builder methods
//! consume and return the query; the first failure is kept and reported by
//! every rendering call.
//!
//! ```ignore
//! let stmt = QueryJoin::<User>::create(config)?
//!     .left_join::<Role>()
//!     .on(User::ROLE_ID, Role::ID)
//!     .select_none_tables()
//!     .select_all::<Role>()
//!     .eq(User::NAME, "alice")
//!     .statement()?;
//! ```

mod conditions;
mod exec;
mod select;

use crate::config::{DuplicateJoinPolicy, JoinConfig};
use crate::entity::Entity;
use crate::error::{BuildError, BuildResult};
use crate::expr::{Condition, Expr};
use crate::ident::validate_alias;
use crate::join::{JoinKind, OnClause};
use crate::param::ParamList;
use crate::statement::{PageRequest, Statement};
use crate::table::{TableEntry, TableRegistry};
use crate::value::SqlValue;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

/// Multi-table query rooted at master entity `M`.
pub struct QueryJoin<M> {
    config: JoinConfig,
    tables: TableRegistry,
    /// `(output alias, raw fragment or empty)`, unique by alias.
    explicit_selects: Vec<(String, String)>,
    from: String,
    condition: Condition,
    group_by: Vec<String>,
    order_by: Vec<String>,
    last: Option<String>,
    distinct: bool,
    tenant_disabled: bool,
    soft_delete_disabled: bool,
    page: Option<PageRequest>,
    build_error: Option<BuildError>,
    _master: PhantomData<fn() -> M>,
}

impl<M> Clone for QueryJoin<M> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            tables: self.tables.clone(),
            explicit_selects: self.explicit_selects.clone(),
            from: self.from.clone(),
            condition: self.condition.clone(),
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            last: self.last.clone(),
            distinct: self.distinct,
            tenant_disabled: self.tenant_disabled,
            soft_delete_disabled: self.soft_delete_disabled,
            page: self.page,
            build_error: self.build_error.clone(),
            _master: PhantomData,
        }
    }
}

impl<M> fmt::Debug for QueryJoin<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryJoin")
            .field("master", &std::any::type_name::<M>())
            .field("tables", &self.tables.len())
            .field("from", &self.from)
            .field("distinct", &self.distinct)
            .field("build_error", &self.build_error)
            .finish()
    }
}

impl<M: Entity> QueryJoin<M> {
    /// Start a query on `M`, which is selected in full by default.
    pub fn create(config: JoinConfig) -> BuildResult<Self> {
        let descriptor = config.descriptors().get::<M>()?;
        let entry = TableEntry::master(descriptor);
        validate_alias(entry.alias())?;

        let mut tables = TableRegistry::new();
        let from = entry.from_fragment();
        tables.insert(TypeId::of::<M>(), entry);

        Ok(Self {
            tenant_disabled: !config.tenant_enabled(),
            soft_delete_disabled: !config.settings.soft_delete,
            config,
            tables,
            explicit_selects: Vec::new(),
            from,
            condition: Condition::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            last: None,
            distinct: false,
            page: None,
            build_error: None,
            _master: PhantomData,
        })
    }

    /// Skip tenant scoping for this query.
    pub fn disable_tenant(mut self) -> Self {
        self.tenant_disabled = true;
        self
    }

    /// Skip soft-delete filtering for this query.
    pub fn disable_soft_delete(mut self) -> Self {
        self.soft_delete_disabled = true;
        self
    }

    /// Emit `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Page used by [`page_maps`](Self::page_maps) and [`page_as`](Self::page_as).
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// The first error recorded while building, if any.
    pub fn build_error(&self) -> Option<&BuildError> {
        self.build_error.as_ref()
    }

    /// Keep `err` unless an earlier error is already recorded.
    pub(crate) fn record(&mut self, err: BuildError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    pub(crate) fn append_from(&mut self, fragment: &str) {
        self.from.push_str(fragment);
    }

    pub(crate) fn push_expr(&mut self, expr: Expr) {
        self.condition.push(expr);
    }

    /// Fail early if something went wrong while building.
    pub fn validate(&self) -> BuildResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    // ==================== Joins ====================

    /// `JOIN J`
    pub fn join<J: Entity>(self) -> OnClause<M> {
        self.join_kind::<J>(JoinKind::Join)
    }

    /// `INNER JOIN J`
    pub fn inner_join<J: Entity>(self) -> OnClause<M> {
        self.join_kind::<J>(JoinKind::Inner)
    }

    /// `CROSS JOIN J`
    pub fn cross_join<J: Entity>(self) -> OnClause<M> {
        self.join_kind::<J>(JoinKind::Cross)
    }

    /// `LEFT JOIN J`
    pub fn left_join<J: Entity>(self) -> OnClause<M> {
        self.join_kind::<J>(JoinKind::Left)
    }

    /// `RIGHT JOIN J`
    pub fn right_join<J: Entity>(self) -> OnClause<M> {
        self.join_kind::<J>(JoinKind::Right)
    }

    /// `, J`; the ON fields become a WHERE equality.
    pub fn where_join<J: Entity>(self) -> OnClause<M> {
        self.join_kind::<J>(JoinKind::Where)
    }

    /// Register `J` with nothing selected and attach it to FROM.
    pub fn join_kind<J: Entity>(mut self, kind: JoinKind) -> OnClause<M> {
        let descriptor = match self.config.descriptors().get::<J>() {
            Ok(descriptor) => descriptor,
            Err(err) => {
                self.record(err);
                return OnClause::new::<J>(self, kind, true);
            }
        };

        let entity = TypeId::of::<J>();
        if let Some(existing) = self.tables.get(entity) {
            let rejoin_master = existing.is_master();
            if rejoin_master || self.config.settings.duplicate_join == DuplicateJoinPolicy::Reject {
                self.record(BuildError::DuplicateEntityJoin(
                    descriptor.entity_name().to_string(),
                ));
                return OnClause::new::<J>(self, kind, true);
            }
            tracing::warn!(
                target: "pgjoin",
                entity = descriptor.entity_name(),
                "entity joined twice; replacing its earlier registration"
            );
        }

        let entry = TableEntry::joined(descriptor);
        if let Err(err) = validate_alias(entry.alias()) {
            self.record(err);
            return OnClause::new::<J>(self, kind, true);
        }
        let fragment = kind.from_fragment(&entry.from_fragment());
        self.tables.insert(entity, entry);
        self.append_from(&fragment);
        OnClause::new::<J>(self, kind, false)
    }

    // ==================== Reset / nesting ====================

    /// Drop joins, explicit selects and conditions; keep the master and flags.
    pub fn clear(mut self) -> Self {
        self.tables.retain_master();
        self.from = self
            .tables
            .master()
            .map(TableEntry::from_fragment)
            .unwrap_or_default();
        self.explicit_selects.clear();
        self.condition.clear();
        self.group_by.clear();
        self.order_by.clear();
        self.last = None;
        self.page = None;
        self.build_error = None;
        self
    }

    /// A query sharing this one's tables with an empty condition.
    ///
    /// Used for nested groups; parameters are numbered when the outer query
    /// is rendered, so nested placeholders never collide.
    pub fn instance(&self) -> Self {
        Self {
            config: self.config.clone(),
            tables: self.tables.clone(),
            explicit_selects: Vec::new(),
            from: self.from.clone(),
            condition: Condition::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            last: None,
            distinct: self.distinct,
            tenant_disabled: self.tenant_disabled,
            soft_delete_disabled: self.soft_delete_disabled,
            page: None,
            build_error: None,
            _master: PhantomData,
        }
    }

    // ==================== Rendering ====================

    /// Select list, `DISTINCT ` prefixed when enabled.
    pub fn select_clause(&self) -> BuildResult<String> {
        self.validate()?;
        let columns = self.select_columns()?;
        if self.distinct {
            Ok(format!("DISTINCT {columns}"))
        } else {
            Ok(columns)
        }
    }

    fn select_columns(&self) -> BuildResult<String> {
        let mut parts: Vec<String> = self
            .explicit_selects
            .iter()
            .map(|(alias, fragment)| {
                if fragment.is_empty() {
                    alias.clone()
                } else {
                    format!("{fragment} AS {alias}")
                }
            })
            .collect();
        parts.extend(
            self.tables
                .iter()
                .map(TableEntry::select_string)
                .filter(|s| !s.is_empty()),
        );
        if parts.is_empty() {
            return Err(BuildError::NoColumnsSelected);
        }
        Ok(parts.join(","))
    }

    /// The FROM text built so far.
    pub fn from_clause(&self) -> &str {
        &self.from
    }

    /// `WHERE .. GROUP BY .. ORDER BY ..` with tenant and soft-delete
    /// predicates injected; placeholders are `$n`.
    pub fn condition_clause(&self) -> BuildResult<String> {
        let (filter, _) = self.render_filter()?;
        let parts = [
            filter,
            self.group_by_clause(),
            self.order_by_clause(),
            self.last.clone().unwrap_or_default(),
        ];
        Ok(parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    /// `WHERE ..` (or nothing) and its parameters.
    fn render_filter(&self) -> BuildResult<(String, ParamList)> {
        self.validate()?;
        let injected = self.injected_predicates();

        let mut caller = self.condition.clone();
        caller.drop_pending_or();

        let effective = if injected.is_empty() {
            caller
        } else {
            let mut effective = if caller.has_or() {
                let mut wrapped = Condition::new();
                wrapped.push(Expr::Group(caller));
                wrapped
            } else {
                caller
            };
            for expr in injected {
                effective.push(expr);
            }
            effective
        };

        let mut params = ParamList::new();
        let body = effective.build(&mut params);
        let filter = if body.is_empty() {
            body
        } else {
            format!("WHERE {body}")
        };
        Ok((filter, params))
    }

    fn group_by_clause(&self) -> String {
        if self.group_by.is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", self.group_by.join(", "))
        }
    }

    fn order_by_clause(&self) -> String {
        if self.order_by.is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", self.order_by.join(", "))
        }
    }

    /// Tenant and soft-delete predicates not already present in the
    /// caller's condition, in table registration order.
    fn injected_predicates(&self) -> Vec<Expr> {
        if self.tables.is_empty() || (self.tenant_disabled && self.soft_delete_disabled) {
            return Vec::new();
        }

        let existing = self.condition.build(&mut ParamList::new());
        let tenant = if self.tenant_disabled {
            None
        } else {
            self.config.tenant_source().and_then(|source| {
                let column = source.tenant_column()?.trim();
                let base = source.tenant_base_type()?;
                (!column.is_empty()).then(|| (column.to_string(), base, source.tenant_values()))
            })
        };

        let mut injected = Vec::new();
        for entry in self.tables.iter() {
            let descriptor = entry.descriptor();

            if let Some((column, base, values)) = &tenant {
                let qualified = entry.qualify(column);
                if descriptor.tenant_base_type() == Some(*base) && !existing.contains(&qualified) {
                    injected.push(Expr::in_list(qualified, values.clone()));
                }
            }

            if !self.soft_delete_disabled {
                if let Some(field) = descriptor.soft_delete_field() {
                    let qualified = entry.qualify(&field.column);
                    if !existing.contains(&qualified) {
                        let marker = field.not_deleted_value.as_deref().unwrap_or("0");
                        injected.push(Expr::compare(
                            qualified,
                            "=",
                            SqlValue::coerce_number(marker),
                        ));
                    }
                }
            }
        }
        injected
    }

    /// The parameterized statement.
    pub fn statement(&self) -> BuildResult<Statement> {
        self.validate()?;
        let select = self.select_columns()?;
        let (filter, params) = self.render_filter()?;
        let stmt = Statement {
            select,
            from: self.from.clone(),
            filter,
            group_by: self.group_by_clause(),
            order_by: self.order_by_clause(),
            last: self.last.clone(),
            params,
            distinct: self.distinct,
            limit: None,
            offset: None,
        };
        tracing::debug!(
            target: "pgjoin.sql",
            sql = %stmt.sql(),
            params = stmt.params.len(),
            "rendered join statement"
        );
        Ok(stmt)
    }

    /// The statement with parameters inlined, for logging and inspection.
    pub fn full_statement(&self) -> BuildResult<String> {
        Ok(self.statement()?.full_sql())
    }

    /// `SELECT COUNT(1)` over the same FROM and filter; ordering and the
    /// `last` fragment are left out.
    pub fn count_statement(&self) -> BuildResult<String> {
        Ok(self.statement()?.count_sql())
    }
}
