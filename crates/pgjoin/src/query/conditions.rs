//! Condition methods.
//!
//! Columns are anything [`IntoColumn`]: a typed [`Field`](crate::Field)
//! resolved against the query's tables, or a raw qualified column string.
//! Every operator has a guarded `*_if(cond, ..)` form that does nothing when
//! `cond` is false; value operators also have an `*_opt` form that does
//! nothing for `None` or an empty value.

use super::QueryJoin;
use crate::entity::Entity;
use crate::expr::Expr;
use crate::resolve::IntoColumn;
use crate::value::SqlValue;

macro_rules! compare_methods {
    ($($(#[$doc:meta])* $name:ident, $name_if:ident, $name_opt:ident => $op:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(self, column: impl IntoColumn, value: impl Into<SqlValue>) -> Self {
                self.$name_if(true, column, value)
            }

            pub fn $name_if(self, cond: bool, column: impl IntoColumn, value: impl Into<SqlValue>) -> Self {
                if !cond {
                    return self;
                }
                let value = value.into();
                self.push_column(column, |c| Expr::compare(c, $op, value))
            }

            pub fn $name_opt<V: Into<SqlValue>>(self, column: impl IntoColumn, value: Option<V>) -> Self {
                match value.map(Into::<SqlValue>::into) {
                    Some(value) if !value.is_empty() => {
                        self.push_column(column, |c| Expr::compare(c, $op, value))
                    }
                    _ => self,
                }
            }
        )*
    };
}

macro_rules! like_methods {
    ($($(#[$doc:meta])* $name:ident, $name_if:ident, $name_opt:ident => $op:literal, $pre:literal, $post:literal;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(self, column: impl IntoColumn, value: impl AsRef<str>) -> Self {
                self.$name_if(true, column, value)
            }

            pub fn $name_if(self, cond: bool, column: impl IntoColumn, value: impl AsRef<str>) -> Self {
                if !cond {
                    return self;
                }
                let pattern = format!("{}{}{}", $pre, value.as_ref(), $post);
                self.push_column(column, |c| Expr::compare(c, $op, pattern))
            }

            pub fn $name_opt<V: AsRef<str>>(self, column: impl IntoColumn, value: Option<V>) -> Self {
                match value {
                    Some(value) if !value.as_ref().is_empty() => self.$name(column, value),
                    _ => self,
                }
            }
        )*
    };
}

impl<M: Entity> QueryJoin<M> {
    fn push_column(mut self, column: impl IntoColumn, make: impl FnOnce(String) -> Expr) -> Self {
        match column.into_column(&self.tables) {
            Ok(column) => self.condition.push(make(column)),
            Err(err) => self.record(err),
        }
        self
    }

    compare_methods! {
        /// `column = value`
        eq, eq_if, eq_opt => "=";
        /// `column <> value`
        ne, ne_if, ne_opt => "<>";
        /// `column > value`
        gt, gt_if, gt_opt => ">";
        /// `column >= value`
        ge, ge_if, ge_opt => ">=";
        /// `column < value`
        lt, lt_if, lt_opt => "<";
        /// `column <= value`
        le, le_if, le_opt => "<=";
    }

    like_methods! {
        /// `column LIKE '%value%'`
        like, like_if, like_opt => "LIKE", "%", "%";
        /// `column NOT LIKE '%value%'`
        not_like, not_like_if, not_like_opt => "NOT LIKE", "%", "%";
        /// `column LIKE '%value'`
        like_left, like_left_if, like_left_opt => "LIKE", "%", "";
        /// `column LIKE 'value%'`
        like_right, like_right_if, like_right_opt => "LIKE", "", "%";
    }

    /// `column IS NULL`
    pub fn is_null(self, column: impl IntoColumn) -> Self {
        self.is_null_if(true, column)
    }

    pub fn is_null_if(self, cond: bool, column: impl IntoColumn) -> Self {
        if !cond {
            return self;
        }
        self.push_column(column, |column| Expr::NullCheck {
            column,
            is_null: true,
        })
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(self, column: impl IntoColumn) -> Self {
        self.is_not_null_if(true, column)
    }

    pub fn is_not_null_if(self, cond: bool, column: impl IntoColumn) -> Self {
        if !cond {
            return self;
        }
        self.push_column(column, |column| Expr::NullCheck {
            column,
            is_null: false,
        })
    }

    /// `column IN (values)`; one value renders as `column = value`.
    pub fn in_list<V: Into<SqlValue>>(
        self,
        column: impl IntoColumn,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.in_list_if(true, column, values)
    }

    pub fn in_list_if<V: Into<SqlValue>>(
        self,
        cond: bool,
        column: impl IntoColumn,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        if !cond {
            return self;
        }
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        self.push_column(column, |c| Expr::in_list(c, values))
    }

    /// `IN` only when `values` is present and non-empty.
    pub fn in_opt<V: Into<SqlValue>>(self, column: impl IntoColumn, values: Option<Vec<V>>) -> Self {
        match values {
            Some(values) if !values.is_empty() => self.in_list(column, values),
            _ => self,
        }
    }

    /// `column NOT IN (values)`
    pub fn not_in<V: Into<SqlValue>>(
        self,
        column: impl IntoColumn,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.not_in_if(true, column, values)
    }

    pub fn not_in_if<V: Into<SqlValue>>(
        self,
        cond: bool,
        column: impl IntoColumn,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        if !cond {
            return self;
        }
        let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        self.push_column(column, |c| Expr::not_in(c, values))
    }

    /// `column IN (sql)` with a caller-written sub-select.
    pub fn in_sql(self, column: impl IntoColumn, sql: &str) -> Self {
        self.in_sql_if(true, column, sql)
    }

    pub fn in_sql_if(self, cond: bool, column: impl IntoColumn, sql: &str) -> Self {
        if !cond {
            return self;
        }
        let sql = sql.to_string();
        self.push_column(column, |column| Expr::InSql {
            column,
            sql,
            negated: false,
        })
    }

    /// `column NOT IN (sql)`
    pub fn not_in_sql(self, column: impl IntoColumn, sql: &str) -> Self {
        self.not_in_sql_if(true, column, sql)
    }

    pub fn not_in_sql_if(self, cond: bool, column: impl IntoColumn, sql: &str) -> Self {
        if !cond {
            return self;
        }
        let sql = sql.to_string();
        self.push_column(column, |column| Expr::InSql {
            column,
            sql,
            negated: true,
        })
    }

    /// `column BETWEEN from AND to`
    pub fn between(
        self,
        column: impl IntoColumn,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> Self {
        self.between_if(true, column, from, to)
    }

    pub fn between_if(
        self,
        cond: bool,
        column: impl IntoColumn,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> Self {
        if !cond {
            return self;
        }
        let (from, to) = (from.into(), to.into());
        self.push_column(column, |c| Expr::between(c, from, to, false))
    }

    /// `column NOT BETWEEN from AND to`
    pub fn not_between(
        self,
        column: impl IntoColumn,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> Self {
        self.not_between_if(true, column, from, to)
    }

    pub fn not_between_if(
        self,
        cond: bool,
        column: impl IntoColumn,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
    ) -> Self {
        if !cond {
            return self;
        }
        let (from, to) = (from.into(), to.into());
        self.push_column(column, |c| Expr::between(c, from, to, true))
    }

    /// `left = right` between two columns.
    pub fn eq_fields(self, left: impl IntoColumn, right: impl IntoColumn) -> Self {
        self.eq_fields_if(true, left, right)
    }

    pub fn eq_fields_if(mut self, cond: bool, left: impl IntoColumn, right: impl IntoColumn) -> Self {
        if !cond {
            return self;
        }
        let columns = left
            .into_column(&self.tables)
            .and_then(|left| right.into_column(&self.tables).map(|right| (left, right)));
        match columns {
            Ok((left, right)) => self.condition.push(Expr::Columns { left, right }),
            Err(err) => self.record(err),
        }
        self
    }

    /// `column = value` for every pair.
    ///
    /// A `NULL` value becomes `IS NULL` when `null_is_null`, otherwise the
    /// pair is skipped.
    pub fn all_eq<C, V, I>(self, pairs: I, null_is_null: bool) -> Self
    where
        C: IntoColumn,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (C, V)>,
    {
        self.all_eq_by(pairs, |_, _| true, null_is_null)
    }

    /// [`all_eq`](Self::all_eq) keeping only pairs accepted by `keep`.
    pub fn all_eq_by<C, V, I>(
        mut self,
        pairs: I,
        keep: impl Fn(&str, &SqlValue) -> bool,
        null_is_null: bool,
    ) -> Self
    where
        C: IntoColumn,
        V: Into<SqlValue>,
        I: IntoIterator<Item = (C, V)>,
    {
        for (column, value) in pairs {
            let column = match column.into_column(&self.tables) {
                Ok(column) => column,
                Err(err) => {
                    self.record(err);
                    continue;
                }
            };
            let value = value.into();
            if !keep(&column, &value) {
                continue;
            }
            if value.is_null() {
                if null_is_null {
                    self.condition.push(Expr::NullCheck {
                        column,
                        is_null: true,
                    });
                }
            } else {
                self.condition.push(Expr::compare(column, "=", value));
            }
        }
        self
    }

    /// Raw predicate appended as-is.
    pub fn apply(self, sql: &str) -> Self {
        self.apply_if(true, sql)
    }

    pub fn apply_if(mut self, cond: bool, sql: &str) -> Self {
        if cond {
            self.condition.push(Expr::Raw(sql.to_string()));
        }
        self
    }

    /// Join the next predicate with `OR`.
    pub fn or(mut self) -> Self {
        self.condition.or();
        self
    }

    /// `AND (..)` built by `f` on a fresh [`instance`](Self::instance).
    pub fn and_with(mut self, f: impl FnOnce(Self) -> Self) -> Self {
        let nested = f(self.instance());
        if let Some(err) = nested.build_error {
            self.record(err);
        }
        self.condition.push(Expr::Group(nested.condition));
        self
    }

    /// `OR (..)` built by `f` on a fresh [`instance`](Self::instance).
    pub fn or_with(self, f: impl FnOnce(Self) -> Self) -> Self {
        self.or().and_with(f)
    }

    /// `GROUP BY column`, accumulating across calls.
    pub fn group_by(self, column: impl IntoColumn) -> Self {
        self.group_by_if(true, column)
    }

    pub fn group_by_if(mut self, cond: bool, column: impl IntoColumn) -> Self {
        if !cond {
            return self;
        }
        match column.into_column(&self.tables) {
            Ok(column) => self.group_by.push(column),
            Err(err) => self.record(err),
        }
        self
    }

    /// `ORDER BY column ASC`
    pub fn order_by_asc(self, column: impl IntoColumn) -> Self {
        self.order_by_if(true, column, "ASC")
    }

    pub fn order_by_asc_if(self, cond: bool, column: impl IntoColumn) -> Self {
        self.order_by_if(cond, column, "ASC")
    }

    /// `ORDER BY column DESC`
    pub fn order_by_desc(self, column: impl IntoColumn) -> Self {
        self.order_by_if(true, column, "DESC")
    }

    pub fn order_by_desc_if(self, cond: bool, column: impl IntoColumn) -> Self {
        self.order_by_if(cond, column, "DESC")
    }

    fn order_by_if(mut self, cond: bool, column: impl IntoColumn, direction: &str) -> Self {
        if !cond {
            return self;
        }
        match column.into_column(&self.tables) {
            Ok(column) => self.order_by.push(format!("{column} {direction}")),
            Err(err) => self.record(err),
        }
        self
    }

    /// Raw SQL appended after everything else (e.g. `LIMIT 5`).
    pub fn last(mut self, sql: &str) -> Self {
        self.last = Some(sql.to_string());
        self
    }
}
