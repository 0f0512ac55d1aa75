//! Condition expressions.
//!
//! [`Expr`] is a single predicate; [`Condition`] is an ordered list of
//! predicates joined by `AND` or `OR`. `build()` numbers `$n` placeholders
//! while rendering, so one pass over the whole tree (nested groups included)
//! yields a gap-free, collision-free parameter sequence.

use crate::param::{Param, ParamList};
use crate::value::SqlValue;

/// A single predicate.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `column op $n`
    Compare {
        column: String,
        op: &'static str,
        value: Param,
    },

    /// `left = right` between two columns.
    Columns { left: String, right: String },

    /// `column IS [NOT] NULL`
    NullCheck { column: String, is_null: bool },

    /// `column [NOT] IN ($1, $2, ...)`
    InList {
        column: String,
        values: Vec<Param>,
        negated: bool,
    },

    /// `column [NOT] IN (sub-select)`
    InSql {
        column: String,
        sql: String,
        negated: bool,
    },

    /// `column [NOT] BETWEEN $n AND $m`
    Between {
        column: String,
        from: Param,
        to: Param,
        negated: bool,
    },

    /// Parenthesised nested condition.
    Group(Condition),

    /// Raw SQL fragment without parameters.
    Raw(String),

    /// Always true (used for empty NOT IN lists).
    True,

    /// Always false (used for empty IN lists).
    False,
}

impl Expr {
    pub fn compare(column: impl Into<String>, op: &'static str, value: impl Into<SqlValue>) -> Self {
        Expr::Compare {
            column: column.into(),
            op,
            value: Param::new(value),
        }
    }

    /// `column IN (values...)`.
    ///
    /// A single value collapses to `column = $n`; no values is always false.
    pub fn in_list(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        let column = column.into();
        match values.len() {
            0 => Expr::False,
            1 => {
                let mut values = values;
                Expr::compare(column, "=", values.remove(0))
            }
            _ => Expr::InList {
                column,
                values: values.into_iter().map(Param::new).collect(),
                negated: false,
            },
        }
    }

    /// `column NOT IN (values...)`; no values is always true.
    pub fn not_in(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            column: column.into(),
            values: values.into_iter().map(Param::new).collect(),
            negated: true,
        }
    }

    pub fn between(
        column: impl Into<String>,
        from: impl Into<SqlValue>,
        to: impl Into<SqlValue>,
        negated: bool,
    ) -> Self {
        Expr::Between {
            column: column.into(),
            from: Param::new(from),
            to: Param::new(to),
            negated,
        }
    }

    /// Check if this expression renders to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Expr::Group(inner) => inner.is_empty(),
            Expr::Raw(sql) => sql.trim().is_empty(),
            _ => false,
        }
    }

    /// Build the SQL fragment with proper `$n` placeholders.
    pub fn build(&self, params: &mut ParamList) -> String {
        match self {
            Expr::Compare { column, op, value } => {
                let idx = params.push_param(value.clone());
                format!("{column} {op} ${idx}")
            }
            Expr::Columns { left, right } => format!("{left} = {right}"),
            Expr::NullCheck { column, is_null } => {
                if *is_null {
                    format!("{column} IS NULL")
                } else {
                    format!("{column} IS NOT NULL")
                }
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| format!("${}", params.push_param(v.clone())))
                    .collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{column} {op} ({})", placeholders.join(", "))
            }
            Expr::InSql {
                column,
                sql,
                negated,
            } => {
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{column} {op} ({sql})")
            }
            Expr::Between {
                column,
                from,
                to,
                negated,
            } => {
                let from = params.push_param(from.clone());
                let to = params.push_param(to.clone());
                let op = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                format!("{column} {op} ${from} AND ${to}")
            }
            Expr::Group(inner) => {
                let sql = inner.build(params);
                if sql.is_empty() {
                    sql
                } else {
                    format!("({sql})")
                }
            }
            Expr::Raw(sql) => sql.clone(),
            Expr::True => "1 = 1".to_string(),
            Expr::False => "1 = 0".to_string(),
        }
    }
}

/// How a predicate attaches to the one before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

/// Ordered predicates joined by `AND`, or by `OR` after a call to [`or`](Self::or).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Condition {
    items: Vec<(Connector, Expr)>,
    or_next: bool,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|(_, e)| e.is_empty())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append a predicate.
    ///
    /// An empty predicate is dropped and still consumes a pending [`or`](Self::or).
    pub fn push(&mut self, expr: Expr) {
        let connector = if std::mem::take(&mut self.or_next) {
            Connector::Or
        } else {
            Connector::And
        };
        if !expr.is_empty() {
            self.items.push((connector, expr));
        }
    }

    /// Join the next predicate with `OR` instead of `AND`.
    pub fn or(&mut self) {
        self.or_next = true;
    }

    /// Forget an [`or`](Self::or) that no predicate followed.
    pub fn drop_pending_or(&mut self) {
        self.or_next = false;
    }

    /// Whether any top-level predicate is OR-connected.
    pub fn has_or(&self) -> bool {
        self.items
            .iter()
            .skip(1)
            .any(|(c, _)| *c == Connector::Or)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.or_next = false;
    }

    /// Build the condition body (without `WHERE`).
    pub fn build(&self, params: &mut ParamList) -> String {
        let mut out = String::new();
        for (connector, expr) in &self.items {
            let sql = expr.build(params);
            if sql.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str(connector.as_sql());
            }
            out.push_str(&sql);
        }
        out
    }
}
