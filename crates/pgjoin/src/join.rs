//! Join kinds and the ON-clause builder.

use crate::entity::{Entity, Field, FieldRef};
use crate::error::BuildError;
use crate::expr::Expr;
use crate::query::QueryJoin;
use crate::resolve::resolve;
use std::any::TypeId;
use std::fmt;
use std::str::FromStr;

/// How a joined table is attached to the FROM clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Join,
    Inner,
    Cross,
    Left,
    Right,
    /// Comma join; the relation goes into the WHERE clause.
    Where,
}

impl JoinKind {
    /// Join keyword, or `None` for a comma join.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            JoinKind::Join => Some("JOIN"),
            JoinKind::Inner => Some("INNER JOIN"),
            JoinKind::Cross => Some("CROSS JOIN"),
            JoinKind::Left => Some("LEFT JOIN"),
            JoinKind::Right => Some("RIGHT JOIN"),
            JoinKind::Where => None,
        }
    }

    /// FROM text that attaches `table AS alias` with this kind.
    pub(crate) fn from_fragment(self, table_fragment: &str) -> String {
        match self.keyword() {
            Some(keyword) => format!(" {keyword} {table_fragment}"),
            None => format!(", {table_fragment}"),
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword().unwrap_or(","))
    }
}

impl FromStr for JoinKind {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "join" => Ok(JoinKind::Join),
            "inner" | "inner join" => Ok(JoinKind::Inner),
            "cross" | "cross join" => Ok(JoinKind::Cross),
            "left" | "left join" => Ok(JoinKind::Left),
            "right" | "right join" => Ok(JoinKind::Right),
            "where" | "," => Ok(JoinKind::Where),
            _ => Err(BuildError::UnsupportedJoinKind(s.to_string())),
        }
    }
}

/// Relates a freshly joined table to the tables before it.
///
/// Holds the query by value and hands it back from every method, so the
/// query stays the only writer of its FROM text.
#[must_use = "call `on` or `without_on` to get the query back"]
pub struct OnClause<M> {
    query: QueryJoin<M>,
    kind: JoinKind,
    /// Entity this join registered; one ON side must belong to it.
    joined: TypeId,
    joined_name: &'static str,
    /// The join itself failed; ON is skipped.
    skip: bool,
}

impl<M: Entity> OnClause<M> {
    pub(crate) fn new<J: Entity>(query: QueryJoin<M>, kind: JoinKind, skip: bool) -> Self {
        Self {
            query,
            kind,
            joined: TypeId::of::<J>(),
            joined_name: std::any::type_name::<J>(),
            skip,
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// `ON left = right`.
    ///
    /// Each field is resolved by its own entity type, so the two sides may
    /// be given in either order. One side must belong to the table just
    /// joined; the other may reference any earlier table.
    pub fn on<L: Entity, R: Entity>(self, left: Field<L>, right: Field<R>) -> QueryJoin<M> {
        self.on_refs(Some(left.erase()), Some(right.erase()))
    }

    /// `ON` with optional sides: both `None` is a no-op, one `None` an error.
    pub fn on_refs(self, left: Option<FieldRef>, right: Option<FieldRef>) -> QueryJoin<M> {
        let OnClause {
            mut query,
            kind,
            joined,
            joined_name,
            skip,
        } = self;
        if skip {
            return query;
        }
        let (left, right) = match (left, right) {
            (None, None) => return query,
            (Some(left), Some(right)) => (left, right),
            _ => {
                query.record(BuildError::IncompleteOnClause);
                return query;
            }
        };
        if left.entity != joined && right.entity != joined {
            query.record(BuildError::DetachedOnClause {
                entity: joined_name,
            });
            return query;
        }
        if query.from_clause().is_empty() {
            query.record(BuildError::EmptyFrom);
            return query;
        }

        let resolved = resolve(query.tables(), left, None)
            .and_then(|l| resolve(query.tables(), right, None).map(|r| (l, r)));
        let (left, right) = match resolved {
            Ok(pair) => pair,
            Err(err) => {
                query.record(err);
                return query;
            }
        };

        if kind == JoinKind::Where {
            query.push_expr(Expr::Columns {
                left: left.condition_form(),
                right: right.condition_form(),
            });
        } else {
            query.append_from(&format!(
                " ON {} = {}",
                left.condition_form(),
                right.condition_form()
            ));
        }
        query
    }

    /// Leave the join without an ON clause (comma and cross joins).
    pub fn without_on(self) -> QueryJoin<M> {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(JoinKind::Left.from_fragment("role AS role"), " LEFT JOIN role AS role");
        assert_eq!(JoinKind::Join.from_fragment("role AS r"), " JOIN role AS r");
        assert_eq!(JoinKind::Where.from_fragment("role AS role"), ", role AS role");
    }

    #[test]
    fn parse_kind() {
        assert_eq!("LEFT".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("inner join".parse::<JoinKind>().unwrap(), JoinKind::Inner);
        assert_eq!(
            "full".parse::<JoinKind>().unwrap_err(),
            BuildError::UnsupportedJoinKind("full".to_string())
        );
    }
}
