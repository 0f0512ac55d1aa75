//! Rendered statements.

use crate::error::{BuildError, BuildResult};
use crate::param::{ParamList, inline_params};
use serde::{Deserialize, Serialize};

/// A rendered join query: clause texts plus bound parameters.
///
/// The texts use `$n` placeholders; [`full_sql`](Self::full_sql) inlines the
/// parameters for logging only. Empty clauses are empty strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Select list, without `DISTINCT`.
    pub select: String,
    pub from: String,
    /// `WHERE ..`
    pub filter: String,
    /// `GROUP BY ..`
    pub group_by: String,
    /// `ORDER BY ..`
    pub order_by: String,
    /// Raw tail rendered after everything else.
    pub last: Option<String>,
    pub params: ParamList,
    pub distinct: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn push_part(sql: &mut String, part: &str) {
    if !part.is_empty() {
        sql.push(' ');
        sql.push_str(part);
    }
}

/// Whether a raw fragment already limits the row count.
fn limits_rows(fragment: &str) -> bool {
    fragment.split_whitespace().any(|word| {
        ["LIMIT", "OFFSET", "FETCH"]
            .iter()
            .any(|kw| word.eq_ignore_ascii_case(kw))
    })
}

impl Statement {
    fn unordered_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.select);
        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        push_part(&mut sql, &self.filter);
        push_part(&mut sql, &self.group_by);
        sql
    }

    /// `SELECT [DISTINCT ]select FROM from [WHERE] [GROUP BY] [ORDER BY]
    /// [LIMIT] [OFFSET] [last]`
    pub fn sql(&self) -> String {
        let mut sql = self.unordered_sql();
        push_part(&mut sql, &self.order_by);
        if let Some(limit) = self.limit {
            push_part(&mut sql, &format!("LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            push_part(&mut sql, &format!("OFFSET {offset}"));
        }
        if let Some(last) = &self.last {
            push_part(&mut sql, last);
        }
        sql
    }

    /// Row count of [`sql`](Self::sql) before ordering and limits.
    ///
    /// Distinct or grouped queries are counted through a derived table.
    pub fn count_sql(&self) -> String {
        if self.distinct || !self.group_by.is_empty() {
            return format!("SELECT COUNT(1) FROM ({}) AS t", self.unordered_sql());
        }
        let mut sql = format!("SELECT COUNT(1) FROM {}", self.from);
        push_part(&mut sql, &self.filter);
        sql
    }

    /// This statement restricted to `limit` rows from `offset`.
    ///
    /// Fails when the `last` fragment already limits rows.
    pub fn limited(&self, limit: u64, offset: Option<u64>) -> BuildResult<Statement> {
        if let Some(last) = self.last.as_deref().filter(|l| limits_rows(l)) {
            return Err(BuildError::ConflictingLimit(last.to_string()));
        }
        Ok(Statement {
            limit: Some(limit),
            offset,
            ..self.clone()
        })
    }

    /// [`sql`](Self::sql) restricted to one page.
    pub fn paged_sql(&self, page: &PageRequest) -> BuildResult<String> {
        Ok(self.limited(page.size, Some(page.offset()))?.sql())
    }

    /// [`sql`](Self::sql) with every parameter inlined as an escaped literal.
    pub fn full_sql(&self) -> String {
        inline_params(&self.sql(), &self.params)
    }
}

/// Which page to fetch; `current` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub current: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(current: u64, size: u64) -> Self {
        Self { current, size }
    }

    pub fn offset(&self) -> u64 {
        self.current.saturating_sub(1).saturating_mul(self.size)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub current: u64,
    pub size: u64,
    pub total: u64,
    pub records: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty(page: &PageRequest, total: u64) -> Self {
        Self {
            current: page.current,
            size: page.size,
            total,
            records: Vec::new(),
        }
    }

    /// Number of pages for `total` rows.
    pub fn pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            current: self.current,
            size: self.size,
            total: self.total,
            records: self.records.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement() -> Statement {
        let mut params = ParamList::new();
        params.push(1_i64);
        Statement {
            select: "user.id AS id".to_string(),
            from: "user AS user".to_string(),
            filter: "WHERE user.id = $1".to_string(),
            group_by: String::new(),
            order_by: String::new(),
            last: None,
            params,
            distinct: false,
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn sql_and_count() {
        let stmt = statement();
        assert_eq!(
            stmt.sql(),
            "SELECT user.id AS id FROM user AS user WHERE user.id = $1"
        );
        assert_eq!(
            stmt.count_sql(),
            "SELECT COUNT(1) FROM user AS user WHERE user.id = $1"
        );
        assert_eq!(
            stmt.full_sql(),
            "SELECT user.id AS id FROM user AS user WHERE user.id = 1"
        );
    }

    #[test]
    fn count_leaves_out_order_and_last() {
        let stmt = Statement {
            order_by: "ORDER BY user.name ASC".to_string(),
            last: Some("FOR SHARE".to_string()),
            ..statement()
        };
        assert_eq!(
            stmt.sql(),
            "SELECT user.id AS id FROM user AS user WHERE user.id = $1 ORDER BY user.name ASC FOR SHARE"
        );
        assert_eq!(
            stmt.count_sql(),
            "SELECT COUNT(1) FROM user AS user WHERE user.id = $1"
        );
    }

    #[test]
    fn distinct_count_uses_derived_table() {
        let stmt = Statement {
            distinct: true,
            filter: String::new(),
            order_by: "ORDER BY user.id DESC".to_string(),
            params: ParamList::new(),
            ..statement()
        };
        assert_eq!(
            stmt.sql(),
            "SELECT DISTINCT user.id AS id FROM user AS user ORDER BY user.id DESC"
        );
        assert_eq!(
            stmt.count_sql(),
            "SELECT COUNT(1) FROM (SELECT DISTINCT user.id AS id FROM user AS user) AS t"
        );
    }

    #[test]
    fn grouped_count_uses_derived_table() {
        let stmt = Statement {
            group_by: "GROUP BY user.id".to_string(),
            order_by: "ORDER BY user.id".to_string(),
            ..statement()
        };
        assert_eq!(
            stmt.count_sql(),
            "SELECT COUNT(1) FROM (SELECT user.id AS id FROM user AS user WHERE user.id = $1 GROUP BY user.id) AS t"
        );
    }

    #[test]
    fn paging() {
        let page = PageRequest::new(3, 20);
        assert_eq!(page.offset(), 40);
        assert!(
            statement()
                .paged_sql(&page)
                .unwrap()
                .ends_with(" LIMIT 20 OFFSET 40")
        );
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
        assert_eq!(PageRequest::new(u64::MAX, u64::MAX).offset(), u64::MAX);

        let page: Page<()> = Page::empty(&PageRequest::new(1, 10), 21);
        assert_eq!(page.pages(), 3);
    }

    #[test]
    fn limit_goes_before_last() {
        let stmt = Statement {
            order_by: "ORDER BY user.id".to_string(),
            last: Some("FOR UPDATE".to_string()),
            ..statement()
        };
        assert_eq!(
            stmt.paged_sql(&PageRequest::new(2, 10)).unwrap(),
            "SELECT user.id AS id FROM user AS user WHERE user.id = $1 ORDER BY user.id \
             LIMIT 10 OFFSET 10 FOR UPDATE"
        );
        assert_eq!(
            stmt.limited(1, None).unwrap().sql(),
            "SELECT user.id AS id FROM user AS user WHERE user.id = $1 ORDER BY user.id LIMIT 1 FOR UPDATE"
        );
    }

    #[test]
    fn limit_in_last_conflicts_with_paging() {
        let stmt = Statement {
            last: Some("limit 5".to_string()),
            ..statement()
        };
        assert_eq!(
            stmt.paged_sql(&PageRequest::new(1, 10)),
            Err(BuildError::ConflictingLimit("limit 5".to_string()))
        );
        assert!(stmt.limited(1, None).is_err());
        assert!(stmt.sql().ends_with(" limit 5"));
    }
}
