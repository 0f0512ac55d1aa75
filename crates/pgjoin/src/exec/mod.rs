//! Statement execution.
//!
//! The query builder never talks to the database itself. A [`JoinExecutor`]
//! configured on [`JoinConfig`](crate::JoinConfig) runs finished statements
//! and returns rows as [`RowMap`]s, keyed by output alias.

mod client;
mod row;

pub use client::{ClientExecutor, GenericClient};
#[cfg(feature = "pool")]
pub use client::PoolExecutor;
pub use row::{RowMap, decode_row, from_row_map};

use crate::error::{JoinError, JoinResult};
use crate::param::ParamList;
use crate::statement::{Page, PageRequest, Statement};
use crate::value::SqlValue;
use async_trait::async_trait;

/// Runs rendered statements.
///
/// Only [`query_rows`](Self::query_rows) is required; the statement-level
/// operations are expressed through it.
#[async_trait]
pub trait JoinExecutor: Send + Sync {
    /// Run `sql` with `params` and return every row.
    async fn query_rows(&self, sql: &str, params: &ParamList) -> JoinResult<Vec<RowMap>>;

    /// Number of rows the statement matches.
    async fn count(&self, stmt: &Statement) -> JoinResult<u64> {
        let rows = self.query_rows(&stmt.count_sql(), &stmt.params).await?;
        let value = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_values().next())
            .ok_or_else(|| JoinError::not_found("count returned no rows"))?;
        match value {
            SqlValue::Int(n) => Ok(u64::try_from(n).unwrap_or(0)),
            other => Err(JoinError::decode(
                "count",
                format!("expected an integer, got {other:?}"),
            )),
        }
    }

    /// Every row of the statement.
    async fn list_rows(&self, stmt: &Statement) -> JoinResult<Vec<RowMap>> {
        self.query_rows(&stmt.sql(), &stmt.params).await
    }

    /// At most one row; more than one is an error.
    async fn one_row(&self, stmt: &Statement) -> JoinResult<Option<RowMap>> {
        let mut rows = self.list_rows(stmt).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(JoinError::TooManyRows(n)),
        }
    }

    /// One page of rows plus the total count.
    async fn page_rows(&self, page: &PageRequest, stmt: &Statement) -> JoinResult<Page<RowMap>> {
        let paged = stmt.paged_sql(page)?;
        let total = self.count(stmt).await?;
        if total == 0 || page.offset() >= total {
            return Ok(Page::empty(page, total));
        }
        let records = self.query_rows(&paged, &stmt.params).await?;
        Ok(Page {
            current: page.current,
            size: page.size,
            total,
            records,
        })
    }
}
