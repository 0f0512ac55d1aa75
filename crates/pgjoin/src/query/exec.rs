//! Execution conveniences; they need an executor on the config.

use super::QueryJoin;
use crate::entity::Entity;
use crate::error::{JoinError, JoinResult};
use crate::exec::{JoinExecutor, RowMap, from_row_map};
use crate::statement::{Page, PageRequest};
use serde::de::DeserializeOwned;
use std::sync::Arc;

impl<M: Entity> QueryJoin<M> {
    fn executor(&self) -> JoinResult<Arc<dyn JoinExecutor>> {
        self.config
            .executor_ref()
            .cloned()
            .ok_or(JoinError::ExecutorNotConfigured)
    }

    /// Page to fetch: the one set with [`page`](Self::page), else the first;
    /// size 0 falls back to the configured default.
    fn effective_page(&self) -> PageRequest {
        let default_size = self.config.settings.default_page_size;
        let mut page = self.page.unwrap_or(PageRequest::new(1, default_size));
        if page.size == 0 {
            page.size = default_size;
        }
        if page.current == 0 {
            page.current = 1;
        }
        page
    }

    /// Number of matching rows.
    pub async fn count(&self) -> JoinResult<u64> {
        let executor = self.executor()?;
        let stmt = self.statement()?;
        executor.count(&stmt).await
    }

    /// At most one row.
    ///
    /// With `strict` more than one row is [`JoinError::TooManyRows`];
    /// otherwise the statement is limited to its first row, which fails
    /// with [`BuildError::ConflictingLimit`](crate::BuildError::ConflictingLimit)
    /// when `last` already limits rows.
    pub async fn one_map(&self, strict: bool) -> JoinResult<Option<RowMap>> {
        let executor = self.executor()?;
        let mut stmt = self.statement()?;
        if !strict {
            stmt = stmt.limited(1, None)?;
        }
        executor.one_row(&stmt).await
    }

    /// Every matching row.
    pub async fn list_maps(&self) -> JoinResult<Vec<RowMap>> {
        let executor = self.executor()?;
        let stmt = self.statement()?;
        executor.list_rows(&stmt).await
    }

    /// One page of rows plus the total count.
    pub async fn page_maps(&self) -> JoinResult<Page<RowMap>> {
        let executor = self.executor()?;
        let stmt = self.statement()?;
        executor.page_rows(&self.effective_page(), &stmt).await
    }

    /// [`one_map`](Self::one_map) mapped onto `T` by output alias.
    pub async fn one_as<T: DeserializeOwned>(&self, strict: bool) -> JoinResult<Option<T>> {
        self.one_map(strict).await?.map(from_row_map).transpose()
    }

    /// [`list_maps`](Self::list_maps) mapped onto `T` by output alias.
    pub async fn list_as<T: DeserializeOwned>(&self) -> JoinResult<Vec<T>> {
        self.list_maps()
            .await?
            .into_iter()
            .map(from_row_map)
            .collect()
    }

    /// [`page_maps`](Self::page_maps) mapped onto `T` by output alias.
    pub async fn page_as<T: DeserializeOwned>(&self) -> JoinResult<Page<T>> {
        self.page_maps().await?.try_map(from_row_map)
    }

    /// Like [`one_as`](Self::one_as) but a missing row is [`JoinError::NotFound`].
    pub async fn fetch_one_as<T: DeserializeOwned>(&self) -> JoinResult<T> {
        self.one_as(false)
            .await?
            .ok_or_else(|| JoinError::not_found(std::any::type_name::<T>()))
    }
}
