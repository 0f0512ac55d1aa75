//! Executors backed by `tokio-postgres`.

use super::JoinExecutor;
use super::row::{RowMap, decode_row};
use crate::error::{JoinError, JoinResult};
use crate::param::ParamList;
use async_trait::async_trait;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients and transactions.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = JoinResult<Vec<Row>>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoinResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(JoinError::from)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoinResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(JoinError::from)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoinResult<Vec<Row>> {
        // Delegate to the deref target (tokio_postgres::Client).
        GenericClient::query(&***self, sql, params).await
    }
}

async fn run<C: GenericClient + ?Sized>(
    client: &C,
    sql: &str,
    params: &ParamList,
) -> JoinResult<Vec<RowMap>> {
    let rows = client.query(sql, &params.as_refs()).await?;
    tracing::debug!(target: "pgjoin.sql", sql = %sql, rows = rows.len(), "executed");
    rows.iter().map(decode_row).collect()
}

/// Runs statements on one client or transaction.
#[derive(Debug)]
pub struct ClientExecutor<C> {
    client: C,
}

impl<C: GenericClient> ClientExecutor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

#[async_trait]
impl<C: GenericClient> JoinExecutor for ClientExecutor<C> {
    async fn query_rows(&self, sql: &str, params: &ParamList) -> JoinResult<Vec<RowMap>> {
        run(&self.client, sql, params).await
    }
}

/// Runs every statement on a connection checked out of a pool.
#[cfg(feature = "pool")]
#[derive(Clone)]
pub struct PoolExecutor {
    pool: deadpool_postgres::Pool,
}

#[cfg(feature = "pool")]
impl PoolExecutor {
    pub fn new(pool: deadpool_postgres::Pool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "pool")]
#[async_trait]
impl JoinExecutor for PoolExecutor {
    async fn query_rows(&self, sql: &str, params: &ParamList) -> JoinResult<Vec<RowMap>> {
        let client = self.pool.get().await?;
        run(&client, sql, params).await
    }
}
