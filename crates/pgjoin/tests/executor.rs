use async_trait::async_trait;
use pgjoin::{
    BuildError, DescriptorRegistry, Entity, JoinConfig, JoinError, JoinExecutor, JoinResult,
    PageRequest, ParamList, QueryJoin, RowMap, SqlValue,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

#[derive(Entity, Debug, Deserialize, PartialEq)]
#[join(table = "account")]
struct Account {
    id: i64,
    name: String,
}

/// Serves fixed rows and records every statement it sees.
#[derive(Clone, Default)]
struct MemoryExecutor {
    rows: Vec<RowMap>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl MemoryExecutor {
    fn with_accounts(n: i64) -> Self {
        let rows = (1..=n)
            .map(|id| {
                let mut row = RowMap::new();
                row.insert("id".to_string(), SqlValue::Int(id));
                row.insert("name".to_string(), SqlValue::from(format!("acct-{id}")));
                row
            })
            .collect();
        Self {
            rows,
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl JoinExecutor for MemoryExecutor {
    async fn query_rows(&self, sql: &str, _params: &ParamList) -> JoinResult<Vec<RowMap>> {
        self.seen.lock().unwrap().push(sql.to_string());

        if sql.starts_with("SELECT COUNT(1)") {
            let mut row = RowMap::new();
            row.insert("count".to_string(), SqlValue::Int(self.rows.len() as i64));
            return Ok(vec![row]);
        }

        let Some((_, tail)) = sql.rsplit_once(" LIMIT ") else {
            return Ok(self.rows.clone());
        };
        let mut parts = tail.split(" OFFSET ");
        let limit: usize = parts.next().unwrap().trim().parse().unwrap();
        let offset: usize = parts.next().map(|o| o.trim().parse().unwrap()).unwrap_or(0);
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }
}

fn query(executor: Option<MemoryExecutor>) -> QueryJoin<Account> {
    let mut config = JoinConfig::new(DescriptorRegistry::new().with::<Account>());
    if let Some(executor) = executor {
        config = config.executor(executor);
    }
    QueryJoin::<Account>::create(config).unwrap()
}

#[tokio::test]
async fn execution_without_executor_fails() {
    let q = query(None);
    assert!(matches!(q.count().await, Err(JoinError::ExecutorNotConfigured)));
    assert!(matches!(
        q.list_maps().await,
        Err(JoinError::ExecutorNotConfigured)
    ));
}

#[tokio::test]
async fn execution_checks_executor_before_rendering() {
    let q = query(None).select_none_tables();
    assert!(matches!(q.count().await, Err(JoinError::ExecutorNotConfigured)));

    let q = query(Some(MemoryExecutor::default())).select_none_tables();
    let err = q.list_maps().await.unwrap_err();
    assert!(err.as_build().is_some());
}

#[tokio::test]
async fn count_and_list() {
    let executor = MemoryExecutor::with_accounts(3);
    let q = query(Some(executor.clone())).gt(Account::ID, 0_i64);

    assert_eq!(q.count().await.unwrap(), 3);
    let accounts: Vec<Account> = q.list_as().await.unwrap();
    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[2].name, "acct-3");

    assert_eq!(
        executor.seen(),
        [
            "SELECT COUNT(1) FROM account AS account WHERE account.id > $1",
            "SELECT account.id AS id,account.name AS name FROM account AS account WHERE account.id > $1",
        ]
    );
}

#[tokio::test]
async fn one_row_strict_and_lenient() {
    let executor = MemoryExecutor::with_accounts(2);
    let q = query(Some(executor.clone()));

    let first: Option<Account> = q.one_as(false).await.unwrap();
    assert_eq!(
        first,
        Some(Account {
            id: 1,
            name: "acct-1".to_string()
        })
    );
    assert!(executor.seen()[0].ends_with(" LIMIT 1"));

    assert!(matches!(
        q.one_map(true).await,
        Err(JoinError::TooManyRows(2))
    ));

    let empty = query(Some(MemoryExecutor::default()));
    assert_eq!(empty.one_map(true).await.unwrap(), None);
    assert!(empty.fetch_one_as::<Account>().await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn paging_uses_requested_or_default_page() {
    let executor = MemoryExecutor::with_accounts(5);
    let q = query(Some(executor.clone())).page(PageRequest::new(2, 2));

    let page = q.page_as::<Account>().await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.pages(), 3);
    assert_eq!(
        page.records.iter().map(|a| a.id).collect::<Vec<_>>(),
        [3, 4]
    );
    assert!(executor.seen()[1].ends_with(" LIMIT 2 OFFSET 2"));

    let page = query(Some(executor.clone())).page_maps().await.unwrap();
    assert_eq!(page.size, 10);
    assert_eq!(page.records.len(), 5);

    let page = query(Some(executor))
        .page(PageRequest::new(9, 2))
        .page_maps()
        .await
        .unwrap();
    assert!(page.records.is_empty());
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn sorted_query_counts_without_order_and_pages_with_it() {
    let executor = MemoryExecutor::with_accounts(5);
    let q = query(Some(executor.clone()))
        .order_by_asc(Account::ID)
        .page(PageRequest::new(1, 2));

    assert_eq!(q.count().await.unwrap(), 5);
    let page = q.page_as::<Account>().await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(
        page.records.iter().map(|a| a.id).collect::<Vec<_>>(),
        [1, 2]
    );

    let seen = executor.seen();
    assert_eq!(seen[0], "SELECT COUNT(1) FROM account AS account");
    assert_eq!(seen[1], "SELECT COUNT(1) FROM account AS account");
    assert!(seen[2].ends_with(" ORDER BY account.id ASC LIMIT 2 OFFSET 0"));
}

#[tokio::test]
async fn one_row_limit_conflicts_with_raw_limit() {
    let executor = MemoryExecutor::with_accounts(3);
    let q = query(Some(executor.clone())).last("LIMIT 2");

    let err = q.one_map(false).await.unwrap_err();
    assert_eq!(
        err.as_build(),
        Some(&BuildError::ConflictingLimit("LIMIT 2".to_string()))
    );
    assert!(executor.seen().is_empty());

    assert!(matches!(q.page_maps().await, Err(JoinError::Build(_))));
    assert!(executor.seen().is_empty());
}
