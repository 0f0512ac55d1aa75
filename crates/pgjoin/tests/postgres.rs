use pgjoin::{ClientExecutor, DescriptorRegistry, Entity, JoinConfig, JoinResult, QueryJoin};
use serde::Deserialize;
use tokio_postgres::NoTls;

#[derive(Entity, Debug, Deserialize)]
#[join(table = "pgjoin_it_team", alias = "team")]
struct Team {
    id: i64,
    name: String,
}

#[derive(Entity, Debug, Deserialize)]
#[join(table = "pgjoin_it_member", alias = "member")]
#[allow(dead_code)]
struct Member {
    id: i64,
    team_id: i64,
    name: String,
    #[join(soft_delete = "0")]
    deleted: i16,
}

#[derive(Debug, Deserialize)]
struct MemberView {
    member_name: String,
    name: String,
}

#[tokio::test]
async fn join_roundtrip() -> JoinResult<()> {
    let _ = dotenvy::dotenv();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping join_roundtrip");
            return Ok(());
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    client
        .batch_execute(
            "DROP TABLE IF EXISTS pgjoin_it_member, pgjoin_it_team;
             CREATE TABLE pgjoin_it_team (id BIGINT PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE pgjoin_it_member (
                 id BIGINT PRIMARY KEY,
                 team_id BIGINT NOT NULL,
                 name TEXT NOT NULL,
                 deleted SMALLINT NOT NULL DEFAULT 0
             );
             INSERT INTO pgjoin_it_team VALUES (1, 'core'), (2, 'web');
             INSERT INTO pgjoin_it_member VALUES
                 (1, 1, 'ana', 0), (2, 1, 'bo', 1), (3, 2, 'cy', 0);",
        )
        .await?;

    let config = JoinConfig::new(DescriptorRegistry::new().with::<Team>().with::<Member>())
        .soft_delete(true)
        .executor(ClientExecutor::new(client));

    let q = QueryJoin::<Team>::create(config)?
        .inner_join::<Member>()
        .on(Member::TEAM_ID, Team::ID)
        .select_none::<Team>()
        .select(Team::NAME)
        .select_as(Member::NAME, "member_name")
        .eq(Team::ID, 1_i64)
        .order_by_asc(Member::ID);

    assert_eq!(q.count().await?, 1);
    let rows: Vec<MemberView> = q.list_as().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].member_name, "ana");
    assert_eq!(rows[0].name, "core");

    let teams: Vec<Team> = QueryJoin::<Team>::create(q.config().clone())?
        .order_by_desc(Team::ID)
        .list_as()
        .await?;
    assert_eq!(teams.iter().map(|t| t.id).collect::<Vec<_>>(), [2, 1]);
    assert_eq!(teams[0].name, "web");
    Ok(())
}
