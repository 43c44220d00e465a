use crate::helpers::harness::with_test_db;
use pgpatch::db::command::run_sql;
use pgpatch::db::{CommandBuilder, DbParam, DbType, LiveDdlRunner};
use pgpatch::patch::{DdlRules, DdlRunner, DdlRunnerExt};
use pgpatch::QualifiedName;
use sqlx::Row;

#[tokio::test]
async fn test_fetch_list_binds_typed_parameters() {
    with_test_db(async |db| {
        let mut builder = CommandBuilder::new();
        builder
            .append_with_parameters(
                "SELECT ? AS label, ? AS n, ? IS NULL AS missing",
                vec![
                    DbParam::varchar("o'neil"),
                    DbParam::BigInt(42),
                    DbParam::Null(DbType::Uuid),
                ],
            )
            .unwrap();
        let command = builder.build();

        let mut conn = db.conn().await;
        let rows = command
            .fetch_list(&mut conn, |row| {
                Ok((
                    row.try_get::<String, _>("label")?,
                    row.try_get::<i64, _>("n")?,
                    row.try_get::<bool, _>("missing")?,
                ))
            })
            .await
            .unwrap();

        assert_eq!(rows, vec![("o'neil".to_string(), 42, true)]);
    })
    .await;
}

#[tokio::test]
async fn test_fetch_scalars_with_named_parameter() {
    with_test_db(async |db| {
        db.execute("CREATE SCHEMA app; CREATE TABLE app.a (id int); CREATE TABLE app.b (id int);")
            .await;

        let mut builder = CommandBuilder::new();
        builder.with("schema", DbParam::varchar("app"));
        builder
            .append("SELECT tablename::text FROM pg_tables WHERE schemaname = ")
            .append_named("schema")
            .unwrap()
            .append(" ORDER BY tablename");

        let mut conn = db.conn().await;
        let names = builder.build().fetch_scalars::<String>(&mut conn).await.unwrap();
        assert_eq!(names, vec![Some("a".to_string()), Some("b".to_string())]);
    })
    .await;
}

#[tokio::test]
async fn test_run_sql_joins_statements() {
    with_test_db(async |db| {
        let mut conn = db.conn().await;
        run_sql(
            &mut conn,
            &["CREATE TABLE t (id int)", "INSERT INTO t VALUES (1), (2)"],
        )
        .await
        .unwrap();

        assert!(db.scalar_exists("SELECT count(*) = 2 FROM t").await);
    })
    .await;
}

#[tokio::test]
async fn test_live_runner_reports_failing_statement() {
    with_test_db(async |db| {
        let subject = QualifiedName::new("public", "ghost");
        let mut runner = LiveDdlRunner::new(db.pool().clone(), &DdlRules::default()).transactional(false);

        runner.drop_table(&subject, &subject).await.unwrap();
        let err = runner
            .apply(&subject, "ALTER TABLE public.ghost ADD COLUMN x int;")
            .await
            .unwrap_err();

        let report = err.to_string();
        assert!(report.starts_with("DDL for public.ghost failed [42P01]"));
        assert!(report.contains("ALTER TABLE public.ghost"));
        assert_eq!(runner.executed(), 1);
    })
    .await;
}
