//! Batched apply against a scripted executor: ordering, policy gating,
//! failure handling and cancellation.

use crate::helpers::scripted::{ScriptedExecutor, StubObject};
use pgpatch::db::{Command, ResultSet};
use pgpatch::patch::{LogAndContinue, PatchError};
use pgpatch::schema::objects::{DatabaseSchema, Sequence};
use pgpatch::{AutoCreate, Difference, QualifiedName, SchemaObject, SchemaPatch};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn stub(name: &str, difference: Difference) -> Arc<dyn SchemaObject> {
    Arc::new(StubObject::new(name, difference))
}

fn logged(patch: &SchemaPatch) -> Vec<(String, Difference)> {
    patch
        .migrations()
        .iter()
        .map(|d| (d.identifier().to_string(), d.difference()))
        .collect()
}

#[tokio::test]
async fn test_policy_none_makes_no_calls() {
    let mut executor = ScriptedExecutor::new().empty_set();
    let mut patch = SchemaPatch::default();

    patch
        .apply(&mut executor, AutoCreate::None, &[stub("a", Difference::Invalid)])
        .await
        .unwrap();

    assert_eq!(executor.calls, 0);
    assert!(patch.migrations().is_empty());
}

#[tokio::test]
async fn test_manual_log_after_apply_updates_aggregate() {
    let mut executor = ScriptedExecutor::new().empty_set().empty_set();
    let mut patch = SchemaPatch::default();

    patch
        .apply(
            &mut executor,
            AutoCreate::CreateOnly,
            &[stub("a", Difference::Create), stub("b", Difference::Create)],
        )
        .await
        .unwrap();
    assert_eq!(patch.difference(), Difference::Create);

    patch.log(stub("x", Difference::None), Difference::Invalid);

    assert_eq!(patch.difference(), Difference::Invalid);
    let err = patch
        .assert_patching_is_valid(AutoCreate::CreateOnly)
        .unwrap_err();
    assert!(matches!(err, PatchError::InvalidDifference { ref objects } if objects == "x"));
    assert_eq!(patch.migrations().len(), 3);
}

#[tokio::test]
async fn test_empty_object_list_is_noop() {
    let mut executor = ScriptedExecutor::new();
    let mut patch = SchemaPatch::default();

    patch.apply(&mut executor, AutoCreate::All, &[]).await.unwrap();

    assert_eq!(executor.calls, 0);
    assert_eq!(patch.difference(), Difference::None);
}

#[tokio::test]
async fn test_one_round_trip_for_all_objects_in_input_order() {
    let mut executor = ScriptedExecutor::new().empty_set().empty_set().empty_set();
    let mut patch = SchemaPatch::default();
    let objects = [
        stub("c", Difference::Create),
        stub("a", Difference::None),
        stub("b", Difference::Create),
    ];

    patch
        .apply(&mut executor, AutoCreate::CreateOnly, &objects)
        .await
        .unwrap();

    assert_eq!(executor.calls, 1);
    assert_eq!(
        executor.sent[0],
        "select 'c'::text;\nselect 'a'::text;\nselect 'b'::text;\n"
    );
    assert_eq!(
        logged(&patch),
        vec![
            ("c".to_string(), Difference::Create),
            ("a".to_string(), Difference::None),
            ("b".to_string(), Difference::Create),
        ]
    );
}

#[tokio::test]
async fn test_create_and_update_under_all() {
    let sequence = Sequence::new(QualifiedName::new("app", "b")).incrementing_by(2);
    let mut executor = ScriptedExecutor::new()
        .empty_set()
        .result_set(ResultSet::from_rows(
            &["relkind", "increment"],
            vec![vec![Some("S"), Some("1")]],
        ));
    let mut patch = SchemaPatch::default();
    let objects: [Arc<dyn SchemaObject>; 2] =
        [Arc::new(DatabaseSchema::new("a")), Arc::new(sequence)];

    patch
        .apply(&mut executor, AutoCreate::All, &objects)
        .await
        .unwrap();

    assert_eq!(
        logged(&patch),
        vec![
            ("a".to_string(), Difference::Create),
            ("app.b".to_string(), Difference::Update),
        ]
    );
    assert_eq!(patch.difference(), Difference::Update);
    assert!(patch.assert_patching_is_valid(AutoCreate::All).is_ok());
}

#[tokio::test]
async fn test_update_rejected_in_create_only_keeps_log() {
    let mut executor = ScriptedExecutor::new().empty_set();
    let mut patch = SchemaPatch::default();

    let err = patch
        .apply(&mut executor, AutoCreate::CreateOnly, &[stub("A", Difference::Update)])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Cannot apply updates in CreateOnly mode to existing items A"
    );
    assert_eq!(patch.migrations().len(), 1);
}

#[tokio::test]
async fn test_log_grows_across_applies() {
    let mut patch = SchemaPatch::default();

    let mut first = ScriptedExecutor::new().empty_set();
    patch
        .apply_one(&mut first, AutoCreate::All, stub("a", Difference::Create))
        .await
        .unwrap();
    let mut second = ScriptedExecutor::new().empty_set().empty_set();
    patch
        .apply(
            &mut second,
            AutoCreate::All,
            &[stub("b", Difference::None), stub("c", Difference::Update)],
        )
        .await
        .unwrap();

    assert_eq!(patch.migrations().len(), 3);
    assert_eq!(patch.difference(), Difference::Update);
}

#[tokio::test]
async fn test_introspection_error_is_rethrown_unmodified() {
    let mut executor = ScriptedExecutor::new()
        .empty_set()
        .fail(sqlx::Error::Protocol("server closed the connection".to_string()));
    let mut patch = SchemaPatch::default();

    let err = patch
        .apply(
            &mut executor,
            AutoCreate::All,
            &[stub("a", Difference::Create), stub("b", Difference::Create)],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PatchError::Introspection(sqlx::Error::Protocol(ref m)) if m == "server closed the connection"
    ));
    assert!(!err.is_rejection());
    // The first result set was read before the failure.
    assert_eq!(logged(&patch), vec![("a".to_string(), Difference::Create)]);
}

#[tokio::test]
async fn test_short_response_is_an_introspection_failure() {
    let mut executor = ScriptedExecutor::new().empty_set();
    let mut patch = SchemaPatch::default();

    let err = patch
        .apply(
            &mut executor,
            AutoCreate::All,
            &[stub("a", Difference::None), stub("b", Difference::None)],
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("ended after 1 result set(s)"));
}

#[tokio::test]
async fn test_handled_failure_still_validates() {
    let mut executor = ScriptedExecutor::new()
        .empty_set()
        .fail(sqlx::Error::PoolTimedOut);
    let mut patch = SchemaPatch::default().with_failure_handler(LogAndContinue);

    let err = patch
        .apply(
            &mut executor,
            AutoCreate::CreateOnly,
            &[stub("a", Difference::Update), stub("b", Difference::Create)],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PatchError::PolicyViolation { ref objects } if objects == "a"));
}

#[tokio::test]
async fn test_custom_handler_sees_the_command() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let handler = move |command: &Command, _error: sqlx::Error| -> Result<(), sqlx::Error> {
        assert!(command.batch_sql().contains("'a'::text"));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    };

    let mut executor = ScriptedExecutor::new().fail(sqlx::Error::RowNotFound);
    let mut patch = SchemaPatch::default().with_failure_handler(handler);

    patch
        .apply(&mut executor, AutoCreate::All, &[stub("a", Difference::Create)])
        .await
        .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(patch.migrations().is_empty());
}

#[tokio::test]
async fn test_cancellation_keeps_deltas_already_read() {
    let mut executor = ScriptedExecutor::new().empty_set().hang();
    let mut patch = SchemaPatch::default();
    let objects = [
        stub("a", Difference::Create),
        stub("b", Difference::Create),
        stub("c", Difference::Create),
    ];

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        patch.apply(&mut executor, AutoCreate::All, &objects),
    )
    .await;

    assert!(outcome.is_err(), "apply should still be waiting");
    assert_eq!(logged(&patch), vec![("a".to_string(), Difference::Create)]);
}

#[tokio::test]
async fn test_write_deltas_after_apply() {
    let mut executor = ScriptedExecutor::new().empty_set().empty_set().empty_set();
    let mut patch = SchemaPatch::default();

    patch
        .apply(
            &mut executor,
            AutoCreate::All,
            &[
                stub("a", Difference::Create),
                stub("b", Difference::Update),
                stub("c", Difference::None),
            ],
        )
        .await
        .unwrap();
    patch.write_deltas().await.unwrap();

    assert_eq!(patch.update_ddl(), "create stub a;\nalter stub b;\n");
    assert_eq!(patch.rollback_ddl(), "drop stub a;\n");
}
