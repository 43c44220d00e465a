use pgpatch::patch::{DdlRules, Difference, SchemaPatch, drop_file_name};
use pgpatch::schema::objects::DatabaseSchema;
use std::fs;
use std::io::Write;
use std::sync::Arc;

#[test]
fn test_write_file_contains_exact_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("update.sql");
    let rules = DdlRules::with_role("app_owner");

    rules.write_file(&path, "create schema app;", true).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        rules.render_script("create schema app;", true).unwrap()
    );
}

#[test]
fn test_write_file_replaces_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("update.sql");
    fs::write(&path, "stale content that is much longer than the new script").unwrap();

    DdlRules::default().write_file(&path, "select 1;", false).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "select 1;\n");
}

#[test]
fn test_write_file_reports_path_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("update.sql");

    let err = DdlRules::default().write_file(&path, "select 1;", true).unwrap_err();

    assert!(err.to_string().starts_with("Failed to write script to"));
    assert!(err.to_string().contains("update.sql"));
}

#[tokio::test]
async fn test_update_and_rollback_files() {
    let dir = tempfile::tempdir().unwrap();
    let update = dir.path().join("V2.sql");

    let mut patch = SchemaPatch::default();
    patch.log(Arc::new(DatabaseSchema::new("billing")), Difference::Create);
    patch.write_deltas().await.unwrap();
    patch.write_update_file(&update, true).unwrap();
    patch.write_rollback_file(&drop_file_name(&update), true).unwrap();

    let forward = fs::read_to_string(&update).unwrap();
    assert!(forward.starts_with("DO LANGUAGE plpgsql $tran$\nBEGIN\n"));
    assert!(forward.contains("CREATE SCHEMA IF NOT EXISTS \"billing\";"));

    let rollback = fs::read_to_string(dir.path().join("V2.drop.sql")).unwrap();
    assert!(rollback.contains("DROP SCHEMA IF EXISTS \"billing\" CASCADE;"));
    assert!(rollback.ends_with("END;\n$tran$;\n"));
}

#[test]
fn test_write_script_into_any_writer() {
    let patch = SchemaPatch::new(DdlRules::with_role("deployer"));
    let mut out: Vec<u8> = Vec::new();
    patch
        .write_script(&mut out, |w| w.write_all(b"select 1;\n"), false)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "SET ROLE deployer;\n\nselect 1;\nRESET ROLE;\n\n"
    );
}
