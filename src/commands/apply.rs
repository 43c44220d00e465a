//! pgpatch apply - execute the accepted patch against the database

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::db::LiveDdlRunner;
use crate::patch::{AutoCreate, SchemaPatch};

pub async fn cmd_apply(config: &Config, rollback_file: Option<&Path>) -> Result<()> {
    if config.patch.auto_create == AutoCreate::None {
        eprintln!("auto_create is 'none'; nothing applied.");
        return Ok(());
    }

    let pool = super::connect(config).await?;
    let runner = LiveDdlRunner::new(pool.clone(), &config.rules).transactional(config.patch.transactional);
    let mut patch = super::with_failure_mode(
        SchemaPatch::with_live_runner(config.rules.clone(), Box::new(runner)),
        config.patch.on_introspection_failure,
    );

    let accepted = super::introspect(config, &pool, &mut patch)
        .await
        .and_then(|outcome| Ok(outcome?));
    let result = match accepted {
        Ok(()) => patch.write_deltas().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        // The runner holds a pooled connection until dropped.
        drop(patch);
        pool.close().await;
        return Err(e);
    }
    pool.close().await;

    info!("Applied patch ({})", patch.difference());
    eprintln!("Patch applied: {}", patch.difference());

    if let Some(path) = rollback_file {
        patch.write_rollback_file(path, config.patch.transactional)?;
        eprintln!("Wrote {}", path.display());
    }

    Ok(())
}
