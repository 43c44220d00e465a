//! pgpatch write - write the update script and its rollback companion

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::patch::{AutoCreate, SchemaPatch, drop_file_name};

pub async fn cmd_write(config: &Config, file: &Path, no_transaction: bool) -> Result<()> {
    let mut patch = super::with_failure_mode(
        SchemaPatch::new(config.rules.clone()),
        config.patch.on_introspection_failure,
    );

    if config.patch.auto_create != AutoCreate::None {
        let pool = super::connect(config).await?;
        let outcome = super::introspect(config, &pool, &mut patch).await?;
        pool.close().await;
        outcome?;
    }

    patch.write_deltas().await?;
    write_scripts(&patch, file, config.patch.transactional && !no_transaction)
}

/// Writes `file` and its `.drop` rollback next to it.
pub fn write_scripts(patch: &SchemaPatch, file: &Path, transactional: bool) -> Result<()> {
    patch.write_update_file(file, transactional)?;
    let rollback = drop_file_name(file);
    patch.write_rollback_file(&rollback, transactional)?;

    eprintln!("Wrote {}", file.display());
    eprintln!("Wrote {}", rollback.display());
    Ok(())
}
