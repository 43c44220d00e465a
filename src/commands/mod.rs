pub mod apply;
pub mod diff;
pub mod write;

pub use apply::cmd_apply;
pub use diff::{DiffFormat, cmd_diff};
pub use write::cmd_write;

use anyhow::Result;
use sqlx::PgPool;
use tracing::warn;

use crate::config::{Config, FailureMode};
use crate::db::connect_to_database;
use crate::patch::{LogAndContinue, PatchError, SchemaPatch};

/// Installs the configured introspection failure handler.
fn with_failure_mode(patch: SchemaPatch, mode: FailureMode) -> SchemaPatch {
    match mode {
        FailureMode::Fail => patch,
        FailureMode::Warn => patch.with_failure_handler(LogAndContinue),
    }
}

/// Connects and runs the batched introspection for every configured object.
///
/// The returned result is the validation outcome; infrastructure failures are
/// returned as the outer error.
async fn introspect(
    config: &Config,
    pool: &PgPool,
    patch: &mut SchemaPatch,
) -> Result<Result<(), PatchError>> {
    let objects = config.objects.schema_objects()?;
    if objects.is_empty() {
        warn!("No objects configured, nothing to compare");
    }

    let mut conn = pool.acquire().await?;
    match patch
        .apply(&mut *conn, config.patch.auto_create, &objects)
        .await
    {
        Err(e) if !e.is_rejection() => Err(e.into()),
        outcome => Ok(outcome),
    }
}

async fn connect(config: &Config) -> Result<PgPool> {
    connect_to_database(&config.database.url, config.database.connect_timeout).await
}
