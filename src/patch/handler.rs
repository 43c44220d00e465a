//! What happens when the batched introspection round trip fails.

use tracing::warn;

use crate::db::command::Command;

/// Strategy invoked with the failed command and its error. Returning `Err`
/// aborts the patch; returning `Ok` lets it continue to validation with
/// whatever deltas were read before the failure.
pub trait IntrospectionFailureHandler: Send + Sync {
    fn handle(&self, command: &Command, error: sqlx::Error) -> Result<(), sqlx::Error>;
}

/// Re-raises the original error unmodified.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rethrow;

impl IntrospectionFailureHandler for Rethrow {
    fn handle(&self, _command: &Command, error: sqlx::Error) -> Result<(), sqlx::Error> {
        Err(error)
    }
}

/// Logs the failure and carries on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAndContinue;

impl IntrospectionFailureHandler for LogAndContinue {
    fn handle(&self, command: &Command, error: sqlx::Error) -> Result<(), sqlx::Error> {
        warn!(
            "Introspection failed ({} parameter(s) in batch): {}",
            command.parameters().len(),
            error
        );
        Ok(())
    }
}

impl<F> IntrospectionFailureHandler for F
where
    F: Fn(&Command, sqlx::Error) -> Result<(), sqlx::Error> + Send + Sync,
{
    fn handle(&self, command: &Command, error: sqlx::Error) -> Result<(), sqlx::Error> {
        self(command, error)
    }
}
