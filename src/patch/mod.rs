//! The patch session: batched introspection, the migration log, policy
//! validation, and script output.

pub mod difference;
pub mod error;
pub mod handler;
pub mod policy;
pub mod recorder;
pub mod script;

pub use difference::{AutoCreate, Delta, Difference};
pub use error::PatchError;
pub use handler::{IntrospectionFailureHandler, LogAndContinue, Rethrow};
pub use recorder::{DdlRecorder, DdlRunner, DdlRunnerExt};
pub use script::{DdlRules, drop_file_name};

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::db::batch::{BatchExecutor, BatchReader};
use crate::db::command::{Command, CommandBuilder};
use crate::schema::SchemaObject;

/// One patch session. Owns the migration log and the forward and rollback
/// DDL destinations; discard it once scripts are written or changes applied.
pub struct SchemaPatch {
    rules: DdlRules,
    updates: DdlRecorder,
    rollbacks: DdlRecorder,
    live_runner: Option<Box<dyn DdlRunner>>,
    failure_handler: Box<dyn IntrospectionFailureHandler>,
    migrations: Vec<Delta>,
}

impl SchemaPatch {
    pub fn new(rules: DdlRules) -> Self {
        Self::with_update_recorder(rules, DdlRecorder::new())
    }

    /// Forward statements go into `updates` instead of a fresh recorder.
    pub fn with_update_recorder(rules: DdlRules, updates: DdlRecorder) -> Self {
        Self {
            rules,
            updates,
            rollbacks: DdlRecorder::new(),
            live_runner: None,
            failure_handler: Box::new(Rethrow),
            migrations: Vec::new(),
        }
    }

    /// Forward statements execute through `runner` as they are written.
    /// Rollback statements are still recorded.
    pub fn with_live_runner(rules: DdlRules, runner: Box<dyn DdlRunner>) -> Self {
        let mut patch = Self::new(rules);
        patch.live_runner = Some(runner);
        patch
    }

    pub fn with_failure_handler(mut self, handler: impl IntrospectionFailureHandler + 'static) -> Self {
        self.failure_handler = Box::new(handler);
        self
    }

    /// Introspects every object in one round trip and logs a delta for each,
    /// then validates the whole log against `policy`.
    ///
    /// Under [`AutoCreate::None`] nothing is sent and the log is untouched.
    /// If the future is dropped mid-read, deltas already read stay logged.
    pub async fn apply<E>(
        &mut self,
        executor: &mut E,
        policy: AutoCreate,
        objects: &[Arc<dyn SchemaObject>],
    ) -> Result<(), PatchError>
    where
        E: BatchExecutor + ?Sized,
    {
        if objects.is_empty() || policy == AutoCreate::None {
            return Ok(());
        }

        let mut builder = CommandBuilder::new();
        for object in objects {
            object.configure_query(&mut builder);
            builder.end_statement();
        }
        let command = builder.build();

        info!("Introspecting {} schema object(s) in one batch", objects.len());

        if let Err(error) = self.read_deltas(executor, &command, objects).await {
            self.failure_handler.handle(&command, error)?;
        }

        self.assert_patching_is_valid(policy)
    }

    pub async fn apply_one<E>(
        &mut self,
        executor: &mut E,
        policy: AutoCreate,
        object: Arc<dyn SchemaObject>,
    ) -> Result<(), PatchError>
    where
        E: BatchExecutor + ?Sized,
    {
        self.apply(executor, policy, &[object]).await
    }

    async fn read_deltas<E>(
        &mut self,
        executor: &mut E,
        command: &Command,
        objects: &[Arc<dyn SchemaObject>],
    ) -> Result<(), sqlx::Error>
    where
        E: BatchExecutor + ?Sized,
    {
        let sql = command.batch_sql();
        let mut reader = BatchReader::new(executor.execute_batch(&sql));

        for object in objects {
            let results = reader.next_result().await?;
            let difference = object.create_delta(&results)?;
            debug!("{}: {}", object.identifier(), difference);
            self.migrations.push(Delta::new(Arc::clone(object), difference));
        }

        Ok(())
    }

    /// Appends a delta without introspection.
    pub fn log(&mut self, object: Arc<dyn SchemaObject>, difference: Difference) {
        self.migrations.push(Delta::new(object, difference));
    }

    pub fn migrations(&self) -> &[Delta] {
        &self.migrations
    }

    /// Most severe difference in the log, recomputed on every call.
    pub fn difference(&self) -> Difference {
        policy::aggregate(&self.migrations)
    }

    pub fn assert_patching_is_valid(&self, policy: AutoCreate) -> Result<(), PatchError> {
        policy::assert_patching_is_valid(&self.migrations, policy)
    }

    /// Where forward statements go: the live runner when one is configured,
    /// the update recorder otherwise.
    pub fn updates(&mut self) -> &mut dyn DdlRunner {
        match &mut self.live_runner {
            Some(runner) => runner.as_mut(),
            None => &mut self.updates,
        }
    }

    pub fn rollbacks(&mut self) -> &mut DdlRecorder {
        &mut self.rollbacks
    }

    pub fn update_ddl(&self) -> String {
        self.updates.snapshot()
    }

    pub fn rollback_ddl(&self) -> String {
        self.rollbacks.snapshot()
    }

    /// Pushes the DDL for every logged delta through the runners: creates go
    /// forward with their drops as rollback, updates go forward only. The
    /// forward runner is finished only once every statement succeeded.
    pub async fn write_deltas(&mut self) -> Result<()> {
        let updates: &mut dyn DdlRunner = match &mut self.live_runner {
            Some(runner) => runner.as_mut(),
            None => &mut self.updates,
        };

        for delta in &self.migrations {
            let object = delta.object();
            let subject = object.identifier();
            match delta.difference() {
                Difference::Create => {
                    for statement in object.create_statements() {
                        updates.apply(subject, &statement.sql).await?;
                    }
                    for statement in object.drop_statements() {
                        self.rollbacks.record(statement.sql);
                    }
                }
                Difference::Update => {
                    for statement in object.update_statements() {
                        updates.apply(subject, &statement.sql).await?;
                    }
                }
                Difference::None | Difference::Invalid => {}
            }
        }

        updates.finish().await
    }

    pub fn write_script<W, F>(&self, writer: &mut W, write_step: F, transactional: bool) -> io::Result<()>
    where
        W: Write + ?Sized,
        F: FnOnce(&mut W) -> io::Result<()>,
    {
        self.rules.write_script(writer, write_step, transactional)
    }

    pub fn write_file(&self, path: &Path, sql: &str, transactional: bool) -> Result<(), PatchError> {
        self.rules.write_file(path, sql, transactional)
    }

    pub fn write_update_file(&self, path: &Path, transactional: bool) -> Result<(), PatchError> {
        self.write_file(path, &self.update_ddl(), transactional)
    }

    pub fn write_rollback_file(&self, path: &Path, transactional: bool) -> Result<(), PatchError> {
        self.write_file(path, &self.rollback_ddl(), transactional)
    }
}

impl Default for SchemaPatch {
    fn default() -> Self {
        Self::new(DdlRules::default())
    }
}
