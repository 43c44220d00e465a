//! Destinations for DDL statements.
//!
//! Callers push statements through [`DdlRunner`] without knowing whether they
//! end up in a script buffer ([`DdlRecorder`]) or run against the database
//! right away ([`crate::db::live_runner::LiveDdlRunner`]).

use anyhow::Result;
use futures_util::future::BoxFuture;
use std::fmt;

use crate::schema::QualifiedName;

pub trait DdlRunner: Send {
    /// Records or executes one statement on behalf of `subject`.
    fn apply<'a>(&'a mut self, subject: &'a QualifiedName, sql: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Makes everything applied so far permanent. Recorders have nothing to do.
    fn finish(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Append-only, ordered statement log.
#[derive(Debug, Clone, Default)]
pub struct DdlRecorder {
    statements: Vec<String>,
}

impl DdlRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from statements already written elsewhere.
    pub fn with_statements(statements: Vec<String>) -> Self {
        Self { statements }
    }

    pub fn record(&mut self, sql: impl Into<String>) {
        self.statements.push(sql.into());
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Everything recorded so far, one statement per line.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(statement);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for DdlRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snapshot())
    }
}

impl DdlRunner for DdlRecorder {
    fn apply<'a>(&'a mut self, _subject: &'a QualifiedName, sql: &'a str) -> BoxFuture<'a, Result<()>> {
        self.record(sql);
        Box::pin(async { Ok(()) })
    }
}

/// Statement shortcuts that every runner supports.
pub trait DdlRunnerExt: DdlRunner {
    fn drop_table<'a>(&'a mut self, subject: &'a QualifiedName, table: &'a QualifiedName) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = format!("drop table if exists {} cascade;", table.to_sql());
            self.apply(subject, &sql).await
        })
    }

    fn remove_column<'a>(
        &'a mut self,
        subject: &'a QualifiedName,
        table: &'a QualifiedName,
        column: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = format!(
                "alter table if exists {} drop column if exists {};",
                table.to_sql(),
                crate::render::quote_ident(column)
            );
            self.apply(subject, &sql).await
        })
    }
}

impl<T: DdlRunner + ?Sized> DdlRunnerExt for T {}
