//! One round trip, many result sets.
//!
//! A batched command is sent through the simple-query protocol, where the
//! server answers every statement with its rows followed by a completion
//! message. [`BatchReader`] turns that stream back into one [`ResultSet`] per
//! statement, handed out in order.

use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Either, Executor, PgPool, Row};
use std::str::FromStr;
use std::sync::Arc;

/// One item of a batched response.
#[derive(Debug, Clone)]
pub enum BatchItem {
    Row(ResultRow),
    /// The current statement finished; the next row belongs to the next result set.
    Complete,
}

/// Anything that can run a multi-statement command in a single round trip.
pub trait BatchExecutor: Send {
    fn execute_batch<'a>(&'a mut self, sql: &'a str)
    -> BoxStream<'a, Result<BatchItem, sqlx::Error>>;
}

fn to_batch_item(item: Result<Either<sqlx::postgres::PgQueryResult, PgRow>, sqlx::Error>) -> Result<BatchItem, sqlx::Error> {
    match item? {
        Either::Left(_) => Ok(BatchItem::Complete),
        Either::Right(row) => ResultRow::from_pg_row(&row).map(BatchItem::Row),
    }
}

impl BatchExecutor for PgConnection {
    fn execute_batch<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> BoxStream<'a, Result<BatchItem, sqlx::Error>> {
        self.fetch_many(sqlx::raw_sql(sql)).map(to_batch_item).boxed()
    }
}

impl BatchExecutor for PgPool {
    fn execute_batch<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> BoxStream<'a, Result<BatchItem, sqlx::Error>> {
        let pool: &'a PgPool = self;
        pool.fetch_many(sqlx::raw_sql(sql)).map(to_batch_item).boxed()
    }
}

/// A row with every value in its text representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl ResultRow {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    fn from_pg_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let columns: Arc<[String]> = row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        // Simple-query results arrive in text format for every type.
        let values = (0..row.len())
            .map(|i| row.try_get_unchecked::<Option<String>, _>(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns, values })
    }

    /// Value of `column`, `None` for SQL NULL.
    pub fn get(&self, column: &str) -> Result<Option<&str>, sqlx::Error> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| sqlx::Error::ColumnNotFound(column.to_string()))?;
        Ok(self.values.get(index).and_then(|v| v.as_deref()))
    }

    pub fn get_required(&self, column: &str) -> Result<&str, sqlx::Error> {
        self.get(column)?
            .ok_or_else(|| sqlx::Error::Decode(format!("column '{}' is NULL", column).into()))
    }

    pub fn parse<T>(&self, column: &str) -> Result<Option<T>, sqlx::Error>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(column)?
            .map(|raw| {
                raw.parse::<T>().map_err(|e| {
                    sqlx::Error::Decode(
                        format!("column '{}' value '{}': {}", column, raw, e).into(),
                    )
                })
            })
            .transpose()
    }

    /// Postgres text booleans are `t` / `f`.
    pub fn get_bool(&self, column: &str) -> Result<Option<bool>, sqlx::Error> {
        match self.get(column)? {
            None => Ok(None),
            Some("t") | Some("true") => Ok(Some(true)),
            Some("f") | Some("false") => Ok(Some(false)),
            Some(other) => Err(sqlx::Error::Decode(
                format!("column '{}' value '{}' is not a boolean", column, other).into(),
            )),
        }
    }
}

/// The rows a single statement of a batch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<ResultRow>,
}

impl ResultSet {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self { rows }
    }

    /// Builds a result set from literal values.
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        Self {
            rows: rows
                .into_iter()
                .map(|values| {
                    ResultRow::new(
                        columns.clone(),
                        values.into_iter().map(|v| v.map(str::to_string)).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn first(&self) -> Option<&ResultRow> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sequential cursor over the result sets of one batched command.
pub struct BatchReader<'a> {
    stream: BoxStream<'a, Result<BatchItem, sqlx::Error>>,
    consumed: usize,
}

impl<'a> BatchReader<'a> {
    pub fn new(stream: BoxStream<'a, Result<BatchItem, sqlx::Error>>) -> Self {
        Self {
            stream,
            consumed: 0,
        }
    }

    /// Number of result sets handed out so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Advances to the next result set and collects its rows.
    pub async fn next_result(&mut self) -> Result<ResultSet, sqlx::Error> {
        let mut rows = Vec::new();
        loop {
            match self.stream.try_next().await? {
                Some(BatchItem::Row(row)) => rows.push(row),
                Some(BatchItem::Complete) => {
                    self.consumed += 1;
                    return Ok(ResultSet::new(rows));
                }
                None => {
                    return Err(sqlx::Error::Protocol(format!(
                        "batched command ended after {} result set(s)",
                        self.consumed
                    )));
                }
            }
        }
    }
}
