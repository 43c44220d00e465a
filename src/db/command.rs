//! Command construction with explicitly typed parameters.
//!
//! A [`Command`] can be rendered two ways: with `$n` placeholders for the
//! extended protocol (bound through sqlx), or with every parameter inlined as
//! a typed literal for the simple-query protocol used by batched
//! introspection, which carries no bind parameters.

use anyhow::{Result, anyhow};
use futures_util::TryStreamExt;
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Decode, Postgres, Row, Type};
use uuid::Uuid;

use crate::render::escape_string;

/// Postgres type tag for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Text,
    Varchar,
    Uuid,
    Integer,
    BigInt,
    Boolean,
    Jsonb,
}

impl DbType {
    pub fn sql_name(self) -> &'static str {
        match self {
            DbType::Text => "text",
            DbType::Varchar => "varchar",
            DbType::Uuid => "uuid",
            DbType::Integer => "integer",
            DbType::BigInt => "bigint",
            DbType::Boolean => "boolean",
            DbType::Jsonb => "jsonb",
        }
    }
}

/// A parameter value together with the type it binds as.
#[derive(Debug, Clone, PartialEq)]
pub enum DbParam {
    Text(String),
    Varchar(String),
    Uuid(Uuid),
    Integer(i32),
    BigInt(i64),
    Boolean(bool),
    Jsonb(serde_json::Value),
    Null(DbType),
}

impl DbParam {
    pub fn text(value: impl Into<String>) -> Self {
        DbParam::Text(value.into())
    }

    pub fn varchar(value: impl Into<String>) -> Self {
        DbParam::Varchar(value.into())
    }

    /// Varchar that binds as a typed NULL when absent.
    pub fn varchar_opt(value: Option<&str>) -> Self {
        value.map_or(DbParam::Null(DbType::Varchar), DbParam::varchar)
    }

    pub fn db_type(&self) -> DbType {
        match self {
            DbParam::Text(_) => DbType::Text,
            DbParam::Varchar(_) => DbType::Varchar,
            DbParam::Uuid(_) => DbType::Uuid,
            DbParam::Integer(_) => DbType::Integer,
            DbParam::BigInt(_) => DbType::BigInt,
            DbParam::Boolean(_) => DbType::Boolean,
            DbParam::Jsonb(_) => DbType::Jsonb,
            DbParam::Null(ty) => *ty,
        }
    }

    /// Render as a literal with an explicit cast, safe to splice into SQL text.
    pub fn to_literal(&self) -> String {
        let ty = self.db_type().sql_name();
        match self {
            DbParam::Text(v) | DbParam::Varchar(v) => format!("{}::{}", escape_string(v), ty),
            DbParam::Uuid(v) => format!("'{}'::{}", v, ty),
            DbParam::Integer(v) => format!("({})::{}", v, ty),
            DbParam::BigInt(v) => format!("({})::{}", v, ty),
            DbParam::Boolean(v) => format!("{}::{}", v, ty),
            DbParam::Jsonb(v) => format!("{}::{}", escape_string(&v.to_string()), ty),
            DbParam::Null(_) => format!("NULL::{}", ty),
        }
    }

    fn bind(self, query: Query<'_, Postgres, PgArguments>) -> Query<'_, Postgres, PgArguments> {
        match self {
            DbParam::Text(v) | DbParam::Varchar(v) => query.bind(v),
            DbParam::Uuid(v) => query.bind(v),
            DbParam::Integer(v) => query.bind(v),
            DbParam::BigInt(v) => query.bind(v),
            DbParam::Boolean(v) => query.bind(v),
            DbParam::Jsonb(v) => query.bind(v),
            DbParam::Null(ty) => match ty {
                DbType::Text | DbType::Varchar => query.bind(None::<String>),
                DbType::Uuid => query.bind(None::<Uuid>),
                DbType::Integer => query.bind(None::<i32>),
                DbType::BigInt => query.bind(None::<i64>),
                DbType::Boolean => query.bind(None::<bool>),
                DbType::Jsonb => query.bind(None::<serde_json::Value>),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Param(usize),
}

/// Accumulates SQL text and parameters from any number of contributors.
#[derive(Debug, Default)]
pub struct CommandBuilder {
    segments: Vec<Segment>,
    params: Vec<DbParam>,
    named: Vec<(String, usize)>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
        self
    }

    /// Appends a placeholder for a new positional parameter.
    pub fn append_parameter(&mut self, param: DbParam) -> &mut Self {
        let index = self.push_param(param);
        self.segments.push(Segment::Param(index));
        self
    }

    /// Appends `text`, replacing each `?` with the next parameter in order.
    pub fn append_with_parameters(&mut self, text: &str, params: Vec<DbParam>) -> Result<&mut Self> {
        let pieces: Vec<&str> = text.split('?').collect();
        if pieces.len() != params.len() + 1 {
            return Err(anyhow!(
                "Expected {} parameters for '{}' but got {}",
                pieces.len() - 1,
                text,
                params.len()
            ));
        }

        let mut params = params.into_iter();
        for (i, piece) in pieces.iter().enumerate() {
            self.append(piece);
            if i + 1 < pieces.len()
                && let Some(param) = params.next()
            {
                self.append_parameter(param);
            }
        }
        Ok(self)
    }

    /// Registers a named parameter. The first binding of a name wins; later
    /// calls with the same name return the existing position.
    pub fn with(&mut self, name: &str, param: DbParam) -> usize {
        if let Some((_, index)) = self.named.iter().find(|(n, _)| n == name) {
            return *index;
        }
        let index = self.push_param(param);
        self.named.push((name.to_string(), index));
        index
    }

    /// Appends a placeholder for a parameter registered with [`Self::with`].
    pub fn append_named(&mut self, name: &str) -> Result<&mut Self> {
        let index = self
            .named
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, index)| *index)
            .ok_or_else(|| anyhow!("Unknown named parameter '{}'", name))?;
        self.segments.push(Segment::Param(index));
        Ok(self)
    }

    /// Makes sure the text so far ends with a statement terminator so the
    /// next contributor starts a new statement.
    pub fn end_statement(&mut self) -> &mut Self {
        let tail = match self.segments.last() {
            Some(Segment::Text(text)) => text.trim_end(),
            _ => "",
        };
        let terminated = tail.ends_with(';');
        // A trailing line comment would swallow the terminator.
        let in_comment = tail.lines().last().is_some_and(|line| line.contains("--"));
        if !terminated && !self.segments.is_empty() {
            self.append(if in_comment { "\n;" } else { ";" });
        }
        self.append("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn build(self) -> Command {
        Command {
            segments: self.segments,
            params: self.params,
        }
    }

    fn push_param(&mut self, param: DbParam) -> usize {
        self.params.push(param);
        self.params.len() - 1
    }
}

/// A finished command: SQL text plus its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    segments: Vec<Segment>,
    params: Vec<DbParam>,
}

impl Command {
    pub fn parameters(&self) -> &[DbParam] {
        &self.params
    }

    /// SQL with `$n` placeholders, for binding through the extended protocol.
    pub fn sql(&self) -> String {
        self.render(|index, _| format!("${}", index + 1))
    }

    /// SQL with every parameter inlined as a typed literal.
    pub fn batch_sql(&self) -> String {
        self.render(|_, param| param.to_literal())
    }

    fn render(&self, placeholder: impl Fn(usize, &DbParam) -> String) -> String {
        let mut sql = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => sql.push_str(text),
                Segment::Param(index) => sql.push_str(&placeholder(*index, &self.params[*index])),
            }
        }
        sql
    }

    /// Executes the command and streams every row through `transform`.
    pub async fn fetch_list<T, F>(&self, conn: &mut PgConnection, mut transform: F) -> Result<Vec<T>>
    where
        F: FnMut(&PgRow) -> Result<T>,
    {
        let sql = self.sql();
        let mut query = sqlx::query(&sql);
        for param in self.params.iter().cloned() {
            query = param.bind(query);
        }

        let mut list = Vec::new();
        let mut rows = query.fetch(&mut *conn);
        while let Some(row) = rows.try_next().await? {
            list.push(transform(&row)?);
        }
        Ok(list)
    }

    /// Reads the first column of every row; SQL NULL becomes `None`.
    pub async fn fetch_scalars<T>(&self, conn: &mut PgConnection) -> Result<Vec<Option<T>>>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
    {
        self.fetch_list(conn, |row| Ok(row.try_get::<Option<T>, _>(0)?))
            .await
    }
}

/// Runs raw statements joined with `;` and returns the affected row count.
pub async fn run_sql(conn: &mut PgConnection, statements: &[&str]) -> Result<u64> {
    let sql = statements.join(";");
    let result = sqlx::raw_sql(&sql).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}
