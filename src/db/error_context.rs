//! Readable reports for DDL statements PostgreSQL rejected.

use sqlx::postgres::{PgDatabaseError, PgErrorPosition};

/// What PostgreSQL said about a failed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlErrorContext {
    pub message: String,
    /// Line of the statement the error position falls on.
    pub line_number: Option<usize>,
    pub detail: Option<String>,
    pub hint: Option<String>,
    /// SQLSTATE, e.g. `42P07` for duplicate_table.
    pub code: Option<String>,
}

impl SqlErrorContext {
    pub fn from_sqlx_error(error: &sqlx::Error, sql: &str) -> Self {
        if let Some(db_error) = error.as_database_error()
            && let Some(pg_error) = db_error.try_downcast_ref::<PgDatabaseError>()
        {
            let line_number = pg_error.position().map(|pos| {
                let offset = match pos {
                    PgErrorPosition::Original(p) => p,
                    PgErrorPosition::Internal { position, .. } => position,
                };
                position_to_line(sql, offset)
            });

            return Self {
                message: pg_error.message().to_string(),
                line_number,
                detail: pg_error.detail().map(str::to_string),
                hint: pg_error.hint().map(str::to_string),
                code: Some(pg_error.code().to_string()),
            };
        }

        Self {
            message: error.to_string(),
            line_number: None,
            detail: None,
            hint: None,
            code: None,
        }
    }

    /// Report naming the object the statement was issued for.
    pub fn format(&self, subject: &str, sql: &str) -> String {
        let mut msg = format!("DDL for {} failed", subject);
        if let Some(code) = &self.code {
            msg.push_str(&format!(" [{}]", code));
        }
        msg.push_str(&format!(": {}", self.message));

        if let Some(detail) = &self.detail {
            msg.push_str(&format!("\n  Detail: {}", detail));
        }
        if let Some(hint) = &self.hint {
            msg.push_str(&format!("\n  Hint: {}", hint));
        }

        msg.push_str("\n\n");
        for (idx, line) in sql.lines().enumerate() {
            let marker = if Some(idx + 1) == self.line_number { ">" } else { " " };
            msg.push_str(&format!("  {} {:3} | {}\n", marker, idx + 1, line));
        }
        msg
    }
}

/// 1-indexed character position to 1-indexed line.
pub fn position_to_line(content: &str, position: usize) -> usize {
    content
        .chars()
        .take(position.saturating_sub(1))
        .filter(|c| *c == '\n')
        .count()
        + 1
}
