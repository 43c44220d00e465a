use anyhow::Result;
use futures_util::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::{Executor, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

use super::error_context::SqlErrorContext;
use crate::patch::{DdlRules, DdlRunner};
use crate::schema::QualifiedName;

/// Where forward statements run once the first one arrives.
enum Session {
    Idle,
    Transaction(Transaction<'static, Postgres>),
    Connection(PoolConnection<Postgres>),
}

/// Runs each forward statement against the database as soon as it is written.
///
/// All statements share one connection. In transactional mode they run inside
/// a single transaction that [`DdlRunner::finish`] commits; dropping the runner
/// before that rolls everything back. A configured role is switched to before
/// the first statement.
pub struct LiveDdlRunner {
    pool: PgPool,
    role: Option<String>,
    transactional: bool,
    session: Session,
    executed: usize,
}

impl LiveDdlRunner {
    pub fn new(pool: PgPool, rules: &DdlRules) -> Self {
        Self {
            pool,
            role: rules.active_role().map(str::to_string),
            transactional: true,
            session: Session::Idle,
            executed: 0,
        }
    }

    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Statements executed so far, committed or not.
    pub fn executed(&self) -> usize {
        self.executed
    }

    async fn open(&mut self) -> Result<()> {
        if !matches!(self.session, Session::Idle) {
            return Ok(());
        }

        self.session = if self.transactional {
            Session::Transaction(self.pool.begin().await?)
        } else {
            Session::Connection(self.pool.acquire().await?)
        };

        if let Some(role) = self.role.clone() {
            let sql = if self.transactional {
                format!("SET LOCAL ROLE {};", role)
            } else {
                format!("SET ROLE {};", role)
            };
            debug!("Switching role: {}", sql);
            let conn = self.connection()?;
            if let Err(e) = (&mut *conn).execute(sqlx::raw_sql(&sql)).await {
                self.session = Session::Idle;
                return Err(anyhow::anyhow!("Failed to switch to role {}: {}", role, e));
            }
        }

        Ok(())
    }

    fn connection(&mut self) -> Result<&mut PgConnection> {
        match &mut self.session {
            Session::Transaction(tx) => Ok(&mut **tx),
            Session::Connection(conn) => Ok(&mut **conn),
            Session::Idle => Err(anyhow::anyhow!("No open database session")),
        }
    }
}

impl DdlRunner for LiveDdlRunner {
    fn apply<'a>(&'a mut self, subject: &'a QualifiedName, sql: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.open().await?;
            debug!("Executing DDL for {}: {}", subject, sql);
            let conn = self.connection()?;
            match (&mut *conn).execute(sqlx::raw_sql(sql)).await {
                Ok(_) => {
                    self.executed += 1;
                    info!("Applied DDL for {}", subject);
                    Ok(())
                }
                Err(e) => {
                    let ctx = SqlErrorContext::from_sqlx_error(&e, sql);
                    Err(anyhow::anyhow!("{}", ctx.format(&subject.to_string(), sql)))
                }
            }
        })
    }

    fn finish(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            match std::mem::replace(&mut self.session, Session::Idle) {
                Session::Idle => Ok(()),
                Session::Transaction(tx) => {
                    tx.commit().await?;
                    info!("Committed {} DDL statement(s)", self.executed);
                    Ok(())
                }
                Session::Connection(mut conn) => {
                    if self.role.is_none() {
                        return Ok(());
                    }
                    if let Err(e) = (&mut *conn).execute(sqlx::raw_sql("RESET ROLE;")).await {
                        // Keep a connection with a switched role out of the pool.
                        warn!("Failed to reset role, closing connection: {}", e);
                        conn.close().await?;
                    }
                    Ok(())
                }
            }
        })
    }
}
