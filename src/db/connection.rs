use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Replaces the password in a connection URL with `***` for display.
pub fn mask_url_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((user_info, host_and_path)) = rest.split_once('@') else {
        return url.to_string();
    };
    match user_info.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host_and_path),
        None => url.to_string(),
    }
}

/// Opens a pool, giving up after `timeout` when no connection can be acquired.
pub async fn connect_to_database(url: &str, timeout: Duration) -> Result<PgPool> {
    PgPoolOptions::new()
        .acquire_timeout(timeout)
        .connect(url)
        .await
        .with_context(|| format!("Failed to connect to database at {}", mask_url_password(url)))
}
