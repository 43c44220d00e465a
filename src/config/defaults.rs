use crate::config::types::*;
use crate::patch::AutoCreate;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/postgres";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

impl Default for Database {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            auto_create: AutoCreate::CreateOnly,
            transactional: true,
            on_introspection_failure: FailureMode::Fail,
        }
    }
}
