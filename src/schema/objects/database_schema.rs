use crate::db::batch::ResultSet;
use crate::db::command::{CommandBuilder, DbParam};
use crate::patch::Difference;
use crate::render::{RenderedSql, quote_ident};
use crate::schema::{QualifiedName, SchemaObject};

/// A namespace (`CREATE SCHEMA`).
#[derive(Debug, Clone)]
pub struct DatabaseSchema {
    identifier: QualifiedName,
}

impl DatabaseSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identifier: QualifiedName::unscoped(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }
}

impl SchemaObject for DatabaseSchema {
    fn identifier(&self) -> &QualifiedName {
        &self.identifier
    }

    fn configure_query(&self, builder: &mut CommandBuilder) {
        builder
            .append("SELECT n.nspname AS name FROM pg_namespace n WHERE n.nspname = ")
            .append_parameter(DbParam::varchar(self.name()));
    }

    fn create_delta(&self, results: &ResultSet) -> Result<Difference, sqlx::Error> {
        Ok(if results.is_empty() {
            Difference::Create
        } else {
            Difference::None
        })
    }

    fn create_statements(&self) -> Vec<RenderedSql> {
        vec![RenderedSql::new(format!(
            "CREATE SCHEMA IF NOT EXISTS {};",
            quote_ident(self.name())
        ))]
    }

    fn drop_statements(&self) -> Vec<RenderedSql> {
        vec![RenderedSql::destructive(format!(
            "DROP SCHEMA IF EXISTS {} CASCADE;",
            quote_ident(self.name())
        ))]
    }
}
