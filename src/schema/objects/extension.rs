use crate::db::batch::ResultSet;
use crate::db::command::{CommandBuilder, DbParam};
use crate::patch::Difference;
use crate::render::{RenderedSql, escape_string, quote_ident};
use crate::schema::{QualifiedName, SchemaObject};

/// A PostgreSQL extension, optionally pinned to a schema and version.
#[derive(Debug, Clone)]
pub struct Extension {
    identifier: QualifiedName,
    pub schema: Option<String>,
    pub version: Option<String>,
}

impl Extension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identifier: QualifiedName::unscoped(name),
            schema: None,
            version: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn at_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.identifier.name
    }

    fn schema_differs(&self, live_schema: &str) -> bool {
        self.schema.as_deref().is_some_and(|s| s != live_schema)
    }
}

impl SchemaObject for Extension {
    fn identifier(&self) -> &QualifiedName {
        &self.identifier
    }

    fn configure_query(&self, builder: &mut CommandBuilder) {
        builder
            .append(
                "SELECT n.nspname AS schema, e.extversion AS version, e.extrelocatable AS relocatable \
                 FROM pg_extension e JOIN pg_namespace n ON n.oid = e.extnamespace \
                 WHERE e.extname = ",
            )
            .append_parameter(DbParam::varchar(self.name()));
    }

    fn create_delta(&self, results: &ResultSet) -> Result<Difference, sqlx::Error> {
        let Some(row) = results.first() else {
            return Ok(Difference::Create);
        };

        let live_schema = row.get_required("schema")?;
        let live_version = row.get_required("version")?;
        let relocatable = row.get_bool("relocatable")?.unwrap_or(false);

        if self.schema_differs(live_schema) {
            // Non-relocatable extensions can only move by drop and re-create.
            return Ok(if relocatable {
                Difference::Update
            } else {
                Difference::Invalid
            });
        }

        if self.version.as_deref().is_some_and(|v| v != live_version) {
            return Ok(Difference::Update);
        }

        Ok(Difference::None)
    }

    fn create_statements(&self) -> Vec<RenderedSql> {
        let mut sql = format!("CREATE EXTENSION IF NOT EXISTS {}", quote_ident(self.name()));
        if let Some(schema) = &self.schema {
            sql.push_str(&format!(" WITH SCHEMA {}", quote_ident(schema)));
        }
        if let Some(version) = &self.version {
            sql.push_str(&format!(" VERSION {}", escape_string(version)));
        }
        sql.push(';');
        vec![RenderedSql::new(sql)]
    }

    fn drop_statements(&self) -> Vec<RenderedSql> {
        vec![RenderedSql::destructive(format!(
            "DROP EXTENSION IF EXISTS {};",
            quote_ident(self.name())
        ))]
    }

    fn update_statements(&self) -> Vec<RenderedSql> {
        let mut statements = Vec::new();
        if let Some(schema) = &self.schema {
            statements.push(RenderedSql::new(format!(
                "ALTER EXTENSION {} SET SCHEMA {};",
                quote_ident(self.name()),
                quote_ident(schema)
            )));
        }
        if let Some(version) = &self.version {
            statements.push(RenderedSql::new(format!(
                "ALTER EXTENSION {} UPDATE TO {};",
                quote_ident(self.name()),
                escape_string(version)
            )));
        }
        statements
    }
}
