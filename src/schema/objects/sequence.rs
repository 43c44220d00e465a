use crate::db::batch::ResultSet;
use crate::db::command::{CommandBuilder, DbParam};
use crate::patch::Difference;
use crate::render::RenderedSql;
use crate::schema::{QualifiedName, SchemaObject};

#[derive(Debug, Clone)]
pub struct Sequence {
    identifier: QualifiedName,
    pub start: i64,
    pub increment: i64,
}

impl Sequence {
    pub fn new(identifier: QualifiedName) -> Self {
        Self {
            identifier,
            start: 1,
            increment: 1,
        }
    }

    pub fn starting_at(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn incrementing_by(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }
}

impl SchemaObject for Sequence {
    fn identifier(&self) -> &QualifiedName {
        &self.identifier
    }

    // Looks the name up among all relations so a table or view squatting on
    // it is detected.
    fn configure_query(&self, builder: &mut CommandBuilder) {
        builder
            .append(
                "SELECT c.relkind::text AS relkind, s.seqincrement AS increment \
                 FROM pg_class c \
                 JOIN pg_namespace n ON n.oid = c.relnamespace \
                 LEFT JOIN pg_sequence s ON s.seqrelid = c.oid \
                 WHERE n.nspname = ",
            )
            .append_parameter(DbParam::varchar(self.identifier.schema_or_default()))
            .append(" AND c.relname = ")
            .append_parameter(DbParam::varchar(self.identifier.name.as_str()));
    }

    fn create_delta(&self, results: &ResultSet) -> Result<Difference, sqlx::Error> {
        let Some(row) = results.first() else {
            return Ok(Difference::Create);
        };

        if row.get_required("relkind")? != "S" {
            return Ok(Difference::Invalid);
        }

        match row.parse::<i64>("increment")? {
            Some(increment) if increment == self.increment => Ok(Difference::None),
            _ => Ok(Difference::Update),
        }
    }

    fn create_statements(&self) -> Vec<RenderedSql> {
        vec![RenderedSql::new(format!(
            "CREATE SEQUENCE IF NOT EXISTS {} START WITH {} INCREMENT BY {};",
            self.identifier.to_sql(),
            self.start,
            self.increment
        ))]
    }

    fn drop_statements(&self) -> Vec<RenderedSql> {
        vec![RenderedSql::destructive(format!(
            "DROP SEQUENCE IF EXISTS {};",
            self.identifier.to_sql()
        ))]
    }

    fn update_statements(&self) -> Vec<RenderedSql> {
        vec![RenderedSql::new(format!(
            "ALTER SEQUENCE {} INCREMENT BY {};",
            self.identifier.to_sql(),
            self.increment
        ))]
    }
}
