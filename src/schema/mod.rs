//! The contract every patchable database object implements.

pub mod name;
pub mod objects;

pub use name::QualifiedName;

use crate::db::batch::ResultSet;
use crate::db::command::CommandBuilder;
use crate::patch::Difference;
use crate::render::RenderedSql;

/// A desired database entity that knows how to introspect its live
/// counterpart and describe its own divergence.
pub trait SchemaObject: Send + Sync {
    fn identifier(&self) -> &QualifiedName;

    /// Contributes exactly one statement to the shared introspection batch.
    /// That statement's result set is later handed to [`Self::create_delta`].
    fn configure_query(&self, builder: &mut CommandBuilder);

    /// Classifies the live state found in `results`.
    fn create_delta(&self, results: &ResultSet) -> Result<Difference, sqlx::Error>;

    fn create_statements(&self) -> Vec<RenderedSql>;

    fn drop_statements(&self) -> Vec<RenderedSql>;

    /// Statements that move an existing object to its desired shape.
    fn update_statements(&self) -> Vec<RenderedSql> {
        Vec::new()
    }
}
