//! Built-in schema objects: namespaces, extensions and sequences.

pub mod database_schema;
pub mod extension;
pub mod sequence;

pub use database_schema::DatabaseSchema;
pub use extension::Extension;
pub use sequence::Sequence;
