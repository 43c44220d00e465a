pub mod commands;
pub mod config;
pub mod constants;
pub mod db;
pub mod patch;
pub mod render;
pub mod schema;

pub use patch::{AutoCreate, Delta, Difference, PatchError, SchemaPatch};
pub use schema::{QualifiedName, SchemaObject};
