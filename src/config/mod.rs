pub mod builder;
pub mod defaults;
pub mod merge;
pub mod types;


pub use builder::ConfigBuilder;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::schema::objects::{DatabaseSchema, Extension, Sequence};
use crate::schema::{QualifiedName, SchemaObject};

/// Reads the config file; a missing file yields an empty input.
pub fn load_config(config_file: &str) -> Result<ConfigInput> {
    let path = Path::new(config_file);
    if !path.exists() {
        return Ok(ConfigInput::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", config_file))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", config_file))
}

impl Objects {
    /// Desired objects in dependency order: schemas, then extensions, then
    /// sequences. A sequence without a schema may name one as `schema.name`.
    pub fn schema_objects(&self) -> Result<Vec<Arc<dyn SchemaObject>>> {
        let mut objects: Vec<Arc<dyn SchemaObject>> = Vec::new();

        for name in &self.schemas {
            objects.push(Arc::new(DatabaseSchema::new(name.as_str())));
        }

        for spec in &self.extensions {
            let mut extension = Extension::new(spec.name.as_str());
            extension.schema = spec.schema.clone();
            extension.version = spec.version.clone();
            objects.push(Arc::new(extension));
        }

        for spec in &self.sequences {
            let identifier = match &spec.schema {
                Some(schema) => QualifiedName::new(schema.as_str(), spec.name.as_str()),
                None => spec
                    .name
                    .parse::<QualifiedName>()
                    .with_context(|| format!("Invalid sequence in config: {}", spec.name))?,
            };
            let mut sequence = Sequence::new(identifier);
            if let Some(start) = spec.start {
                sequence = sequence.starting_at(start);
            }
            if let Some(increment) = spec.increment {
                sequence = sequence.incrementing_by(increment);
            }
            objects.push(Arc::new(sequence));
        }

        Ok(objects)
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.extensions.is_empty() && self.sequences.is_empty()
    }
}
