use crate::render::quote_ident;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SCHEMA: &str = "public";

/// Identifier of a database object, optionally scoped to a schema.
///
/// Schemas and extensions live at database level and carry no schema part.
/// Only used for diagnostics and DDL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// A name that is not scoped to any schema (schemas, extensions).
    pub fn unscoped(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn schema_or_default(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    /// Quoted form for use inside DDL text.
    pub fn to_sql(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for QualifiedName {
    type Err = anyhow::Error;

    /// Parses `schema.name`, or a bare `name` which lands in the default schema.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('.') {
            Some((schema, name)) => {
                if schema.is_empty() || name.is_empty() || name.contains('.') {
                    anyhow::bail!("Invalid qualified name '{}': expected schema.name", s);
                }
                Ok(Self::new(schema, name))
            }
            None if s.is_empty() => anyhow::bail!("Qualified name cannot be empty"),
            None => Ok(Self::new(DEFAULT_SCHEMA, s)),
        }
    }
}
