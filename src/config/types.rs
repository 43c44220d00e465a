use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::patch::{AutoCreate, DdlRules};

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigInput {
    pub database: Option<DatabaseInput>,
    pub patch: Option<PatchInput>,
    pub rules: Option<RulesInput>,
    pub objects: Option<ObjectsInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database: Database,
    pub patch: Patch,
    pub rules: DdlRules,
    pub objects: Objects,
}

// Database connection
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseInput {
    pub url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub connect_timeout: Duration,
}

// Patch behaviour
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PatchInput {
    pub auto_create: Option<AutoCreate>,
    pub transactional: Option<bool>,
    pub on_introspection_failure: Option<FailureMode>,
}

#[derive(Debug, Clone)]
pub struct Patch {
    pub auto_create: AutoCreate,
    pub transactional: bool,
    pub on_introspection_failure: FailureMode,
}

/// How a failed introspection round trip is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort with the original database error
    #[default]
    Fail,
    /// Log the error and validate whatever was read
    Warn,
}

// Script rules
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RulesInput {
    pub role: Option<String>,
    pub proc_language: Option<String>,
}

// Desired objects
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObjectsInput {
    pub schemas: Option<Vec<String>>,
    pub extensions: Option<Vec<ExtensionSpec>>,
    pub sequences: Option<Vec<SequenceSpec>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtensionSpec {
    pub name: String,
    pub schema: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SequenceSpec {
    pub schema: Option<String>,
    pub name: String,
    pub start: Option<i64>,
    pub increment: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct Objects {
    pub schemas: Vec<String>,
    pub extensions: Vec<ExtensionSpec>,
    pub sequences: Vec<SequenceSpec>,
}

// CLI argument group shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct PatchArgs {
    #[arg(long, help = "Database URL (falls back to DATABASE_URL)")]
    pub database_url: Option<String>,

    #[arg(long, value_enum, help = "Which differences may be applied")]
    pub auto_create: Option<AutoCreate>,

    #[arg(long, help = "Role the generated DDL runs as")]
    pub role: Option<String>,

    #[arg(long, value_enum, help = "What to do when introspection fails")]
    pub on_introspection_failure: Option<FailureMode>,
}

impl From<PatchArgs> for ConfigInput {
    fn from(args: PatchArgs) -> Self {
        let database = args.database_url.map(|url| DatabaseInput {
            url: Some(url),
            connect_timeout_secs: None,
        });

        let patch = if args.auto_create.is_some() || args.on_introspection_failure.is_some() {
            Some(PatchInput {
                auto_create: args.auto_create,
                transactional: None,
                on_introspection_failure: args.on_introspection_failure,
            })
        } else {
            None
        };

        let rules = args.role.map(|role| RulesInput {
            role: Some(role),
            proc_language: None,
        });

        Self {
            database,
            patch,
            rules,
            objects: None,
        }
    }
}
