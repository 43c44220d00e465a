use crate::config::{merge::Merge, types::*};
use crate::patch::DdlRules;
use std::time::Duration;

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Config {
        let defaults = Config::default();

        Config {
            database: self.resolve_database(&defaults.database),
            patch: self.resolve_patch(&defaults.patch),
            rules: self.resolve_rules(&defaults.rules),
            objects: self.resolve_objects(),
        }
    }

    fn resolve_database(&self, defaults: &Database) -> Database {
        let db_input = self.config_input.database.as_ref();

        let url = db_input
            .and_then(|d| d.url.as_ref())
            .cloned()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| defaults.url.clone());

        let connect_timeout = db_input
            .and_then(|d| d.connect_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.connect_timeout);

        Database {
            url,
            connect_timeout,
        }
    }

    fn resolve_patch(&self, defaults: &Patch) -> Patch {
        let patch_input = self.config_input.patch.as_ref();

        Patch {
            auto_create: patch_input
                .and_then(|p| p.auto_create)
                .unwrap_or(defaults.auto_create),
            transactional: patch_input
                .and_then(|p| p.transactional)
                .unwrap_or(defaults.transactional),
            on_introspection_failure: patch_input
                .and_then(|p| p.on_introspection_failure)
                .unwrap_or(defaults.on_introspection_failure),
        }
    }

    fn resolve_rules(&self, defaults: &DdlRules) -> DdlRules {
        let rules_input = self.config_input.rules.as_ref();

        DdlRules {
            role: rules_input
                .and_then(|r| r.role.as_ref())
                .cloned()
                .or_else(|| defaults.role.clone()),
            proc_language: rules_input
                .and_then(|r| r.proc_language.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.proc_language.clone()),
        }
    }

    fn resolve_objects(&self) -> Objects {
        let obj_input = self.config_input.objects.as_ref();

        Objects {
            schemas: obj_input
                .and_then(|o| o.schemas.as_ref())
                .cloned()
                .unwrap_or_default(),
            extensions: obj_input
                .and_then(|o| o.extensions.as_ref())
                .cloned()
                .unwrap_or_default(),
            sequences: obj_input
                .and_then(|o| o.sequences.as_ref())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
