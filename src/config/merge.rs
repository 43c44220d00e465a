use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

fn merge_sections<T>(a: Option<T>, b: Option<T>, merge_with: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(merge_with(a, b)),
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            database: merge_sections(self.database, other.database, DatabaseInput::merge_with),
            patch: merge_sections(self.patch, other.patch, PatchInput::merge_with),
            rules: merge_sections(self.rules, other.rules, RulesInput::merge_with),
            objects: merge_sections(self.objects, other.objects, ObjectsInput::merge_with),
        }
    }
}

impl DatabaseInput {
    pub fn merge_with(self, other: DatabaseInput) -> DatabaseInput {
        DatabaseInput {
            url: self.url.merge(other.url),
            connect_timeout_secs: self.connect_timeout_secs.merge(other.connect_timeout_secs),
        }
    }
}

impl PatchInput {
    pub fn merge_with(self, other: PatchInput) -> PatchInput {
        PatchInput {
            auto_create: self.auto_create.merge(other.auto_create),
            transactional: self.transactional.merge(other.transactional),
            on_introspection_failure: self
                .on_introspection_failure
                .merge(other.on_introspection_failure),
        }
    }
}

impl RulesInput {
    pub fn merge_with(self, other: RulesInput) -> RulesInput {
        RulesInput {
            role: self.role.merge(other.role),
            proc_language: self.proc_language.merge(other.proc_language),
        }
    }
}

// Lists replace each other wholesale.
impl ObjectsInput {
    pub fn merge_with(self, other: ObjectsInput) -> ObjectsInput {
        ObjectsInput {
            schemas: self.schemas.merge(other.schemas),
            extensions: self.extensions.merge(other.extensions),
            sequences: self.sequences.merge(other.sequences),
        }
    }
}
