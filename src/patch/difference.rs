use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::schema::{QualifiedName, SchemaObject};

/// How far a schema object's live state is from its desired state.
///
/// Variants are declared in severity order so the derived `Ord` ranks them
/// `None < Create < Update < Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difference {
    /// Live state already matches.
    None,
    /// The object does not exist yet.
    Create,
    /// The object exists but its structure differs.
    Update,
    /// No script can be derived automatically; needs manual intervention.
    Invalid,
}

impl Difference {
    /// The most severe difference in `differences`, or `None` when empty.
    pub fn aggregate<I>(differences: I) -> Difference
    where
        I: IntoIterator<Item = Difference>,
    {
        differences.into_iter().max().unwrap_or(Difference::None)
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difference::None => "none",
            Difference::Create => "create",
            Difference::Update => "update",
            Difference::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

/// Which differences may be applied without operator intervention.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AutoCreate {
    /// Never touch the database, not even to introspect.
    None,
    /// New objects may be created; existing ones must not change.
    #[default]
    CreateOnly,
    /// Every difference may be applied.
    All,
}

impl fmt::Display for AutoCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AutoCreate::None => "none",
            AutoCreate::CreateOnly => "create_only",
            AutoCreate::All => "all",
        };
        f.write_str(label)
    }
}

/// A schema object paired with the difference computed for it. Never
/// changes after construction.
#[derive(Clone)]
pub struct Delta {
    object: Arc<dyn SchemaObject>,
    difference: Difference,
}

impl Delta {
    pub fn new(object: Arc<dyn SchemaObject>, difference: Difference) -> Self {
        Self { object, difference }
    }

    pub fn object(&self) -> &Arc<dyn SchemaObject> {
        &self.object
    }

    pub fn difference(&self) -> Difference {
        self.difference
    }

    pub fn identifier(&self) -> &QualifiedName {
        self.object.identifier()
    }
}

impl fmt::Debug for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delta")
            .field("object", &self.identifier().to_string())
            .field("difference", &self.difference)
            .finish()
    }
}
