use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    /// The batched introspection round trip failed and the failure handler
    /// re-raised it. Displays as the original driver error.
    #[error(transparent)]
    Introspection(#[from] sqlx::Error),

    /// At least one object cannot be reconciled automatically, whatever the policy.
    #[error("Cannot derive updates for objects {objects}")]
    InvalidDifference { objects: String },

    /// An existing object would change while the policy only allows creation.
    #[error("Cannot apply updates in CreateOnly mode to existing items {objects}")]
    PolicyViolation { objects: String },

    #[error("Failed to write script to {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    /// Whether this is a policy decision rather than an infrastructure failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PatchError::InvalidDifference { .. } | PatchError::PolicyViolation { .. }
        )
    }
}
