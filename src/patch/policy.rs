//! Decides whether a set of deltas may be patched under a policy.

use itertools::Itertools;

use super::difference::{AutoCreate, Delta, Difference};
use super::error::PatchError;

/// Aggregate difference of a migration log, recomputed on every call.
pub fn aggregate(deltas: &[Delta]) -> Difference {
    Difference::aggregate(deltas.iter().map(Delta::difference))
}

/// Invalid deltas fail under every policy, including `All`. Updates fail only
/// under `CreateOnly`. Reported names keep log order.
pub fn assert_patching_is_valid(deltas: &[Delta], policy: AutoCreate) -> Result<(), PatchError> {
    match aggregate(deltas) {
        Difference::None => Ok(()),
        Difference::Invalid => Err(PatchError::InvalidDifference {
            objects: names_with(deltas, Difference::Invalid),
        }),
        Difference::Update if policy == AutoCreate::CreateOnly => {
            Err(PatchError::PolicyViolation {
                objects: names_with(deltas, Difference::Update),
            })
        }
        Difference::Create | Difference::Update => Ok(()),
    }
}

fn names_with(deltas: &[Delta], difference: Difference) -> String {
    deltas
        .iter()
        .filter(|d| d.difference() == difference)
        .map(|d| d.identifier().to_string())
        .join(", ")
}
