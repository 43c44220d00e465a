use pgpatch::patch::policy::assert_patching_is_valid;
use pgpatch::schema::objects::DatabaseSchema;
use pgpatch::{AutoCreate, Delta, Difference};
use rstest::rstest;
use std::sync::Arc;

fn deltas(differences: &[Difference]) -> Vec<Delta> {
    differences
        .iter()
        .enumerate()
        .map(|(i, d)| Delta::new(Arc::new(DatabaseSchema::new(format!("o{}", i))), *d))
        .collect()
}

#[rstest]
#[case(&[], AutoCreate::CreateOnly, true)]
#[case(&[Difference::None], AutoCreate::CreateOnly, true)]
#[case(&[Difference::Create], AutoCreate::CreateOnly, true)]
#[case(&[Difference::Create, Difference::Update], AutoCreate::CreateOnly, false)]
#[case(&[Difference::Create, Difference::Update], AutoCreate::All, true)]
#[case(&[Difference::Update], AutoCreate::None, true)]
#[case(&[Difference::Invalid], AutoCreate::All, false)]
#[case(&[Difference::Invalid], AutoCreate::None, false)]
#[case(&[Difference::None, Difference::Invalid], AutoCreate::CreateOnly, false)]
fn test_validation_matrix(
    #[case] differences: &[Difference],
    #[case] policy: AutoCreate,
    #[case] accepted: bool,
) {
    assert_eq!(
        assert_patching_is_valid(&deltas(differences), policy).is_ok(),
        accepted
    );
}

#[test]
fn test_invalid_reported_before_updates() {
    let log = deltas(&[Difference::Update, Difference::Invalid, Difference::Invalid]);
    let err = assert_patching_is_valid(&log, AutoCreate::CreateOnly).unwrap_err();
    assert_eq!(err.to_string(), "Cannot derive updates for objects o1, o2");
}
