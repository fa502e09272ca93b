mod common;

use appstore_crypto::{CertRole, CertificateError, ChainVerifier, ErrorKind};
use chrono::{DateTime, TimeZone as _, Utc};
use common::{Pki, Profile};

fn effective() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

#[test]
fn valid_chain_returns_matching_root() {
    let pki = Pki::new();
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let root = verifier
        .verify(
            &pki.leaf.certificate(),
            &pki.intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap();

    assert_eq!(root.der(), pki.root.der().as_slice());
}

#[test]
fn empty_root_set_is_rejected() {
    let err = ChainVerifier::new(Vec::new()).unwrap_err();
    assert!(matches!(err, CertificateError::RootSetEmpty));
    assert_eq!(err.kind(), ErrorKind::RootSetEmpty);
}

#[test]
fn first_configured_root_wins() {
    let pki = Pki::new();
    let unrelated = Profile::root("Unrelated Root").self_signed();
    let verifier = ChainVerifier::new(vec![
        unrelated.certificate(),
        pki.root.certificate(),
        pki.root.certificate(),
    ])
    .unwrap();

    let root = verifier
        .verify(
            &pki.leaf.certificate(),
            &pki.intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap();

    assert!(std::ptr::eq(root, &verifier.roots()[1]));
}

#[test]
fn expired_leaf_is_rejected() {
    let pki = Pki::new();
    let leaf = Profile::leaf("Old Receipt Signer")
        .years(2016, 2020)
        .issued_by(&pki.intermediate);
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let err = verifier
        .verify(
            &leaf.certificate(),
            &pki.intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        CertificateError::Expired {
            role: CertRole::Leaf,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::CertificateExpired);
}

#[test]
fn not_yet_valid_intermediate_is_rejected() {
    let pki = Pki::new();
    let intermediate = Profile::intermediate("Future WWDR")
        .years(2030, 2040)
        .issued_by(&pki.root);
    let leaf = Profile::leaf("Receipt Signer").issued_by(&intermediate);
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let err = verifier
        .verify(
            &leaf.certificate(),
            &intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        CertificateError::Expired {
            role: CertRole::Intermediate,
            ..
        }
    ));
}

#[test]
fn leaf_without_receipt_oid_is_rejected() {
    let pki = Pki::new();
    let leaf = Profile::leaf("Plain Leaf")
        .without_oid()
        .issued_by(&pki.intermediate);
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let err = verifier
        .verify(
            &leaf.certificate(),
            &pki.intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        CertificateError::PolicyMismatch {
            role: CertRole::Leaf,
            oid: appstore_crypto::RECEIPT_SIGNER_OID,
        }
    ));
    assert_eq!(err.kind(), ErrorKind::PolicyMismatch);
}

#[test]
fn intermediate_without_wwdr_oid_is_rejected() {
    let pki = Pki::new();
    let intermediate = Profile::intermediate("Plain CA")
        .without_oid()
        .issued_by(&pki.root);
    let leaf = Profile::leaf("Receipt Signer").issued_by(&intermediate);
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let err = verifier
        .verify(
            &leaf.certificate(),
            &intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        CertificateError::PolicyMismatch {
            role: CertRole::Intermediate,
            oid: appstore_crypto::WWDR_INTERMEDIATE_OID,
        }
    ));
}

#[test]
fn leaf_from_other_intermediate_is_rejected() {
    let pki = Pki::new();
    let other = Pki::new();
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let err = verifier
        .verify(
            &other.leaf.certificate(),
            &pki.intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap_err();

    assert!(matches!(err, CertificateError::SignatureInvalid { .. }));
    assert_eq!(err.kind(), ErrorKind::SignatureInvalid);
}

#[test]
fn untrusted_intermediate_is_rejected() {
    let pki = Pki::new();
    let untrusted = Pki::new();
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    let err = verifier
        .verify(
            &untrusted.leaf.certificate(),
            &untrusted.intermediate.certificate(),
            effective(),
            false,
        )
        .unwrap_err();

    assert!(matches!(err, CertificateError::NoTrustedRoot { .. }));
    assert_eq!(err.kind(), ErrorKind::NoTrustedRoot);
}

#[test]
fn online_checks_do_not_change_the_result() {
    let pki = Pki::new();
    let verifier = ChainVerifier::new(vec![pki.root.certificate()]).unwrap();

    assert!(
        verifier
            .verify(
                &pki.leaf.certificate(),
                &pki.intermediate.certificate(),
                effective(),
                true,
            )
            .is_ok()
    );
}
