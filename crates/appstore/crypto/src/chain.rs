//! Certificate chain verification against a fixed set of trusted roots.

use chrono::{DateTime, Utc};

use crate::Certificate;
use crate::error::{CertRole, CertificateError};

/// Mac App Store receipt signing.
///
/// See <https://www.apple.com/certificateauthority/Worldwide_Developer_Relations_CPS>.
pub const RECEIPT_SIGNER_OID: &str = "1.2.840.113635.100.6.11.1";

/// Apple Worldwide Developer Relations intermediate.
pub const WWDR_INTERMEDIATE_OID: &str = "1.2.840.113635.100.6.2.1";

/// Verifies `leaf → intermediate → root` chains against an ordered root set.
#[derive(Debug, Clone)]
pub struct ChainVerifier {
    roots: Vec<Certificate>,
}

impl ChainVerifier {
    /// Create a verifier trusting `roots`, in order.
    pub fn new(roots: Vec<Certificate>) -> Result<Self, CertificateError> {
        if roots.is_empty() {
            return Err(CertificateError::RootSetEmpty);
        }

        Ok(Self { roots })
    }

    /// Configured trust roots.
    pub fn roots(&self) -> &[Certificate] {
        &self.roots
    }

    /// Prove that `leaf` chains to a configured root at `effective`.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// validity windows, policy OIDs, leaf issuer signature, then the root scan.
    /// Returns the first configured root that issued `intermediate`.
    pub fn verify(
        &self,
        leaf: &Certificate,
        intermediate: &Certificate,
        effective: DateTime<Utc>,
        online_checks: bool,
    ) -> Result<&Certificate, CertificateError> {
        check_effective_time(CertRole::Leaf, leaf, effective)?;
        check_effective_time(CertRole::Intermediate, intermediate, effective)?;

        check_oid(CertRole::Leaf, leaf, RECEIPT_SIGNER_OID)?;
        check_oid(CertRole::Intermediate, intermediate, WWDR_INTERMEDIATE_OID)?;

        if !leaf.verify(intermediate) {
            return Err(CertificateError::SignatureInvalid {
                subject: leaf.subject().to_string(),
                issuer: intermediate.subject().to_string(),
            });
        }

        // First configured match wins. Two roots validating the same
        // intermediate is not treated as an error.
        let root = self
            .roots
            .iter()
            .find(|root| intermediate.verify(root))
            .ok_or_else(|| CertificateError::NoTrustedRoot {
                issuer: intermediate.issuer().to_string(),
            })?;

        tracing::debug!(
            leaf = leaf.subject(),
            intermediate = intermediate.subject(),
            root = root.subject(),
            %effective,
            "certificate chain verified"
        );

        if online_checks {
            check_revocation(leaf, intermediate);
        }

        Ok(root)
    }
}

fn check_effective_time(
    role: CertRole,
    cert: &Certificate,
    effective: DateTime<Utc>,
) -> Result<(), CertificateError> {
    if cert.verify_effective_time(effective) {
        return Ok(());
    }

    Err(CertificateError::Expired {
        role,
        valid_from: cert.valid_from(),
        valid_to: cert.valid_to(),
        effective,
    })
}

fn check_oid(role: CertRole, cert: &Certificate, oid: &'static str) -> Result<(), CertificateError> {
    if cert.verify_oid(oid) {
        return Ok(());
    }

    Err(CertificateError::PolicyMismatch { role, oid })
}

/// Online revocation (OCSP) checking.
///
/// Not implemented: nothing is checked and nothing is reported as checked.
/// A real implementation needs its own timeout and retry policy.
fn check_revocation(leaf: &Certificate, intermediate: &Certificate) {
    tracing::warn!(
        leaf_serial = leaf.serial(),
        intermediate_serial = intermediate.serial(),
        "online revocation checking is not implemented, certificates were not checked for revocation"
    );
}
