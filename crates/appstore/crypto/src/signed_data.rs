//! Signed payload verification.
//!
//! App Store Server API responses and App Store Server Notifications carry
//! JWS payloads whose `x5c` header holds the signing chain. A payload is
//! trusted only after the chain verifies against a configured Apple root and
//! the JWS signature verifies under the leaf certificate's key.

use appstore_core::{ClaimSet, Environment};
use chrono::{DateTime, Utc};
use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};

use crate::error::SignedDataError;
use crate::jws::CompactToken;
use crate::{Certificate, ChainVerifier};

/// The only accepted JWS algorithm.
pub const ALG_NAME: &str = "ES256";

const CHAIN_LEN: usize = 3;

/// Verifies and decodes signed payloads.
#[derive(Debug, Clone)]
pub struct SignedDataVerifier {
    chain: ChainVerifier,
    environment: Environment,
    online_checks: bool,
}

impl SignedDataVerifier {
    /// Create a verifier.
    ///
    /// `root_certificates` are the trust anchors, scanned in order. With
    /// `online_checks` set, certificates are checked against the current time
    /// instead of the payload's signing date.
    ///
    /// See <https://www.apple.com/certificateauthority/>.
    pub fn new(
        root_certificates: Vec<Certificate>,
        environment: Environment,
        online_checks: bool,
    ) -> Result<Self, crate::CertificateError> {
        Ok(Self {
            chain: ChainVerifier::new(root_certificates)?,
            environment,
            online_checks,
        })
    }

    /// Environment this verifier accepts payloads for.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Whether online checks are enabled.
    pub fn online_checks(&self) -> bool {
        self.online_checks
    }

    /// Configured trust roots.
    pub fn root_certificates(&self) -> &[Certificate] {
        self.chain.roots()
    }

    /// Decode a signed payload, returning its claims once verified.
    pub fn decode(&self, signed_data: &str) -> Result<ClaimSet, SignedDataError> {
        let token = CompactToken::parse(signed_data)?;

        if self.environment.skips_verification() {
            return Ok(decode_unverified(token));
        }

        self.decode_verified(token)
    }

    /// Decode a signed payload and deserialize its verified claims.
    pub fn decode_as<T: serde::de::DeserializeOwned>(
        &self,
        signed_data: &str,
    ) -> Result<T, SignedDataError> {
        let claims = self.decode(signed_data)?;
        serde_json::from_value(serde_json::Value::Object(claims)).map_err(SignedDataError::Claims)
    }

    fn decode_verified(&self, token: CompactToken) -> Result<ClaimSet, SignedDataError> {
        let x5c = chain_entries(token.header.x5c.as_ref())?;

        match &token.header.alg {
            Some(serde_json::Value::String(alg)) if alg == ALG_NAME => {}
            found => {
                return Err(SignedDataError::UnsupportedAlgorithm {
                    found: found.as_ref().map(|alg| match alg {
                        serde_json::Value::String(alg) => alg.clone(),
                        other => other.to_string(),
                    }),
                });
            }
        }

        let effective = self.effective_instant(&token.claims)?;

        let leaf = Certificate::from_der(x5c[0].as_bytes(), true)?;
        let intermediate = Certificate::from_der(x5c[1].as_bytes(), true)?;

        self.chain
            .verify(&leaf, &intermediate, effective, self.online_checks)?;

        verify_signature(&leaf, &token)?;

        tracing::debug!(
            environment = %self.environment,
            leaf = leaf.subject(),
            "signed data verified"
        );

        Ok(token.claims)
    }

    /// Instant certificates must be valid at.
    ///
    /// The payload's own signing date, so payloads stay verifiable after the
    /// certificates that signed them expire. Wall-clock time when online
    /// checks are on or the payload carries no signing date.
    fn effective_instant(&self, claims: &ClaimSet) -> Result<DateTime<Utc>, SignedDataError> {
        if self.online_checks {
            return Ok(Utc::now());
        }

        let Some((claim, value)) = appstore_core::signing_date_claim(claims) else {
            return Ok(Utc::now());
        };

        if is_empty(value) {
            return Ok(Utc::now());
        }

        signing_date_millis(value)
            .and_then(DateTime::from_timestamp_millis)
            .ok_or(SignedDataError::InvalidSigningDate { claim })
    }
}

/// Trust the payload as-is. Only reachable for [`Environment::Xcode`].
fn decode_unverified(token: CompactToken) -> ClaimSet {
    tracing::debug!(
        environment = %Environment::Xcode,
        "skipping verification of locally signed data"
    );
    token.claims
}

/// The `x5c` entries, checked for count and type.
fn chain_entries(x5c: Option<&serde_json::Value>) -> Result<Vec<&str>, SignedDataError> {
    let entries = match x5c {
        None => return Err(SignedDataError::MissingChain),
        Some(serde_json::Value::Array(entries)) => entries,
        Some(_) => return Err(SignedDataError::InvalidChainType),
    };

    if entries.is_empty() {
        return Err(SignedDataError::MissingChain);
    }
    if entries.len() != CHAIN_LEN {
        return Err(SignedDataError::MalformedChain {
            count: entries.len(),
        });
    }

    entries
        .iter()
        .map(serde_json::Value::as_str)
        .collect::<Option<Vec<_>>>()
        .ok_or(SignedDataError::InvalidChainType)
}

fn verify_signature(leaf: &Certificate, token: &CompactToken) -> Result<(), SignedDataError> {
    let key =
        VerifyingKey::from_sec1_bytes(leaf.public_key()).map_err(SignedDataError::SignatureInvalid)?;
    let signature =
        Signature::from_slice(&token.signature).map_err(SignedDataError::SignatureInvalid)?;

    key.verify(token.signing_input.as_bytes(), &signature)
        .map_err(SignedDataError::SignatureInvalid)
}

fn signing_date_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|millis| millis.is_finite())
                .map(|millis| millis.trunc() as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `null`, `0` and `""` count as no signing date.
fn is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty() || s == "0",
        _ => false,
    }
}
