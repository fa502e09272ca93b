//! Error types for signed-data verification.

use chrono::{DateTime, Utc};
use x509_parser::error::X509Error;

/// Broad category of a verification failure.
///
/// Every error in this crate maps onto exactly one kind, so callers can reject
/// and log a message without matching on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed DER/PEM or unparseable certificate metadata.
    CertificateInvalid,
    /// Effective instant outside a certificate's validity window.
    CertificateExpired,
    /// Required policy OID absent on the leaf or intermediate.
    PolicyMismatch,
    /// A certificate-to-issuer or token-to-leaf signature check failed.
    SignatureInvalid,
    /// The chain does not end at any configured root.
    NoTrustedRoot,
    /// The compact token could not be parsed.
    TokenParseFailed,
    /// The `x5c` header does not hold exactly three certificates.
    MissingOrMalformedChain,
    /// The `alg` header is not `ES256`.
    UnsupportedAlgorithm,
    /// The verifier was configured without trust roots.
    RootSetEmpty,
}

/// Position of a certificate in the `x5c` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertRole {
    /// Receipt-signing certificate that signed the token.
    Leaf,
    /// WWDR intermediate that issued the leaf.
    Intermediate,
}

impl std::fmt::Display for CertRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf => f.write_str("leaf"),
            Self::Intermediate => f.write_str("intermediate"),
        }
    }
}

/// Why certificate bytes could not be turned into a [`crate::Certificate`].
#[derive(Debug, thiserror::Error)]
pub enum CertificateParseError {
    /// PEM framing is malformed.
    #[error("failed to parse PEM")]
    Pem(#[source] pem::PemError),
    /// PEM block is not a certificate.
    #[error("PEM is not a certificate, got: {0}")]
    Tag(String),
    /// Supposedly base64 input is not text.
    #[error("base64 certificate is not UTF-8")]
    Utf8(#[source] std::str::Utf8Error),
    /// DER does not hold a valid X.509 certificate.
    #[error("failed to parse certificate DER")]
    X509(#[source] X509Error),
    /// Validity timestamp cannot be represented.
    #[error("certificate validity timestamp {0} is out of range")]
    Timestamp(i64),
}

/// Errors from certificate parsing and chain verification.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    /// Certificate bytes could not be parsed.
    #[error("invalid certificate")]
    Invalid(#[from] CertificateParseError),
    /// A chain certificate is not valid at the effective instant.
    #[error("{role} certificate is not valid at {effective} (valid from {valid_from} to {valid_to})")]
    Expired {
        role: CertRole,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
        effective: DateTime<Utc>,
    },
    /// A chain certificate lacks its required policy OID.
    #[error("{role} certificate is missing policy OID {oid}")]
    PolicyMismatch { role: CertRole, oid: &'static str },
    /// A certificate was not signed by its claimed issuer.
    #[error("certificate {subject:?} was not signed by {issuer:?}")]
    SignatureInvalid { subject: String, issuer: String },
    /// No configured root issued the intermediate.
    #[error("no trusted root issued intermediate certificate from {issuer:?}")]
    NoTrustedRoot { issuer: String },
    /// The trust root set is empty.
    #[error("the root certificates are empty")]
    RootSetEmpty,
}

impl CertificateError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::CertificateInvalid,
            Self::Expired { .. } => ErrorKind::CertificateExpired,
            Self::PolicyMismatch { .. } => ErrorKind::PolicyMismatch,
            Self::SignatureInvalid { .. } => ErrorKind::SignatureInvalid,
            Self::NoTrustedRoot { .. } => ErrorKind::NoTrustedRoot,
            Self::RootSetEmpty => ErrorKind::RootSetEmpty,
        }
    }
}

/// Structural problems with a compact signed token.
#[derive(Debug, thiserror::Error)]
pub enum TokenParseError {
    /// Token does not have exactly three dot-separated segments.
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),
    /// A segment is not valid base64url.
    #[error("{segment} segment is not valid base64url")]
    Base64 {
        segment: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    /// The header or claims segment is not a JSON object.
    #[error("{segment} segment is not a JSON object")]
    Json {
        segment: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from decoding a signed payload.
#[derive(Debug, thiserror::Error)]
pub enum SignedDataError {
    /// The token structure could not be parsed.
    #[error("failed to parse the signed data")]
    ParseFailed(#[from] TokenParseError),
    /// The `x5c` header is missing or empty.
    #[error("x5c header is missing or empty")]
    MissingChain,
    /// The `x5c` header does not hold exactly three certificates.
    #[error("x5c header must hold 3 certificates, found {count}")]
    MalformedChain { count: usize },
    /// The `x5c` header is not an array of strings.
    #[error("x5c header must be an array of base64 strings")]
    InvalidChainType,
    /// The `alg` header is missing or not `ES256`.
    #[error("algorithm was not ES256 (found {found:?})")]
    UnsupportedAlgorithm { found: Option<String> },
    /// The signing-date claim is present but not epoch milliseconds.
    #[error("{claim} claim is not an epoch-millisecond timestamp")]
    InvalidSigningDate { claim: &'static str },
    /// Certificate parsing or chain verification failed.
    #[error("certificate chain verification failed")]
    Certificate(#[from] CertificateError),
    /// The token signature does not verify under the leaf key.
    #[error("token signature verification failed")]
    SignatureInvalid(#[source] p256::ecdsa::Error),
    /// Verified claims do not match the requested type.
    #[error("failed to deserialize verified claims")]
    Claims(#[source] serde_json::Error),
}

impl SignedDataError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParseFailed(_) | Self::InvalidSigningDate { .. } | Self::Claims(_) => {
                ErrorKind::TokenParseFailed
            }
            Self::MissingChain | Self::MalformedChain { .. } | Self::InvalidChainType => {
                ErrorKind::MissingOrMalformedChain
            }
            Self::UnsupportedAlgorithm { .. } => ErrorKind::UnsupportedAlgorithm,
            Self::Certificate(e) => e.kind(),
            Self::SignatureInvalid(_) => ErrorKind::SignatureInvalid,
        }
    }
}
