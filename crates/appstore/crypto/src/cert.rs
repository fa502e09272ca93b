//! Certificate handle.

use std::collections::BTreeMap;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use x509_parser::error::X509Error;
use x509_parser::prelude::*;

use crate::error::{CertificateError, CertificateParseError};

const PEM_TAG: &str = "CERTIFICATE";
const PEM_LINE_WIDTH: usize = 64;

/// A parsed X.509 certificate.
///
/// Owns its DER encoding along with the metadata needed for chain checks.
/// Construction parses the whole certificate, so every instance is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    serial: String,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    extensions: BTreeMap<String, Vec<u8>>,
    public_key: Vec<u8>,
}

impl Certificate {
    /// Build a certificate from DER bytes.
    ///
    /// When `is_base64` is set, `der` is the standard base64 text of the DER
    /// (as found in an `x5c` header) rather than the raw bytes. Either way the
    /// body is framed as PEM and parsed with [`Certificate::from_pem`].
    pub fn from_der(der: &[u8], is_base64: bool) -> Result<Self, CertificateError> {
        let body = if is_base64 {
            std::str::from_utf8(der)
                .map_err(CertificateParseError::Utf8)?
                .trim()
                .to_string()
        } else {
            base64::engine::general_purpose::STANDARD.encode(der)
        };

        Self::from_pem(&wrap_pem(&body))
    }

    /// Parse a certificate from PEM text.
    pub fn from_pem(pem_str: &str) -> Result<Self, CertificateError> {
        let pem_data = ::pem::parse(pem_str).map_err(CertificateParseError::Pem)?;

        if pem_data.tag() != PEM_TAG {
            return Err(CertificateParseError::Tag(pem_data.tag().to_string()).into());
        }

        Self::parse(pem_data.into_contents())
    }

    fn parse(der: Vec<u8>) -> Result<Self, CertificateError> {
        let (_, cert) = X509Certificate::from_der(&der)
            .map_err(|e| CertificateParseError::X509(flatten_x509_error(e)))?;

        let validity = cert.validity();
        let valid_from = timestamp(validity.not_before.timestamp())?;
        let valid_to = timestamp(validity.not_after.timestamp())?;

        let extensions = cert
            .extensions()
            .iter()
            .map(|ext| (ext.oid.to_id_string(), ext.value.to_vec()))
            .collect();

        let subject = cert.subject().to_string();
        let issuer = cert.issuer().to_string();
        let serial = cert.raw_serial_as_string();
        let public_key = cert.public_key().subject_public_key.data.to_vec();

        Ok(Self {
            der,
            subject,
            issuer,
            serial,
            valid_from,
            valid_to,
            extensions,
            public_key,
        })
    }

    /// Whether this certificate's signature verifies under `issuer`'s public key.
    pub fn verify(&self, issuer: &Certificate) -> bool {
        let (Ok((_, subject)), Ok((_, issuer))) = (
            X509Certificate::from_der(&self.der),
            X509Certificate::from_der(&issuer.der),
        ) else {
            return false;
        };

        subject.verify_signature(Some(issuer.public_key())).is_ok()
    }

    /// Whether `instant` falls strictly inside the validity window.
    ///
    /// Compared in whole seconds. An instant equal to either bound is not valid.
    pub fn verify_effective_time(&self, instant: DateTime<Utc>) -> bool {
        let instant = instant.timestamp();
        self.valid_from.timestamp() < instant && instant < self.valid_to.timestamp()
    }

    /// Whether the certificate carries an extension with the given dotted OID.
    pub fn verify_oid(&self, oid: &str) -> bool {
        self.extensions.contains_key(oid)
    }

    /// DER encoding.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer distinguished name.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number as colon-separated hex.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Start of the validity window.
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// End of the validity window.
    pub fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    /// Dotted OIDs of all extensions, sorted.
    pub fn extension_oids(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    /// Raw subject public key (SEC1 point for EC keys).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

fn wrap_pem(body: &str) -> String {
    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, CertificateParseError> {
    DateTime::from_timestamp(secs, 0).ok_or(CertificateParseError::Timestamp(secs))
}

fn flatten_x509_error(err: x509_parser::nom::Err<X509Error>) -> X509Error {
    match err {
        x509_parser::nom::Err::Error(e) | x509_parser::nom::Err::Failure(e) => e,
        x509_parser::nom::Err::Incomplete(_) => X509Error::InvalidCertificate,
    }
}
