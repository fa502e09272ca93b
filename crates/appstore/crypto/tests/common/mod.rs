//! Synthetic Apple-style PKI for tests.

#![allow(dead_code)]

use appstore_crypto::Certificate;
use appstore_crypto::jws::encode_segment;
use base64::Engine as _;
use p256::ecdsa::signature::Signer as _;
use p256::pkcs8::DecodePrivateKey as _;
use rcgen::{
    BasicConstraints, CertificateParams, CustomExtension, DnType, IsCa, KeyPair,
};

pub const RECEIPT_SIGNER_OID: &[u64] = &[1, 2, 840, 113635, 100, 6, 11, 1];
pub const WWDR_INTERMEDIATE_OID: &[u64] = &[1, 2, 840, 113635, 100, 6, 2, 1];

/// 2025-01-01T00:00:00Z in epoch milliseconds.
pub const SIGNED_DATE: i64 = 1_735_689_600_000;

/// A generated certificate with its private key.
pub struct Issued {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
}

impl Issued {
    pub fn der(&self) -> Vec<u8> {
        self.cert.der().to_vec()
    }

    pub fn b64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.cert.der())
    }

    pub fn certificate(&self) -> Certificate {
        Certificate::from_der(self.cert.der(), false).unwrap()
    }
}

/// Validity window and policy extensions for a generated certificate.
pub struct Profile {
    pub name: &'static str,
    pub years: (i32, i32),
    pub oid: Option<&'static [u64]>,
    pub ca: bool,
}

impl Profile {
    pub fn root(name: &'static str) -> Self {
        Self {
            name,
            years: (2015, 2045),
            oid: None,
            ca: true,
        }
    }

    pub fn intermediate(name: &'static str) -> Self {
        Self {
            name,
            years: (2018, 2040),
            oid: Some(WWDR_INTERMEDIATE_OID),
            ca: true,
        }
    }

    pub fn leaf(name: &'static str) -> Self {
        Self {
            name,
            years: (2020, 2040),
            oid: Some(RECEIPT_SIGNER_OID),
            ca: false,
        }
    }

    pub fn years(mut self, from: i32, to: i32) -> Self {
        self.years = (from, to);
        self
    }

    pub fn without_oid(mut self) -> Self {
        self.oid = None;
        self
    }

    fn params(&self) -> CertificateParams {
        let mut params = CertificateParams::new(vec![format!("{}.example", self.name)]).unwrap();
        params.distinguished_name.push(DnType::CommonName, self.name);
        params.not_before = rcgen::date_time_ymd(self.years.0, 1, 1);
        params.not_after = rcgen::date_time_ymd(self.years.1, 1, 1);
        if self.ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        }
        if let Some(oid) = self.oid {
            // Apple encodes these policy markers as ASN.1 NULL.
            params
                .custom_extensions
                .push(CustomExtension::from_oid_content(oid, vec![0x05, 0x00]));
        }
        params
    }

    pub fn self_signed(self) -> Issued {
        let key = KeyPair::generate().unwrap();
        let cert = self.params().self_signed(&key).unwrap();
        Issued { cert, key }
    }

    pub fn issued_by(self, issuer: &Issued) -> Issued {
        let key = KeyPair::generate().unwrap();
        let cert = self
            .params()
            .signed_by(&key, &issuer.cert, &issuer.key)
            .unwrap();
        Issued { cert, key }
    }
}

/// Root, WWDR-style intermediate and receipt-signing leaf.
pub struct Pki {
    pub root: Issued,
    pub intermediate: Issued,
    pub leaf: Issued,
}

impl Pki {
    pub fn new() -> Self {
        let root = Profile::root("Test Root CA").self_signed();
        let intermediate = Profile::intermediate("Test WWDR").issued_by(&root);
        let leaf = Profile::leaf("Test Receipt Signer").issued_by(&intermediate);
        Self {
            root,
            intermediate,
            leaf,
        }
    }

    pub fn x5c(&self) -> Vec<String> {
        vec![self.leaf.b64(), self.intermediate.b64(), self.root.b64()]
    }

    /// A token signed by the leaf key carrying this chain.
    pub fn token(&self, claims: &serde_json::Value) -> String {
        sign(
            &serde_json::json!({ "alg": "ES256", "x5c": self.x5c() }),
            claims,
            &self.leaf.key,
        )
    }
}

pub fn claims() -> serde_json::Value {
    serde_json::json!({
        "transactionId": "2000000000000001",
        "bundleId": "com.example.app",
        "productId": "com.example.app.monthly",
        "purchaseDate": SIGNED_DATE - 60_000,
        "environment": "Production",
        "signedDate": SIGNED_DATE,
    })
}

/// Encode `header.claims` and sign it with `key` using ES256.
pub fn sign(header: &serde_json::Value, claims: &serde_json::Value, key: &KeyPair) -> String {
    let signing_input = signing_input(header, claims);
    let signing_key = p256::ecdsa::SigningKey::from_pkcs8_der(&key.serialize_der()).unwrap();
    let signature: p256::ecdsa::Signature = signing_key.sign(signing_input.as_bytes());
    format!("{signing_input}.{}", encode_segment(&signature.to_bytes()))
}

/// A token with an empty signature segment.
pub fn unsigned(header: &serde_json::Value, claims: &serde_json::Value) -> String {
    format!("{}.", signing_input(header, claims))
}

fn signing_input(header: &serde_json::Value, claims: &serde_json::Value) -> String {
    format!(
        "{}.{}",
        encode_segment(header.to_string().as_bytes()),
        encode_segment(claims.to_string().as_bytes())
    )
}
