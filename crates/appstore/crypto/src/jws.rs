//! Compact JWS parsing.

use appstore_core::ClaimSet;
use base64::Engine as _;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::TokenParseError;

/// base64url, accepting input with or without padding.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// JOSE header of a signed payload.
///
/// `alg` and `x5c` are kept as received and only interpreted when the payload
/// is verified, so an oddly typed header does not stop an unverified decode.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JoseHeader {
    /// Signature algorithm.
    #[serde(default)]
    pub alg: Option<serde_json::Value>,

    /// Certificate chain, leaf first, each entry standard base64 DER.
    #[serde(default)]
    pub x5c: Option<serde_json::Value>,

    /// Any other header fields.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl JoseHeader {
    /// Key ID, if present and a string.
    pub fn kid(&self) -> Option<&str> {
        self.other.get("kid").and_then(serde_json::Value::as_str)
    }

    /// Token type, if present and a string.
    pub fn typ(&self) -> Option<&str> {
        self.other.get("typ").and_then(serde_json::Value::as_str)
    }
}

/// A parsed but unverified compact token.
#[derive(Debug, Clone)]
pub struct CompactToken {
    /// Decoded header.
    pub header: JoseHeader,
    /// Decoded claims.
    pub claims: ClaimSet,
    /// `<header>.<claims>` exactly as received.
    pub signing_input: String,
    /// Decoded signature bytes.
    pub signature: Vec<u8>,
}

impl CompactToken {
    /// Parse `header.claims.signature`.
    pub fn parse(raw: &str) -> Result<Self, TokenParseError> {
        let raw = raw.trim();
        let segments: Vec<&str> = raw.split('.').collect();
        let [header_b64, claims_b64, signature_b64] = segments[..] else {
            return Err(TokenParseError::SegmentCount(segments.len()));
        };

        let header = decode_json(header_b64, "header")?;
        let claims = decode_json(claims_b64, "claims")?;
        let signature = decode_segment(signature_b64, "signature")?;

        Ok(Self {
            header,
            claims,
            signing_input: format!("{header_b64}.{claims_b64}"),
            signature,
        })
    }
}

fn decode_segment(segment: &str, name: &'static str) -> Result<Vec<u8>, TokenParseError> {
    BASE64_URL
        .decode(segment)
        .map_err(|source| TokenParseError::Base64 {
            segment: name,
            source,
        })
}

fn decode_json<T: serde::de::DeserializeOwned>(
    segment: &str,
    name: &'static str,
) -> Result<T, TokenParseError> {
    let bytes = decode_segment(segment, name)?;
    serde_json::from_slice(&bytes).map_err(|source| TokenParseError::Json {
        segment: name,
        source,
    })
}

/// Encode bytes as unpadded base64url.
pub fn encode_segment(bytes: &[u8]) -> String {
    BASE64_URL.encode(bytes)
}
