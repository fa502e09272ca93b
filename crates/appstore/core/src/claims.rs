//! Claim set carried by a signed payload.

/// Verified claims, in the order they appear in the payload.
///
/// Claim semantics are left to the caller.
pub type ClaimSet = serde_json::Map<String, serde_json::Value>;

/// Claim holding the signing time (epoch milliseconds) of transactions,
/// renewal info and notifications.
pub const SIGNED_DATE_CLAIM: &str = "signedDate";

/// Claim holding the signing time (epoch milliseconds) of app transaction payloads.
pub const RECEIPT_CREATION_DATE_CLAIM: &str = "receiptCreationDate";

/// Return the signing-date claim, preferring `signedDate` over `receiptCreationDate`.
///
/// A `null` claim counts as missing. Returns `None` when neither claim is set.
pub fn signing_date_claim(claims: &ClaimSet) -> Option<(&'static str, &serde_json::Value)> {
    [SIGNED_DATE_CLAIM, RECEIPT_CREATION_DATE_CLAIM]
        .into_iter()
        .find_map(|name| match claims.get(name) {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some((name, value)),
        })
}
