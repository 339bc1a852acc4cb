//! Keyed signing of gateway parameter sets.
//!
//! Both directions (building the redirect URL and verifying the echoed
//! callback) go through the same canonicalization: keys sorted
//! lexicographically, values URL-encoded, pairs joined with `&`, then
//! HMAC-SHA512 under the merchant secret, hex-encoded. Arbitrary extra
//! parameters from the provider simply become part of the signed string.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// The signature itself and its type hint are never part of the signed
/// payload.
pub const SIGNATURE_FIELD: &str = "vnp_SecureHash";
pub const SIGNATURE_TYPE_FIELD: &str = "vnp_SecureHashType";

/// Canonical, deterministically ordered query string over the parameters.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA512 signature over the canonical query string, lowercase hex.
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let signing_input = canonical_query(params);

    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(signing_input.as_bytes());

    hex_encode(&mac.finalize().into_bytes())
}

/// Compare a provider-supplied signature against a freshly computed one.
/// HMAC output is fixed-length hex, so exact string comparison suffices.
pub fn verify(params: &BTreeMap<String, String>, secret: &str, provided: &str) -> bool {
    let expected = sign(params, secret);
    expected == provided.to_lowercase()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}
