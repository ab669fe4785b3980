//! ES256K signing and verification over the operation signing input.
//!
//! Operations are signed JWS-style but carry no protected header; the
//! signing input is the ASCII `"."` separator followed by the
//! base64url-encoded payload exactly as it appears on the wire.

use std::convert::TryFrom;

use crate::error::Error;
use crate::jwk::Jwk;

/// The JWS signing input for an encoded payload: `"." + encoded_payload`.
pub fn signing_input(encoded_payload: &str) -> Vec<u8> {
    format!(".{encoded_payload}").into_bytes()
}

/// Sign an encoded payload with a SECP256K1 private JWK.
pub fn sign(encoded_payload: &str, key: &Jwk) -> Result<Vec<u8>, Error> {
    use k256::ecdsa::{signature::Signer, Signature};
    let secret_key = k256::SecretKey::try_from(key)?;
    let signing_key = k256::ecdsa::SigningKey::from(secret_key);
    let sig: Signature = signing_key.try_sign(&signing_input(encoded_payload))?;
    Ok(sig.to_bytes().to_vec())
}

/// Verify a signature over an encoded payload.
///
/// Returns `false` on any failure: malformed signature bytes, wrong key,
/// mismatched payload. Anchored operations may be deliberately adversarial,
/// so verification failure is a value, not an error.
pub fn verify(encoded_payload: &str, signature: &[u8], key: &k256::ecdsa::VerifyingKey) -> bool {
    verify_inner(encoded_payload, signature, key).is_ok()
}

fn verify_inner(
    encoded_payload: &str,
    signature: &[u8],
    key: &k256::ecdsa::VerifyingKey,
) -> Result<(), Error> {
    use k256::ecdsa::signature::Verifier;
    let sig = k256::ecdsa::Signature::try_from(signature)?;
    // Accept low-S and high-S forms alike.
    let sig = sig.normalize_s().unwrap_or(sig);
    key.verify(&signing_input(encoded_payload), &sig)?;
    Ok(())
}
