//! URL-safe base64 encoding without padding.
//!
//! Every encoded string in the operation wire format (payloads, signatures,
//! operation hashes, DID unique suffixes) uses this alphabet.

use crate::error::Error;

/// Encode bytes with the URL-safe base64 alphabet, without padding.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    base64::encode_config(data, base64::URL_SAFE_NO_PAD)
}

/// Decode a URL-safe unpadded base64 string.
pub fn decode(input: &str) -> Result<Vec<u8>, Error> {
    Ok(base64::decode_config(input, base64::URL_SAFE_NO_PAD)?)
}

/// Decode a URL-safe unpadded base64 string and require the bytes to be
/// valid UTF-8.
pub fn decode_as_utf8(input: &str) -> Result<String, Error> {
    let bytes = decode(input)?;
    Ok(String::from_utf8(bytes)?)
}
