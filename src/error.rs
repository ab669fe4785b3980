//! Error types for `sidetree-core`.

/// Error type for `sidetree-core`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// JSON parse, envelope schema, or payload schema failure while
    /// constructing an [`Operation`](crate::operation::Operation).
    #[error("Malformed operation: {0}")]
    MalformedOperation(String),
    /// Invalid base64url input.
    #[error("Malformed base64url encoding")]
    MalformedEncoding(#[from] base64::DecodeError),
    /// Decoded bytes that are required to be UTF-8 but are not.
    #[error(transparent)]
    FromUtf8(#[from] std::string::FromUtf8Error),
    /// A multihash buffer that does not follow `[code, length, digest]`.
    #[error("Malformed multihash")]
    MalformedMultihash,
    /// Hash requested for an operation that has no anchoring context.
    #[error("Operation transaction time is unknown; unanchored operations cannot be hashed")]
    HashTimeUnknown,
    /// A JSON Patch could not be validated or applied.
    #[error("Invalid JSON Patch")]
    InvalidPatch(#[from] json_patch::PatchError),
    /// No protocol parameters are configured for the given transaction time.
    #[error("No protocol parameters configured for transaction time {0}")]
    NoProtocolConfigured(u64),
    /// Multihash algorithm code not implemented
    #[error("Multihash algorithm code not implemented: 0x{0:x}")]
    UnsupportedHashAlgorithm(u64),
    /// Curve not implemented
    #[error("Curve not implemented: '{0}'")]
    CurveNotImplemented(String),
    /// Missing elliptic curve point in JWK
    #[error("Missing elliptic curve point in JWK")]
    MissingPoint,
    /// Missing private key parameter in JWK
    #[error("Missing private key parameter in JWK")]
    MissingPrivateKey,
    /// A DID Document public key entry carries no usable key material.
    #[error("Public key entry carries neither publicKeyJwk nor publicKeyHex")]
    MissingKeyMaterial,
    /// Errors from k256 point/scalar decoding
    #[error(transparent)]
    EllipticCurve(#[from] k256::elliptic_curve::Error),
    /// Errors from k256 ECDSA signing and verification
    #[error(transparent)]
    CryptoErr(#[from] k256::ecdsa::Error),
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Content not found in the content-addressed store.
    #[error("Content not found in CAS")]
    CasNotFound,
    /// The content-addressed store could not be reached.
    #[error("CAS unavailable: {0}")]
    CasUnavailable(String),
}
