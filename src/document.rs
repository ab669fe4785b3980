//! DID Document model and document rules.
//!
//! Two rules live here: the structural predicate for an *original* DID
//! Document (the payload of a Create operation, authored before the DID
//! itself exists), and pure RFC 6902 patch application used to advance a
//! document through its update chain.

use std::collections::HashMap as Map;
use std::convert::TryFrom;

use json_patch::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::jwk::{self, Jwk};

/// JSON-LD context expected on DID Documents.
pub const DEFAULT_CONTEXT: &str = "https://w3id.org/did/v1";

/// A DID Document.
///
/// Only the properties the resolution core interprets are typed; anything
/// else rides along in `property_set`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_key: Vec<DidPublicKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub property_set: Option<Map<String, Value>>,
}

/// A public key entry within a DID Document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DidPublicKey {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub property_set: Option<Map<String, Value>>,
}

/// A service endpoint entry within a DID Document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub service_endpoint: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub property_set: Option<Map<String, Value>>,
}

impl DidDocument {
    /// Look up a public key entry by its `id`.
    pub fn public_key(&self, id: &str) -> Option<&DidPublicKey> {
        self.public_key.iter().find(|key| key.id == id)
    }
}

impl DidPublicKey {
    /// The entry's key material as a k256 verifying key, from whichever of
    /// `publicKeyJwk` and `publicKeyHex` is present.
    pub fn verifying_key(&self) -> Result<k256::ecdsa::VerifyingKey, Error> {
        if let Some(key) = &self.public_key_jwk {
            return k256::ecdsa::VerifyingKey::try_from(key);
        }
        if let Some(hex_data) = &self.public_key_hex {
            let key = jwk::secp256k1_parse_hex(hex_data)?;
            return k256::ecdsa::VerifyingKey::try_from(&key);
        }
        Err(Error::MissingKeyMaterial)
    }
}

/// Structural predicate for an *original* DID Document, the payload of a
/// Create operation.
///
/// The DID is derived from the operation hash, so the method cannot have
/// assigned an `id` yet; public key ids must be fragment references so they
/// resolve against the DID once it exists. At least one public key with an
/// `id` and a `type` is required.
pub fn is_valid_original_document(value: &Value) -> bool {
    let object = match value.as_object() {
        Some(object) => object,
        None => return false,
    };
    if let Some(id) = object.get("id") {
        if !id.is_string() {
            return false;
        }
    }
    let keys = match object.get("publicKey").and_then(Value::as_array) {
        Some(keys) if !keys.is_empty() => keys,
        _ => return false,
    };
    keys.iter().all(|key| {
        let id_valid = key
            .get("id")
            .and_then(Value::as_str)
            .map_or(false, |id| id.starts_with('#') && id.len() > 1);
        let type_valid = key
            .get("type")
            .and_then(Value::as_str)
            .map_or(false, |type_| !type_.is_empty());
        id_valid && type_valid
    })
}

/// Apply an RFC 6902 patch to a document, producing a new document.
///
/// The input is never mutated: the patch is applied to a working copy, and
/// any failure discards the copy. A failing patch operation reports
/// [`Error::InvalidPatch`]; a result that no longer has DID Document shape
/// fails typed re-deserialization instead.
pub fn apply_patch(document: &DidDocument, patch: &Patch) -> Result<DidDocument, Error> {
    let mut value = serde_json::to_value(document)?;
    json_patch::patch(&mut value, patch)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "@context": DEFAULT_CONTEXT,
            "publicKey": [
                { "id": "#key1", "type": "Secp256k1VerificationKey2018", "publicKeyHex": "02deadbeef" },
                { "id": "#key2", "type": "Secp256k1VerificationKey2018", "owner": "did:sidetree:abc" }
            ],
            "service": [
                { "id": "#hub", "type": "IdentityHub", "serviceEndpoint": "https://hub.example.com" }
            ]
        })
    }

    #[test]
    fn accepts_well_formed_original_document() {
        assert!(is_valid_original_document(&fixture()));
        // `@context` is conventional, not required.
        assert!(is_valid_original_document(&json!({
            "publicKey": [{ "id": "#key1", "type": "Secp256k1VerificationKey2018" }]
        })));
    }

    #[test]
    fn rejects_structurally_invalid_original_documents() {
        assert!(!is_valid_original_document(&json!("not an object")));
        assert!(!is_valid_original_document(&json!({ "@context": DEFAULT_CONTEXT })));
        assert!(!is_valid_original_document(
            &json!({ "@context": DEFAULT_CONTEXT, "publicKey": [] })
        ));
        // Key id must be a fragment.
        assert!(!is_valid_original_document(&json!({
            "@context": DEFAULT_CONTEXT,
            "publicKey": [{ "id": "key1", "type": "Secp256k1VerificationKey2018" }]
        })));
        // Key type is required.
        assert!(!is_valid_original_document(&json!({
            "@context": DEFAULT_CONTEXT,
            "publicKey": [{ "id": "#key1" }]
        })));
    }

    #[test]
    fn key_lookup_matches_exact_id() {
        let document: DidDocument = serde_json::from_value(fixture()).unwrap();
        assert!(document.public_key("#key1").is_some());
        assert!(document.public_key("#key2").is_some());
        assert!(document.public_key("#key3").is_none());
    }

    #[test]
    fn apply_patch_does_not_mutate_input() {
        let document: DidDocument = serde_json::from_value(fixture()).unwrap();
        let before = document.clone();
        let patch: Patch = serde_json::from_value(json!([
            { "op": "replace", "path": "/publicKey/1/owner", "value": "did:sidetree:xyz" }
        ]))
        .unwrap();
        let updated = apply_patch(&document, &patch).unwrap();
        assert_eq!(document, before);
        assert_eq!(
            updated.public_key[1].owner.as_deref(),
            Some("did:sidetree:xyz")
        );
    }

    #[test]
    fn no_op_patch_yields_equal_document() {
        let document: DidDocument = serde_json::from_value(fixture()).unwrap();
        let patch: Patch = serde_json::from_value(json!([])).unwrap();
        assert_eq!(apply_patch(&document, &patch).unwrap(), document);
    }

    #[test]
    fn failing_patch_operation_is_invalid() {
        let document: DidDocument = serde_json::from_value(fixture()).unwrap();
        let patch: Patch = serde_json::from_value(json!([
            { "op": "replace", "path": "/publicKey/9/owner", "value": "did:sidetree:xyz" }
        ]))
        .unwrap();
        assert!(matches!(
            apply_patch(&document, &patch),
            Err(Error::InvalidPatch(_))
        ));
    }

    #[test]
    fn patch_breaking_document_shape_is_rejected() {
        let document: DidDocument = serde_json::from_value(fixture()).unwrap();
        let patch: Patch = serde_json::from_value(json!([
            { "op": "replace", "path": "/publicKey", "value": "no longer an array" }
        ]))
        .unwrap();
        assert!(matches!(
            apply_patch(&document, &patch),
            Err(Error::Json(_))
        ));
    }
}
