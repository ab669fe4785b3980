//! Parsed, anchored DID operations.
//!
//! An [`Operation`] is the immutable in-memory form of one raw operation
//! buffer pulled out of an anchored batch file. Construction performs JSON
//! and schema validation only; signature verification and chain placement
//! are the [processor](crate::processor)'s concern, because both depend on
//! state the single operation cannot see.

use json_patch::Patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::base64url;
use crate::cas::ResolvedTransaction;
use crate::document::{self, DidDocument};
use crate::error::Error;
use crate::multihash;
use crate::protocol::ProtocolVersions;

/// The kind of state change an operation applies to a DID.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
    /// Reserved in the wire format; no payload semantics are defined yet.
    Recover,
}

/// The ledger-supplied envelope accompanying every ingested operation.
///
/// `(transaction_number, operation_index)` is globally unique and totally
/// ordered; it is the tie-break the processor uses wherever operations
/// compete.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnchoringContext {
    /// Ledger time the containing transaction was anchored at.
    pub transaction_time: u64,
    /// Strict total order assigned by the ledger.
    pub transaction_number: u64,
    /// Content address of the batch file the operation arrived in.
    pub batch_file_hash: Vec<u8>,
    /// Position of the operation within its batch.
    pub operation_index: u32,
}

impl AnchoringContext {
    /// Bind a batch position to the ledger transaction it was anchored by.
    pub fn new(transaction: &ResolvedTransaction, operation_index: u32) -> Self {
        Self {
            transaction_time: transaction.transaction_time,
            transaction_number: transaction.transaction_number,
            batch_file_hash: transaction.batch_file_hash.clone(),
            operation_index,
        }
    }

    /// Key in the ledger-imposed total order.
    pub fn order(&self) -> (u64, u32) {
        (self.transaction_number, self.operation_index)
    }
}

/// Decoded payload of an Update operation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    /// The DID the update applies to.
    pub did: String,
    /// Position in the operation chain; 0 is the Create, so updates start
    /// at 1. Advisory: the predecessor hash is authoritative.
    pub operation_number: u32,
    /// Operation hash of the predecessor, in its base64url-encoded form.
    pub previous_operation_hash: String,
    /// RFC 6902 patch to apply to the predecessor's document.
    pub patch: Patch,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
struct DeletePayload {
    did: String,
}

#[derive(Debug, Deserialize)]
struct OperationEnvelope {
    header: OperationHeader,
    payload: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationHeader {
    operation: OperationType,
    kid: String,
    proof_of_work: Value,
}

#[derive(Debug, Clone)]
enum OperationPayload {
    Create { did_document: DidDocument },
    Update(UpdatePayload),
    Delete { did: String },
}

/// One parsed anchored operation.
///
/// The original buffer is preserved byte for byte: non-Create operation
/// hashes are defined over it, so any re-serialization would change
/// identity.
#[derive(Debug, Clone)]
pub struct Operation {
    operation_buffer: Vec<u8>,
    anchoring: Option<AnchoringContext>,
    signing_key_id: String,
    signature: Vec<u8>,
    encoded_payload: String,
    payload: OperationPayload,
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::MalformedOperation(reason.into())
}

impl Operation {
    /// Parse and schema-validate an anchored operation buffer.
    pub fn parse(operation_buffer: &[u8], anchoring: AnchoringContext) -> Result<Self, Error> {
        Self::parse_inner(operation_buffer, Some(anchoring))
    }

    /// Parse an operation that has not been anchored yet (e.g. one just
    /// authored, still waiting to be batched). Such operations cannot be
    /// hashed.
    pub fn parse_unanchored(operation_buffer: &[u8]) -> Result<Self, Error> {
        Self::parse_inner(operation_buffer, None)
    }

    fn parse_inner(
        operation_buffer: &[u8],
        anchoring: Option<AnchoringContext>,
    ) -> Result<Self, Error> {
        let envelope: OperationEnvelope = serde_json::from_slice(operation_buffer)
            .map_err(|e| malformed(format!("invalid envelope: {e}")))?;
        if envelope.header.kid.is_empty() {
            return Err(malformed("header.kid must be a non-empty string"));
        }
        if !envelope.header.proof_of_work.is_object() {
            return Err(malformed("header.proofOfWork must be an object"));
        }
        if envelope.payload.is_empty() {
            return Err(malformed("payload must be a non-empty string"));
        }
        if envelope.signature.is_empty() {
            return Err(malformed("signature must be a non-empty string"));
        }
        let signature = base64url::decode(&envelope.signature)
            .map_err(|_| malformed("signature is not base64url"))?;
        let payload_json = base64url::decode_as_utf8(&envelope.payload)
            .map_err(|_| malformed("payload is not base64url-encoded UTF-8"))?;
        let payload_value: Value = serde_json::from_str(&payload_json)
            .map_err(|e| malformed(format!("payload is not JSON: {e}")))?;

        let payload = match envelope.header.operation {
            OperationType::Create => {
                if !document::is_valid_original_document(&payload_value) {
                    return Err(malformed("payload is not a valid original DID Document"));
                }
                let did_document = serde_json::from_value(payload_value)
                    .map_err(|e| malformed(format!("payload is not a DID Document: {e}")))?;
                OperationPayload::Create { did_document }
            }
            OperationType::Update => {
                let update: UpdatePayload = serde_json::from_value(payload_value)
                    .map_err(|e| malformed(format!("invalid update payload: {e}")))?;
                if update.did.is_empty() {
                    return Err(malformed("update payload did must be non-empty"));
                }
                if update.operation_number < 1 {
                    return Err(malformed("update operationNumber must be >= 1"));
                }
                let previous_hash = base64url::decode(&update.previous_operation_hash)
                    .map_err(|_| malformed("previousOperationHash is not base64url"))?;
                multihash::decode(&previous_hash)
                    .map_err(|_| malformed("previousOperationHash is not a multihash"))?;
                OperationPayload::Update(update)
            }
            OperationType::Delete => {
                let delete: DeletePayload = serde_json::from_value(payload_value)
                    .map_err(|e| malformed(format!("invalid delete payload: {e}")))?;
                if delete.did.is_empty() {
                    return Err(malformed("delete payload did must be non-empty"));
                }
                OperationPayload::Delete { did: delete.did }
            }
            OperationType::Recover => {
                return Err(malformed(
                    "recover operations have no defined payload semantics",
                ));
            }
        };

        Ok(Self {
            operation_buffer: operation_buffer.to_vec(),
            anchoring,
            signing_key_id: envelope.header.kid,
            signature,
            encoded_payload: envelope.payload,
            payload,
        })
    }

    pub fn operation_type(&self) -> OperationType {
        match self.payload {
            OperationPayload::Create { .. } => OperationType::Create,
            OperationPayload::Update(_) => OperationType::Update,
            OperationPayload::Delete { .. } => OperationType::Delete,
        }
    }

    pub fn anchoring(&self) -> Option<&AnchoringContext> {
        self.anchoring.as_ref()
    }

    /// The original buffer the operation was parsed from, byte for byte.
    pub fn operation_buffer(&self) -> &[u8] {
        &self.operation_buffer
    }

    /// `header.kid`: the id of the signing key within the target document.
    pub fn signing_key_id(&self) -> &str {
        &self.signing_key_id
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The base64url-encoded payload exactly as received.
    pub fn encoded_payload(&self) -> &str {
        &self.encoded_payload
    }

    /// The original DID Document, for Create operations.
    pub fn did_document(&self) -> Option<&DidDocument> {
        match &self.payload {
            OperationPayload::Create { did_document } => Some(did_document),
            _ => None,
        }
    }

    /// The decoded update payload, for Update operations.
    pub fn update_payload(&self) -> Option<&UpdatePayload> {
        match &self.payload {
            OperationPayload::Update(update) => Some(update),
            _ => None,
        }
    }

    /// The embedded target DID, for Update and Delete operations.
    pub fn did(&self) -> Option<&str> {
        match &self.payload {
            OperationPayload::Create { .. } => None,
            OperationPayload::Update(update) => Some(&update.did),
            OperationPayload::Delete { did } => Some(did),
        }
    }

    pub fn operation_number(&self) -> Option<u32> {
        self.update_payload().map(|update| update.operation_number)
    }

    pub fn previous_operation_hash(&self) -> Option<&str> {
        self.update_payload()
            .map(|update| update.previous_operation_hash.as_str())
    }

    /// The operation's content address, base64url-encoded.
    ///
    /// Create operations hash their encoded payload, so the derived DID is
    /// invariant to header choices (the signature cannot sign its own
    /// hash). Every other type hashes the full buffer, committing to the
    /// signature and proof of work and making the chain tamper-evident.
    pub fn operation_hash(&self, protocol: &ProtocolVersions) -> Result<String, Error> {
        let anchoring = self.anchoring.as_ref().ok_or(Error::HashTimeUnknown)?;
        let parameters = protocol.get(anchoring.transaction_time)?;
        let hash_input: &[u8] = match self.payload {
            OperationPayload::Create { .. } => self.encoded_payload.as_bytes(),
            _ => &self.operation_buffer,
        };
        let digest = multihash::hash(hash_input, parameters.hash_algorithm_in_multihash_code)?;
        Ok(base64url::encode(digest))
    }

    /// The DID unique suffix this operation applies to.
    ///
    /// For Create operations the suffix *is* the operation hash; for the
    /// rest it is the embedded `did` with the method prefix stripped.
    pub fn did_unique_suffix(
        &self,
        did_method_name: &str,
        protocol: &ProtocolVersions,
    ) -> Result<String, Error> {
        match &self.payload {
            OperationPayload::Create { .. } => self.operation_hash(protocol),
            OperationPayload::Update(update) => strip_method(did_method_name, &update.did),
            OperationPayload::Delete { did } => strip_method(did_method_name, did),
        }
    }

    /// Verify the operation signature against a candidate public key.
    ///
    /// Returns `false` on any failure; never raises.
    pub fn verify_signature(&self, key: &k256::ecdsa::VerifyingKey) -> bool {
        crate::jws::verify(&self.encoded_payload, &self.signature, key)
    }
}

fn strip_method(did_method_name: &str, did: &str) -> Result<String, Error> {
    did.strip_prefix(did_method_name)
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            Error::MalformedOperation(format!(
                "DID '{did}' is not under method '{did_method_name}'"
            ))
        })
}
